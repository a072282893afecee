/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task-set loading.
//!
//! Two on-disk formats are accepted.
//!
//! Plain text, one task per line (`name compute period`):
//! ```text
//! # name  C  T
//! A       2  6
//! B       3  12
//! C       6  24
//! ```
//! Blank lines and lines starting with `#` are ignored.  Any other line that is
//! not exactly three fields, or whose numbers are not positive integers, is a
//! fatal error reported with its line number.
//!
//! YAML:
//! ```yaml
//! tasks:
//!   - name: A
//!     compute: 2
//!     period: 6
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::task::{TaskCatalog, TaskSpec};

// ── Format selection ──────────────────────────────────────────────────────────

/// Task-set file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TaskSetFormat {
    /// YAML for `.yaml` / `.yml` extensions, plain text otherwise.
    #[default]
    Auto,
    /// Whitespace-separated `name compute period` records.
    Plain,
    /// `tasks:` list of `{name, compute, period}` maps.
    Yaml,
}

impl TaskSetFormat {
    /// Resolve `Auto` against the file extension of `path`.
    pub fn resolve(self, path: &Path) -> TaskSetFormat {
        match self {
            TaskSetFormat::Auto => match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                    TaskSetFormat::Yaml
                }
                _ => TaskSetFormat::Plain,
            },
            other => other,
        }
    }
}

// ── Private YAML deserialization types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TaskSetFile {
    #[serde(default)]
    tasks: Vec<TaskEntry>,
}

#[derive(Debug, Deserialize)]
struct TaskEntry {
    name: String,
    compute: u64,
    period: u64,
}

// ── Parsers ───────────────────────────────────────────────────────────────────

/// Parse the plain whitespace-separated format.
pub fn parse_plain(content: &str) -> Result<Vec<TaskSpec>> {
    let mut specs = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [name, compute, period] = fields.as_slice() else {
            bail!(
                "line {line_no}: expected `<name> <compute> <period>`, found {} field(s): '{line}'",
                fields.len()
            );
        };

        let compute = parse_positive(compute)
            .with_context(|| format!("line {line_no}: invalid compute-time '{compute}'"))?;
        let period = parse_positive(period)
            .with_context(|| format!("line {line_no}: invalid period '{period}'"))?;

        debug!(line = line_no, name, compute, period, "parsed task");
        specs.push(TaskSpec::new(*name, compute, period));
    }

    Ok(specs)
}

/// Parse the YAML format.
pub fn parse_yaml(content: &str) -> Result<Vec<TaskSpec>> {
    let file: TaskSetFile = serde_yaml::from_str(content).context("Failed to parse YAML task set")?;
    Ok(file
        .tasks
        .into_iter()
        .map(|e| TaskSpec::new(e.name, e.compute, e.period))
        .collect())
}

fn parse_positive(field: &str) -> Result<u64> {
    let v: u64 = field.parse()?;
    if v == 0 {
        bail!("value must be a positive integer");
    }
    Ok(v)
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Read `path` in the given format and return the raw specs in declaration
/// order.
///
/// # Errors
/// Returns an error if the file cannot be read or a record is malformed.
pub fn load_specs(path: &Path, format: TaskSetFormat) -> Result<Vec<TaskSpec>> {
    let format = format.resolve(path);
    info!(path = %path.display(), ?format, "Loading task set");

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot open task set file: {}", path.display()))?;

    let specs = match format {
        TaskSetFormat::Yaml => parse_yaml(&content),
        _ => parse_plain(&content),
    }
    .with_context(|| format!("Invalid task set file: {}", path.display()))?;

    info!(task_count = specs.len(), "Task set loaded");
    Ok(specs)
}

/// [`load_specs`] followed by catalog validation.
///
/// # Errors
/// Everything [`load_specs`] reports plus every [`CatalogError`].
///
/// [`CatalogError`]: crate::task::CatalogError
pub fn load_catalog(path: &Path, format: TaskSetFormat) -> Result<TaskCatalog> {
    let specs = load_specs(path, format)?;
    let catalog = TaskCatalog::new(specs)
        .with_context(|| format!("Invalid task set file: {}", path.display()))?;

    for (id, task) in catalog.iter() {
        info!(
            "  [{id}] {name:<12} C={c:<6} T={t:<6} U={u:.3}",
            name = task.name,
            c = task.compute,
            t = task.period,
            u = task.utilization(),
        );
    }
    Ok(catalog)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    /// Helper: write `content` to a temp file with the given suffix.
    fn tempfile_with(suffix: &str, content: &str) -> NamedTempFile {
        let mut f = Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn plain_format_parses_records_in_order() {
        let specs = parse_plain("A 2 6\nB 3 12\nC 6 24\n").unwrap();
        assert_eq!(
            specs,
            vec![
                TaskSpec::new("A", 2, 6),
                TaskSpec::new("B", 3, 12),
                TaskSpec::new("C", 6, 24),
            ]
        );
    }

    #[test]
    fn plain_format_skips_blank_and_comment_lines() {
        let specs = parse_plain("# header\n\n  A\t2   6  \n   \n# tail\n").unwrap();
        assert_eq!(specs, vec![TaskSpec::new("A", 2, 6)]);
    }

    #[test]
    fn plain_format_rejects_wrong_field_count() {
        let err = parse_plain("A 2 6\nB 3\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"), "got: {err:#}");
    }

    #[test]
    fn plain_format_rejects_non_integer_and_zero() {
        assert!(parse_plain("A two 6\n").is_err());
        assert!(parse_plain("A 2 -6\n").is_err());
        let err = parse_plain("A 0 6\n").unwrap_err();
        assert!(format!("{err:#}").contains("positive"), "got: {err:#}");
    }

    #[test]
    fn yaml_format_parses_task_list() {
        let yaml = r#"
tasks:
  - name: A
    compute: 2
    period: 6
  - name: B
    compute: 3
    period: 12
"#;
        let specs = parse_yaml(yaml).unwrap();
        assert_eq!(
            specs,
            vec![TaskSpec::new("A", 2, 6), TaskSpec::new("B", 3, 12)]
        );
    }

    #[test]
    fn malformed_yaml_returns_error() {
        assert!(parse_yaml("tasks: [ { name: A, compute: x } ]").is_err());
    }

    #[test]
    fn auto_format_follows_extension() {
        assert_eq!(
            TaskSetFormat::Auto.resolve(Path::new("set.YML")),
            TaskSetFormat::Yaml
        );
        assert_eq!(
            TaskSetFormat::Auto.resolve(Path::new("set.txt")),
            TaskSetFormat::Plain
        );
        assert_eq!(
            TaskSetFormat::Plain.resolve(Path::new("set.yaml")),
            TaskSetFormat::Plain
        );
    }

    #[test]
    fn load_catalog_from_plain_file() {
        let f = tempfile_with(".txt", "C 6 24\nA 2 6\nB 3 12\n");
        let cat = load_catalog(f.path(), TaskSetFormat::Auto).unwrap();
        let names: Vec<&str> = cat.tasks().iter().map(|t| &*t.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn load_catalog_from_yaml_file() {
        let f = tempfile_with(
            ".yaml",
            "tasks:\n  - {name: X, compute: 1, period: 4}\n  - {name: Y, compute: 1, period: 2}\n",
        );
        let cat = load_catalog(f.path(), TaskSetFormat::Auto).unwrap();
        assert_eq!(cat.len(), 2);
        assert_eq!(&*cat.tasks()[0].name, "Y");
    }

    #[test]
    fn missing_file_returns_error() {
        let result = load_specs(Path::new("/nonexistent/path/tasks.txt"), TaskSetFormat::Auto);
        assert!(result.is_err());
    }

    #[test]
    fn empty_file_is_rejected_by_catalog() {
        let f = tempfile_with(".txt", "# nothing here\n");
        assert!(load_catalog(f.path(), TaskSetFormat::Plain).is_err());
    }

    #[test]
    fn yaml_names_that_would_split_trace_tokens_are_rejected() {
        let f = tempfile_with(
            ".yaml",
            "tasks:\n  - {name: \"A\\nB\", compute: 1, period: 2}\n  - {name: X, compute: 1, period: 4}\n",
        );
        let err = load_catalog(f.path(), TaskSetFormat::Auto).unwrap_err();
        assert!(format!("{err:#}").contains("not a valid trace token"), "got: {err:#}");

        let f = tempfile_with(".yaml", "tasks:\n  - {name: \"__\", compute: 1, period: 4}\n");
        assert!(load_catalog(f.path(), TaskSetFormat::Auto).is_err());

        let f = tempfile_with(".yaml", "tasks:\n  - {name: \"\", compute: 1, period: 4}\n");
        assert!(load_catalog(f.path(), TaskSetFormat::Auto).is_err());
    }

    #[test]
    fn plain_idle_marker_name_is_rejected() {
        let f = tempfile_with(".txt", "A 1 2\n__ 1 4\n");
        let err = load_catalog(f.path(), TaskSetFormat::Plain).unwrap_err();
        assert!(format!("{err:#}").contains("\"__\""), "got: {err:#}");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let f = tempfile_with(".txt", "A 1 4\nA 1 8\n");
        let err = load_catalog(f.path(), TaskSetFormat::Plain).unwrap_err();
        assert!(format!("{err:#}").contains("more than once"), "got: {err:#}");
    }
}
