/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! rmsched – rate-monotonic scheduler simulator
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── task          – TaskSpec / Task / TaskCatalog (priority-ordered)
//! ├── taskset/      – plain-text and YAML task-set loading
//! ├── hyperperiod/  – LCM / GCD helpers and the hyperperiod limit
//! ├── scheduler/    – RM tick loop, ready stack, utilisation analysis
//! ├── sim/          – simulation context and the worker handshake
//! └── trace         – trace rows and the on-disk artifact
//! ```

pub mod hyperperiod;
pub mod scheduler;
pub mod sim;
pub mod task;
pub mod taskset;
pub mod trace;
