// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! OpenOTDR command line.
//!
//! # Usage
//! ```text
//! otdr [-v] [--no-config] <command> [options]
//! ```
//!
//! | command   | output                                           |
//! |-----------|--------------------------------------------------|
//! | `inspect` | link summary table, or the decoded file as JSON  |
//! | `blocks`  | block directory                                  |
//! | `events`  | key events                                       |
//! | `trace`   | downsampled distance/power pairs (CSV or TSV)    |
//! | `batch`   | one summary row per file, decoded in parallel    |
//!
//! The CLI exits with code `0` on success and `1` on any read or decode
//! error.

pub mod cli;
pub mod render;
