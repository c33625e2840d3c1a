//! Process-level plumbing shared by the broker binary and its crates:
//! configuration from CLI flags, environment and `.env`, and terminal logging.

pub mod config;
pub mod logging;
