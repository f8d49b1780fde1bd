//! Support library for the `baler` binary: exit codes, logging setup,
//! settings resolution and payload rendering.

pub mod exit_codes;
pub mod logging;
pub mod output;
pub mod settings;
