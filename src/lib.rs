// OBDSleuth - lib.rs
//
// Library entry point, exposing the analysis engine for the CLI binary and
// for integration tests.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
