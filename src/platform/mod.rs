// OBDSleuth - platform/mod.rs
//
// Filesystem and configuration access.
// Must NOT depend on: core, app.

pub mod config;
pub mod fs;
