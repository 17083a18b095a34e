// OBDSleuth - util/mod.rs
//
// Shared utilities: named constants, error types, logging setup.
// Depends on no other layer.

pub mod constants;
pub mod error;
pub mod logging;
