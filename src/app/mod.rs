// OBDSleuth - app/mod.rs
//
// Application layer: reference loading, single-file and folder analysis,
// folder monitoring.
// Dependencies: core, platform, util.

pub mod analyze;
pub mod monitor;
pub mod reference_mgr;
