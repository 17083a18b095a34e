// OBDSleuth - core/mod.rs
//
// Core business logic layer: parsing, classification, reconciliation and
// rendering of scan-tool logs.
// Must NOT depend on: app, platform, or read files directly.

pub mod analysis;
pub mod consistency;
pub mod export;
pub mod keywords;
pub mod model;
pub mod pairing;
pub mod parser;
pub mod reference;
pub mod report;
