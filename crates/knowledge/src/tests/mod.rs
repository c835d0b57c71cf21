//! Crate-level tests spanning several modules.

mod pipeline_scenarios;
