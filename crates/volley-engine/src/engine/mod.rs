pub mod closure;
pub mod orchestrator;
pub mod registry;
pub mod worker;
