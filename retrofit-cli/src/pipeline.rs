pub mod disaggregation;
pub mod end_use;
pub mod error;
pub mod estimator;
pub mod features;
pub mod model;
pub mod orchestrator;
pub mod reference;
pub mod scenario;
pub mod weather;

#[cfg(test)]
pub mod testing;

pub use self::error::PipelineError;
