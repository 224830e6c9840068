//! Core tuning types

mod configuration;
mod parameter;
mod space;
mod transform;


// Re-export all public types
pub use configuration::Configuration;
pub use parameter::{Parameter, ParameterDomain, ParameterValue};
pub use space::HyperparameterSpace;
pub use transform::Transform;
