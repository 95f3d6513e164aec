pub mod forward_service;
pub mod health_service;
pub mod llm_classifier;

pub use forward_service::*;
pub use health_service::*;
pub use llm_classifier::*;
