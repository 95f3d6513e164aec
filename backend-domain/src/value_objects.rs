// Domain value objects
pub mod forward_status;
pub mod identifiers;
pub mod importance;

pub use forward_status::*;
pub use identifiers::*;
pub use importance::*;
