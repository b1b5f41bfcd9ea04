//! Shared functionality for the center and party implementations.

pub mod crypto;
pub mod traits;
pub mod utils;

pub use traits::{Operator, OperatorInput, Transport};
