pub mod models;
pub mod contracts;
pub mod validation;
pub mod affordability;
pub mod errors;

pub use models::*;
pub use contracts::*;
pub use validation::*;
pub use affordability::*;
pub use errors::*;
