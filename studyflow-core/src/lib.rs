pub mod errors;
pub mod filters;
pub mod knowledge;
pub mod models;
pub mod progress;
pub mod quiz;
pub mod repo;
pub mod stats;

pub use errors::*;
pub use filters::*;
pub use knowledge::*;
pub use models::*;
pub use progress::*;
pub use quiz::*;
pub use repo::*;
pub use stats::*;
