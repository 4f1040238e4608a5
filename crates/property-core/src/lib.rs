pub mod error;
pub mod standards;
pub mod types;

pub use error::*;
pub use standards::*;
pub use types::*;
