pub mod error;
pub mod events;
pub mod market;

pub use error::*;
pub use events::*;
pub use market::*;
