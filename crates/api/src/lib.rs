pub mod routes;
pub mod stream;
pub mod validation;

pub use routes::*;
pub use stream::*;
pub use validation::*;
