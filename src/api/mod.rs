pub mod handlers;
pub mod response;
pub mod routes;

pub use handlers::*;
pub use response::*;
pub use routes::*;
