pub mod query_builder;
pub mod repository;
pub mod resolve;
pub mod validate;

pub use query_builder::*;
pub use repository::*;
pub use resolve::*;
pub use validate::*;
