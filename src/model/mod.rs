pub mod common;
pub mod device;
pub mod fields;
pub mod location;
pub mod pagination;
pub mod plan;

pub use common::*;
pub use device::*;
pub use fields::*;
pub use location::*;
pub use pagination::*;
pub use plan::*;
