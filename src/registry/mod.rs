//! In-memory pool registry and its refresh driver

pub mod store;
pub mod sync;

pub use store::*;
pub use sync::*;
