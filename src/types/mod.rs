//! Core data types and structures

pub mod pools;
pub mod transactions;

pub use pools::*;
pub use transactions::*;
