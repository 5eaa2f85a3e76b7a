//! Error types shared by the registry, calculators and collaborators

pub mod pool_error;

pub use pool_error::*;
