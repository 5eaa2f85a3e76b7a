//! Join/exit call construction and submission

pub mod calls;
pub mod submitter;

pub use calls::*;
pub use submitter::*;
