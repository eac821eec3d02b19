//! CLI command implementations.

pub mod keygen;
pub mod seal;
pub mod send;
