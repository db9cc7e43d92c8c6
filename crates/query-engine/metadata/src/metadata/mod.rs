//! Metadata information regarding the statements a collection cycle runs.

pub mod statements;

// re-export without modules
pub use statements::*;
