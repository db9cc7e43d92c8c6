//! Named SQL statements collected from statement definition files.

pub mod metadata;
