//! The sink that receives every converted row.

use crate::value::{Fields, Tags};

/// Measurement name every row is emitted under.
pub const MEASUREMENT: &str = "ora";

/// Tag holding the name of the statement that produced the row.
pub const FUNC_TAG: &str = "func";
pub const HOST_TAG: &str = "orahost";
pub const PORT_TAG: &str = "oraport";
pub const SERVICE_TAG: &str = "oraservice";
pub const INSTANCE_TAG: &str = "orainstance";

/// Receives metrics as they are produced. Called concurrently from every statement task.
pub trait Accumulator: Send + Sync {
    fn add_fields(&self, measurement: &str, fields: Fields, tags: Tags);
}
