//! Values read from the database and values written to the sink.

use std::collections::BTreeMap;

/// A non-null column value, as scanned by the database driver.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(String),
    Bytes(Vec<u8>),
    Integer(i64),
    Float(f64),
    /// An arbitrary-precision number rendered as a decimal string.
    Decimal(String),
    Boolean(bool),
    /// A value of a type the converter does not know about, with the driver's name for the type.
    Unsupported(String),
}

/// A numeric metric value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
}

/// Low-cardinality string labels, keyed by lower-cased column name.
pub type Tags = BTreeMap<String, String>;

/// Numeric values, keyed by lower-cased column name.
pub type Fields = BTreeMap<String, FieldValue>;
