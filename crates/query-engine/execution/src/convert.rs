//! Convert a result row into tags and fields.
//!
//! Strings, bytes and booleans become tags, numbers become fields. Every row is also tagged with
//! the non-empty parts of the connection identity.

use sqlgather_configuration::ConnectionIdentity;
use thiserror::Error;

use crate::accumulator::{HOST_TAG, INSTANCE_TAG, PORT_TAG, SERVICE_TAG};
use crate::value::{ColumnValue, FieldValue, Fields, Tags};

/// Tag value used for empty strings.
pub const EMPTY_STRING_TAG: &str = "NULL";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("row has {values} values but the statement returned {columns} columns")]
    ColumnCountMismatch { columns: usize, values: usize },
}

/// Classify each value of a row as a tag or a field.
///
/// `values` lines up with `columns`; `None` is SQL NULL and is skipped.
pub fn convert_row(
    columns: &[String],
    values: Vec<Option<ColumnValue>>,
    identity: &ConnectionIdentity,
) -> Result<(Tags, Fields), ConvertError> {
    if columns.len() != values.len() {
        return Err(ConvertError::ColumnCountMismatch {
            columns: columns.len(),
            values: values.len(),
        });
    }

    let mut tags = Tags::new();
    let mut fields = Fields::new();

    for (column, value) in columns.iter().zip(values) {
        let Some(value) = value else {
            continue;
        };

        let key = column.to_lowercase();
        match value {
            ColumnValue::Text(text) if text.is_empty() => {
                tags.insert(key, EMPTY_STRING_TAG.to_string());
            }
            ColumnValue::Text(text) => {
                tags.insert(key, text);
            }
            // invalid UTF-8 is replaced, not rejected
            ColumnValue::Bytes(bytes) => {
                tags.insert(key, String::from_utf8_lossy(&bytes).into_owned());
            }
            ColumnValue::Integer(integer) => {
                fields.insert(key, FieldValue::Integer(integer));
            }
            ColumnValue::Float(float) => {
                fields.insert(key, FieldValue::Float(float));
            }
            // a value that does not parse is dropped
            ColumnValue::Decimal(decimal) => {
                if let Ok(float) = decimal.parse::<f64>() {
                    fields.insert(key, FieldValue::Float(float));
                }
            }
            ColumnValue::Boolean(boolean) => {
                tags.insert(key, if boolean { "1" } else { "0" }.to_string());
            }
            ColumnValue::Unsupported(type_name) => {
                tracing::info!(column = %key, column_type = %type_name, "column type not supported");
            }
        }
    }

    if !columns.is_empty() {
        add_identity_tags(&mut tags, identity);
    }

    Ok((tags, fields))
}

fn add_identity_tags(tags: &mut Tags, identity: &ConnectionIdentity) {
    for (tag, value) in [
        (HOST_TAG, &identity.host),
        (PORT_TAG, &identity.port),
        (SERVICE_TAG, &identity.service),
        (INSTANCE_TAG, &identity.instance),
    ] {
        if !value.is_empty() {
            tags.insert(tag.to_string(), value.clone());
        }
    }
}
