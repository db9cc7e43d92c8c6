//! PostgreSQL implementation of the database traits.
//!
//! A single `tokio_postgres::Client` pipelines concurrent queries over one socket, so every
//! statement task of a cycle can query the same connection.

use std::error::Error as StdError;

use async_trait::async_trait;
use futures::StreamExt;
use pg_bigdecimal::PgNumeric;
use sqlgather_configuration::ConnectionIdentity;
use tokio::task::JoinHandle;
use tokio_postgres::types::{FromSql, Type};
use tokio_postgres::{NoTls, Row};

use crate::database::{Connect, Connection, DatabaseError, QueryRows, ScannedRow};
use crate::value::ColumnValue;

pub const APPLICATION_NAME: &str = "sqlgather";

/// Connects to PostgreSQL using the connection identity.
///
/// The service becomes the database name; the instance is only a label.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

/// Build the driver configuration from the connection identity.
pub fn connection_config(
    identity: &ConnectionIdentity,
) -> Result<tokio_postgres::Config, DatabaseError> {
    let port = identity
        .port
        .parse::<u16>()
        .map_err(|error| DatabaseError::InvalidConnectionParameter {
            parameter: "port".to_string(),
            message: format!("{:?}: {error}", identity.port),
        })?;

    let mut config = tokio_postgres::Config::new();
    config
        .host(identity.host.as_str())
        .port(port)
        .application_name(APPLICATION_NAME);
    if !identity.user.is_empty() {
        config.user(identity.user.as_str());
    }
    if !identity.password.is_empty() {
        config.password(identity.password.as_str());
    }
    if !identity.service.is_empty() {
        config.dbname(identity.service.as_str());
    }
    Ok(config)
}

#[async_trait]
impl Connect for Postgres {
    type Connection = PostgresConnection;

    async fn connect(
        &self,
        identity: &ConnectionIdentity,
    ) -> Result<PostgresConnection, DatabaseError> {
        let config = connection_config(identity)?;
        let (client, connection) = config.connect(NoTls).await?;

        let host = identity.host.clone();
        let driver = tokio::spawn(async move {
            if let Err(error) = connection.await {
                tracing::error!(host = %host, %error, "connection error");
            }
        });

        Ok(PostgresConnection { client, driver })
    }
}

/// An open PostgreSQL connection and the task driving its socket.
pub struct PostgresConnection {
    client: tokio_postgres::Client,
    driver: JoinHandle<()>,
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn query(&self, sql: &str) -> Result<QueryRows, DatabaseError> {
        let statement = self.client.prepare(sql).await?;
        let columns = statement
            .columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect();

        let rows = self
            .client
            .query_raw(&statement, std::iter::empty::<&str>())
            .await?
            .map(|row| row.map_err(DatabaseError::from).and_then(|row| scan_row(&row)))
            .boxed();

        Ok(QueryRows { columns, rows })
    }

    async fn close(self) {
        // the driver task finishes once the last client handle is gone
        drop(self.client);
        if let Err(error) = self.driver.await {
            tracing::warn!(%error, "connection task did not shut down cleanly");
        }
    }
}

/// Scan every column of a row into a [`ColumnValue`].
fn scan_row(row: &Row) -> Result<ScannedRow, DatabaseError> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            scan_value(row, index, column.type_()).map_err(|error| DatabaseError::Decode {
                column: column.name().to_string(),
                message: error.to_string(),
            })
        })
        .collect()
}

fn scan_value(
    row: &Row,
    index: usize,
    ty: &Type,
) -> Result<Option<ColumnValue>, tokio_postgres::Error> {
    let value = match *ty {
        Type::BOOL => row
            .try_get::<_, Option<bool>>(index)?
            .map(ColumnValue::Boolean),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(index)?
            .map(|value| ColumnValue::Integer(value.into())),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(index)?
            .map(|value| ColumnValue::Integer(value.into())),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(index)?
            .map(ColumnValue::Integer),
        Type::OID => row
            .try_get::<_, Option<u32>>(index)?
            .map(|value| ColumnValue::Integer(value.into())),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(index)?
            .map(|value| ColumnValue::Float(value.into())),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(index)?
            .map(ColumnValue::Float),
        Type::NUMERIC => row
            .try_get::<_, Option<PgNumeric>>(index)?
            .and_then(numeric_value),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
            .try_get::<_, Option<String>>(index)?
            .map(ColumnValue::Text),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(index)?
            .map(ColumnValue::Bytes),
        _ => row
            .try_get::<_, Option<Opaque>>(index)?
            .map(|Opaque| ColumnValue::Unsupported(ty.name().to_string())),
    };
    Ok(value)
}

/// A `numeric` cell as a decimal string. `NaN` has no decimal form and is dropped.
fn numeric_value(numeric: PgNumeric) -> Option<ColumnValue> {
    numeric
        .n
        .map(|decimal| ColumnValue::Decimal(decimal.to_string()))
}

/// Accepts any type, for columns whose value is dropped but whose nullness matters.
struct Opaque;

impl<'a> FromSql<'a> for Opaque {
    fn from_sql(_: &Type, _: &'a [u8]) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Ok(Opaque)
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numerics_render_as_decimal_strings() {
        let numeric = PgNumeric {
            n: Some("-12345.678".parse().unwrap()),
        };
        let Some(ColumnValue::Decimal(text)) = numeric_value(numeric) else {
            panic!("expected a decimal");
        };
        assert_eq!(text.parse::<f64>().unwrap(), -12345.678);
    }

    #[test]
    fn nan_numerics_are_dropped() {
        assert_eq!(numeric_value(PgNumeric { n: None }), None);
    }

    #[test]
    fn builds_connection_config_from_identity() {
        let identity = ConnectionIdentity::parse("scott/tiger@db.internal:5433/metrics/primary")
            .unwrap();
        let config = connection_config(&identity).unwrap();

        assert_eq!(config.get_user(), Some("scott"));
        assert_eq!(config.get_password(), Some("tiger".as_bytes()));
        assert_eq!(config.get_dbname(), Some("metrics"));
        assert_eq!(config.get_ports(), &[5433]);
        assert_eq!(config.get_application_name(), Some(APPLICATION_NAME));
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let identity = ConnectionIdentity::parse("scott/tiger@db:abc/metrics/primary").unwrap();
        assert!(matches!(
            connection_config(&identity),
            Err(DatabaseError::InvalidConnectionParameter { .. })
        ));
    }
}
