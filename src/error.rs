use thiserror::Error;

/// Failures that abort a dashboard render.
#[derive(Debug, Clone, Error)]
pub enum DashboardError {
    /// The table service rejected a field, view, or table name.
    #[error("remote schema rejected the query: {0}")]
    RemoteSchema(String),
    /// Network, auth, rate limit, or server-side failure.
    #[error("remote table service unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("record {record_id} is malformed: fields must be an object, found {found}")]
    MalformedRecord { record_id: String, found: String },
    #[error("column `{column}` row {row}: expected a single-element lookup, found {len} elements")]
    UnexpectedShape {
        column: &'static str,
        row: usize,
        len: usize,
    },
    #[error("chart rendering failed: {0}")]
    ChartRender(String),
}
