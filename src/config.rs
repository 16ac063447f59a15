use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::airtable::{AirtableClient, RecordSource, DEFAULT_API_URL};
use crate::models::{FetchQuery, Field};

pub const DEFAULT_BASE_ID: &str = "app1MKM5YW5GC6rww";
pub const DEFAULT_TABLE: &str = "Fellows x Diagnostic 1.5";
pub const DEFAULT_VIEW: &str = "OMN StreamlitView";
pub const DEFAULT_TITLE: &str = "Fellowship Diagnostic Dashboard";

/// Where the diagnostic records are read from.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    #[arg(long, env = "AIRTABLE_BASE_ID", default_value = DEFAULT_BASE_ID, global = true)]
    pub base_id: String,
    #[arg(long, env = "AIRTABLE_TABLE", default_value = DEFAULT_TABLE, global = true)]
    pub table: String,
    #[arg(long, env = "AIRTABLE_VIEW", default_value = DEFAULT_VIEW, global = true)]
    pub view: String,
    #[arg(long, env = "AIRTABLE_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,
    /// Read records from a saved JSON response instead of the live service
    #[arg(long, global = true)]
    pub records: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_TITLE, global = true)]
    pub title: String,
}

impl SourceArgs {
    pub fn fetch_query(&self) -> FetchQuery {
        FetchQuery {
            base_id: self.base_id.clone(),
            table: self.table.clone(),
            view: self.view.clone(),
            fields: Field::ALL.to_vec(),
        }
    }

    /// The credential is only required when reading from the live service.
    pub fn record_source(&self) -> anyhow::Result<RecordSource> {
        if let Some(path) = &self.records {
            return Ok(RecordSource::Snapshot(path.clone()));
        }
        let api_key = std::env::var("AIRTABLE_API_KEY")
            .context("AIRTABLE_API_KEY must be set to read from the live table service")?;
        let client = AirtableClient::new(&self.api_url, api_key)?;
        Ok(RecordSource::Remote(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(records: Option<PathBuf>) -> SourceArgs {
        SourceArgs {
            base_id: DEFAULT_BASE_ID.to_string(),
            table: DEFAULT_TABLE.to_string(),
            view: DEFAULT_VIEW.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            records,
            title: DEFAULT_TITLE.to_string(),
        }
    }

    #[test]
    fn query_requests_every_field() {
        let query = args(None).fetch_query();
        assert_eq!(query.view, "OMN StreamlitView");
        assert_eq!(query.fields.len(), 14);
        assert_eq!(query.fields[0], Field::Name);
    }

    #[test]
    fn records_path_skips_credentials() {
        let source = args(Some(PathBuf::from("fellows.json"))).record_source().unwrap();
        assert!(matches!(source, RecordSource::Snapshot(ref p) if p == &PathBuf::from("fellows.json")));
    }
}
