use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use crate::airtable::RecordSource;
use crate::error::DashboardError;
use crate::models::{Cell, FellowRow, FellowTable, FetchQuery, Field, RawRecord};

/// Fetch, flatten, and normalize: the full uncached pipeline behind one
/// snapshot.
pub async fn load_fellows(
    source: &RecordSource,
    query: &FetchQuery,
) -> Result<FellowTable, DashboardError> {
    let records = source.fetch(query).await?;
    let newest = records.iter().map(|record| record.created_time).max();
    let table = flatten(&records, &query.fields)?;
    let table = normalize_lookups(table)?;
    info!(rows = table.rows.len(), newest_record = ?newest, "fellow table ready");
    Ok(table)
}

/// Expands each record's field mapping into one cell per requested field.
/// Record id and creation time are not carried over.
pub fn flatten(records: &[RawRecord], fields: &[Field]) -> Result<FellowTable, DashboardError> {
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let mapping = record
            .fields
            .as_object()
            .ok_or_else(|| DashboardError::MalformedRecord {
                record_id: record.id.clone(),
                found: json_kind(&record.fields).to_string(),
            })?;

        let mut row = FellowRow::default();
        for field in fields {
            let cell = mapping
                .get(field.column_name())
                .map(cell_from_json)
                .unwrap_or(Cell::Absent);
            row.cells.insert(*field, cell);
        }
        rows.push(row);
    }

    Ok(FellowTable {
        fields: fields.to_vec(),
        rows,
        fetched_at: Utc::now(),
    })
}

/// Unwraps one-element lookup lists in every lookup column of the table.
pub fn normalize_lookups(mut table: FellowTable) -> Result<FellowTable, DashboardError> {
    let lookups: Vec<Field> = table
        .fields
        .iter()
        .copied()
        .filter(|field| field.is_lookup())
        .collect();

    for field in lookups {
        for (index, row) in table.rows.iter_mut().enumerate() {
            let Some(cell) = row.cells.get_mut(&field) else {
                continue;
            };
            if let Cell::Sequence(values) = cell {
                if values.len() != 1 {
                    warn!(
                        column = field.column_name(),
                        row = index,
                        len = values.len(),
                        "lookup value has unexpected shape"
                    );
                    return Err(DashboardError::UnexpectedShape {
                        column: field.column_name(),
                        row: index,
                        len: values.len(),
                    });
                }
                let value = values.remove(0);
                *cell = Cell::Scalar(value);
            }
        }
    }

    Ok(table)
}

fn cell_from_json(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Absent,
        Value::Array(items) => Cell::Sequence(items.iter().map(scalar_text).collect()),
        other => Cell::Scalar(scalar_text(other)),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, fields: Value) -> RawRecord {
        serde_json::from_value(json!({
            "id": id,
            "createdTime": "2022-09-01T12:00:00.000Z",
            "fields": fields,
        }))
        .unwrap()
    }

    fn sample_records() -> Vec<RawRecord> {
        vec![
            record(
                "rec1",
                json!({
                    "Name": "Avery Lee",
                    "Milestone Link": ["Clarity"],
                    "College/University": ["Hunter College"],
                    "Graduation Date": ["2023"],
                    "Energy Style Score": 4,
                    "A26 Experience Link": ["Internship", "Research"],
                }),
            ),
            record("rec2", json!({"Name": "Jules Moreno", "Milestone Link": null})),
            record("rec3", json!({})),
        ]
    }

    #[test]
    fn flatten_keeps_one_row_per_record() {
        let records = sample_records();
        let table = flatten(&records, &Field::ALL).unwrap();
        assert_eq!(table.rows.len(), records.len());
        assert_eq!(table.fields, Field::ALL.to_vec());
        assert!(table.rows.iter().all(|row| row.cells.len() == Field::ALL.len()));
    }

    #[test]
    fn flatten_marks_missing_fields_absent() {
        let table = flatten(&sample_records(), &Field::ALL).unwrap();
        assert_eq!(table.rows[1].get(Field::MilestoneLink), &Cell::Absent);
        assert_eq!(table.rows[2].get(Field::Name), &Cell::Absent);
        assert_eq!(
            table.rows[0].get(Field::EnergyStyleScore),
            &Cell::Scalar("4".to_string())
        );
    }

    #[test]
    fn flatten_ignores_unrequested_fields() {
        let table = flatten(&sample_records(), &[Field::Name]).unwrap();
        assert_eq!(table.rows[0].cells.len(), 1);
        assert_eq!(table.rows[0].get(Field::College), &Cell::Absent);
    }

    #[test]
    fn flatten_rejects_non_object_fields() {
        let records = vec![record("rec9", json!(["not", "a", "map"]))];
        let err = flatten(&records, &Field::ALL).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::MalformedRecord { ref record_id, .. } if record_id == "rec9"
        ));
    }

    #[test]
    fn normalize_leaves_no_sequences_in_lookup_columns() {
        let table = flatten(&sample_records(), &Field::ALL).unwrap();
        let table = normalize_lookups(table).unwrap();
        for field in Field::LOOKUPS {
            assert!(table
                .rows
                .iter()
                .all(|row| !matches!(row.get(field), Cell::Sequence(_))));
        }
        assert_eq!(
            table.rows[0].get(Field::College),
            &Cell::Scalar("Hunter College".to_string())
        );
        assert_eq!(table.rows[1].get(Field::MilestoneLink), &Cell::Absent);
    }

    #[test]
    fn normalize_skips_non_lookup_columns() {
        let table = normalize_lookups(flatten(&sample_records(), &Field::ALL).unwrap()).unwrap();
        assert_eq!(
            table.rows[0].get(Field::ExperienceLink),
            &Cell::Sequence(vec!["Internship".to_string(), "Research".to_string()])
        );
    }

    #[test]
    fn normalize_rejects_multi_element_lookups() {
        let records = vec![
            record("rec1", json!({"User Profile": ["Explorer"]})),
            record("rec2", json!({"User Profile": ["Explorer", "Builder"]})),
        ];
        let err = normalize_lookups(flatten(&records, &Field::ALL).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::UnexpectedShape { column: "User Profile", row: 1, len: 2 }
        ));
    }

    #[test]
    fn normalize_rejects_empty_lookups() {
        let records = vec![record("rec1", json!({"A21 GPA Link": []}))];
        let err = normalize_lookups(flatten(&records, &Field::ALL).unwrap()).unwrap_err();
        assert!(matches!(err, DashboardError::UnexpectedShape { len: 0, .. }));
    }

    #[tokio::test]
    async fn load_fellows_reads_snapshot_file() {
        let path = std::env::temp_dir().join(format!("fellow-snapshot-{}.json", std::process::id()));
        let body = json!({"records": [
            {"id": "rec1", "createdTime": "2022-09-01T12:00:00.000Z", "fields": {"Milestone Link": ["Alignment"]}}
        ]});
        std::fs::write(&path, body.to_string()).unwrap();

        let query = FetchQuery {
            base_id: "appBase".to_string(),
            table: "Fellows".to_string(),
            view: "Grid".to_string(),
            fields: Field::ALL.to_vec(),
        };
        let table = load_fellows(&RecordSource::Snapshot(path.clone()), &query)
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(
            table.rows[0].get(Field::MilestoneLink),
            &Cell::Scalar("Alignment".to_string())
        );
    }
}
