use std::io::Write;

use crate::models::FellowTable;

/// Writes the table as CSV with the remote column names as the header.
/// Blank cells are written as empty strings.
pub fn write_csv<W: Write>(table: &FellowTable, writer: W) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.fields.iter().map(|field| field.column_name()))?;

    for row in &table.rows {
        writer.write_record(
            table
                .fields
                .iter()
                .map(|field| row.get(*field).label().unwrap_or_default()),
        )?;
    }

    writer.flush()?;
    Ok(table.rows.len())
}

pub fn export_csv(table: &FellowTable, path: &std::path::Path) -> anyhow::Result<usize> {
    let file = std::fs::File::create(path)?;
    write_csv(table, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, FellowRow, Field};
    use chrono::Utc;

    #[test]
    fn writes_header_and_rows() {
        let mut row = FellowRow::default();
        row.cells.insert(Field::Name, Cell::Scalar("Avery Lee".to_string()));
        row.cells.insert(Field::College, Cell::Absent);
        row.cells.insert(
            Field::ExperienceLink,
            Cell::Sequence(vec!["Internship".to_string(), "Research".to_string()]),
        );
        let table = FellowTable {
            fields: vec![Field::Name, Field::College, Field::ExperienceLink],
            rows: vec![row],
            fetched_at: Utc::now(),
        };

        let mut buffer = Vec::new();
        let written = write_csv(&table, &mut buffer).unwrap();
        assert_eq!(written, 1);
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "Name,College/University,A26 Experience Link\nAvery Lee,,\"Internship, Research\"\n"
        );
    }
}
