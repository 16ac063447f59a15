use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The columns requested from the diagnostic table, in request order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    MilestoneLink,
    IndustryOfInterest,
    DemographicCode,
    EnergyStyleScore,
    EnergyStyleSummary,
    PredictabilityScore,
    PredictabilitySummary,
    SalaryExpectationsSummary,
    ExperienceLink,
    GpaLink,
    UserProfile,
    GraduationDate,
    College,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::Name,
        Field::MilestoneLink,
        Field::IndustryOfInterest,
        Field::DemographicCode,
        Field::EnergyStyleScore,
        Field::EnergyStyleSummary,
        Field::PredictabilityScore,
        Field::PredictabilitySummary,
        Field::SalaryExpectationsSummary,
        Field::ExperienceLink,
        Field::GpaLink,
        Field::UserProfile,
        Field::GraduationDate,
        Field::College,
    ];

    /// Lookup-style columns whose values arrive as one-element lists.
    pub const LOOKUPS: [Field; 7] = [
        Field::GpaLink,
        Field::MilestoneLink,
        Field::DemographicCode,
        Field::IndustryOfInterest,
        Field::UserProfile,
        Field::College,
        Field::GraduationDate,
    ];

    /// Column name as it appears in the remote schema.
    pub fn column_name(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::MilestoneLink => "Milestone Link",
            Field::IndustryOfInterest => "Industry of Interest",
            Field::DemographicCode => "A4",
            Field::EnergyStyleScore => "Energy Style Score",
            Field::EnergyStyleSummary => "Energy Style Summary",
            Field::PredictabilityScore => "Predictability Score",
            Field::PredictabilitySummary => "Predictability Preference Summary",
            Field::SalaryExpectationsSummary => "Salary Expectations Summary",
            Field::ExperienceLink => "A26 Experience Link",
            Field::GpaLink => "A21 GPA Link",
            Field::UserProfile => "User Profile",
            Field::GraduationDate => "Graduation Date",
            Field::College => "College/University",
        }
    }

    pub fn is_lookup(self) -> bool {
        Self::LOOKUPS.contains(&self)
    }
}

/// One record as returned by the table service.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(rename = "createdTime")]
    pub created_time: DateTime<Utc>,
    #[serde(default = "empty_fields")]
    pub fields: serde_json::Value,
}

fn empty_fields() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Absent,
    Scalar(String),
    Sequence(Vec<String>),
}

static ABSENT: Cell = Cell::Absent;

impl Cell {
    /// Display label, or `None` when the value is absent.
    pub fn label(&self) -> Option<String> {
        match self {
            Cell::Absent => None,
            Cell::Scalar(value) => Some(value.clone()),
            Cell::Sequence(values) => Some(values.join(", ")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FellowRow {
    pub cells: BTreeMap<Field, Cell>,
}

impl FellowRow {
    pub fn get(&self, field: Field) -> &Cell {
        self.cells.get(&field).unwrap_or(&ABSENT)
    }
}

/// Tidy snapshot of the diagnostic table: one row per fellow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FellowTable {
    pub fields: Vec<Field>,
    pub rows: Vec<FellowRow>,
    pub fetched_at: DateTime<Utc>,
}

impl FellowTable {
    /// Copy of the table header with a different row set.
    pub fn with_rows(&self, rows: Vec<FellowRow>) -> FellowTable {
        FellowTable {
            fields: self.fields.clone(),
            rows,
            fetched_at: self.fetched_at,
        }
    }
}

/// Parameters of one remote read; also the snapshot cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchQuery {
    pub base_id: String,
    pub table: String,
    pub view: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow {
    pub label: String,
    pub count: usize,
}

impl CountRow {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}
