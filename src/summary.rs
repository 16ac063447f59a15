use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::models::{CountRow, FellowTable, Field};

pub const MILESTONE_ORDER: &[&str] = &[
    "Clarity",
    "Alignment",
    "Search Strategy",
    "Interviewing & Advancing",
];

pub const ENERGY_ORDER: &[&str] = &[
    "Strong Introvert",
    "Slight Introvert",
    "Ambivert",
    "Slight Extrovert",
    "Strong Extrovert",
];

pub const PREDICTABILITY_ORDER: &[&str] = &["Structured", "Any Work Environment", "Flexible"];

pub const SALARY_ORDER: &[&str] = &["Salary Unsure", "40-60K", "60-80K", "80-100K", "100K+"];

pub const GPA_ORDER: &[&str] = &[
    "Less than 2.00",
    "Between 2.00 and 2.49",
    "Between 2.50 and 2.79",
    "Between 2.80 and 2.99",
    "Between 3.00 and 3.49",
    "Between 3.50 and 3.79",
    "3.80 or higher",
];

/// How the categories of one chart are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryOrder {
    /// Rank by position in the table; labels missing from it follow, in
    /// first-seen order.
    Fixed(&'static [&'static str]),
    Alphabetical,
    /// Most common first; ties keep first-seen order.
    ByCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Milestone,
    Industry,
    EnergyStyle,
    Predictability,
    UserProfile,
    Salary,
    Gpa,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Milestone,
        Dimension::Industry,
        Dimension::EnergyStyle,
        Dimension::Predictability,
        Dimension::UserProfile,
        Dimension::Salary,
        Dimension::Gpa,
    ];

    /// Position of this dimension in [`Dimension::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn field(self) -> Field {
        match self {
            Dimension::Milestone => Field::MilestoneLink,
            Dimension::Industry => Field::IndustryOfInterest,
            Dimension::EnergyStyle => Field::EnergyStyleSummary,
            Dimension::Predictability => Field::PredictabilitySummary,
            Dimension::UserProfile => Field::UserProfile,
            Dimension::Salary => Field::SalaryExpectationsSummary,
            Dimension::Gpa => Field::GpaLink,
        }
    }

    pub fn order(self) -> CategoryOrder {
        match self {
            Dimension::Milestone => CategoryOrder::Fixed(MILESTONE_ORDER),
            Dimension::Industry => CategoryOrder::Alphabetical,
            Dimension::EnergyStyle => CategoryOrder::Fixed(ENERGY_ORDER),
            Dimension::Predictability => CategoryOrder::Fixed(PREDICTABILITY_ORDER),
            Dimension::UserProfile => CategoryOrder::ByCount,
            Dimension::Salary => CategoryOrder::Fixed(SALARY_ORDER),
            Dimension::Gpa => CategoryOrder::Fixed(GPA_ORDER),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Dimension::Milestone => "Milestone Distribution",
            Dimension::Industry => "Industry Interest Distribution",
            Dimension::EnergyStyle => "Energy Style Summary",
            Dimension::Predictability => "Predictability Preference Summary",
            Dimension::UserProfile => "User Profile Distribution",
            Dimension::Salary => "Salary Expectations",
            Dimension::Gpa => "GPA Ranges",
        }
    }

    pub fn axis_label(self) -> &'static str {
        match self {
            Dimension::Milestone => "Milestone Score",
            Dimension::Industry => "Industry of Interest",
            Dimension::EnergyStyle => "Energy Label",
            Dimension::Predictability => "Predictability Label",
            Dimension::UserProfile => "User Profile",
            Dimension::Salary => "Salary Expectation",
            Dimension::Gpa => "GPA Range",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionSummary {
    pub dimension: Dimension,
    pub title: &'static str,
    pub rows: Vec<CountRow>,
}

/// Counts the non-blank values of `field` and orders them per `order`.
pub fn summarize(table: &FellowTable, field: Field, order: CategoryOrder) -> Vec<CountRow> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for label in table.rows.iter().filter_map(|row| row.get(field).label()) {
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut rows: Vec<CountRow> = counts
        .into_iter()
        .map(|(label, count)| CountRow::new(label, count))
        .collect();

    match order {
        CategoryOrder::Fixed(labels) => {
            let rank: HashMap<&str, usize> = labels
                .iter()
                .enumerate()
                .map(|(position, label)| (*label, position))
                .collect();
            rows.sort_by_key(|row| rank.get(row.label.as_str()).copied().unwrap_or(usize::MAX));
        }
        CategoryOrder::Alphabetical => rows.sort_by(|a, b| a.label.cmp(&b.label)),
        CategoryOrder::ByCount => rows.sort_by(|a, b| b.count.cmp(&a.count)),
    }

    rows
}

pub fn summarize_dimension(table: &FellowTable, dimension: Dimension) -> DimensionSummary {
    DimensionSummary {
        dimension,
        title: dimension.title(),
        rows: summarize(table, dimension.field(), dimension.order()),
    }
}

/// One summary per dimension, indexed by [`Dimension::index`].
pub fn summarize_all(table: &FellowTable) -> [DimensionSummary; 7] {
    Dimension::ALL.map(|dimension| summarize_dimension(table, dimension))
}
