use axum::Json;
use serde::Serialize;

use crate::models::Gender;

/// Skill labels offered by the registration form. Not enforced server-side.
pub const SKILLS: &[(&str, &str)] = &[
    ("software-developer", "Software Developer"),
    ("web-developer", "Web Developer"),
    ("data-scientist", "Data Scientist"),
    ("ui-ux-designer", "UI/UX Designer"),
    ("project-manager", "Project Manager"),
    ("business-analyst", "Business Analyst"),
    ("digital-marketer", "Digital Marketer"),
    ("accountant", "Accountant"),
    ("hr-specialist", "HR Specialist"),
    ("sales-representative", "Sales Representative"),
];

/// Experience buckets offered by the registration form.
pub const EXPERIENCE: &[(&str, &str)] = &[
    ("0-1", "0-1 years"),
    ("1-3", "1-3 years"),
    ("3-5", "3-5 years"),
    ("5-10", "5-10 years"),
    ("10+", "10+ years"),
];

#[derive(Debug, Serialize)]
pub struct OptionItem {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct OptionCatalog {
    pub skills: Vec<OptionItem>,
    pub experience: Vec<OptionItem>,
    pub gender: Vec<OptionItem>,
}

fn items(pairs: &[(&'static str, &'static str)]) -> Vec<OptionItem> {
    pairs
        .iter()
        .map(|&(value, label)| OptionItem { value, label })
        .collect()
}

pub fn catalog() -> OptionCatalog {
    OptionCatalog {
        skills: items(SKILLS),
        experience: items(EXPERIENCE),
        gender: Gender::ALL
            .into_iter()
            .map(|g| OptionItem {
                value: g.as_str(),
                label: g.label(),
            })
            .collect(),
    }
}

/// GET /api/options
pub async fn handle_options() -> Json<OptionCatalog> {
    Json(catalog())
}
