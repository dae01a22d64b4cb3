use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Default status given to every new registration.
pub const DEFAULT_STATUS: &str = "active";

/// Filter value that means "no constraint" for any listing option.
const ANY: &str = "all";

/// A persisted candidate profile.
///
/// `resume_file_path` is a server-side location and is never serialized;
/// clients reach the binary only through the resume download endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Jobseeker {
    pub id: i64,
    pub full_name: String,
    pub contact_number: String,
    pub email: String,
    pub gender: String,
    pub age: i32,
    pub skill: String,
    pub experience: String,
    pub location: String,
    pub resume_file_name: String,
    #[serde(skip_serializing)]
    pub resume_file_path: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

impl Gender {
    pub const ALL: [Gender; 4] = [
        Gender::Male,
        Gender::Female,
        Gender::Other,
        Gender::PreferNotToSay,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::PreferNotToSay => "prefer-not-to-say",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
            Gender::PreferNotToSay => "Prefer not to say",
        }
    }

    pub fn parse(value: &str) -> Option<Gender> {
        Gender::ALL.into_iter().find(|g| g.as_str() == value)
    }
}

/// A validated registration, ready to insert.
///
/// Only constructed from a validated form plus a resume that is already on
/// disk, so a record can never be created without its file.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJobseeker {
    pub full_name: String,
    pub contact_number: String,
    pub email: String,
    pub gender: Gender,
    pub age: i32,
    pub skill: String,
    pub experience: String,
    pub location: String,
    pub resume_file_name: String,
    pub resume_file_path: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl NewJobseeker {
    pub fn into_record(self, id: i64) -> Jobseeker {
        Jobseeker {
            id,
            full_name: self.full_name,
            contact_number: self.contact_number,
            email: self.email,
            gender: self.gender.as_str().to_string(),
            age: self.age,
            skill: self.skill,
            experience: self.experience,
            location: self.location,
            resume_file_name: self.resume_file_name,
            resume_file_path: self.resume_file_path,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Partial update body for `PUT /api/jobseekers/:id`.
///
/// Identity, creation time and the resume columns are not patchable; any
/// such keys in the request body are ignored along with unknown fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobseekerPatch {
    pub full_name: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub skill: Option<String>,
    pub experience: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}

impl JobseekerPatch {
    pub fn is_empty(&self) -> bool {
        *self == JobseekerPatch::default()
    }

    /// Merges the supplied fields into `record`, leaving the rest untouched.
    pub fn apply_to(&self, record: &mut Jobseeker) {
        fn merge(slot: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                slot.clone_from(v);
            }
        }

        merge(&mut record.full_name, &self.full_name);
        merge(&mut record.contact_number, &self.contact_number);
        merge(&mut record.email, &self.email);
        merge(&mut record.gender, &self.gender);
        merge(&mut record.skill, &self.skill);
        merge(&mut record.experience, &self.experience);
        merge(&mut record.location, &self.location);
        merge(&mut record.status, &self.status);
        if let Some(age) = self.age {
            record.age = age;
        }
    }
}

/// Listing filter taken from the query string.
///
/// Empty or `"all"` values impose no constraint; everything supplied is
/// combined with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobseekerFilter {
    pub search: Option<String>,
    pub skill: Option<String>,
    pub experience: Option<String>,
    pub location: Option<String>,
}

impl JobseekerFilter {
    pub fn search(&self) -> Option<&str> {
        active(&self.search)
    }

    pub fn skill(&self) -> Option<&str> {
        active(&self.skill)
    }

    pub fn experience(&self) -> Option<&str> {
        active(&self.experience)
    }

    pub fn location(&self) -> Option<&str> {
        active(&self.location)
    }

    /// In-process evaluation of the filter, used by the memory store.
    pub fn matches(&self, record: &Jobseeker) -> bool {
        let search_ok = self.search().map_or(true, |term| {
            contains_folded(&record.full_name, term) || contains_folded(&record.email, term)
        });
        let skill_ok = self.skill().map_or(true, |s| record.skill == s);
        let experience_ok = self.experience().map_or(true, |e| record.experience == e);
        let location_ok = self
            .location()
            .map_or(true, |l| contains_folded(&record.location, l));

        search_ok && skill_ok && experience_ok && location_ok
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ANY))
}

/// Unicode case folding used for search and duplicate matching. The SQL
/// stores persist folded copies of the searchable columns, so every backend
/// compares the same strings.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    fold_case(haystack).contains(&fold_case(needle))
}
