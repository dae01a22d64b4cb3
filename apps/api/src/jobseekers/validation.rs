use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::ValidateEmail;

use crate::models::jobseeker::DEFAULT_STATUS;
use crate::models::{Gender, JobseekerPatch, NewJobseeker};
use crate::resumes::StoredResume;

pub const MIN_AGE: i32 = 18;
pub const MAX_AGE: i32 = 65;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Required,
    InvalidValue,
}

/// One violated rule on one field. `field` is the camelCase wire name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub kind: ViolationKind,
    pub message: String,
}

/// Every violation found in a submission, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    fn required(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldViolation {
            field,
            kind: ViolationKind::Required,
            message: message.into(),
        });
    }

    fn invalid(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldViolation {
            field,
            kind: ViolationKind::InvalidValue,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
impl ValidationErrors {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// The text fields of a registration after validation and trimming.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationForm {
    pub full_name: String,
    pub contact_number: String,
    pub email: String,
    pub gender: Gender,
    pub age: i32,
    pub skill: String,
    pub experience: String,
    pub location: String,
    pub status: String,
}

impl RegistrationForm {
    pub fn into_new_jobseeker(
        self,
        resume: StoredResume,
        created_at: DateTime<Utc>,
    ) -> NewJobseeker {
        NewJobseeker {
            full_name: self.full_name,
            contact_number: self.contact_number,
            email: self.email,
            gender: self.gender,
            age: self.age,
            skill: self.skill,
            experience: self.experience,
            location: self.location,
            resume_file_name: resume.file_name,
            resume_file_path: resume.path,
            status: self.status,
            created_at,
        }
    }
}

/// Validates a raw multipart submission.
///
/// All violations are collected before returning. Keys outside the known
/// field set are ignored.
pub fn validate_submission(
    raw: &HashMap<String, String>,
) -> Result<RegistrationForm, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let get = |key: &str| raw.get(key).map(String::as_str);

    let full_name = check_full_name(&mut errors, get("fullName"));
    let contact_number = check_contact_number(&mut errors, get("contactNumber"));
    let email = check_email(&mut errors, get("email"));
    let gender = check_gender(&mut errors, get("gender"));
    let age = check_age_text(&mut errors, get("age"));
    let skill = check_skill(&mut errors, get("skill"));
    let experience = check_experience(&mut errors, get("experience"));
    let location = check_location(&mut errors, get("location"));
    let status = get("status")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_STATUS)
        .to_string();

    match (
        full_name,
        contact_number,
        email,
        gender,
        age,
        skill,
        experience,
        location,
    ) {
        (
            Some(full_name),
            Some(contact_number),
            Some(email),
            Some(gender),
            Some(age),
            Some(skill),
            Some(experience),
            Some(location),
        ) if errors.is_empty() => Ok(RegistrationForm {
            full_name,
            contact_number,
            email,
            gender,
            age,
            skill,
            experience,
            location,
            status,
        }),
        _ => Err(errors),
    }
}

/// Validates the fields a partial update supplies and returns the patch
/// with trimmed values. Absent fields are not checked.
pub fn validate_patch(patch: JobseekerPatch) -> Result<JobseekerPatch, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let normalized = JobseekerPatch {
        full_name: patch
            .full_name
            .as_deref()
            .and_then(|v| check_full_name(&mut errors, Some(v))),
        contact_number: patch
            .contact_number
            .as_deref()
            .and_then(|v| check_contact_number(&mut errors, Some(v))),
        email: patch
            .email
            .as_deref()
            .and_then(|v| check_email(&mut errors, Some(v))),
        gender: patch
            .gender
            .as_deref()
            .and_then(|v| check_gender(&mut errors, Some(v)))
            .map(|g| g.as_str().to_string()),
        age: patch.age.and_then(|v| check_age(&mut errors, v)),
        skill: patch
            .skill
            .as_deref()
            .and_then(|v| check_skill(&mut errors, Some(v))),
        experience: patch
            .experience
            .as_deref()
            .and_then(|v| check_experience(&mut errors, Some(v))),
        location: patch
            .location
            .as_deref()
            .and_then(|v| check_location(&mut errors, Some(v))),
        status: match patch.status.as_deref().map(str::trim) {
            Some("") => {
                errors.required("status", "Status is required");
                None
            }
            other => other.map(String::from),
        },
    };

    if errors.is_empty() {
        Ok(normalized)
    } else {
        Err(errors)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn check_min_chars(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
    min: usize,
    required_msg: &str,
    short_msg: &str,
) -> Option<String> {
    let Some(value) = present(value) else {
        errors.required(field, required_msg);
        return None;
    };
    if value.chars().count() < min {
        errors.invalid(field, short_msg);
        return None;
    }
    Some(value.to_string())
}

fn check_full_name(errors: &mut ValidationErrors, value: Option<&str>) -> Option<String> {
    check_min_chars(
        errors,
        "fullName",
        value,
        2,
        "Full name is required",
        "Full name must be at least 2 characters",
    )
}

fn check_contact_number(errors: &mut ValidationErrors, value: Option<&str>) -> Option<String> {
    check_min_chars(
        errors,
        "contactNumber",
        value,
        10,
        "Contact number is required",
        "Contact number must be at least 10 characters",
    )
}

fn check_location(errors: &mut ValidationErrors, value: Option<&str>) -> Option<String> {
    check_min_chars(
        errors,
        "location",
        value,
        2,
        "Preferred job location is required",
        "Preferred job location must be at least 2 characters",
    )
}

fn check_skill(errors: &mut ValidationErrors, value: Option<&str>) -> Option<String> {
    check_min_chars(
        errors,
        "skill",
        value,
        1,
        "Skill/Trade is required",
        "Skill/Trade is required",
    )
}

fn check_experience(errors: &mut ValidationErrors, value: Option<&str>) -> Option<String> {
    check_min_chars(
        errors,
        "experience",
        value,
        1,
        "Years of experience is required",
        "Years of experience is required",
    )
}

fn check_email(errors: &mut ValidationErrors, value: Option<&str>) -> Option<String> {
    let Some(value) = present(value) else {
        errors.required("email", "Email is required");
        return None;
    };
    if !value.validate_email() {
        errors.invalid("email", "Invalid email format");
        return None;
    }
    Some(value.to_string())
}

fn check_gender(errors: &mut ValidationErrors, value: Option<&str>) -> Option<Gender> {
    let Some(value) = present(value) else {
        errors.required("gender", "Gender is required");
        return None;
    };
    let gender = Gender::parse(value);
    if gender.is_none() {
        errors.invalid(
            "gender",
            "Gender must be one of: male, female, other, prefer-not-to-say",
        );
    }
    gender
}

fn check_age_text(errors: &mut ValidationErrors, value: Option<&str>) -> Option<i32> {
    let Some(value) = present(value) else {
        errors.required("age", "Age is required");
        return None;
    };
    match value.parse::<i32>() {
        Ok(age) => check_age(errors, age),
        Err(_) => {
            errors.invalid("age", "Age must be a whole number");
            None
        }
    }
}

fn check_age(errors: &mut ValidationErrors, age: i32) -> Option<i32> {
    if age < MIN_AGE {
        errors.invalid("age", format!("Age must be at least {MIN_AGE}"));
        None
    } else if age > MAX_AGE {
        errors.invalid("age", format!("Age must be at most {MAX_AGE}"));
        None
    } else {
        Some(age)
    }
}
