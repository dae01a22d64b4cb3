use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::{Bytes, BytesMut};
use chrono::{SubsecRound, Utc};
use serde_json::{json, Value};
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::jobseekers::validation::{validate_patch, validate_submission};
use crate::models::{Jobseeker, JobseekerFilter, JobseekerPatch};
use crate::resumes::{attachment_disposition, ResumeError, ResumeStore, PDF_CONTENT_TYPE};
use crate::state::AppState;

/// Multipart field carrying the PDF.
pub const RESUME_FIELD: &str = "resume";

struct UploadedResume {
    file_name: String,
    data: Bytes,
}

struct Registration {
    fields: HashMap<String, String>,
    resume: Option<UploadedResume>,
}

fn jobseeker_not_found() -> AppError {
    AppError::NotFound("Jobseeker not found".to_string())
}

/// A body cut off by the request size limit is an oversized resume.
fn multipart_error(e: MultipartError, resumes: &ResumeStore) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ResumeError::TooLarge {
            limit: resumes.max_bytes(),
        }
        .into()
    } else {
        e.into()
    }
}

/// Splits the multipart body into text fields and the resume upload.
/// The size cap is enforced chunk by chunk.
async fn read_registration(
    multipart: &mut Multipart,
    resumes: &ResumeStore,
) -> Result<Registration, AppError> {
    let mut fields = HashMap::new();
    let mut resume = None;

    let read_err = |e| multipart_error(e, resumes);

    while let Some(mut field) = multipart.next_field().await.map_err(read_err)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == RESUME_FIELD {
            if resume.is_some() {
                return Err(AppError::BadRequest(
                    "Only one resume file may be attached".to_string(),
                ));
            }
            resumes.check_content_type(field.content_type())?;
            let file_name = field.file_name().unwrap_or_default().to_string();

            let mut data = BytesMut::new();
            while let Some(chunk) = field.chunk().await.map_err(read_err)? {
                resumes.check_size(data.len() + chunk.len())?;
                data.extend_from_slice(&chunk);
            }
            if data.is_empty() {
                return Err(AppError::BadRequest("Resume file is empty".to_string()));
            }
            resume = Some(UploadedResume {
                file_name,
                data: data.freeze(),
            });
        } else if field.file_name().is_none() {
            fields.insert(name, field.text().await.map_err(read_err)?);
        }
    }

    Ok(Registration { fields, resume })
}

/// GET /api/jobseekers
pub async fn handle_list(
    State(state): State<AppState>,
    Query(filter): Query<JobseekerFilter>,
) -> Result<Json<Vec<Jobseeker>>, AppError> {
    let rows = state.store.list(&filter).await?;
    Ok(Json(rows))
}

/// GET /api/jobseekers/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Jobseeker>, AppError> {
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(jobseeker_not_found)
}

/// POST /api/jobseekers
///
/// The resume is written before the record; if the insert fails the file
/// is removed again.
pub async fn handle_create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Jobseeker>), AppError> {
    let Registration { fields, resume } = read_registration(&mut multipart, &state.resumes).await?;
    let resume =
        resume.ok_or_else(|| AppError::BadRequest("Resume file is required".to_string()))?;
    let form = validate_submission(&fields)?;

    if !state.config.allow_duplicate_registrations {
        if let Some(existing) = state
            .store
            .find_duplicate(&form.email, &form.contact_number)
            .await?
        {
            warn!(existing_id = existing.id, "Rejected duplicate registration");
            return Err(AppError::Conflict(
                "A jobseeker with this email or contact number is already registered".to_string(),
            ));
        }
    }

    let stored = state.resumes.save(&resume.file_name, &resume.data).await?;
    let new = form.into_new_jobseeker(stored, Utc::now().trunc_subsecs(6));

    match state.store.create(&new).await {
        Ok(record) => {
            info!(
                id = record.id,
                backend = state.store.backend(),
                "Registered jobseeker"
            );
            Ok((StatusCode::CREATED, Json(record)))
        }
        Err(e) => {
            if let Err(cleanup) = state.resumes.remove(&new.resume_file_path).await {
                error!(
                    path = %new.resume_file_path,
                    error = %cleanup,
                    "Failed to remove resume after insert failure; file is orphaned"
                );
            }
            Err(e.into())
        }
    }
}

/// GET /api/jobseekers/:id/resume
pub async fn handle_download_resume(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .store
        .get(id)
        .await?
        .ok_or_else(jobseeker_not_found)?;
    let (file, len) = state.resumes.open(&record.resume_file_path).await?;

    let headers = [
        (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
        (header::CONTENT_LENGTH, len.to_string()),
        (
            header::CONTENT_DISPOSITION,
            attachment_disposition(&record.resume_file_name),
        ),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))))
}

/// PUT /api/jobseekers/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<JobseekerPatch>,
) -> Result<Json<Jobseeker>, AppError> {
    let patch = validate_patch(patch)?;
    let updated = if patch.is_empty() {
        state.store.get(id).await?
    } else {
        state.store.update(id, &patch).await?
    };

    let record = updated.ok_or_else(jobseeker_not_found)?;
    info!(id, "Updated jobseeker");
    Ok(Json(record))
}

/// DELETE /api/jobseekers/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let existing = state
        .store
        .get(id)
        .await?
        .ok_or_else(jobseeker_not_found)?;
    if !state.store.delete(id).await? {
        return Err(jobseeker_not_found());
    }

    if let Err(e) = state.resumes.remove(&existing.resume_file_path).await {
        warn!(id, error = %e, "Deleted jobseeker but could not remove resume file");
    }
    info!(id, "Deleted jobseeker");
    Ok(Json(json!({ "message": "Jobseeker deleted successfully" })))
}
