//! Handler for inference submissions.
//!
//! The request path only validates, resolves and creates the job row; the
//! capability runs on the execution engine and the caller polls
//! `/responses` and `/results` with its correlation id.

use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use vocalis_core::audio::AudioFormat;
use vocalis_core::capability::params::{PARAM_AUDIO_CONTENTS, PARAM_AUDIO_FORMAT};
use vocalis_core::capability::CapabilityParams;
use vocalis_core::error::CoreError;
use vocalis_core::jobs::{JobManager, JobOutcome};
use vocalis_core::types::DbId;
use vocalis_worker::ExecutionTask;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Multipart field carrying the audio file.
const FIELD_DATA: &str = "data";
/// Multipart field that must be `true`.
const FIELD_EXPLAINING: &str = "explaining";
const FIELD_CORRELATION_ID: &str = "correlation_id";

/// Parameter names a caller cannot set through extra form fields.
const RESERVED_PARAMS: [&str; 2] = [PARAM_AUDIO_CONTENTS, PARAM_AUDIO_FORMAT];

/// A parsed inference form.
#[derive(Debug, Default)]
struct Submission {
    file_name: Option<String>,
    data: Option<Vec<u8>>,
    explaining: Option<String>,
    correlation_id: Option<String>,
    extra: Vec<(String, String)>,
}

/// A submission that passed validation.
#[derive(Debug)]
struct ValidSubmission {
    file_name: String,
    format: AudioFormat,
    data: Vec<u8>,
    correlation_id: String,
    extra: Vec<(String, String)>,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

async fn read_submission(mut multipart: Multipart) -> AppResult<Submission> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            FIELD_DATA => {
                submission.file_name = field.file_name().map(str::to_string);
                submission.data = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            }
            FIELD_EXPLAINING => {
                submission.explaining = Some(field.text().await.map_err(multipart_error)?);
            }
            FIELD_CORRELATION_ID => {
                submission.correlation_id = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {
                let value = field.text().await.map_err(multipart_error)?;
                submission.extra.push((name, value));
            }
        }
    }

    Ok(submission)
}

fn validate(submission: Submission) -> Result<ValidSubmission, CoreError> {
    let data = submission
        .data
        .ok_or_else(|| CoreError::Validation(format!("Missing '{FIELD_DATA}' file field")))?;
    if data.is_empty() {
        return Err(CoreError::Validation("Uploaded file is empty".into()));
    }

    let file_name = submission
        .file_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| CoreError::Validation("Uploaded file has no file name".into()))?;
    let format = AudioFormat::from_file_name(&file_name).ok_or_else(|| {
        CoreError::Validation(format!(
            "Unsupported file '{file_name}'. Only .mp3 and .wav files are accepted"
        ))
    })?;

    if submission.explaining.as_deref().map(str::trim) != Some("true") {
        return Err(CoreError::Validation(format!(
            "'{FIELD_EXPLAINING}' must be true"
        )));
    }

    let correlation_id = submission
        .correlation_id
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CoreError::Validation(format!("'{FIELD_CORRELATION_ID}' is required")))?;

    Ok(ValidSubmission {
        file_name,
        format,
        data,
        correlation_id,
        extra: submission.extra,
    })
}

fn build_params(submission: ValidSubmission) -> CapabilityParams {
    let mut params = CapabilityParams::new()
        .with_bytes(PARAM_AUDIO_CONTENTS, Arc::<[u8]>::from(submission.data))
        .with_text(PARAM_AUDIO_FORMAT, submission.format.extension());

    for (name, value) in submission.extra {
        if RESERVED_PARAMS.contains(&name.as_str()) {
            continue;
        }
        params = params.with_text(name, value);
    }
    params
}

/// POST /api/v1/models/{model_id}/inference
///
/// Accept an audio upload for asynchronous processing. Returns 201 with
/// `{"message": "created", "job_id": J}`. An unknown model is 404
/// `NOT_REGISTERED` and creates no job. If the engine cannot take the job,
/// the job is marked failed and the response is 503.
pub async fn submit_inference(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(model_id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let submission = validate(read_submission(multipart).await?)?;

    let mut scope = state.store.scope().await?;
    let resolved = state.resolver.resolve(scope.as_mut(), model_id).await?;

    let job = JobManager::create(
        scope.as_mut(),
        model_id,
        &submission.correlation_id,
        &submission.file_name,
    )
    .await?;

    let correlation_id = submission.correlation_id.clone();
    let task = ExecutionTask {
        job_id: job.id,
        model_id,
        correlation_id,
        params: build_params(submission),
    };

    if let Err(e) = state.engine.submit(task) {
        let outcome = JobOutcome::Failure(e.to_string());
        JobManager::mark_terminal(scope.as_mut(), job.id, &outcome).await?;
        return Err(AppError::ServiceUnavailable(format!(
            "Job {} could not be queued: {e}",
            job.id
        )));
    }

    tracing::info!(
        job_id = job.id,
        model_id,
        capability = %resolved.descriptor.capability,
        correlation_id = %job.correlation_id,
        user_id = auth.user_id,
        "Inference job submitted",
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "created",
            "job_id": job.id,
        })),
    ))
}
