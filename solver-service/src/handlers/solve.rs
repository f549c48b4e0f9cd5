use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

/// Multipart field carrying the photo.
pub const IMAGE_FIELD: &str = "image";

pub const NO_IMAGE_PROVIDED: &str = "No image file provided";
pub const NO_IMAGE_SELECTED: &str = "No image file selected";

/// `POST /api/solve`: solve the homework problem in the uploaded image.
///
/// 200 with the solved envelope, 500 with the failed one; input problems
/// short-circuit with 400 before the model is called.
pub async fn solve_problem(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let multipart = multipart.map_err(|e| {
        tracing::debug!("Request is not a multipart upload: {}", e);
        AppError::BadRequest(NO_IMAGE_PROVIDED.to_string())
    })?;

    let image = read_image_field(multipart).await?;

    tracing::info!(size = image.len(), "Image received");

    let envelope = state.solver.solve(&image).await;

    let status = if envelope.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((status, Json(envelope)))
}

/// Find the first `image` part that is a file and read it fully into memory.
///
/// Parts named `image` without a filename are plain form values, not files,
/// and are skipped.
async fn read_image_field(mut multipart: Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename_empty = match field.file_name() {
            Some(name) => name.is_empty(),
            None => continue,
        };
        if filename_empty {
            return Err(AppError::BadRequest(NO_IMAGE_SELECTED.to_string()));
        }

        return field.bytes().await.map_err(field_read_error);
    }

    Err(AppError::BadRequest(NO_IMAGE_PROVIDED.to_string()))
}

/// An unparseable form yields no files; an oversized one is reported as such.
fn multipart_error(err: MultipartError) -> AppError {
    match err.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(err.body_text()),
        StatusCode::BAD_REQUEST => {
            tracing::debug!("Malformed multipart body: {}", err.body_text());
            AppError::BadRequest(NO_IMAGE_PROVIDED.to_string())
        }
        _ => AppError::InternalError(anyhow::Error::new(err)),
    }
}

/// The image part exists, so a broken body is reported as-is rather than as a missing file.
fn field_read_error(err: MultipartError) -> AppError {
    match err.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(err.body_text()),
        StatusCode::BAD_REQUEST => AppError::BadRequest(err.body_text()),
        _ => AppError::InternalError(anyhow::Error::new(err)),
    }
}
