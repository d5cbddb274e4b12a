//! Profile route handlers.
//!
//! Both endpoints act on the signed-in user.

use axum::extract::{Multipart, State, multipart::MultipartError};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::routes::envelope::ApiResponse;
use crate::services::ProfileService;
use crate::services::profile::{ProfileFields, ProfileImage};
use crate::state::AppState;

/// Multipart field carrying the picture.
const PICTURE_FIELD: &str = "profilepic";

/// Uploaded picture buffered from the multipart body.
struct UploadedPicture {
    file_name: String,
    bytes: axum::body::Bytes,
}

fn multipart_error(e: &MultipartError) -> AppError {
    AppError::InvalidInput(format!("invalid form data: {}", e.body_text()))
}

/// Get the signed-in user's profile.
///
/// GET /api/profile
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
) -> Result<ApiResponse<User>> {
    let profiles = ProfileService::new(state.pool(), &state.config().upload_dir);
    let user = profiles.get(current_user.id).await?;

    Ok(ApiResponse::ok("Profile loaded", user))
}

/// Update the signed-in user's profile.
///
/// POST /api/profile (multipart: `fullname`, `email`, `phone`, `address`, `profilepic`)
///
/// Blank or missing text fields keep their stored value. Other fields are
/// ignored.
#[instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    mut multipart: Multipart,
) -> Result<ApiResponse<User>> {
    let mut fields = ProfileFields::default();
    let mut picture: Option<UploadedPicture> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == PICTURE_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_owned();
            let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
            // Browsers send an empty part when no file was chosen.
            if !file_name.is_empty() || !bytes.is_empty() {
                picture = Some(UploadedPicture { file_name, bytes });
            }
            continue;
        }

        let slot = match name.as_str() {
            "fullname" => &mut fields.fullname,
            "email" => &mut fields.email,
            "phone" => &mut fields.phone,
            "address" => &mut fields.address,
            _ => continue,
        };
        *slot = Some(field.text().await.map_err(|e| multipart_error(&e))?);
    }

    let profiles = ProfileService::new(state.pool(), &state.config().upload_dir);
    let image = picture.as_ref().map(|p| ProfileImage {
        file_name: &p.file_name,
        bytes: &p.bytes,
    });
    let user = profiles.update(current_user.id, fields, image).await?;

    Ok(ApiResponse::ok("Profile updated successfully", user))
}
