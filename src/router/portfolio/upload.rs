use axum::extract::State;
use axum::extract::multipart::{Field, Multipart};
use axum::{Extension, Json};
use validator::{ValidationError, ValidationErrors};

use crate::AppState;
use crate::error::Result;
use crate::portfolio::{Portfolio, PortfolioRepository};
use crate::router::owner;
use crate::storage::object_key;
use crate::token::Claims;

pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

const PROFILE_IMAGE_FIELD: &str = "profileImageURL";
const PROJECT_IMAGE_FIELD: &str = "projectImages";
const PROJECT_INDEX_FIELD: &str = "projectIndex";
const RESUME_FIELD: &str = "resume";

struct Upload {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

fn field_error(field: &'static str, message: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        field,
        ValidationError::new("invalid_upload").with_message(message.into()),
    );
    errors
}

/// Read one file field, holding it to `accept`ed mime-types and the size cap.
async fn read_file(
    field: Field<'_>,
    name: &'static str,
    accept: fn(&str) -> bool,
) -> Result<Upload> {
    let filename = field.file_name().unwrap_or_default().to_owned();
    let content_type = field.content_type().unwrap_or_default().to_owned();
    let bytes = field.bytes().await?;

    if !accept(&content_type) {
        return Err(
            field_error(name, "Unsupported file type for this field.").into()
        );
    }
    if bytes.len() > MAX_FILE_BYTES {
        return Err(field_error(name, "File exceeds the 10MB cap.").into());
    }

    Ok(Upload {
        filename,
        content_type,
        bytes: bytes.to_vec(),
    })
}

fn is_image(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

fn is_pdf(content_type: &str) -> bool {
    content_type == "application/pdf"
}

/// Handler uploading portfolio images.
///
/// `profileImageURL` lands in `personalDetails`; `projectImages` needs a
/// `projectIndex` text field naming which stored project receives the URL.
/// The file is pushed to the object store first, then its URL is merged
/// into the stored portfolio.
pub async fn images(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<Portfolio>> {
    let owner = owner(&claims)?;

    let mut profile_image = None;
    let mut project_image = None;
    let mut project_index: Option<usize> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some(PROFILE_IMAGE_FIELD) => {
                profile_image = Some(
                    read_file(field, PROFILE_IMAGE_FIELD, is_image).await?,
                );
            },
            Some(PROJECT_IMAGE_FIELD) => {
                project_image = Some(
                    read_file(field, PROJECT_IMAGE_FIELD, is_image).await?,
                );
            },
            Some(PROJECT_INDEX_FIELD) => {
                project_index =
                    Some(field.text().await?.trim().parse().map_err(|_| {
                        field_error(
                            PROJECT_INDEX_FIELD,
                            "projectIndex must be a number.",
                        )
                    })?);
            },
            _ => {},
        }
    }

    let repository = PortfolioRepository::new(state.db.postgres.clone());
    let mut portfolio = None;

    if let Some(upload) = profile_image {
        let key = object_key("profile-images", &upload.filename);
        let url = state
            .storage
            .put(&key, &upload.content_type, upload.bytes)
            .await?;
        portfolio = Some(repository.attach_profile_image(owner, &url).await?);
    }

    if let Some(upload) = project_image {
        let index = project_index.ok_or_else(|| {
            field_error(
                PROJECT_INDEX_FIELD,
                "projectIndex is required with projectImages.",
            )
        })?;
        let key = object_key("project-images", &upload.filename);
        let url = state
            .storage
            .put(&key, &upload.content_type, upload.bytes)
            .await?;
        portfolio =
            Some(repository.attach_project_image(owner, index, &url).await?);
    }

    portfolio.map(Json).ok_or_else(|| {
        field_error(PROFILE_IMAGE_FIELD, "No file was uploaded.").into()
    })
}

/// Handler uploading a PDF resume, linked from `personalDetails`.
pub async fn resume(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<Portfolio>> {
    let owner = owner(&claims)?;

    let mut resume = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(RESUME_FIELD) {
            resume = Some(read_file(field, RESUME_FIELD, is_pdf).await?);
        }
    }

    let Some(upload) = resume else {
        return Err(field_error(RESUME_FIELD, "No file was uploaded.").into());
    };

    let key = object_key("resumes", &upload.filename);
    let url = state
        .storage
        .put(&key, &upload.content_type, upload.bytes)
        .await?;

    let portfolio = PortfolioRepository::new(state.db.postgres.clone())
        .attach_resume(owner, &url)
        .await?;

    Ok(Json(portfolio))
}
