mod assets;
mod repository;

pub use repository::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Portfolio as saved on database.
///
/// Every section is schemaless JSON; clients own the shape of records
/// inside `personal_details`, `projects` and the other lists. Asset URLs
/// live inside the JSON (`personalDetails.profileImageURL`,
/// `personalDetails.resumeDriveLink`, `projects[i].projectImage`).
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub personal_details: Value,
    pub skills: Value,
    pub experience: Value,
    #[sqlx(json)]
    pub projects: Vec<Value>,
    pub education: Value,
    pub certifications: Value,
    pub soft_skills: Value,
    pub languages: Value,
    pub description: Option<String>,
    pub template_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Portfolio {
    /// Empty portfolio shell for `owner`, used when an asset is attached
    /// before any full write happened. Timestamps are set by the database.
    pub(crate) fn shell(owner: Uuid) -> Self {
        Self {
            user_id: owner,
            personal_details: serde_json::json!({}),
            skills: serde_json::json!([]),
            experience: serde_json::json!([]),
            projects: Vec::new(),
            education: serde_json::json!([]),
            certifications: serde_json::json!([]),
            soft_skills: serde_json::json!([]),
            languages: serde_json::json!([]),
            description: None,
            template_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }
}

/// Writable portfolio fields, as sent by clients.
///
/// `personalDetails` is the only mandatory section; everything else
/// defaults to empty. A full write replaces all fields, it does not merge.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioFields {
    #[validate(custom(function = personal_details_is_object))]
    pub personal_details: Value,
    #[serde(default = "empty_list")]
    pub skills: Value,
    #[serde(default = "empty_list")]
    pub experience: Value,
    #[serde(default)]
    pub projects: Vec<Value>,
    #[serde(default = "empty_list")]
    pub education: Value,
    #[serde(default = "empty_list")]
    pub certifications: Value,
    #[serde(default = "empty_list")]
    pub soft_skills: Value,
    #[serde(default = "empty_list")]
    pub languages: Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
}

fn empty_list() -> Value {
    serde_json::json!([])
}

fn personal_details_is_object(
    value: &Value,
) -> Result<(), ValidationError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_personal_details")
            .with_message("personalDetails must be an object.".into()))
    }
}
