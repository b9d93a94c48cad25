//! Handle database requests.

use sqlx::types::Json;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::portfolio::{Portfolio, PortfolioFields};

const RETURNING: &str = r#"RETURNING
        user_id, personal_details, skills, experience, projects,
        education, certifications, soft_skills, languages,
        description, template_id, created_at, updated_at"#;

fn upsert_query() -> String {
    format!(
        r#"INSERT INTO portfolios
            (user_id, personal_details, skills, experience, projects,
             education, certifications, soft_skills, languages,
             description, template_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id) DO UPDATE SET
                personal_details = EXCLUDED.personal_details,
                skills = EXCLUDED.skills,
                experience = EXCLUDED.experience,
                projects = EXCLUDED.projects,
                education = EXCLUDED.education,
                certifications = EXCLUDED.certifications,
                soft_skills = EXCLUDED.soft_skills,
                languages = EXCLUDED.languages,
                description = EXCLUDED.description,
                template_id = EXCLUDED.template_id,
                updated_at = NOW()
            {RETURNING}"#
    )
}

/// Carry stored asset URLs into an incoming full write.
///
/// `profileImageURL` and per-project `projectImage` only ever enter the
/// document through the upload routes, so a body without them keeps the
/// stored value; a body that brings its own wins.
fn preserve_asset_urls(fields: &mut PortfolioFields, stored: &Portfolio) {
    if let Some(url) = stored.personal_details.get("profileImageURL")
        && let Some(details) = fields.personal_details.as_object_mut()
    {
        details
            .entry("profileImageURL".to_owned())
            .or_insert_with(|| url.clone());
    }

    for (incoming, stored) in
        fields.projects.iter_mut().zip(stored.projects.iter())
    {
        if let Some(url) = stored.get("projectImage")
            && let Some(incoming) = incoming.as_object_mut()
        {
            incoming
                .entry("projectImage".to_owned())
                .or_insert_with(|| url.clone());
        }
    }
}

#[derive(Clone)]
pub struct PortfolioRepository {
    pool: Pool<Postgres>,
}

impl PortfolioRepository {
    /// Create a new [`PortfolioRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Write the portfolio owned by `owner`, creating it on first write.
    ///
    /// `user_id` is the primary key, so two concurrent writes for the same
    /// owner cannot create two rows; the last commit wins field-wise.
    pub async fn upsert(
        &self,
        owner: Uuid,
        fields: &PortfolioFields,
    ) -> Result<Portfolio> {
        // Clients do not re-send asset URLs on a full write; stored
        // references are carried over unless the body brings its own.
        let mut fields = fields.clone();
        match self.find_by_owner(owner).await {
            Ok(stored) => preserve_asset_urls(&mut fields, &stored),
            Err(ServerError::NotFound(_)) => {},
            Err(err) => return Err(err),
        }

        let portfolio = sqlx::query_as::<_, Portfolio>(&upsert_query())
            .bind(owner)
            .bind(&fields.personal_details)
            .bind(&fields.skills)
            .bind(&fields.experience)
            .bind(Json(&fields.projects))
            .bind(&fields.education)
            .bind(&fields.certifications)
            .bind(&fields.soft_skills)
            .bind(&fields.languages)
            .bind(&fields.description)
            .bind(&fields.template_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(portfolio)
    }

    /// Find the portfolio owned by `owner`.
    pub async fn find_by_owner(&self, owner: Uuid) -> Result<Portfolio> {
        sqlx::query_as::<_, Portfolio>(
            r#"SELECT
                user_id, personal_details, skills, experience, projects,
                education, certifications, soft_skills, languages,
                description, template_id, created_at, updated_at
                FROM portfolios
                WHERE user_id = $1"#,
        )
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServerError::NotFound("Portfolio"))
    }

    /// Write back a full [`Portfolio`] row.
    ///
    /// Used by asset attachment after a read-modify-write cycle.
    pub(crate) async fn save(
        &self,
        portfolio: &Portfolio,
    ) -> Result<Portfolio> {
        let portfolio = sqlx::query_as::<_, Portfolio>(&upsert_query())
            .bind(portfolio.user_id)
            .bind(&portfolio.personal_details)
            .bind(&portfolio.skills)
            .bind(&portfolio.experience)
            .bind(Json(&portfolio.projects))
            .bind(&portfolio.education)
            .bind(&portfolio.certifications)
            .bind(&portfolio.soft_skills)
            .bind(&portfolio.languages)
            .bind(&portfolio.description)
            .bind(&portfolio.template_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(portfolio)
    }
}
