//! Merge uploaded asset URLs into a stored portfolio.
//!
//! These operations read-modify-write the whole row. There is no version
//! guard, so a concurrent full write for the same owner races with an
//! attach and the last commit wins.

use serde_json::Value;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::error::{Result, ServerError};
use crate::portfolio::{Portfolio, PortfolioRepository};

fn invalid_index() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "projectIndex",
        ValidationError::new("invalid_index")
            .with_message("No project exists at this index.".into()),
    );
    errors
}

fn set_personal_detail(portfolio: &mut Portfolio, key: &str, url: &str) {
    if !portfolio.personal_details.is_object() {
        portfolio.personal_details = serde_json::json!({});
    }
    if let Some(details) = portfolio.personal_details.as_object_mut() {
        details.insert(key.to_owned(), Value::String(url.to_owned()));
    }
}

impl PortfolioRepository {
    /// Current portfolio for `owner`, or an empty shell if none exists yet.
    async fn find_or_shell(&self, owner: Uuid) -> Result<Portfolio> {
        match self.find_by_owner(owner).await {
            Ok(portfolio) => Ok(portfolio),
            Err(ServerError::NotFound(_)) => Ok(Portfolio::shell(owner)),
            Err(err) => Err(err),
        }
    }

    /// Set `personalDetails.profileImageURL`, keeping every other field.
    ///
    /// Creates the portfolio if the owner never wrote one.
    pub async fn attach_profile_image(
        &self,
        owner: Uuid,
        url: &str,
    ) -> Result<Portfolio> {
        let mut portfolio = self.find_or_shell(owner).await?;
        set_personal_detail(&mut portfolio, "profileImageURL", url);
        self.save(&portfolio).await
    }

    /// Set `personalDetails.resumeDriveLink`, keeping every other field.
    pub async fn attach_resume(
        &self,
        owner: Uuid,
        url: &str,
    ) -> Result<Portfolio> {
        let mut portfolio = self.find_or_shell(owner).await?;
        set_personal_detail(&mut portfolio, "resumeDriveLink", url);
        self.save(&portfolio).await
    }

    /// Set `projectImage` on the project at `index`.
    ///
    /// Image upload never creates a project: an index outside the stored
    /// list fails and leaves the row untouched. A missing portfolio counts
    /// as an empty list.
    pub async fn attach_project_image(
        &self,
        owner: Uuid,
        index: usize,
        url: &str,
    ) -> Result<Portfolio> {
        let mut portfolio = match self.find_by_owner(owner).await {
            Ok(portfolio) => portfolio,
            Err(ServerError::NotFound(_)) => {
                return Err(invalid_index().into());
            },
            Err(err) => return Err(err),
        };

        let project = portfolio
            .projects
            .get_mut(index)
            .and_then(Value::as_object_mut)
            .ok_or_else(invalid_index)?;
        project.insert("projectImage".to_owned(), Value::String(url.to_owned()));

        self.save(&portfolio).await
    }
}
