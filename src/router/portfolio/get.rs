use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::AppState;
use crate::error::Result;
use crate::portfolio::{Portfolio, PortfolioRepository};
use crate::router::owner;
use crate::token::Claims;
use crate::user::UserRepository;

/// Handler returning the caller's own portfolio.
pub async fn handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Portfolio>> {
    let portfolio = PortfolioRepository::new(state.db.postgres.clone())
        .find_by_owner(owner(&claims)?)
        .await?;

    Ok(Json(portfolio))
}

/// Public handler resolving a handle to its portfolio.
///
/// Two-step lookup: a missing user and a user without a portfolio both
/// surface as 404 on this route.
pub async fn by_handle(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Portfolio>> {
    let user = UserRepository::new(state.db.postgres.clone())
        .find_by_username(&username.to_lowercase())
        .await?;

    let portfolio = PortfolioRepository::new(state.db.postgres.clone())
        .find_by_owner(user.id)
        .await?;

    Ok(Json(portfolio))
}
