use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::Result;
use crate::router::owner;
use crate::token::Claims;
use crate::user::UserRepository;

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub username: String,
    pub email: String,
}

/// Handler returning the account behind the token.
pub async fn handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Response>> {
    let user = UserRepository::new(state.db.postgres.clone())
        .find_by_id(owner(&claims)?)
        .await?;

    Ok(Json(Response {
        username: user.username,
        email: user.email,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use sqlx::{Pool, Postgres};

    const ADA_ID: &str = "00000000-0000-0000-0000-0000000000a1";

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_user_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let token = state.token.create(ADA_ID).unwrap();
        let response = make_request(
            app,
            Method::GET,
            "/auth/user",
            Some(&token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Response = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.username, "ada");
        assert_eq!(body.email, "ada@x.com");
    }

    #[sqlx::test]
    async fn test_user_handler_unknown_subject(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let token =
            state.token.create(&uuid::Uuid::new_v4().to_string()).unwrap();
        let response = make_request(
            app,
            Method::GET,
            "/auth/user",
            Some(&token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
