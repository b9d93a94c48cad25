use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::user::{User, UserRepository};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(
        length(min = 2, max = 30),
        custom(
            function = super::validate_handle,
            message = "Username must be alphanumeric."
        )
    )]
    pub username: String,
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 255,
        message = "Password must contain at least 6 characters."
    ))]
    pub password: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub message: String,
}

/// Handler to create user.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Response>)> {
    let user = User {
        id: Uuid::new_v4(),
        username: body.username.to_lowercase(),
        email: body.email.to_lowercase(),
        password: state.crypto.hash_password(&body.password)?,
        created_at: chrono::Utc::now(),
    };

    UserRepository::new(state.db.postgres.clone())
        .insert(&user)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Response {
            message: "User created successfully.".to_owned(),
        }),
    ))
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use crate::*;
    use axum::Router;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    pub(in crate::router) async fn signup(
        app: Router,
        username: &str,
        email: &str,
        password: &str,
    ) -> axum::http::Response<axum::body::Body> {
        make_request(
            app,
            Method::POST,
            "/auth/signup",
            None,
            json!({
                "username": username,
                "email": email,
                "password": password,
            })
            .to_string(),
        )
        .await
    }

    #[sqlx::test]
    async fn test_signup_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response =
            signup(app.clone(), "ada", "ada@x.com", "secret").await;
        assert_eq!(response.status(), StatusCode::CREATED);

        // Same handle again must conflict.
        let response =
            signup(app.clone(), "ada", "other@x.com", "secret").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Same address with a fresh handle must conflict too.
        let response = signup(app, "lovelace", "ada@x.com", "secret").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_signup_rejects_malformed_input(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response =
            signup(app.clone(), "ada", "not-an-email", "secret").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = signup(app, "ada", "ada@x.com", "short").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
