use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::router::auth::TOKEN_TYPE;
use crate::user::{User, UserRepository};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password must not be empty."))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub token_type: String,
    pub token: String,
    pub expires_in: u64,
    pub user: User,
}

/// Handler to log a user in and issue a session token.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let user = UserRepository::new(state.db.postgres.clone())
        .find_by_email(&body.email.to_lowercase())
        .await?;

    state.crypto.verify_password(&body.password, &user.password)?;

    let token = state.token.create(&user.id.to_string())?;

    Ok(Json(Response {
        token_type: TOKEN_TYPE.to_owned(),
        token,
        expires_in: crate::token::EXPIRATION_TIME,
        user,
    }))
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use crate::*;
    use axum::Router;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    use crate::router::auth::signup::tests::signup;

    pub(in crate::router) async fn login(
        app: Router,
        email: &str,
        password: &str,
    ) -> axum::http::Response<axum::body::Body> {
        make_request(
            app,
            Method::POST,
            "/auth/login",
            None,
            json!({ "email": email, "password": password }).to_string(),
        )
        .await
    }

    #[sqlx::test]
    async fn test_login_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let response =
            signup(app.clone(), "ada", "ada@x.com", "secret").await;
        assert_eq!(response.status(), StatusCode::CREATED);

        // Wrong password must not leak whether the account exists.
        let response = login(app.clone(), "ada@x.com", "wrong").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = login(app, "ada@x.com", "secret").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Response = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.token_type, TOKEN_TYPE);
        assert_eq!(body.expires_in, crate::token::EXPIRATION_TIME);
        assert_eq!(body.user.username, "ada");

        let claims = state.token.decode(&body.token).unwrap();
        assert_eq!(claims.sub, body.user.id.to_string());
    }

    #[sqlx::test]
    async fn test_login_unknown_address(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = login(app, "nobody@x.com", "secret").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
