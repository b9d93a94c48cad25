use axum::{Extension, Json};

use crate::token::Claims;

/// Handler returning the decoded token payload.
///
/// Reaching this handler means the middleware already checked signature and
/// expiry; no database access happens here.
pub async fn handler(Extension(claims): Extension<Claims>) -> Json<Claims> {
    Json(claims)
}

#[cfg(test)]
mod tests {
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use sqlx::{Pool, Postgres};

    #[sqlx::test]
    async fn test_verify_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());

        let token = state.token.create("some-user-id").unwrap();
        let response = make_request(
            app.clone(),
            Method::GET,
            "/auth/verify",
            Some(&token),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let claims: token::Claims = serde_json::from_slice(&body).unwrap();
        assert_eq!(claims.sub, "some-user-id");

        let response = make_request(
            app.clone(),
            Method::GET,
            "/auth/verify",
            Some("not-a-token"),
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = make_request(
            app,
            Method::GET,
            "/auth/verify",
            None,
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
