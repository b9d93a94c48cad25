use axum::{Extension, Json, extract::State};

use crate::AppState;
use crate::error::Result;
use crate::portfolio::{Portfolio, PortfolioFields, PortfolioRepository};
use crate::router::{Valid, owner};
use crate::token::Claims;

/// Handler writing the caller's portfolio, creating it on first write.
///
/// Full-field replace: fields missing from the body fall back to their
/// empty defaults, they are not merged with the stored document.
pub async fn handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Valid(body): Valid<PortfolioFields>,
) -> Result<Json<Portfolio>> {
    let portfolio = PortfolioRepository::new(state.db.postgres.clone())
        .upsert(owner(&claims)?, &body)
        .await?;

    Ok(Json(portfolio))
}

#[cfg(test)]
pub(super) mod tests {
    use crate::*;
    use axum::Router;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use sqlx::{Pool, Postgres};

    pub(in crate::router) const ADA_ID: &str =
        "00000000-0000-0000-0000-0000000000a1";

    pub(in crate::router) async fn write_portfolio(
        app: Router,
        token: &str,
        body: Value,
    ) -> axum::http::Response<axum::body::Body> {
        make_request(
            app,
            Method::POST,
            "/portfolio",
            Some(token),
            body.to_string(),
        )
        .await
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_update_handler(pool: Pool<Postgres>) {
        let state = router::state(pool.clone());
        let app = app(state.clone());
        let token = state.token.create(ADA_ID).unwrap();

        let response = write_portfolio(
            app.clone(),
            &token,
            json!({
                "personalDetails": { "fullName": "Ada Lovelace" },
                "skills": ["rust"],
                "projects": [{ "name": "Analytical Engine" }],
                "description": "First programmer.",
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["user"], ADA_ID);
        assert_eq!(body["personalDetails"]["fullName"], "Ada Lovelace");
        assert_eq!(body["skills"][0], "rust");

        // Second write replaces fields instead of merging them.
        let response = write_portfolio(
            app,
            &token,
            json!({
                "personalDetails": { "fullName": "A. Lovelace" },
                "softSkills": ["writing"],
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["personalDetails"]["fullName"], "A. Lovelace");
        assert_eq!(body["softSkills"][0], "writing");
        assert_eq!(body["skills"], json!([]));
        assert_eq!(body["description"], Value::Null);

        // Still exactly one row for this owner.
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM portfolios")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_update_requires_personal_details(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state.clone());
        let token = state.token.create(ADA_ID).unwrap();

        let response =
            write_portfolio(app.clone(), &token, json!({ "skills": [] }))
                .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = write_portfolio(
            app,
            &token,
            json!({ "personalDetails": "not-an-object" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_update_requires_token(pool: Pool<Postgres>) {
        let state = router::state(pool);
        let app = app(state);

        let response = make_request(
            app,
            Method::POST,
            "/portfolio",
            None,
            json!({ "personalDetails": {} }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
