//! Handle database requests.

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::user::User;

#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert [`User`] into database.
    ///
    /// Uniqueness of username and email is enforced by the database; a
    /// concurrent signup for the same address cannot slip through here.
    pub async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO users (id, username, email, password)
                VALUES ($1, $2, $3, $4)"#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .execute(&self.pool)
        .await
        .map_err(into_conflict)?;

        Ok(())
    }

    /// Find current user using `id` field.
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(&get_by_field_query(Field::Id))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound("User"))
    }

    /// Find current user using `email` field.
    pub async fn find_by_email(&self, email: &str) -> Result<User> {
        sqlx::query_as::<_, User>(&get_by_field_query(Field::Email))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound("User"))
    }

    /// Find current user using `username` field.
    pub async fn find_by_username(&self, username: &str) -> Result<User> {
        sqlx::query_as::<_, User>(&get_by_field_query(Field::Username))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound("User"))
    }
}

/// Translate a unique-index violation into the conflicting field.
fn into_conflict(err: sqlx::Error) -> ServerError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return match db_err.constraint() {
            Some("users_email_key") => ServerError::Conflict("Email"),
            _ => ServerError::Conflict("Username"),
        };
    }

    ServerError::Sql(err)
}

#[derive(Debug, Clone)]
enum Field {
    Id,
    Email,
    Username,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Field::Id => write!(f, "id"),
            Field::Email => write!(f, "email"),
            Field::Username => write!(f, "username"),
        }
    }
}

fn get_by_field_query(field: Field) -> String {
    format!(
        r#"SELECT id, username, email, password, created_at
            FROM users
            WHERE {field} = $1"#
    )
}
