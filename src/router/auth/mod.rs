pub mod login;
pub mod signup;
pub mod user;
pub mod verify;

use validator::ValidationError;

pub const TOKEN_TYPE: &str = "Bearer";

/// Handles are URL path segments, so only alphanumerics, `-` and `_` are
/// allowed.
pub(super) fn validate_handle(
    username: &str,
) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_username"))
    }
}
