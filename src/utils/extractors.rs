use crate::{
    error::{AppError, Result},
    utils::jwt::Claims,
};

/// Numeric user id carried in the token subject.
pub fn extract_user_id(claims: &Claims) -> Result<i32> {
    claims
        .sub
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::Unauthorized("Token subject is not a valid user".to_string()))
}
