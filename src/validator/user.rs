use super::{UniquenessLookup, ValidationError, ValidatorError, PASSWORD_MIN_LENGTH};
use crate::database::models::{UserCreationRequest, UserModificationRequest};

pub async fn validate_user_creation<L: UniquenessLookup + ?Sized>(
    lookup: &L,
    request: &UserCreationRequest,
) -> Result<(), ValidatorError> {
    if request.username.is_empty() {
        return Err(ValidationError::MissingUsername.into());
    }
    if request.pseudonym.is_empty() {
        return Err(ValidationError::MissingPseudonym.into());
    }
    if lookup.username_taken(&request.username, None).await? {
        return Err(ValidationError::UserAlreadyExists.into());
    }
    if lookup.pseudonym_taken(&request.pseudonym, None).await? {
        return Err(ValidationError::PseudonymAlreadyExists.into());
    }
    check_password(&request.password)?;
    Ok(())
}

/// Only fields present in the patch are checked; uniqueness ignores `user_id` itself.
pub async fn validate_user_modification<L: UniquenessLookup + ?Sized>(
    lookup: &L,
    user_id: i64,
    patch: &UserModificationRequest,
) -> Result<(), ValidatorError> {
    if let Some(username) = &patch.username {
        if username.is_empty() {
            return Err(ValidationError::MissingUsername.into());
        }
        if lookup.username_taken(username, Some(user_id)).await? {
            return Err(ValidationError::UserAlreadyExists.into());
        }
    }
    if let Some(pseudonym) = &patch.pseudonym {
        if pseudonym.is_empty() {
            return Err(ValidationError::MissingPseudonym.into());
        }
        if lookup.pseudonym_taken(pseudonym, Some(user_id)).await? {
            return Err(ValidationError::PseudonymAlreadyExists.into());
        }
    }
    if let Some(password) = &patch.password {
        check_password(password)?;
    }
    Ok(())
}

fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}
