use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!(err))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|err| anyhow!(err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Checks a new password and its confirmation, returning the message shown
/// to the user when they are not acceptable.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), &'static str> {
    if password != confirmation {
        return Err("passwords do not match");
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("password must be at least 8 characters");
    }
    Ok(())
}
