//! Password/username policy validation and bcrypt-class hashing.
//!
//! Mirrors the source's `InputSanitizer`: a denylist of SQL-shaped substrings
//! is checked in addition to parameterized queries downstream — defense in
//! depth, not the primary protection.

use duel_core::constants::{
    BCRYPT_COST, PASSWORD_MAX_LEN, PASSWORD_MIN_LEN, USERNAME_MAX_LEN, USERNAME_MIN_LEN,
};
use duel_core::error::{DuelError, DuelResult};

const PASSWORD_PUNCTUATION: &str = "!@#$%^&*()_+-=";

const SQL_DENYLIST: &[&str] = &[
    "--", ";", "/*", "*/", "union select", "drop table", "xp_cmdshell", "' or ", "\" or ",
];

pub fn validate_username_policy(username: &str) -> DuelResult<()> {
    if username.len() < USERNAME_MIN_LEN || username.len() > USERNAME_MAX_LEN {
        return Err(DuelError::invalid(format!(
            "username must be {USERNAME_MIN_LEN}-{USERNAME_MAX_LEN} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
    {
        return Err(DuelError::invalid(
            "username may only contain letters, digits, '_', '.', and '-'",
        ));
    }
    Ok(())
}

pub fn validate_password_policy(password: &str) -> DuelResult<()> {
    if password.len() < PASSWORD_MIN_LEN || password.len() > PASSWORD_MAX_LEN {
        return Err(DuelError::invalid(format!(
            "password must be {PASSWORD_MIN_LEN}-{PASSWORD_MAX_LEN} characters"
        )));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(DuelError::invalid("password must contain at least one digit"));
    }
    if !password.chars().any(|c| PASSWORD_PUNCTUATION.contains(c)) {
        return Err(DuelError::invalid(format!(
            "password must contain at least one of: {PASSWORD_PUNCTUATION}"
        )));
    }
    let lowered = password.to_ascii_lowercase();
    if SQL_DENYLIST.iter().any(|needle| lowered.contains(needle)) {
        return Err(DuelError::invalid("password contains disallowed characters"));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> DuelResult<String> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| DuelError::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> DuelResult<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e| DuelError::internal(format!("password verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_policy_compliant_password() {
        assert!(validate_password_policy("Abcdef1!").is_ok());
    }

    #[test]
    fn rejects_password_without_digit() {
        assert!(validate_password_policy("Abcdefgh!").is_err());
    }

    #[test]
    fn rejects_password_without_punctuation() {
        assert!(validate_password_policy("Abcdefg1").is_err());
    }

    #[test]
    fn rejects_sql_shaped_password() {
        assert!(validate_password_policy("Abcdef1!--drop").is_err());
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("Abcdef1!").unwrap();
        assert!(verify_password("Abcdef1!", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn rejects_username_with_bad_charset() {
        assert!(validate_username_policy("al ice!").is_err());
    }
}
