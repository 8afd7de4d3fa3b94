//! Agent credential hashing (Argon2id, PHC string format).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hashes a credential into a self-describing PHC string.
pub fn hash_credential(credential: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(credential.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| format!("failed to hash credential: {err}"))
}

/// Checks a credential against a stored PHC hash.
pub fn verify_credential(credential: &str, hash: &str) -> Result<bool, String> {
    let parsed = PasswordHash::new(hash).map_err(|err| format!("invalid credential hash: {err}"))?;
    Ok(Argon2::default()
        .verify_password(credential.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::{hash_credential, verify_credential};

    #[test]
    fn hash_is_salted_and_verifies() {
        let first = hash_credential("open sesame").unwrap();
        let second = hash_credential("open sesame").unwrap();
        assert!(first.starts_with("$argon2"));
        assert_ne!(first, second);
        assert!(verify_credential("open sesame", &first).unwrap());
        assert!(!verify_credential("wrong", &first).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_credential("x", "plain-text").is_err());
    }
}
