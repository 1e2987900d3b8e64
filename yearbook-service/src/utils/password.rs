use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password with Argon2id and a fresh random salt. The returned
/// PHC string embeds the salt and cost parameters.
pub fn hash_password(password: &str) -> Result<String, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    Ok(hash.to_string())
}

/// Check a candidate password against a stored PHC string. An unparseable
/// stored hash is indistinguishable from a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_phc_encoded_and_never_the_plaintext() {
        let hash = hash_password("pw123456").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert_ne!(hash, "pw123456");
    }

    #[test]
    fn correct_password_verifies() {
        let hash = hash_password("pw123456").unwrap();
        assert!(verify_password("pw123456", &hash));
    }

    #[test]
    fn wrong_password_fails() {
        let hash = hash_password("pw123456").unwrap();
        assert!(!verify_password("different", &hash));
    }

    #[test]
    fn garbage_stored_hash_fails_closed() {
        assert!(!verify_password("pw123456", "not-a-phc-string"));
    }

    #[test]
    fn salts_make_hashes_unique() {
        let a = hash_password("pw123456").unwrap();
        let b = hash_password("pw123456").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("pw123456", &a));
        assert!(verify_password("pw123456", &b));
    }
}
