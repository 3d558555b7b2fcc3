use tracing::error;

/// Hashes a plaintext password with a fresh random salt. `cost` is the
/// bcrypt work factor; the resulting string embeds the algorithm version,
/// cost and salt, so verification needs nothing else.
pub fn hash_password(plain: &str, cost: u32) -> anyhow::Result<String> {
    let hash = bcrypt::hash(plain, cost).map_err(|e| {
        error!(error = %e, "bcrypt hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(hash)
}

/// Recomputes the digest with the parameters embedded in `secret`.
/// A non-matching password is `Ok(false)`; only a structurally malformed
/// secret is an error.
pub fn verify_password(plain: &str, secret: &str) -> anyhow::Result<bool> {
    bcrypt::verify(plain, secret).map_err(|e| {
        error!(error = %e, "bcrypt verify error");
        anyhow::anyhow!(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost keeps the suite fast; production cost comes from config.
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password, TEST_COST).expect("hashing should succeed");
        assert!(hash.starts_with("$2"));
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password, TEST_COST).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn hashing_is_salted() {
        let password = "same-input-twice";
        let first = hash_password(password, TEST_COST).expect("first hash");
        let second = hash_password(password, TEST_COST).expect("second hash");
        assert_ne!(first, second);
        assert!(verify_password(password, &first).unwrap());
        assert!(verify_password(password, &second).unwrap());
    }

    #[test]
    fn verify_errors_on_malformed_secret() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
