//! Salted, iterated SHA-256 password hashes.
//!
//! Stored format: `sha256$<iterations>$<salt>$<hex digest>`.

use sha2::{Digest, Sha256};
use uuid::Uuid;

const ALGORITHM: &str = "sha256";
const ITERATIONS: u32 = 600_000;

fn digest(raw_password: &str, salt: &str, iterations: u32) -> String {
    let mut hash = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(raw_password.as_bytes())
        .finalize();
    for _ in 1..iterations {
        hash = Sha256::new()
            .chain_update(hash)
            .chain_update(raw_password.as_bytes())
            .finalize();
    }
    format!("{:x}", hash)
}

/// Hash a password with a fresh random salt.
pub fn hash_password(raw_password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let hex = digest(raw_password, &salt, ITERATIONS);
    format!("{}${}${}${}", ALGORITHM, ITERATIONS, salt, hex)
}

/// Check a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(raw_password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(4, '$');
    let (Some(algorithm), Some(iterations), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if algorithm != ALGORITHM {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }
    constant_time_eq(digest(raw_password, salt, iterations).as_bytes(), expected.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let stored = hash_password("s3cret-pass");
        assert!(stored.starts_with("sha256$600000$"));
        assert!(verify_password("s3cret-pass", &stored));
        assert!(!verify_password("s3cret-pas", &stored));
    }

    #[test]
    fn hashes_with_an_older_iteration_count_still_verify() {
        let stored = format!("sha256$20000$oldsalt${}", digest("s3cret-pass", "oldsalt", 20_000));
        assert!(verify_password("s3cret-pass", &stored));
        assert!(!verify_password("wrong-pass", &stored));
    }

    #[test]
    fn same_password_gets_different_salts() {
        assert_ne!(hash_password("abc12345"), hash_password("abc12345"));
    }

    #[test]
    fn malformed_hashes_are_rejected() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "md5$1$salt$abcd"));
        assert!(!verify_password("x", "sha256$zero$salt$abcd"));
        assert!(!verify_password("x", "sha256$0$salt$abcd"));
    }
}
