//! Tripcode generation and verification
//!
//! A tripcode is a short public token derived from a poster-supplied
//! password. It lets a poster prove ownership of a thread or post without
//! any account: the server stores only the token, never the password.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Number of digest characters kept in the public token
const TRIPCODE_LENGTH: usize = 10;

/// Derives tripcodes from passwords using a process-wide secret salt.
pub struct TripcodeGenerator {
    salt: String,
}

impl TripcodeGenerator {
    pub fn new(salt: &str) -> Self {
        Self {
            salt: salt.to_string(),
        }
    }

    /// Generate a tripcode token from a password.
    ///
    /// Returns `None` for a missing or empty password (anonymous poster).
    /// The token is deterministic for a given (password, salt) pair,
    /// URL-safe, and not reversible to the password.
    pub fn generate(&self, password: Option<&str>) -> Option<String> {
        let password = password?;
        if password.is_empty() {
            return None;
        }

        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(password.as_bytes());
        let encoded = URL_SAFE_NO_PAD.encode(hasher.finalize());

        Some(format!("!{}", &encoded[..TRIPCODE_LENGTH]))
    }

    /// Check a password against a stored tripcode token.
    pub fn verify(&self, password: &str, tripcode: &str) -> bool {
        match self.generate(Some(password)) {
            Some(generated) => generated == tripcode,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> TripcodeGenerator {
        TripcodeGenerator::new("test-salt")
    }

    #[test]
    fn test_generate_is_deterministic() {
        let gen = generator();
        assert_eq!(gen.generate(Some("hunter2")), gen.generate(Some("hunter2")));
    }

    #[test]
    fn test_generate_round_trips_through_verify() {
        let gen = generator();
        let token = gen.generate(Some("hunter2")).unwrap();
        assert!(gen.verify("hunter2", &token));
        assert!(!gen.verify("hunter3", &token));
    }

    #[test]
    fn test_empty_password_yields_no_tripcode() {
        let gen = generator();
        assert_eq!(gen.generate(None), None);
        assert_eq!(gen.generate(Some("")), None);
        assert!(!gen.verify("", "!whatever"));
    }

    #[test]
    fn test_different_passwords_yield_different_tokens() {
        let gen = generator();
        let a = gen.generate(Some("alpha")).unwrap();
        let b = gen.generate(Some("bravo")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_salt_changes_token() {
        let a = TripcodeGenerator::new("salt-a")
            .generate(Some("hunter2"))
            .unwrap();
        let b = TripcodeGenerator::new("salt-b")
            .generate(Some("hunter2"))
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_shape_is_url_safe() {
        let gen = generator();
        for password in ["hunter2", "päss wörd", "日本語", "a"] {
            let token = gen.generate(Some(password)).unwrap();
            assert_eq!(token.len(), 1 + TRIPCODE_LENGTH);
            assert!(token.starts_with('!'));
            assert!(token[1..]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }
}
