//! Password hashing: `bcrypt`, same choice `spec.md` names explicitly.
//! Deliberately slow — callers on the hot auth path should expect to block.

use anyhow::{Context, Result};

const COST: u32 = bcrypt::DEFAULT_COST;

pub fn hash(password: &str) -> Result<String> {
    bcrypt::hash(password, COST).context("bcrypt hashing failed")
}

pub fn verify(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let h = hash("correct horse battery staple").unwrap();
        assert!(verify("correct horse battery staple", &h));
        assert!(!verify("wrong password", &h));
    }
}
