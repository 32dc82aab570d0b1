//! Client-side half of SSH challenge/response login: sign a server-issued
//! nonce with a local Ed25519 private key.
//!
//! Only raw 32-byte seed files are supported (no OpenSSH PEM container
//! parsing, which involves its own bcrypt-KDF-wrapped encryption format).
//! A user who keeps a passphrase-protected `~/.ssh/id_ed25519` needs to
//! export the raw seed first; that conversion is outside this tool.

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use camino::Utf8Path;
use ed25519_dalek::{Signer, SigningKey};

pub fn sign_nonce(seed_path: &Utf8Path, nonce: &str) -> Result<String> {
    let bytes = std::fs::read(seed_path).with_context(|| format!("Couldn't read {seed_path}"))?;
    if bytes.len() != 32 {
        bail!(
            "{seed_path} is not a raw 32-byte Ed25519 seed (got {} bytes)",
            bytes.len()
        );
    }
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&bytes);
    let signing_key = SigningKey::from_bytes(&seed);
    let signature = signing_key.sign(nonce.as_bytes());
    Ok(BASE64.encode(signature.to_bytes()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn signs_and_is_base64() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("seed");
        std::fs::write(&path, [9u8; 32]).unwrap();

        let sig = sign_nonce(&path, "abc123").unwrap();
        assert!(BASE64.decode(sig).is_ok());
    }

    #[test]
    fn rejects_wrong_length_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("seed");
        std::fs::write(&path, [9u8; 16]).unwrap();
        assert!(sign_nonce(&path, "abc123").is_err());
    }
}
