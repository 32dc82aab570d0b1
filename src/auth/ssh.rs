//! SSH login: challenge/response over Ed25519 or RSA-PKCS1v15-SHA256,
//! verified against a key the user previously registered
//! (`users/<name>/keys.json`). The nonce map is the "Challenge map" named in
//! the concurrency model: short-lived, in-memory, single-writer per user,
//! entries deleted on use.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, anyhow, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use rand::RngCore;
use rsa::RsaPublicKey;
use rsa::pkcs1v15::{Signature as RsaSignature, VerifyingKey as RsaVerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier as RsaVerifierTrait;
use sha2::Sha256 as RsaSha256;

pub struct ChallengeMap {
    nonces: Mutex<HashMap<String, String>>,
}

impl Default for ChallengeMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ChallengeMap {
    pub fn new() -> Self {
        Self {
            nonces: Mutex::new(HashMap::new()),
        }
    }

    pub fn issue(&self, username: &str) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let nonce = STANDARD.encode(bytes);
        self.nonces.lock().unwrap().insert(username.to_string(), nonce.clone());
        nonce
    }

    /// Removes and returns the nonce on use — one-shot, as the concurrency
    /// model requires.
    pub fn take(&self, username: &str) -> Option<String> {
        self.nonces.lock().unwrap().remove(username)
    }
}

/// Verifies `signature_b64` over `nonce` using `public_key_text`, a stored
/// SSH-format public key. Tries Ed25519 (`ssh-ed25519 <base64>`) then an
/// RSA-PKCS1v15-SHA256 SPKI-PEM fallback.
pub fn verify_signature(public_key_text: &str, nonce: &str, signature_b64: &str) -> Result<bool> {
    let signature_bytes = STANDARD
        .decode(signature_b64)
        .map_err(|_| anyhow!("signature is not valid base64"))?;

    if let Some(rest) = public_key_text.trim().strip_prefix("ssh-ed25519 ") {
        let key_b64 = rest.split_whitespace().next().unwrap_or(rest);
        let key_bytes = STANDARD
            .decode(key_b64)
            .map_err(|_| anyhow!("ed25519 key is not valid base64"))?;
        let raw = extract_ed25519_raw_key(&key_bytes)?;
        let verifying_key = VerifyingKey::from_bytes(&raw).map_err(|e| anyhow!(e))?;
        let sig = Signature::from_slice(&signature_bytes).map_err(|e| anyhow!(e))?;
        return Ok(verifying_key.verify(nonce.as_bytes(), &sig).is_ok());
    }

    // Fall back to an RSA SPKI PEM public key, PKCS1v15/SHA-256 signature.
    let public_key = RsaPublicKey::from_public_key_pem(public_key_text.trim())
        .map_err(|_| anyhow!("not a recognized SSH key format"))?;
    let verifying_key: RsaVerifyingKey<RsaSha256> = RsaVerifyingKey::new(public_key);
    let sig = RsaSignature::try_from(signature_bytes.as_slice()).map_err(|e| anyhow!(e))?;
    Ok(verifying_key.verify(nonce.as_bytes(), &sig).is_ok())
}

/// An `ssh-ed25519` wire-format public key blob is
/// `len("ssh-ed25519") + "ssh-ed25519" + len(key) + key`; pull the raw
/// 32-byte key out of it.
fn extract_ed25519_raw_key(blob: &[u8]) -> Result<[u8; 32]> {
    let read_u32 = |b: &[u8]| -> Result<u32> {
        if b.len() < 4 {
            bail!("truncated SSH key blob");
        }
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    };

    let name_len = read_u32(blob)? as usize;
    let after_name = 4 + name_len;
    if blob.len() < after_name + 4 {
        bail!("truncated SSH key blob");
    }
    let key_len = read_u32(&blob[after_name..])? as usize;
    let key_start = after_name + 4;
    if blob.len() < key_start + key_len || key_len != 32 {
        bail!("unexpected ed25519 key length");
    }
    let mut raw = [0u8; 32];
    raw.copy_from_slice(&blob[key_start..key_start + 32]);
    Ok(raw)
}

#[cfg(test)]
mod test {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn encode_ed25519_ssh_key(verifying: &VerifyingKey) -> String {
        let name = b"ssh-ed25519";
        let mut blob = Vec::new();
        blob.extend((name.len() as u32).to_be_bytes());
        blob.extend(name);
        blob.extend((32u32).to_be_bytes());
        blob.extend(verifying.as_bytes());
        format!("ssh-ed25519 {}", STANDARD.encode(blob))
    }

    #[test]
    fn ed25519_round_trip() {
        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        let verifying_key = signing_key.verifying_key();
        let ssh_key = encode_ed25519_ssh_key(&verifying_key);

        let nonce = "challenge-nonce";
        let signature = signing_key.sign(nonce.as_bytes());
        let sig_b64 = STANDARD.encode(signature.to_bytes());

        assert!(verify_signature(&ssh_key, nonce, &sig_b64).unwrap());
        assert!(!verify_signature(&ssh_key, "other-nonce", &sig_b64).unwrap());
    }

    #[test]
    fn challenge_map_is_one_shot() {
        let map = ChallengeMap::new();
        let nonce = map.issue("alice");
        assert_eq!(map.take("alice"), Some(nonce));
        assert_eq!(map.take("alice"), None);
    }
}
