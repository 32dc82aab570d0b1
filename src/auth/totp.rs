//! TOTP (RFC 6238) — named an out-of-scope collaborator (`spec.md` §1), but
//! the 2FA lifecycle still needs *something* real at that seam to exercise
//! end to end. This is the minimal direct implementation: SHA-1 HMAC, 30s
//! step, 6 digits. No provisioning-URI QR rendering, no backup codes.

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

const STEP_SECS: i64 = 30;
const DIGITS: u32 = 6;

fn hotp(secret: &[u8], counter: u64) -> u32 {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(&counter.to_be_bytes());
    let hash = mac.finalize().into_bytes();

    let offset = (hash[hash.len() - 1] & 0x0f) as usize;
    let truncated = ((hash[offset] as u32 & 0x7f) << 24)
        | ((hash[offset + 1] as u32) << 16)
        | ((hash[offset + 2] as u32) << 8)
        | (hash[offset + 3] as u32);

    truncated % 10u32.pow(DIGITS)
}

pub fn generate(secret: &[u8], unix_time: i64) -> String {
    let counter = (unix_time / STEP_SECS) as u64;
    format!("{:0width$}", hotp(secret, counter), width = DIGITS as usize)
}

/// Accepts the current and immediately-adjacent windows, to tolerate clock
/// skew between the two ends.
pub fn verify(secret: &[u8], code: &str, unix_time: i64) -> bool {
    let counter = unix_time / STEP_SECS;
    for delta in [-1, 0, 1] {
        let candidate = hotp(secret, (counter + delta) as u64);
        if format!("{:0width$}", candidate, width = DIGITS as usize) == code {
            return true;
        }
    }
    false
}

pub fn generate_secret() -> Vec<u8> {
    let mut bytes = [0u8; 20];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    bytes.to_vec()
}

pub fn provisioning_uri(secret: &[u8], issuer: &str, account: &str) -> String {
    let encoded = base32_encode(secret);
    format!(
        "otpauth://totp/{issuer}:{account}?secret={encoded}&issuer={issuer}&digits={DIGITS}&period={STEP_SECS}"
    )
}

/// RFC 4648 base32, no padding — just enough to print a provisioning URI.
fn base32_encode(bytes: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
    let mut out = String::new();
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for &b in bytes {
        buffer = (buffer << 8) | b as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn generated_code_verifies() {
        let secret = generate_secret();
        let now = 1_700_000_000;
        let code = generate(&secret, now);
        assert!(verify(&secret, &code, now));
    }

    #[test]
    fn wrong_code_fails() {
        let secret = generate_secret();
        let now = 1_700_000_000;
        assert!(!verify(&secret, "000000", now));
    }

    #[test]
    fn tolerates_one_step_of_clock_skew() {
        let secret = generate_secret();
        let now = 1_700_000_000;
        let code = generate(&secret, now);
        assert!(verify(&secret, &code, now + STEP_SECS));
        assert!(!verify(&secret, &code, now + STEP_SECS * 3));
    }
}
