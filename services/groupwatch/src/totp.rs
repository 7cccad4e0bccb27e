//! RFC 6238 time-based one-time passwords for the VRChat two-factor login

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Standard TOTP time step
pub const STEP_SECONDS: u64 = 30;

const DIGITS: u32 = 6;

/// Compute the 6-digit TOTP code for the given base32 secret at `time`.
///
/// Secrets are accepted the way authenticator apps hand them out: mixed
/// case, optional spacing, optional trailing padding.
pub fn generate(secret_base32: &str, time: SystemTime) -> crate::Result<String> {
    let unix_seconds = time
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    code_for_counter(secret_base32, unix_seconds / STEP_SECONDS)
}

fn code_for_counter(secret_base32: &str, counter: u64) -> crate::Result<String> {
    let normalized = secret_base32
        .trim()
        .trim_end_matches('=')
        .replace(' ', "")
        .to_ascii_uppercase();

    let key = base32::decode(base32::Alphabet::Rfc4648 { padding: false }, &normalized)
        .ok_or_else(|| {
            crate::WatchError::Config("TOTP secret is not valid base32".to_string())
        })?;

    let mut mac = HmacSha1::new_from_slice(&key)
        .map_err(|e| crate::WatchError::Config(format!("TOTP secret rejected: {}", e)))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation per RFC 4226 §5.3
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);
    let code = binary % 10u32.pow(DIGITS);

    Ok(format!("{:06}", code))
}
