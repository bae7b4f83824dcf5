use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use rand::RngCore;

use super::CryptoError;

pub const SALT_LENGTH: usize = 16;
pub const HASH_LENGTH: usize = 32;

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Hash a password with PBKDF2-SHA256 into a self-describing PHC string
/// (`$pbkdf2-sha256$i=<rounds>,l=32$<salt>$<hash>`).
pub fn hash_password(plain: &str, rounds: u32) -> Result<String, CryptoError> {
    let salt = SaltString::encode_b64(&generate_salt())
        .map_err(|e| CryptoError::HashFailed(e.to_string()))?;
    let params = Params {
        rounds,
        output_length: HASH_LENGTH,
    };
    let hash = Pbkdf2
        .hash_password_customized(plain.as_bytes(), None, None, params, &salt)
        .map_err(|e| CryptoError::HashFailed(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string. Rounds and salt come from
/// the stored value, so hashes made with older settings keep verifying.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool, CryptoError> {
    let parsed = PasswordHash::new(stored).map_err(|_| CryptoError::MalformedHash)?;
    Ok(Pbkdf2.verify_password(plain.as_bytes(), &parsed).is_ok())
}
