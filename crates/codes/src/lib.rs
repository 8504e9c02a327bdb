//! Transfer and user code generation.
//!
//! A transfer code identifies one send session for its 10-minute
//! lifetime; a user code is the persistent anonymous identity of one
//! client. Neither generator checks the database — the registry layer
//! owns uniqueness.

use rand::Rng;

/// Length of a transfer code in decimal digits.
pub const TRANSFER_CODE_LEN: usize = 6;

/// Length of a persistent user code.
pub const USER_CODE_LEN: usize = 8;

/// Uppercase letters and digits minus the visually ambiguous
/// `I`, `O`, `0`, `1`.
const USER_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Errors from transfer-code validation.
#[derive(Debug, thiserror::Error)]
pub enum CodeError {
    #[error("code must be {} digits", TRANSFER_CODE_LEN)]
    InvalidLength,
}

/// Returns a 6-digit transfer code, uniform over [100000, 999999].
pub fn generate_transfer_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}

/// Returns an 8-character user code drawn from the safe alphabet.
pub fn generate_user_code() -> String {
    let mut rng = rand::thread_rng();
    (0..USER_CODE_LEN)
        .map(|_| USER_CODE_ALPHABET[rng.gen_range(0..USER_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Strips non-digit characters and truncates to the code length.
pub fn sanitize_transfer_code(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(TRANSFER_CODE_LEN)
        .collect()
}

/// Sanitizes `input` and requires exactly 6 digits.
///
/// Rejection happens here, before any network round-trip.
pub fn parse_transfer_code(input: &str) -> Result<String, CodeError> {
    let code = sanitize_transfer_code(input);
    if code.len() != TRANSFER_CODE_LEN {
        return Err(CodeError::InvalidLength);
    }
    Ok(code)
}
