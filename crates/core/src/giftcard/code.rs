use rand::RngCore;

/// Random bytes per generated code.
pub const CODE_BYTES: usize = 16;

/// Length of a generated code in hex characters.
pub const CODE_LEN: usize = CODE_BYTES * 2;

const NAME_CODE_CHARS: usize = 8;

/// Generates a new redemption code: 16 random bytes as uppercase hex.
///
/// Uniqueness is not checked here; the store's unique index on `code`
/// rejects the rare collision.
#[must_use]
pub fn generate_code() -> String {
    let mut bytes = [0u8; CODE_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode_upper(bytes)
}

/// Normalizes user input for code lookup.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Returns true if `code` looks like a generated code.
#[must_use]
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F'))
}

/// Name given to a card issued without one: the prefix plus the first
/// eight characters of the code.
#[must_use]
pub fn default_card_name(prefix: &str, code: &str) -> String {
    let short: String = code.chars().take(NAME_CODE_CHARS).collect();
    format!("{prefix} {short}")
}
