//! Random hex tokens for cart line ids and visitor session ids.

use core::fmt::Write as _;

use rand::RngCore;

/// Generate `len` random lowercase hex characters.
///
/// ```
/// use emporium_core::types::random_hex;
///
/// let token = random_hex(12);
/// assert_eq!(token.len(), 12);
/// assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len.div_ceil(2)];
    rand::rng().fill_bytes(&mut bytes);

    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out.truncate(len);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_hex_odd_length() {
        let token = random_hex(7);
        assert_eq!(token.len(), 7);
        assert!(token.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[test]
    fn test_random_hex_differs() {
        assert_ne!(random_hex(32), random_hex(32));
    }
}
