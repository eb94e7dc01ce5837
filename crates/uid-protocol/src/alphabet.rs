//! UID character set
//!
//! UIDs are drawn from 64 symbols. The order below is also the order in
//! which the scanner explores children of a collision.

/// The 64 UID symbols in exploration order: `0-9 A-Z a-z - _`
pub const ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

/// Returns true if `c` is one of the 64 UID symbols
pub fn is_alphabet_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Iterate the alphabet as `char`s in exploration order
pub fn symbols() -> impl DoubleEndedIterator<Item = char> + ExactSizeIterator {
    ALPHABET.iter().map(|&b| b as char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_membership_agrees_with_table() {
        for b in 0u8..=127 {
            let c = b as char;
            assert_eq!(is_alphabet_char(c), ALPHABET.contains(&b), "char {:?}", c);
        }
    }

    #[test]
    fn test_symbols_order() {
        let all: String = symbols().collect();
        assert!(all.starts_with("0123456789ABC"));
        assert!(all.ends_with("xyz-_"));
        assert_eq!(symbols().len(), 64);
    }

    #[test]
    fn test_non_ascii_rejected() {
        assert!(!is_alphabet_char('é'));
        assert!(!is_alphabet_char(' '));
        assert!(!is_alphabet_char(':'));
    }
}
