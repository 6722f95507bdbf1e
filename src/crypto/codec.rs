//! Text encoding of ciphertext and key material.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::error::CryptoError;

/// Encode bytes as standard, padded base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode base64 text back into bytes.
///
/// Surrounding whitespace is ignored so pasted values with a trailing newline
/// still decode. Lengths are not checked here; the engines do that.
pub fn decode(text: &str) -> Result<Vec<u8>, CryptoError> {
    Ok(STANDARD.decode(text.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn decode_inverts_encode(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(decode(&encode(&bytes)).unwrap(), bytes);
        }
    }

    #[test]
    fn empty_input_encodes_to_empty_text() {
        assert_eq!(encode(&[]), "");
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn trailing_newline_is_ignored() {
        assert_eq!(decode("aGVsbG8=\n").unwrap(), b"hello");
    }

    #[test]
    fn malformed_text_fails() {
        assert!(matches!(decode("not base64!"), Err(CryptoError::Encoding(_))));
        assert!(matches!(decode("aGVsbG8"), Err(CryptoError::Encoding(_))));
    }
}
