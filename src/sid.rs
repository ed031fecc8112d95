//! Short identifiers derived from paste digests.
//!
//! A sid is the digest read as a big-endian number and written in base 66,
//! least significant digit first, zero-padded to the requested length.
//! Every position of a sid spreads over the whole alphabet, so a short sid
//! names the digests sharing its low digits.

use thiserror::Error;

/// Digits of the encoding, in ascending order.
pub const ALPHABET: &[u8; 66] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_~.";

/// Length of the short sid.
pub const SHORT_LENGTH: usize = 6;

/// Length of the long sid.
pub const LONG_LENGTH: usize = 42;

const BASE: u32 = ALPHABET.len() as u32;

/// Error returned when decoding a sid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Character outside of [`ALPHABET`].
    #[error("invalid sid character {0:?}")]
    InvalidCharacter(char),
    /// Decoded value does not fit in the requested width.
    #[error("sid does not fit in digest")]
    Overflow,
}

/// Returns the bytes a digest string stands for.
///
/// Hex digests are decoded; anything else is taken as raw bytes.
pub fn digest_bytes(digest: &str) -> Vec<u8> {
    if digest.len() % 2 == 0 && digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        digest
            .as_bytes()
            .chunks(2)
            .filter_map(|pair| std::str::from_utf8(pair).ok())
            .filter_map(|pair| u8::from_str_radix(pair, 16).ok())
            .collect()
    } else {
        digest.as_bytes().to_vec()
    }
}

/// Encodes the digest into exactly `length` digits.
///
/// Digits past the width of the digest are zeros (`A`); a shorter length
/// keeps the low digits.
pub fn encode(digest: &str, length: usize) -> String {
    let mut number = digest_bytes(digest);
    (0..length)
        .map(|_| char::from(ALPHABET[divmod(&mut number, BASE) as usize]))
        .collect()
}

/// Decodes a sid back into `bytes` bytes.
///
/// The sid must carry every non-zero digit of the digest, as a long sid does.
pub fn decode(sid: &str, bytes: usize) -> Result<Vec<u8>, DecodeError> {
    let mut number = vec![0u8; bytes];
    for c in sid.chars().rev() {
        let digit = ALPHABET
            .iter()
            .position(|&a| char::from(a) == c)
            .ok_or(DecodeError::InvalidCharacter(c))?;
        let mut carry = digit as u32;
        for byte in number.iter_mut().rev() {
            let value = u32::from(*byte) * BASE + carry;
            *byte = (value & 0xff) as u8;
            carry = value >> 8;
        }
        if carry != 0 {
            return Err(DecodeError::Overflow);
        }
    }
    Ok(number)
}

/// Divides the big-endian number in place and returns the remainder.
fn divmod(number: &mut [u8], divisor: u32) -> u32 {
    let mut remainder = 0u32;
    for byte in number.iter_mut() {
        let value = (remainder << 8) | u32::from(*byte);
        *byte = (value / divisor) as u8;
        remainder = value % divisor;
    }
    remainder
}
