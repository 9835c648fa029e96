//! Minimal contract ABI codec.
//!
//! Covers exactly what the report contract needs: 4-byte selectors,
//! `uint256`/`bool`/`string` arguments, and the report tuple returned by
//! `reports(uint256)`. Integers are limited to `u64`; larger values are
//! rejected on decode.

use sha3::{Digest, Keccak256};
use wastewatch_core::{LedgerError, Report, ReportId};

/// ABI word size in bytes.
pub const WORD: usize = 32;

/// Function selector: first four bytes of the Keccak-256 of the signature.
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// ABI argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `uint256`
    Uint(u64),
    /// `bool`
    Bool(bool),
    /// `string`
    Str(String),
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Head/tail encode a list of arguments.
#[must_use]
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Uint(v) => head.extend_from_slice(&uint_word(*v)),
            Token::Bool(b) => head.extend_from_slice(&uint_word(u64::from(*b))),
            Token::Str(s) => {
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u64));
                tail.extend_from_slice(&uint_word(s.len() as u64));
                tail.extend_from_slice(s.as_bytes());
                tail.resize(tail.len().next_multiple_of(WORD), 0);
            }
        }
    }

    head.extend(tail);
    head
}

/// Selector followed by encoded arguments.
#[must_use]
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend(encode(tokens));
    data
}

fn word_at(data: &[u8], offset: usize) -> Result<&[u8], LedgerError> {
    offset
        .checked_add(WORD)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| LedgerError::Abi(format!("return data too short for word at byte {offset}")))
}

fn read_u64(word: &[u8]) -> Result<u64, LedgerError> {
    let (high, low) = word.split_at(WORD - 8);
    if high.iter().any(|b| *b != 0) {
        return Err(LedgerError::Abi("uint256 does not fit in u64".to_string()));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(low);
    Ok(u64::from_be_bytes(buf))
}

fn read_usize(word: &[u8]) -> Result<usize, LedgerError> {
    usize::try_from(read_u64(word)?)
        .map_err(|_| LedgerError::Abi("offset does not fit in usize".to_string()))
}

/// Decode the `uint256` in head slot `index`.
///
/// # Errors
/// `Abi` if the data is short or the value exceeds `u64`.
pub fn decode_uint(data: &[u8], index: usize) -> Result<u64, LedgerError> {
    read_u64(word_at(data, index * WORD)?)
}

/// Decode the `bool` in head slot `index`.
///
/// # Errors
/// `Abi` if the data is short or the word is neither 0 nor 1.
pub fn decode_bool(data: &[u8], index: usize) -> Result<bool, LedgerError> {
    match decode_uint(data, index) {
        Ok(0) => Ok(false),
        Ok(1) => Ok(true),
        Ok(other) => Err(LedgerError::Abi(format!("invalid bool value {other}"))),
        Err(e) => Err(e),
    }
}

/// Decode the `string` whose offset sits in head slot `index`.
///
/// # Errors
/// `Abi` on out-of-range offsets or invalid UTF-8.
pub fn decode_string(data: &[u8], index: usize) -> Result<String, LedgerError> {
    let offset = read_usize(word_at(data, index * WORD)?)?;
    let len = read_usize(word_at(data, offset)?)?;
    let bytes = (offset + WORD)
        .checked_add(len)
        .and_then(|end| data.get(offset + WORD..end))
        .ok_or_else(|| LedgerError::Abi(format!("string of {len} bytes runs past return data")))?;
    String::from_utf8(bytes.to_vec()).map_err(|e| LedgerError::Abi(e.to_string()))
}

/// Decode the `(uint256,string,string,string,bool,uint256)` report tuple.
///
/// # Errors
/// `Abi` on any malformed field.
pub fn decode_report(data: &[u8]) -> Result<Report, LedgerError> {
    Ok(Report {
        id: ReportId(decode_uint(data, 0)?),
        image_url: decode_string(data, 1)?,
        location: decode_string(data, 2)?,
        description: decode_string(data, 3)?,
        completed: decode_bool(data, 4)?,
        timestamp: decode_uint(data, 5)?,
    })
}

/// `0x`-prefixed lowercase hex.
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode hex with or without a `0x` prefix.
///
/// # Errors
/// `Abi` on invalid hex.
pub fn from_hex(text: &str) -> Result<Vec<u8>, LedgerError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits).map_err(|e| LedgerError::Abi(format!("invalid hex: {e}")))
}

/// Parse a JSON-RPC quantity such as `"0x1b4"`.
///
/// # Errors
/// `Abi` on anything that is not hex digits.
pub fn parse_quantity(text: &str) -> Result<u64, LedgerError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    u64::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::Abi(format!("invalid quantity {text:?}: {e}")))
}
