//! Oracle request log decoding.
//!
//! ```text
//! event OracleRequest(
//!     bytes32 indexed specId,     // topic 1: job id, ASCII, zero padded
//!     address requester,          // word 0
//!     bytes32 requestId,          // word 1
//!     uint256 payment,            // word 2
//!     address callbackAddr,       // word 3
//!     bytes4  callbackFunctionId, // word 4
//!     uint256 cancelExpiration,   // word 5
//!     uint256 dataVersion,        // word 6
//!     bytes   data                // word 7: offset of length-prefixed bytes
//! )
//! ```

use num_bigint::BigUint;

use chaintrigger_core::error::ManagerError;

const WORD: usize = 32;
const HEAD_WORDS: usize = 8;

/// Fields of an `OracleRequest` log body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    pub requester: String,
    pub request_id: String,
    pub payment: BigUint,
    pub callback_address: String,
    pub callback_function_id: String,
    pub cancel_expiration: BigUint,
    pub data_version: BigUint,
    /// CBOR-encoded request parameters, hex encoded.
    pub request_data: String,
}

/// Decode the non-indexed body of an `OracleRequest` log.
pub fn decode_oracle_request(data: &str) -> Result<OracleRequest, ManagerError> {
    let bytes = decode_hex(data)?;
    if bytes.len() < HEAD_WORDS * WORD {
        return Err(ManagerError::Decode(format!(
            "oracle request body is {} bytes, need at least {}",
            bytes.len(),
            HEAD_WORDS * WORD
        )));
    }

    let offset = word_as_usize(word(&bytes, 7))
        .ok_or_else(|| ManagerError::Decode("oracle request data offset overflows".into()))?;
    let len_end = offset
        .checked_add(WORD)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| ManagerError::Decode("oracle request data offset out of range".into()))?;
    let len = word_as_usize(&bytes[offset..len_end])
        .ok_or_else(|| ManagerError::Decode("oracle request data length overflows".into()))?;
    let data_end = len_end
        .checked_add(len)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| ManagerError::Decode("oracle request data truncated".into()))?;

    Ok(OracleRequest {
        requester: address_from_word(word(&bytes, 0)),
        request_id: prefixed_hex(word(&bytes, 1)),
        payment: BigUint::from_bytes_be(word(&bytes, 2)),
        callback_address: address_from_word(word(&bytes, 3)),
        callback_function_id: prefixed_hex(&word(&bytes, 4)[..4]),
        cancel_expiration: BigUint::from_bytes_be(word(&bytes, 5)),
        data_version: BigUint::from_bytes_be(word(&bytes, 6)),
        request_data: prefixed_hex(&bytes[len_end..data_end]),
    })
}

/// Recover the job id stored in an indexed `bytes32` topic.
///
/// Job ids are ASCII strings right-padded with zero bytes. A topic that is
/// not printable ASCII is returned as lowercase hex.
pub fn job_id_from_topic(topic: &str) -> Result<String, ManagerError> {
    let bytes = decode_hex(topic)?;
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    let trimmed = &bytes[..end];
    if !trimmed.is_empty() && trimmed.iter().all(|b| b.is_ascii_graphic()) {
        Ok(String::from_utf8_lossy(trimmed).into_owned())
    } else {
        Ok(prefixed_hex(&bytes))
    }
}

fn word(bytes: &[u8], index: usize) -> &[u8] {
    &bytes[index * WORD..(index + 1) * WORD]
}

fn decode_hex(s: &str) -> Result<Vec<u8>, ManagerError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| ManagerError::Decode(format!("invalid hex '{s}': {e}")))
}

fn prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn address_from_word(word: &[u8]) -> String {
    prefixed_hex(&word[WORD - 20..])
}

fn word_as_usize(word: &[u8]) -> Option<usize> {
    let (high, low) = word.split_at(WORD - 8);
    if high.iter().any(|b| *b != 0) {
        return None;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(low);
    usize::try_from(u64::from_be_bytes(buf)).ok()
}
