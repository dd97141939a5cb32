//! Minimal decoder for the one event shape this crate cares about.
//!
//! Only `address` and `uint256` parameters are supported. Each indexed
//! parameter occupies one topic after the signature hash; each non-indexed
//! parameter occupies one 32-byte word of the data payload.

use alloy_primitives::{keccak256, Address, B256, U256};

use crate::error::DecodeMismatchError;
use crate::models::RawLog;

const WORD_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Address,
    Uint256,
}

impl ParamKind {
    pub fn canonical_name(&self) -> &'static str {
        match self {
            ParamKind::Address => "address",
            ParamKind::Uint256 => "uint256",
        }
    }

    fn decode_word(&self, name: &str, word: &[u8]) -> Result<DecodedValue, DecodeMismatchError> {
        match self {
            // Right-aligned in the 32-byte word, upper 12 bytes zero
            ParamKind::Address => {
                let (padding, address) = word.split_at(WORD_SIZE - 20);
                if padding.iter().any(|b| *b != 0) {
                    return Err(DecodeMismatchError::DirtyAddressPadding { name: name.to_string() });
                }
                Ok(DecodedValue::Address(Address::from_slice(address)))
            }
            ParamKind::Uint256 => Ok(DecodedValue::Uint(U256::from_be_slice(word))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventParam {
    pub name: String,
    pub kind: ParamKind,
    pub indexed: bool,
}

impl EventParam {
    pub fn new(name: &str, kind: ParamKind, indexed: bool) -> Self {
        Self {
            name: name.to_string(),
            kind,
            indexed,
        }
    }
}

/// Static description of an event: its name and ordered parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSignature {
    pub name: String,
    pub params: Vec<EventParam>,
}

impl EventSignature {
    /// `Transfer(address indexed from, address indexed to, uint256 value)`
    pub fn erc20_transfer() -> Self {
        Self {
            name: "Transfer".to_string(),
            params: vec![
                EventParam::new("from", ParamKind::Address, true),
                EventParam::new("to", ParamKind::Address, true),
                EventParam::new("value", ParamKind::Uint256, false),
            ],
        }
    }

    /// Canonical form used for hashing, e.g. `Transfer(address,address,uint256)`
    pub fn canonical(&self) -> String {
        let types: Vec<&str> = self.params.iter().map(|p| p.kind.canonical_name()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// keccak256 of the canonical signature; the first topic of every matching log
    pub fn topic0(&self) -> B256 {
        keccak256(self.canonical().as_bytes())
    }

    pub fn indexed_count(&self) -> usize {
        self.params.iter().filter(|p| p.indexed).count()
    }

    pub fn non_indexed_count(&self) -> usize {
        self.params.len() - self.indexed_count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedValue {
    Address(Address),
    Uint(U256),
}

/// Decoded parameters in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFields {
    values: Vec<(String, DecodedValue)>,
}

impl DecodedFields {
    pub fn get(&self, name: &str) -> Option<&DecodedValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn address(&self, name: &str) -> Result<Address, DecodeMismatchError> {
        match self.get(name) {
            Some(DecodedValue::Address(address)) => Ok(*address),
            _ => Err(DecodeMismatchError::MissingParameter { name: name.to_string() }),
        }
    }

    pub fn uint(&self, name: &str) -> Result<U256, DecodeMismatchError> {
        match self.get(name) {
            Some(DecodedValue::Uint(value)) => Ok(*value),
            _ => Err(DecodeMismatchError::MissingParameter { name: name.to_string() }),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Decode a raw log against `signature`.
///
/// The topic list must hold exactly the signature hash plus one topic per
/// indexed parameter, and the data payload exactly one word per non-indexed
/// parameter. Anything else is a mismatch; nothing is truncated or padded.
pub fn decode(raw: &RawLog, signature: &EventSignature) -> Result<DecodedFields, DecodeMismatchError> {
    let expected_topics = 1 + signature.indexed_count();
    if raw.topics.len() != expected_topics {
        return Err(DecodeMismatchError::TopicCount {
            expected: expected_topics,
            got: raw.topics.len(),
        });
    }

    let expected_topic0 = signature.topic0();
    if raw.topics[0] != expected_topic0 {
        return Err(DecodeMismatchError::SignatureHash {
            expected: format!("0x{}", hex::encode(expected_topic0.as_slice())),
            got: format!("0x{}", hex::encode(raw.topics[0].as_slice())),
        });
    }

    let expected_data = WORD_SIZE * signature.non_indexed_count();
    if raw.data.len() != expected_data {
        return Err(DecodeMismatchError::DataLength {
            expected: expected_data,
            got: raw.data.len(),
        });
    }

    let mut topics = raw.topics[1..].iter();
    let mut words = raw.data.chunks_exact(WORD_SIZE);
    let mut values = Vec::with_capacity(signature.params.len());

    for param in &signature.params {
        // Lengths were checked above, so both iterators have exactly enough items
        let word = if param.indexed {
            topics.next().map(|t| t.as_slice())
        } else {
            words.next()
        };
        let word = word.ok_or_else(|| DecodeMismatchError::MissingParameter { name: param.name.clone() })?;

        values.push((param.name.clone(), param.kind.decode_word(&param.name, word)?));
    }

    Ok(DecodedFields { values })
}
