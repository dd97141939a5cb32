use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::blockchain::event_decoder::{decode, EventSignature};
use crate::error::DecodeMismatchError;
use crate::models::{format_units, DecodedTransfer, RawLog};

/// How decoded addresses are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFormat {
    /// `0x` followed by 40 lowercase hex digits
    #[default]
    Lowercase,
    /// EIP-55 mixed-case checksum
    Checksum,
}

impl AddressFormat {
    pub fn render(&self, address: &Address) -> String {
        match self {
            AddressFormat::Lowercase => format!("0x{}", hex::encode(address.as_slice())),
            AddressFormat::Checksum => address.to_checksum(None),
        }
    }
}

impl FromStr for AddressFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowercase" => Ok(AddressFormat::Lowercase),
            "checksum" => Ok(AddressFormat::Checksum),
            other => Err(format!("unknown address format: {}", other)),
        }
    }
}

/// Turns ERC-20 `Transfer` logs into display-ready records
#[derive(Debug, Clone)]
pub struct TransferDecoder {
    signature: EventSignature,
    decimals: u8,
    address_format: AddressFormat,
}

impl TransferDecoder {
    pub fn new(decimals: u8, address_format: AddressFormat) -> Self {
        Self {
            signature: EventSignature::erc20_transfer(),
            decimals,
            address_format,
        }
    }

    pub fn signature(&self) -> &EventSignature {
        &self.signature
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn decode_transfer(&self, log: &RawLog) -> Result<DecodedTransfer, DecodeMismatchError> {
        let fields = decode(log, &self.signature)?;

        let from = fields.address("from")?;
        let to = fields.address("to")?;
        let value = fields.uint("value")?;

        Ok(DecodedTransfer {
            from: self.address_format.render(&from),
            to: self.address_format.render(&to),
            amount: format_units(value, self.decimals),
            tx_hash: format!("0x{}", hex::encode(log.transaction_hash.as_slice())),
            block_number: log.block_number,
            log_index: log.log_index,
        })
    }
}

/// Strip an optional `0x` prefix and lowercase
pub fn normalize_address(address: &str) -> String {
    let addr = address.trim();
    if addr.starts_with("0x") || addr.starts_with("0X") {
        addr[2..].to_lowercase()
    } else {
        addr.to_lowercase()
    }
}

/// Parse a hex address, insisting on exactly 20 bytes
pub fn validate_address(address: &str) -> Result<Address, String> {
    let normalized = normalize_address(address);

    if !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("address contains non-hexadecimal characters".to_string());
    }

    if normalized.len() != 40 {
        return Err(format!(
            "address must be 20 bytes (40 hex characters), got {} characters",
            normalized.len()
        ));
    }

    Address::from_str(&normalized).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, U256};

    fn sample_log(amount: u64) -> RawLog {
        let signature = EventSignature::erc20_transfer();
        RawLog {
            address: validate_address("0xdAC17F958D2ee523a2206206994597C13D831ec7").unwrap(),
            topics: vec![
                signature.topic0(),
                B256::left_padding_from(Address::repeat_byte(0xaa).as_slice()),
                B256::left_padding_from(&hex::decode("f977814e90da44bfa03b6295a0616a897441acec").unwrap()),
            ],
            data: B256::from(U256::from(amount)).to_vec(),
            block_number: 950,
            transaction_hash: B256::repeat_byte(0xab),
            log_index: 2,
        }
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address("0xF977814e90dA44bFA03b6295A0616a897441aceC"),
            "f977814e90da44bfa03b6295a0616a897441acec"
        );
        assert_eq!(
            normalize_address("F977814e90dA44bFA03b6295A0616a897441aceC"),
            "f977814e90da44bfa03b6295a0616a897441acec"
        );
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("0xdAC17F958D2ee523a2206206994597C13D831ec7").is_ok());
        assert!(validate_address("f977814e90da44bfa03b6295a0616a897441acec").is_ok());

        assert!(validate_address("0xf977814e90da44bfa03b6295a0616a897441ace").is_err()); // Too short
        assert!(validate_address("0xf977814e90da44bfa03b6295a0616a897441acecc").is_err()); // Too long
        assert!(validate_address("0xg977814e90da44bfa03b6295a0616a897441acec").is_err()); // Invalid hex
    }

    #[test]
    fn test_decode_transfer_lowercase() {
        let decoder = TransferDecoder::new(6, AddressFormat::Lowercase);
        let transfer = decoder.decode_transfer(&sample_log(2_500_000)).unwrap();

        assert_eq!(transfer.from, "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(transfer.to, "0xf977814e90da44bfa03b6295a0616a897441acec");
        assert_eq!(transfer.amount, "2.5");
        assert_eq!(transfer.tx_hash, format!("0x{}", "ab".repeat(32)));
        assert_eq!(transfer.block_number, 950);
        assert_eq!(transfer.log_index, 2);
    }

    #[test]
    fn test_decode_transfer_checksum() {
        let decoder = TransferDecoder::new(6, AddressFormat::Checksum);
        let transfer = decoder.decode_transfer(&sample_log(1)).unwrap();

        assert_eq!(transfer.to, "0xF977814e90dA44bFA03b6295A0616a897441aceC");
        assert_eq!(transfer.amount, "0.000001");
    }

    #[test]
    fn test_decode_transfer_rejects_short_topics() {
        let decoder = TransferDecoder::new(6, AddressFormat::Lowercase);
        let mut log = sample_log(1);
        log.topics.truncate(1);

        assert_eq!(
            decoder.decode_transfer(&log).unwrap_err(),
            DecodeMismatchError::TopicCount { expected: 3, got: 1 }
        );
    }

    #[test]
    fn test_address_format_parsing() {
        assert_eq!("lowercase".parse::<AddressFormat>().unwrap(), AddressFormat::Lowercase);
        assert_eq!("Checksum".parse::<AddressFormat>().unwrap(), AddressFormat::Checksum);
        assert!("mixed".parse::<AddressFormat>().is_err());
    }
}
