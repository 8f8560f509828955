//! Raw transaction inspection: hash precomputation and log summaries.
//!
//! The delayer hands a tx hash back to the caller before the L1 node has
//! seen the tx, so it has to derive the exact hash the node will report.
//! For most envelopes that is `keccak256(raw)`. EIP-4844 blob txs are
//! submitted in network form, `0x03 || rlp([tx_payload_body, blobs,
//! commitments, proofs])`, but hashed without the sidecar, i.e.
//! `keccak256(0x03 || rlp(tx_payload_body))`.

use crate::domain::errors::DelayerError;
use crate::domain::types::{Address, Hash};
use rlp::Rlp;
use sha3::{Digest, Keccak256};
use std::borrow::Cow;

/// EIP-2718 type byte of blob-carrying transactions (EIP-4844)
pub const BLOB_TX_TYPE: u8 = 0x03;

/// Minimum element count of a blob tx network wrapper
const MIN_BLOB_WRAPPER_ITEMS: usize = 4;

/// Transaction envelope type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxType {
    Legacy,
    AccessList, // EIP-2930
    DynamicFee, // EIP-1559
    Blob,       // EIP-4844
    SetCode,    // EIP-7702
    Unknown(u8),
}

impl TxType {
    pub fn is_blob(&self) -> bool {
        matches!(self, TxType::Blob)
    }
}

/// Keccak-256 digest of arbitrary bytes
pub fn keccak256(data: &[u8]) -> Hash {
    Hash::from_slice(&Keccak256::digest(data))
}

/// Compute the hash the L1 node will assign to this raw transaction.
pub fn compute_tx_hash(raw: &[u8]) -> Result<Hash, DelayerError> {
    let canonical = canonical_payload(raw)?;
    Ok(keccak256(&canonical))
}

/// Canonical encoding of a raw transaction.
///
/// Blob txs in network form are returned with blobs, commitments and proofs
/// stripped. Anything else is returned untouched.
pub fn canonical_payload(raw: &[u8]) -> Result<Cow<'_, [u8]>, DelayerError> {
    if raw.first() != Some(&BLOB_TX_TYPE) {
        return Ok(Cow::Borrowed(raw));
    }

    let outer = Rlp::new(&raw[1..]);
    if !outer.is_list() {
        return Err(DelayerError::InvalidTransaction(
            "Blob transaction must be RLP list".into(),
        ));
    }

    let encoded_len = outer.payload_info()?.total();
    if encoded_len != raw.len() - 1 {
        return Err(DelayerError::InvalidTransaction(format!(
            "Blob transaction has {} trailing bytes",
            (raw.len() - 1).saturating_sub(encoded_len)
        )));
    }

    let body = outer.at(0)?;
    if !body.is_list() {
        // Already canonical: [chainId, nonce, ...] without sidecar
        return Ok(Cow::Borrowed(raw));
    }

    let item_count = outer.item_count()?;
    if item_count < MIN_BLOB_WRAPPER_ITEMS {
        return Err(DelayerError::InvalidTransaction(format!(
            "Blob transaction wrapper must have at least {} fields, got {}",
            MIN_BLOB_WRAPPER_ITEMS, item_count
        )));
    }

    let body = body.as_raw();
    let mut canonical = Vec::with_capacity(1 + body.len());
    canonical.push(BLOB_TX_TYPE);
    canonical.extend_from_slice(body);
    Ok(Cow::Owned(canonical))
}

/// Loggable view of a raw transaction. Calldata and sidecars are omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSummary {
    pub tx_type: TxType,
    pub chain_id: Option<u64>,
    pub nonce: u64,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub blob_versioned_hashes: usize,
    pub blobs: usize,
    pub has_sidecars: bool,
    pub size: usize,
}

impl TxSummary {
    /// Decode the summary fields from a raw transaction.
    pub fn decode(raw: &[u8]) -> Result<Self, DelayerError> {
        let (tx_type, payload) = detect_tx_type(raw)?;
        let outer = Rlp::new(payload);
        if !outer.is_list() {
            return Err(DelayerError::InvalidTransaction(
                "Transaction must be RLP list".into(),
            ));
        }

        let summary = match tx_type {
            TxType::Legacy => {
                // [nonce, gasPrice, gasLimit, to, value, data, v, r, s]
                let v = decode_u64(&outer, 6)?;
                TxSummary {
                    tx_type,
                    chain_id: if v >= 35 { Some((v - 35) / 2) } else { None },
                    nonce: decode_u64(&outer, 0)?,
                    gas_limit: decode_u64(&outer, 2)?,
                    to: decode_optional_address(&outer, 3)?,
                    blob_versioned_hashes: 0,
                    blobs: 0,
                    has_sidecars: false,
                    size: raw.len(),
                }
            }
            TxType::AccessList => {
                // [chainId, nonce, gasPrice, gasLimit, to, value, data, accessList, yParity, r, s]
                TxSummary {
                    tx_type,
                    chain_id: Some(decode_u64(&outer, 0)?),
                    nonce: decode_u64(&outer, 1)?,
                    gas_limit: decode_u64(&outer, 3)?,
                    to: decode_optional_address(&outer, 4)?,
                    blob_versioned_hashes: 0,
                    blobs: 0,
                    has_sidecars: false,
                    size: raw.len(),
                }
            }
            TxType::DynamicFee | TxType::SetCode => {
                // [chainId, nonce, maxPriorityFeePerGas, maxFeePerGas, gasLimit, to, ...]
                TxSummary {
                    tx_type,
                    chain_id: Some(decode_u64(&outer, 0)?),
                    nonce: decode_u64(&outer, 1)?,
                    gas_limit: decode_u64(&outer, 4)?,
                    to: decode_optional_address(&outer, 5)?,
                    blob_versioned_hashes: 0,
                    blobs: 0,
                    has_sidecars: false,
                    size: raw.len(),
                }
            }
            TxType::Blob => decode_blob_summary(&outer, raw.len())?,
            TxType::Unknown(byte) => {
                return Err(DelayerError::InvalidTransaction(format!(
                    "Unknown transaction type: 0x{:02x}",
                    byte
                )))
            }
        };

        Ok(summary)
    }
}

fn decode_blob_summary(outer: &Rlp, size: usize) -> Result<TxSummary, DelayerError> {
    let wrapped = outer.at(0)?.is_list();
    let body = if wrapped {
        outer.at(0)?
    } else {
        Rlp::new(outer.as_raw())
    };

    // Sidecar layout: [body, blobs, commitments, proofs] or
    // [body, wrapperVersion, blobs, commitments, cellProofs]
    let blobs = if wrapped {
        let blobs_index = if outer.item_count()? > MIN_BLOB_WRAPPER_ITEMS { 2 } else { 1 };
        outer.at(blobs_index)?.item_count()?
    } else {
        0
    };

    // [chainId, nonce, maxPriorityFeePerGas, maxFeePerGas, gasLimit, to, value,
    //  data, accessList, maxFeePerBlobGas, blobVersionedHashes, yParity, r, s]
    Ok(TxSummary {
        tx_type: TxType::Blob,
        chain_id: Some(decode_u64(&body, 0)?),
        nonce: decode_u64(&body, 1)?,
        gas_limit: decode_u64(&body, 4)?,
        to: decode_optional_address(&body, 5)?,
        blob_versioned_hashes: body.at(10)?.item_count()?,
        blobs,
        has_sidecars: wrapped,
        size,
    })
}

/// Detect transaction type from first byte
fn detect_tx_type(raw: &[u8]) -> Result<(TxType, &[u8]), DelayerError> {
    let first_byte = *raw
        .first()
        .ok_or_else(|| DelayerError::InvalidTransaction("Empty transaction".into()))?;

    // EIP-2718: typed envelopes start with a byte <= 0x7f,
    // legacy txs with an RLP list prefix (0xc0-0xff)
    if first_byte <= 0x7f {
        let tx_type = match first_byte {
            0x01 => TxType::AccessList,
            0x02 => TxType::DynamicFee,
            BLOB_TX_TYPE => TxType::Blob,
            0x04 => TxType::SetCode,
            other => TxType::Unknown(other),
        };
        Ok((tx_type, &raw[1..]))
    } else if first_byte >= 0xc0 {
        Ok((TxType::Legacy, raw))
    } else {
        Err(DelayerError::InvalidTransaction(format!(
            "Invalid envelope prefix: 0x{:02x}",
            first_byte
        )))
    }
}

fn decode_u64(rlp: &Rlp, index: usize) -> Result<u64, DelayerError> {
    rlp.at(index)
        .and_then(|r| r.as_val())
        .map_err(|e| DelayerError::InvalidTransaction(format!("field {}: {:?}", index, e)))
}

fn decode_optional_address(rlp: &Rlp, index: usize) -> Result<Option<Address>, DelayerError> {
    let item = rlp.at(index)?;
    let bytes = item.data()?;
    match bytes.len() {
        0 => Ok(None),
        20 => Ok(Some(Address::from_slice(bytes))),
        len => Err(DelayerError::InvalidTransaction(format!(
            "Invalid address length at field {}: {} bytes",
            index, len
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;
    use proptest::prelude::*;

    #[test]
    fn test_legacy_hash_is_plain_digest() {
        let raw = fixtures::legacy_tx(3);
        assert_eq!(compute_tx_hash(&raw).unwrap(), keccak256(&raw));
    }

    #[test]
    fn test_dynamic_fee_hash_is_plain_digest() {
        let raw = fixtures::dynamic_fee_tx(7);
        assert_eq!(compute_tx_hash(&raw).unwrap(), keccak256(&raw));
        assert!(matches!(canonical_payload(&raw).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_blob_wrapper_is_stripped() {
        let body = fixtures::blob_tx(1, 2);
        let network = fixtures::blob_tx_network(1, 2);

        let hash = compute_tx_hash(&network).unwrap();
        assert_eq!(hash, keccak256(&body));
        assert_ne!(hash, keccak256(&network));
        assert_eq!(canonical_payload(&network).unwrap().as_ref(), &body[..]);
    }

    #[test]
    fn test_blob_cell_proof_wrapper_is_stripped() {
        let body = fixtures::blob_tx(4, 1);
        let network = fixtures::blob_tx_network_with_cell_proofs(4, 1);

        assert_eq!(compute_tx_hash(&network).unwrap(), keccak256(&body));
    }

    #[test]
    fn test_canonical_blob_tx_hashes_as_is() {
        let body = fixtures::blob_tx(1, 2);
        assert_eq!(compute_tx_hash(&body).unwrap(), keccak256(&body));
    }

    #[test]
    fn test_malformed_blob_tx_rejected() {
        assert!(matches!(
            compute_tx_hash(&[BLOB_TX_TYPE]),
            Err(DelayerError::InvalidTransaction(_))
        ));
        assert!(matches!(
            compute_tx_hash(&[BLOB_TX_TYPE, 0x82, 0x01, 0x02]),
            Err(DelayerError::InvalidTransaction(_))
        ));
    }

    #[test]
    fn test_blob_tx_with_trailing_bytes_rejected() {
        for tx in [fixtures::blob_tx_network(0, 1), fixtures::blob_tx(0, 1)] {
            let mut raw = tx.to_vec();
            raw.extend_from_slice(&[0xde, 0xad]);
            assert!(matches!(
                compute_tx_hash(&raw),
                Err(DelayerError::InvalidTransaction(_))
            ));
        }
    }

    #[test]
    fn test_short_blob_wrapper_rejected() {
        let mut stream = rlp::RlpStream::new_list(2);
        stream.append_raw(&fixtures::blob_tx(1, 1)[1..], 1);
        stream.begin_list(0);
        let mut raw = vec![BLOB_TX_TYPE];
        raw.extend_from_slice(&stream.out());

        assert!(matches!(
            compute_tx_hash(&raw),
            Err(DelayerError::InvalidTransaction(_))
        ));
    }

    #[test]
    fn test_summary_legacy() {
        let summary = TxSummary::decode(&fixtures::legacy_tx(3)).unwrap();
        assert_eq!(summary.tx_type, TxType::Legacy);
        assert_eq!(summary.nonce, 3);
        assert_eq!(summary.chain_id, Some(1));
        assert_eq!(summary.to, Some(fixtures::recipient()));
        assert!(!summary.has_sidecars);
    }

    #[test]
    fn test_summary_dynamic_fee() {
        let summary = TxSummary::decode(&fixtures::dynamic_fee_tx(9)).unwrap();
        assert_eq!(summary.tx_type, TxType::DynamicFee);
        assert_eq!(summary.nonce, 9);
        assert_eq!(summary.chain_id, Some(fixtures::CHAIN_ID));
        assert_eq!(summary.gas_limit, fixtures::GAS_LIMIT);
    }

    #[test]
    fn test_summary_blob_network_form() {
        let summary = TxSummary::decode(&fixtures::blob_tx_network(2, 3)).unwrap();
        assert!(summary.tx_type.is_blob());
        assert_eq!(summary.nonce, 2);
        assert_eq!(summary.blobs, 3);
        assert_eq!(summary.blob_versioned_hashes, 3);
        assert!(summary.has_sidecars);
    }

    #[test]
    fn test_summary_blob_cell_proof_form() {
        let summary =
            TxSummary::decode(&fixtures::blob_tx_network_with_cell_proofs(2, 2)).unwrap();
        assert_eq!(summary.blobs, 2);
        assert!(summary.has_sidecars);
    }

    #[test]
    fn test_summary_unknown_type() {
        assert!(TxSummary::decode(&[0x7e, 0xc0]).is_err());
        assert!(TxSummary::decode(&[]).is_err());
        assert!(TxSummary::decode(&[0x85, 0x01]).is_err());
    }

    proptest! {
        #[test]
        fn prop_non_blob_payload_hashes_raw_bytes(raw in proptest::collection::vec(any::<u8>(), 0..256)) {
            prop_assume!(raw.first() != Some(&BLOB_TX_TYPE));
            prop_assert_eq!(compute_tx_hash(&raw).unwrap(), keccak256(&raw));
        }
    }
}
