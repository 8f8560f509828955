//! Test utilities for the transaction delayer.
//!
//! This module provides an in-memory L1 client and raw transaction fixtures
//! for deterministic testing. Enable with the `test-utils` feature flag.

use crate::domain::transaction::compute_tx_hash;
use crate::domain::types::{Address, BlockNumber, Bytes, Hash, SignerKind, Timestamp};
use crate::ports::outbound::{ClientError, L1Client};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// A submission as seen by the mock node, with the head at arrival time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSubmission {
    pub raw: Bytes,
    pub block_number: BlockNumber,
    pub timestamp: Timestamp,
}

#[derive(Debug)]
struct MockChain {
    head: BlockNumber,
    anchor_block: BlockNumber,
    anchor_timestamp: Timestamp,
    slot_secs: u64,
}

impl MockChain {
    fn timestamp_of(&self, block: BlockNumber) -> Timestamp {
        if block >= self.anchor_block {
            self.anchor_timestamp + (block - self.anchor_block) * self.slot_secs
        } else {
            self.anchor_timestamp
                .saturating_sub((self.anchor_block - block) * self.slot_secs)
        }
    }
}

/// In-memory L1 node with a manually advanced head.
///
/// Blocks are produced every `slot_secs` seconds of chain time, but only when
/// the test calls `mine_block`/`set_block`. Submissions are recorded, never
/// mined.
#[derive(Debug)]
pub struct MockL1Client {
    chain: Mutex<MockChain>,
    submissions: Mutex<Vec<RecordedSubmission>>,
    signer_kind: SignerKind,
    hash_override: Mutex<Option<Hash>>,
    rejection: Mutex<Option<ClientError>>,
    block_number_queries: AtomicU64,
    timestamp_queries: AtomicU64,
}

impl MockL1Client {
    /// Create a local-signing client whose head is `block` at `timestamp`.
    pub fn new(block: BlockNumber, timestamp: Timestamp, slot_secs: u64) -> Self {
        Self::with_signer(block, timestamp, slot_secs, SignerKind::Local)
    }

    /// Create a client whose transactions are signed by the node.
    pub fn remote_signer(block: BlockNumber, timestamp: Timestamp, slot_secs: u64) -> Self {
        Self::with_signer(block, timestamp, slot_secs, SignerKind::Remote)
    }

    fn with_signer(
        block: BlockNumber,
        timestamp: Timestamp,
        slot_secs: u64,
        signer_kind: SignerKind,
    ) -> Self {
        Self {
            chain: Mutex::new(MockChain {
                head: block,
                anchor_block: block,
                anchor_timestamp: timestamp,
                slot_secs,
            }),
            submissions: Mutex::new(Vec::new()),
            signer_kind,
            hash_override: Mutex::new(None),
            rejection: Mutex::new(None),
            block_number_queries: AtomicU64::new(0),
            timestamp_queries: AtomicU64::new(0),
        }
    }

    /// Advance the head by one block, returning the new head.
    pub fn mine_block(&self) -> BlockNumber {
        let mut chain = self.chain.lock();
        chain.head += 1;
        chain.head
    }

    /// Move the head to `block` (never backwards).
    pub fn set_block(&self, block: BlockNumber) {
        let mut chain = self.chain.lock();
        chain.head = chain.head.max(block);
    }

    pub fn current_block(&self) -> BlockNumber {
        self.chain.lock().head
    }

    pub fn current_timestamp(&self) -> Timestamp {
        let chain = self.chain.lock();
        chain.timestamp_of(chain.head)
    }

    /// Make the node report `hash` for every accepted tx.
    pub fn override_hash(&self, hash: Hash) {
        *self.hash_override.lock() = Some(hash);
    }

    /// Make the node reject every submission with `error` (`None` to accept again).
    pub fn reject_submissions(&self, error: Option<ClientError>) {
        *self.rejection.lock() = error;
    }

    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.lock().clone()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().len()
    }

    pub fn block_number_queries(&self) -> u64 {
        self.block_number_queries.load(Ordering::Relaxed)
    }

    pub fn timestamp_queries(&self) -> u64 {
        self.timestamp_queries.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl L1Client for MockL1Client {
    /// Requests are "signed" as-is: the request bytes are the raw tx.
    type Request = Bytes;

    fn signer_kind(&self) -> SignerKind {
        self.signer_kind
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<Hash, ClientError> {
        let rejection = self.rejection.lock().clone();
        if let Some(error) = rejection {
            return Err(error);
        }

        let forced_hash = *self.hash_override.lock();
        let hash = match forced_hash {
            Some(hash) => hash,
            None => compute_tx_hash(&raw).map_err(|e| ClientError::Rejected(e.to_string()))?,
        };

        let (block_number, timestamp) = {
            let chain = self.chain.lock();
            (chain.head, chain.timestamp_of(chain.head))
        };
        self.submissions.lock().push(RecordedSubmission {
            raw,
            block_number,
            timestamp,
        });

        Ok(hash)
    }

    async fn block_number(&self) -> Result<BlockNumber, ClientError> {
        self.block_number_queries.fetch_add(1, Ordering::Relaxed);
        Ok(self.current_block())
    }

    async fn block_timestamp(&self, number: BlockNumber) -> Result<Timestamp, ClientError> {
        self.timestamp_queries.fetch_add(1, Ordering::Relaxed);
        let chain = self.chain.lock();
        if number > chain.head {
            return Err(ClientError::BlockNotFound(number));
        }
        Ok(chain.timestamp_of(number))
    }

    async fn sign_transaction(&self, request: &Bytes) -> Result<Bytes, ClientError> {
        match self.signer_kind {
            SignerKind::Local => Ok(request.clone()),
            SignerKind::Remote => Err(ClientError::Unsupported(
                "no local account to sign with".into(),
            )),
        }
    }
}

/// Raw transaction fixtures built with `rlp::RlpStream`.
pub mod fixtures {
    use super::*;
    use rlp::RlpStream;

    pub const CHAIN_ID: u64 = 31337;
    pub const GAS_LIMIT: u64 = 100_000;
    const GAS_PRICE: u64 = 1_000_000_000;

    pub fn recipient() -> Address {
        Address::repeat_byte(0x42)
    }

    fn append_signature(stream: &mut RlpStream, v: u64) {
        stream.append(&v);
        stream.append(&vec![0x11u8; 32]);
        stream.append(&vec![0x22u8; 32]);
    }

    fn typed(tx_type: u8, payload: &[u8]) -> Bytes {
        let mut raw = Vec::with_capacity(1 + payload.len());
        raw.push(tx_type);
        raw.extend_from_slice(payload);
        Bytes::from(raw)
    }

    /// EIP-155 legacy transfer on chain 1
    pub fn legacy_tx(nonce: u64) -> Bytes {
        let mut stream = RlpStream::new_list(9);
        stream.append(&nonce);
        stream.append(&GAS_PRICE);
        stream.append(&GAS_LIMIT);
        stream.append(&recipient().as_bytes().to_vec());
        stream.append(&1u64);
        stream.append(&Vec::<u8>::new());
        append_signature(&mut stream, 37);
        Bytes::from(stream.out().to_vec())
    }

    /// EIP-1559 contract call
    pub fn dynamic_fee_tx(nonce: u64) -> Bytes {
        let mut stream = RlpStream::new_list(12);
        stream.append(&CHAIN_ID);
        stream.append(&nonce);
        stream.append(&GAS_PRICE);
        stream.append(&(2 * GAS_PRICE));
        stream.append(&GAS_LIMIT);
        stream.append(&recipient().as_bytes().to_vec());
        stream.append(&0u64);
        stream.append(&vec![0xa9u8, 0x05, 0x9c, 0xbb]);
        stream.begin_list(0);
        append_signature(&mut stream, 1);
        typed(0x02, &stream.out())
    }

    fn blob_tx_body(nonce: u64, blobs: usize) -> Vec<u8> {
        let mut stream = RlpStream::new_list(14);
        stream.append(&CHAIN_ID);
        stream.append(&nonce);
        stream.append(&GAS_PRICE);
        stream.append(&(2 * GAS_PRICE));
        stream.append(&GAS_LIMIT);
        stream.append(&recipient().as_bytes().to_vec());
        stream.append(&0u64);
        stream.append(&vec![0xc0u8, 0xff, 0xee]);
        stream.begin_list(0);
        stream.append(&GAS_PRICE);
        stream.begin_list(blobs);
        for i in 0..blobs {
            let mut versioned_hash = vec![i as u8; 32];
            versioned_hash[0] = 0x01;
            stream.append(&versioned_hash);
        }
        append_signature(&mut stream, 0);
        stream.out().to_vec()
    }

    fn append_sidecar_items(stream: &mut RlpStream, len: usize, item_size: usize, fill: u8) {
        stream.begin_list(len);
        for _ in 0..len {
            stream.append(&vec![fill; item_size]);
        }
    }

    /// EIP-4844 blob tx in canonical form (no sidecar)
    pub fn blob_tx(nonce: u64, blobs: usize) -> Bytes {
        typed(0x03, &blob_tx_body(nonce, blobs))
    }

    /// EIP-4844 blob tx in network form: `[body, blobs, commitments, proofs]`
    pub fn blob_tx_network(nonce: u64, blobs: usize) -> Bytes {
        let mut stream = RlpStream::new_list(4);
        stream.append_raw(&blob_tx_body(nonce, blobs), 1);
        append_sidecar_items(&mut stream, blobs, 256, 0xb1);
        append_sidecar_items(&mut stream, blobs, 48, 0xc0);
        append_sidecar_items(&mut stream, blobs, 48, 0xd0);
        typed(0x03, &stream.out())
    }

    /// EIP-7594 network form: `[body, wrapperVersion, blobs, commitments, cellProofs]`
    pub fn blob_tx_network_with_cell_proofs(nonce: u64, blobs: usize) -> Bytes {
        let mut stream = RlpStream::new_list(5);
        stream.append_raw(&blob_tx_body(nonce, blobs), 1);
        stream.append(&1u64);
        append_sidecar_items(&mut stream, blobs, 256, 0xb1);
        append_sidecar_items(&mut stream, blobs, 48, 0xc0);
        append_sidecar_items(&mut stream, blobs * 4, 48, 0xd0);
        typed(0x03, &stream.out())
    }
}
