//! # Transaction Delayer Flows
//!
//! Drives a `DelayedClient` against a simulated L1 node that mines a block
//! every 500ms (12s of chain time per block) and hashes incoming transactions
//! on its own, so the delayer's precomputed hashes are checked against an
//! independent implementation.
//!
//! ## Flows Tested:
//!
//! 1. **Block target**: tx is forwarded while the head is one block short
//! 2. **Timestamp target**: tx is forwarded one slot before the timestamp
//! 3. **Ordering**: an immediate tx overtakes an earlier delayed one
//! 4. **Blob txs**: network-form blob txs report the canonical hash
//! 5. **Cancel / races**: an instruction is consumed exactly once

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rlp::Rlp;
    use sha3::{Digest, Keccak256};

    use qc_18_tx_delayer::test_utils::{fixtures, MockL1Client};
    use qc_18_tx_delayer::{
        with_delayer, BlockNumber, Bytes, ClientError, DelayedClient, Delayer, DelayerConfig,
        DelayerError, DelayerHandle, Hash, L1Client, SignerKind, Timestamp,
    };

    // =============================================================================
    // SIMULATED L1
    // =============================================================================

    const GENESIS_TS: Timestamp = 1_700_000_000;
    const SLOT_SECS: u64 = 12;
    const BLOCK_INTERVAL: Duration = Duration::from_millis(500);

    fn ts_of(block: BlockNumber) -> Timestamp {
        GENESIS_TS + block * SLOT_SECS
    }

    fn keccak(data: &[u8]) -> Hash {
        Hash::from_slice(&Keccak256::digest(data))
    }

    /// Hash the way an execution client does: blob sidecars are not part of the tx.
    fn node_tx_hash(raw: &[u8]) -> Hash {
        if raw.first() == Some(&0x03) {
            let outer = Rlp::new(&raw[1..]);
            if let Ok(body) = outer.at(0) {
                if body.is_list() {
                    let mut canonical = vec![0x03];
                    canonical.extend_from_slice(body.as_raw());
                    return keccak(&canonical);
                }
            }
        }
        keccak(raw)
    }

    /// Unsigned request; the node signs it as a dynamic fee tx
    struct TxRequest {
        nonce: u64,
    }

    #[derive(Debug, Clone)]
    struct Inclusion {
        tx_hash: Hash,
        submitted_at_block: BlockNumber,
    }

    struct SimulatedL1 {
        head: AtomicU64,
        mempool: Mutex<Vec<Inclusion>>,
    }

    impl SimulatedL1 {
        fn start(head: BlockNumber) -> Arc<Self> {
            let node = Arc::new(Self {
                head: AtomicU64::new(head),
                mempool: Mutex::new(Vec::new()),
            });

            let miner = Arc::clone(&node);
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(BLOCK_INTERVAL).await;
                    miner.head.fetch_add(1, Ordering::SeqCst);
                }
            });

            node
        }

        fn mempool(&self) -> Vec<Inclusion> {
            self.mempool.lock().clone()
        }
    }

    #[async_trait]
    impl L1Client for SimulatedL1 {
        type Request = TxRequest;

        fn signer_kind(&self) -> SignerKind {
            SignerKind::Local
        }

        async fn send_raw_transaction(&self, raw: Bytes) -> Result<Hash, ClientError> {
            let tx_hash = node_tx_hash(&raw);
            self.mempool.lock().push(Inclusion {
                tx_hash,
                submitted_at_block: self.head.load(Ordering::SeqCst),
            });
            Ok(tx_hash)
        }

        async fn block_number(&self) -> Result<BlockNumber, ClientError> {
            Ok(self.head.load(Ordering::SeqCst))
        }

        async fn block_timestamp(&self, number: BlockNumber) -> Result<Timestamp, ClientError> {
            if number > self.head.load(Ordering::SeqCst) {
                return Err(ClientError::BlockNotFound(number));
            }
            Ok(ts_of(number))
        }

        async fn sign_transaction(&self, request: &TxRequest) -> Result<Bytes, ClientError> {
            Ok(fixtures::dynamic_fee_tx(request.nonce))
        }
    }

    fn delayed(node: &Arc<SimulatedL1>) -> (DelayedClient<SimulatedL1>, DelayerHandle) {
        with_delayer(
            Arc::clone(node),
            DelayerConfig::with_slot_duration(SLOT_SECS),
        )
        .unwrap()
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_delayed_tx_lands_in_target_block() {
        let node = SimulatedL1::start(100);
        let (client, delayer) = delayed(&node);
        let raw = fixtures::dynamic_fee_tx(0);

        delayer.pause_next_tx_until_block(105);
        let tx_hash = client.send_raw_transaction(raw.clone()).await.unwrap();
        assert!(node.mempool().is_empty());

        client.flush().await;

        let mempool = node.mempool();
        assert_eq!(mempool.len(), 1);
        assert_eq!(mempool[0].tx_hash, tx_hash);
        // Submitted during 104 so it gets mined in 105
        assert_eq!(mempool[0].submitted_at_block, 104);
        assert_eq!(delayer.sent_tx_hashes(), vec![tx_hash]);
        assert_eq!(client.stats().hash_mismatches, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_tx_lands_at_target_timestamp() {
        let node = SimulatedL1::start(100);
        let (client, delayer) = delayed(&node);

        delayer.pause_next_tx_until_timestamp(ts_of(108));
        let tx_hash = client.send_transaction(&TxRequest { nonce: 1 }).await.unwrap();
        client.flush().await;

        let mempool = node.mempool();
        assert_eq!(mempool.len(), 1);
        assert_eq!(mempool[0].tx_hash, tx_hash);
        assert_eq!(mempool[0].submitted_at_block, 107);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_tx_overtakes_delayed_tx() {
        let node = SimulatedL1::start(100);
        let (client, delayer) = delayed(&node);

        delayer.pause_next_tx_until_block(110);
        let delayed_hash = client
            .send_raw_transaction(fixtures::dynamic_fee_tx(0))
            .await
            .unwrap();
        let immediate_hash = client
            .send_raw_transaction(fixtures::dynamic_fee_tx(1))
            .await
            .unwrap();

        assert_eq!(delayer.sent_tx_hashes(), vec![immediate_hash]);
        assert_eq!(client.pending_deliveries(), 1);

        client.flush().await;

        assert_eq!(delayer.sent_tx_hashes(), vec![immediate_hash, delayed_hash]);
        let order: Vec<Hash> = node.mempool().iter().map(|i| i.tx_hash).collect();
        assert_eq!(order, vec![immediate_hash, delayed_hash]);

        let stats = client.stats();
        assert_eq!(stats.immediate, 1);
        assert_eq!(stats.deferred, 1);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_form_blob_tx_reports_canonical_hash() {
        let node = SimulatedL1::start(100);
        let (client, delayer) = delayed(&node);

        for raw in [
            fixtures::blob_tx_network(0, 2),
            fixtures::blob_tx_network_with_cell_proofs(1, 1),
        ] {
            delayer.pause_next_tx_until_block(102);
            let tx_hash = client.send_raw_transaction(raw.clone()).await.unwrap();
            assert_eq!(tx_hash, node_tx_hash(&raw));
            assert_ne!(tx_hash, keccak(&raw));
        }

        client.flush().await;

        assert_eq!(node.mempool().len(), 2);
        assert_eq!(client.stats().hash_mismatches, 0);
        assert_eq!(delayer.sent_tx_hashes().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_signed_tx_never_reaches_node() {
        let node = SimulatedL1::start(100);
        let (client, delayer) = delayed(&node);

        delayer.cancel_next_tx();
        let tx_hash = client.send_transaction(&TxRequest { nonce: 7 }).await.unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        client.flush().await;

        assert!(node.mempool().is_empty());
        assert_eq!(delayer.cancelled_txs(), vec![fixtures::dynamic_fee_tx(7)]);
        assert_eq!(tx_hash, keccak(&fixtures::dynamic_fee_tx(7)));
        assert!(delayer.sent_tx_hashes().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_consume_instruction_once() {
        let mock = Arc::new(MockL1Client::new(10, GENESIS_TS, SLOT_SECS));
        let (client, delayer) =
            with_delayer(Arc::clone(&mock), DelayerConfig::default()).unwrap();
        let client = Arc::new(client);

        delayer.cancel_next_tx();

        let mut handles = Vec::new();
        for nonce in 0..8 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move {
                client
                    .send_raw_transaction(fixtures::legacy_tx(nonce))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(delayer.cancelled_txs().len(), 1);
        assert_eq!(delayer.sent_tx_hashes().len(), 7);
        assert_eq!(mock.submission_count(), 7);
    }

    #[tokio::test]
    async fn test_remote_signer_cannot_be_delayed() {
        let mock = Arc::new(MockL1Client::remote_signer(10, GENESIS_TS, SLOT_SECS));
        let result = with_delayer(mock, DelayerConfig::default());

        match result {
            Err(DelayerError::Configuration(msg)) => assert!(msg.contains("local")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("remote signer accepted"),
        }
    }
}
