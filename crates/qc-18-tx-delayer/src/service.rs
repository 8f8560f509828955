//! Delayed L1 client - the submission interceptor.
//!
//! Every raw transaction sent through [`DelayedClient`] first consults the
//! schedule state. With nothing armed the tx goes straight to the wrapped
//! client. Otherwise the instruction is consumed and the tx is either
//! dropped (cancel) or handed to a background task that waits for the L1
//! head to reach the target before forwarding it. In both cases the caller
//! gets the precomputed tx hash back immediately.

use crate::algorithms::wait::wait_for_target;
use crate::config::{DelayerConfig, WaitConfig};
use crate::domain::errors::DelayerError;
use crate::domain::instruction::{Instruction, PendingSubmission};
use crate::domain::schedule::ScheduleState;
use crate::domain::stats::{DeliveryStats, DeliveryStatsSnapshot};
use crate::domain::transaction::{compute_tx_hash, TxSummary};
use crate::domain::types::{BlockNumber, Bytes, Hash, SignerKind, Timestamp};
use crate::ports::inbound::Delayer;
use crate::ports::outbound::{ClientError, L1Client};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

/// Wrap `client` with a tx delayer.
///
/// Returns the delayed client (use it wherever the wrapped client was used
/// to send transactions) and the handle that controls it. The client passed
/// in is not modified.
///
/// Only clients signing with a local key can be delayed: txs signed by the
/// node never go through `send_raw_transaction`.
pub fn with_delayer<C>(
    client: Arc<C>,
    config: DelayerConfig,
) -> Result<(DelayedClient<C>, DelayerHandle), DelayerError>
where
    C: L1Client + 'static,
{
    if client.signer_kind() != SignerKind::Local {
        return Err(DelayerError::Configuration(
            "with_delayer has to be instantiated with a local-signing wallet client".into(),
        ));
    }

    config
        .validate()
        .map_err(|e| DelayerError::Configuration(e.to_string()))?;

    let state = Arc::new(ScheduleState::new(config.ethereum_slot_duration_secs));
    let handle = DelayerHandle {
        state: Arc::clone(&state),
    };

    let delayed = DelayedClient {
        inner: client,
        state,
        wait: config.wait,
        stats: Arc::new(DeliveryStats::default()),
        in_flight: Arc::new(AtomicUsize::new(0)),
        tasks: Mutex::new(Vec::new()),
    };

    Ok((delayed, handle))
}

/// Control handle for a delayed client.
#[derive(Debug, Clone)]
pub struct DelayerHandle {
    state: Arc<ScheduleState>,
}

impl DelayerHandle {
    fn arm(&self, instruction: Instruction) {
        if let Some(previous) = self.state.arm(instruction) {
            debug!(
                previous = %previous,
                next = %instruction,
                "Replacing unconsumed delay instruction"
            );
        }
    }

    /// Instruction armed for the next tx, if any
    pub fn armed(&self) -> Option<Instruction> {
        self.state.armed()
    }

    pub fn slot_duration_secs(&self) -> u64 {
        self.state.slot_duration_secs()
    }
}

impl Delayer for DelayerHandle {
    fn sent_tx_hashes(&self) -> Vec<Hash> {
        self.state.sent_tx_hashes()
    }

    fn cancelled_txs(&self) -> Vec<Bytes> {
        self.state.cancelled_txs()
    }

    fn pause_next_tx_until_block(&self, block: BlockNumber) {
        self.arm(Instruction::UntilBlock(block));
    }

    fn pause_next_tx_until_timestamp(&self, timestamp: Timestamp) {
        self.arm(Instruction::UntilTimestamp(timestamp));
    }

    fn cancel_next_tx(&self) {
        self.arm(Instruction::Indefinitely);
    }
}

/// L1 client whose raw submissions go through the delayer.
pub struct DelayedClient<C: L1Client> {
    inner: Arc<C>,
    state: Arc<ScheduleState>,
    wait: WaitConfig,
    stats: Arc<DeliveryStats>,
    in_flight: Arc<AtomicUsize>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Counts a spawned delivery until its future is dropped, panics included.
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<C> DelayedClient<C>
where
    C: L1Client + 'static,
{
    /// Send a signed, serialized transaction, honouring the armed instruction.
    ///
    /// With no instruction armed this is a plain `send_raw_transaction` on the
    /// wrapped client. Otherwise the returned hash is computed locally and the
    /// actual delivery (if any) happens in the background.
    pub async fn send_raw_transaction(&self, raw: Bytes) -> Result<Hash, DelayerError> {
        let Some(instruction) = self.state.take() else {
            let tx_hash = self.inner.send_raw_transaction(raw).await?;
            debug!(tx_hash = ?tx_hash, "Sent tx immediately");
            self.state.record_sent(tx_hash);
            DeliveryStats::incr(&self.stats.immediate);
            return Ok(tx_hash);
        };

        // Compute the tx hash manually so we emulate the client's response
        let tx_hash = compute_tx_hash(&raw)?;
        let pending = PendingSubmission::new(
            raw,
            tx_hash,
            instruction,
            self.state.slot_duration_secs(),
        );

        if pending.is_cancelled() {
            info!(tx_hash = ?tx_hash, "Cancelling tx {:?}", tx_hash);
            self.state.record_cancelled(pending.raw);
            DeliveryStats::incr(&self.stats.cancelled);
            return Ok(tx_hash);
        }

        match TxSummary::decode(&pending.raw) {
            Ok(summary) => info!(
                tx_hash = ?tx_hash,
                target = %instruction,
                wait_target = ?pending.target,
                tx_type = ?summary.tx_type,
                chain_id = ?summary.chain_id,
                nonce = summary.nonce,
                gas_limit = summary.gas_limit,
                to = ?summary.to,
                blobs = summary.blobs,
                size = summary.size,
                "Delaying tx {:?} until {}",
                tx_hash,
                instruction
            ),
            Err(e) => {
                warn!(tx_hash = ?tx_hash, error = %e, "Could not summarize delayed tx");
                info!(
                    tx_hash = ?tx_hash,
                    target = %instruction,
                    "Delaying tx {:?} until {}",
                    tx_hash,
                    instruction
                );
            }
        }

        DeliveryStats::incr(&self.stats.deferred);
        let in_flight = InFlightGuard::new(Arc::clone(&self.in_flight));
        let delivery = deliver_after_wait(
            Arc::clone(&self.inner),
            Arc::clone(&self.state),
            Arc::clone(&self.stats),
            self.wait,
            pending,
        );
        let task = tokio::spawn(async move {
            let _in_flight = in_flight;
            delivery.await
        });
        self.track(task).await;

        Ok(tx_hash)
    }

    /// Sign `request` with the local account and send it through the delayer.
    pub async fn send_transaction(&self, request: &C::Request) -> Result<Hash, DelayerError> {
        let raw = self.inner.sign_transaction(request).await?;
        self.send_raw_transaction(raw).await
    }

    /// Wait for every background delivery started so far to finish.
    pub async fn flush(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.tasks.lock());
            if tasks.is_empty() {
                return;
            }

            for task in tasks {
                self.reap(task.await);
            }
        }
    }

    /// Number of background deliveries still waiting or in flight
    pub fn pending_deliveries(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> DeliveryStatsSnapshot {
        self.stats.snapshot()
    }

    /// The wrapped client
    pub fn inner(&self) -> &Arc<C> {
        &self.inner
    }

    /// Register a delivery task, reaping the ones that already finished.
    async fn track(&self, task: JoinHandle<()>) {
        let finished = {
            let mut tasks = self.tasks.lock();
            let (finished, running): (Vec<_>, Vec<_>) =
                tasks.drain(..).partition(|t| t.is_finished());
            *tasks = running;
            tasks.push(task);
            finished
        };

        // Already complete, so these resolve without waiting
        for task in finished {
            self.reap(task.await);
        }
    }

    fn reap(&self, result: Result<(), JoinError>) {
        if let Err(e) = result {
            DeliveryStats::incr(&self.stats.failed);
            error!(error = %e, "Delayed tx delivery task failed");
        }
    }

    #[cfg(test)]
    fn tracked_tasks(&self) -> usize {
        self.tasks.lock().len()
    }
}

/// Background half of a deferred submission.
///
/// Failures end here: the submitter already has its hash, so everything is
/// logged and counted instead of returned.
async fn deliver_after_wait<C>(
    client: Arc<C>,
    state: Arc<ScheduleState>,
    stats: Arc<DeliveryStats>,
    budget: WaitConfig,
    pending: PendingSubmission,
) where
    C: L1Client + ?Sized,
{
    if let Err(e) = wait_for_target(client.as_ref(), pending.target, budget).await {
        match e {
            DelayerError::WaitTimeout { .. } => DeliveryStats::incr(&stats.timed_out),
            _ => DeliveryStats::incr(&stats.failed),
        }
        error!(
            tx_hash = ?pending.tx_hash,
            target = %pending.instruction,
            error = %e,
            "Error sending tx after delay"
        );
        return;
    }

    let client_tx_hash = match client.send_raw_transaction(pending.raw.clone()).await {
        Ok(hash) => hash,
        Err(e) => {
            DeliveryStats::incr(&stats.failed);
            error!(
                tx_hash = ?pending.tx_hash,
                target = %pending.instruction,
                error = %e,
                "Error sending tx after delay"
            );
            return;
        }
    };

    if client_tx_hash != pending.tx_hash {
        DeliveryStats::incr(&stats.hash_mismatches);
        let anomaly = DelayerError::IdentifierMismatch {
            client: client_tx_hash,
            computed: pending.tx_hash,
        };
        error!(
            client_tx_hash = ?client_tx_hash,
            computed_tx_hash = ?pending.tx_hash,
            "{}",
            anomaly
        );
    }

    info!(
        tx_hash = ?client_tx_hash,
        target = %pending.instruction,
        "Sent previously delayed tx {:?} to land on {}",
        client_tx_hash,
        pending.instruction
    );
    state.record_sent(client_tx_hash);
    DeliveryStats::incr(&stats.delivered);
}

impl From<DelayerError> for ClientError {
    fn from(e: DelayerError) -> Self {
        match e {
            DelayerError::Client(inner) => inner,
            DelayerError::InvalidTransaction(msg) => ClientError::Rejected(msg),
            other => ClientError::Rpc(other.to_string()),
        }
    }
}

/// A delayed client is a drop-in replacement for the client it wraps.
#[async_trait]
impl<C> L1Client for DelayedClient<C>
where
    C: L1Client + 'static,
{
    type Request = C::Request;

    fn signer_kind(&self) -> SignerKind {
        self.inner.signer_kind()
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<Hash, ClientError> {
        DelayedClient::send_raw_transaction(self, raw)
            .await
            .map_err(ClientError::from)
    }

    async fn block_number(&self) -> Result<BlockNumber, ClientError> {
        self.inner.block_number().await
    }

    async fn block_timestamp(&self, number: BlockNumber) -> Result<Timestamp, ClientError> {
        self.inner.block_timestamp(number).await
    }

    async fn sign_transaction(&self, request: &Self::Request) -> Result<Bytes, ClientError> {
        self.inner.sign_transaction(request).await
    }
}
