//! Condition waiter: poll the L1 head until a block number or timestamp is reached.

use crate::config::WaitConfig;
use crate::domain::errors::DelayerError;
use crate::domain::instruction::WaitTarget;
use crate::domain::types::{BlockNumber, Timestamp};
use crate::ports::outbound::{ClientError, L1Client};
use parking_lot::Mutex;
use std::future::Future;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Evaluate `check` until it returns true or the budget runs out.
///
/// `check` always runs at least once. A client error aborts the wait.
pub async fn retry_until<F, Fut>(
    mut check: F,
    condition: &str,
    budget: WaitConfig,
) -> Result<(), DelayerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, ClientError>>,
{
    let start = Instant::now();
    let timeout = budget.timeout();
    let poll_interval = budget.poll_interval();

    loop {
        if check().await? {
            return Ok(());
        }

        sleep(poll_interval).await;

        let elapsed = start.elapsed();
        if elapsed > timeout {
            return Err(DelayerError::WaitTimeout {
                condition: condition.to_string(),
                elapsed,
            });
        }
    }
}

/// Wait until the L1 head reaches `block`.
pub async fn wait_until_block<C>(
    client: &C,
    block: BlockNumber,
    budget: WaitConfig,
) -> Result<(), DelayerError>
where
    C: L1Client + ?Sized,
{
    retry_until(
        move || async move {
            let current = client.block_number().await?;
            debug!(
                current_block = current,
                target_block = block,
                "Block number is {} (waiting until {})",
                current,
                block
            );
            Ok(current >= block)
        },
        &format!("L1 block {}", block),
        budget,
    )
    .await
}

/// Wait until the L1 head block has a timestamp of at least `timestamp`.
///
/// The block number is queried on every poll; the block itself is only
/// fetched when the head moved since the previous poll.
pub async fn wait_until_timestamp<C>(
    client: &C,
    timestamp: Timestamp,
    budget: WaitConfig,
) -> Result<(), DelayerError>
where
    C: L1Client + ?Sized,
{
    let last_block = Mutex::new(None::<BlockNumber>);
    let last_block = &last_block;

    retry_until(
        move || async move {
            let current = client.block_number().await?;
            let previous = last_block.lock().replace(current);
            if previous == Some(current) {
                return Ok(false);
            }

            let current_ts = client.block_timestamp(current).await?;
            debug!(
                current_block = current,
                current_ts,
                target_ts = timestamp,
                "Block timestamp is {} (waiting until {})",
                current_ts,
                timestamp
            );
            Ok(current_ts >= timestamp)
        },
        &format!("L1 timestamp {}", timestamp),
        budget,
    )
    .await
}

/// Wait for a resolved target. `WaitTarget::Never` is not waitable.
pub async fn wait_for_target<C>(
    client: &C,
    target: WaitTarget,
    budget: WaitConfig,
) -> Result<(), DelayerError>
where
    C: L1Client + ?Sized,
{
    match target {
        WaitTarget::Block(block) => wait_until_block(client, block, budget).await,
        WaitTarget::Timestamp(ts) => wait_until_timestamp(client, ts, budget).await,
        WaitTarget::Never => Err(DelayerError::Configuration(
            "cancelled submissions have no wait target".into(),
        )),
    }
}
