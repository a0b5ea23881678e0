use log::info;
use postage::{stream::Stream, watch};
use std::time::Duration;
use thiserror::Error;
use tokio::{
    select,
    signal::ctrl_c,
    time::{self, Instant},
};

#[derive(Error, Debug)]
#[error("state never resolved to a value")]
pub struct StateUninitalizedError {}

pub async fn await_state<T: Clone + Send + Sync>(
    channel: &mut watch::Receiver<Option<T>>,
) -> Result<T, StateUninitalizedError> {
    if let Some(ref value) = *channel.borrow() {
        return Ok(value.clone());
    }

    while let Some(update) = channel.recv().await {
        if let Some(value) = update {
            return Ok(value);
        }
    }

    Err(StateUninitalizedError {})
}

pub async fn await_condition<T, F>(
    channel: &mut watch::Receiver<Option<T>>,
    mut condition: F,
) -> Result<T, StateUninitalizedError>
where
    T: Clone + Send + Sync,
    F: FnMut(&T) -> bool,
{
    if let Some(ref value) = *channel.borrow() {
        if condition(value) {
            return Ok(value.clone());
        }
    }

    while let Some(update) = channel.recv().await {
        if let Some(value) = update {
            if condition(&value) {
                return Ok(value);
            }
        }
    }

    Err(StateUninitalizedError {})
}

/// A resettable timer.  Each `touch` pushes the deadline out by the quiet period.
#[derive(Debug)]
pub struct Debounce {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    pub fn touch(&mut self) {
        self.deadline = Some(Instant::now() + self.quiet);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Resolves at the deadline.  Never resolves if nothing is pending.
    pub async fn elapsed(deadline: Option<Instant>) {
        match deadline {
            Some(deadline) => time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

/// Waits for either a ctrl-c signal, or a message on the given channel.
pub async fn wait_for_shutdown<T>(mut receiver: impl Stream<Item = T> + Unpin) -> Option<T> {
    info!("Waiting for termination");

    let message = select! {
        _ = ctrl_c() => None,
        message = receiver.recv() => message
    };

    info!("Complete.  Shutting down");
    message
}

#[cfg(test)]
mod tests {
    use super::{await_condition, await_state, Debounce};
    use lifeline::assert_completes;
    use postage::{sink::Sink, watch};
    use std::time::Duration;
    use tokio::time::{self, Instant};

    #[tokio::test]
    async fn await_state_skips_none() -> anyhow::Result<()> {
        let (mut tx, mut rx) = watch::channel::<Option<u32>>();

        tx.send(Some(3)).await?;

        assert_completes!(async move {
            let value = await_state(&mut rx).await;
            assert_eq!(3, value.unwrap());
        });

        Ok(())
    }

    #[tokio::test]
    async fn await_condition_waits() -> anyhow::Result<()> {
        let (mut tx, mut rx) = watch::channel::<Option<u32>>();

        tx.send(Some(1)).await?;
        let wait = tokio::spawn(async move { await_condition(&mut rx, |v| *v > 1).await });
        tx.send(Some(2)).await?;

        assert_completes!(async move {
            let value = wait.await.unwrap();
            assert_eq!(2, value.unwrap());
        });

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_resets() {
        let mut debounce = Debounce::new(Duration::from_secs(10));
        assert!(!debounce.is_pending());

        let start = Instant::now();
        debounce.touch();
        time::sleep(Duration::from_secs(5)).await;
        debounce.touch();

        Debounce::elapsed(debounce.deadline()).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(15));
        assert!(elapsed < Duration::from_millis(15_100));

        debounce.cancel();
        assert!(!debounce.is_pending());
    }
}
