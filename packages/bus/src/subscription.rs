//! A live subscription as a pull-based receiver.
//!
//! Every transport runs a background pump task that pushes payloads into a
//! bounded tokio channel; the [`Subscription`] owns the receiving half and
//! the pump. Dropping or closing the subscription aborts the pump.

use lambda_view_core::ChannelName;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::BusError;

/// Buffer size of the channel between a pump task and its subscription.
pub const DEFAULT_CAPACITY: usize = 64;

/// One payload, or the transport failure that ended the subscription.
pub type Delivery = std::result::Result<String, BusError>;

/// Receiving end of one channel subscription.
pub struct Subscription {
    channel: ChannelName,
    rx: mpsc::Receiver<Delivery>,
    pump: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wrap a pump task and the receiver it feeds.
    pub fn new(channel: ChannelName, rx: mpsc::Receiver<Delivery>, pump: JoinHandle<()>) -> Self {
        Self {
            channel,
            rx,
            pump: Some(pump),
        }
    }

    /// Create the sender/receiver pair a pump writes into.
    pub fn pipe() -> (mpsc::Sender<Delivery>, mpsc::Receiver<Delivery>) {
        mpsc::channel(DEFAULT_CAPACITY)
    }

    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }

    /// Wait for the next payload.
    ///
    /// Returns `None` once the pump has stopped and the buffer is drained.
    /// An `Err` is the last item a pump sends before stopping.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }

    /// Stop the pump and discard anything still buffered.
    pub fn close(&mut self) {
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel.to_string())
            .field("open", &self.pump.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_view_core::ChannelKind;

    fn channel() -> ChannelName {
        ChannelName::new(ChannelKind::StrategyParams, "test").unwrap()
    }

    #[tokio::test]
    async fn receives_until_pump_ends() {
        let (tx, rx) = Subscription::pipe();
        let pump = tokio::spawn(async move {
            tx.send(Ok("one".to_string())).await.unwrap();
            tx.send(Ok("two".to_string())).await.unwrap();
        });
        let mut sub = Subscription::new(channel(), rx, pump);

        assert_eq!(sub.recv().await.unwrap().unwrap(), "one");
        assert_eq!(sub.recv().await.unwrap().unwrap(), "two");
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn close_discards_buffered() {
        let (tx, rx) = Subscription::pipe();
        tx.send(Ok("buffered".to_string())).await.unwrap();
        let pump = tokio::spawn(std::future::pending::<()>());
        let mut sub = Subscription::new(channel(), rx, pump);

        sub.close();
        assert!(sub.recv().await.is_none());
        assert!(tx.is_closed());
    }
}
