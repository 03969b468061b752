//! Bounded outbound channel: single producer side (make-payment), shared
//! consumer side (dispatcher workers). A full buffer blocks the producer.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::payment::{PaymentError, PaymentInstruction};

pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

#[derive(Clone)]
pub struct OutboundSender {
    tx: mpsc::Sender<PaymentInstruction>,
}

/// Receiver shared by all dispatcher workers
#[derive(Clone)]
pub struct OutboundReceiver {
    rx: Arc<Mutex<mpsc::Receiver<PaymentInstruction>>>,
}

pub fn outbound_channel(buffer: usize) -> (OutboundSender, OutboundReceiver) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (
        OutboundSender { tx },
        OutboundReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

impl OutboundSender {
    pub async fn send(&self, instruction: PaymentInstruction) -> Result<(), PaymentError> {
        let id = instruction.id;
        self.tx.send(instruction).await.map_err(|_| {
            PaymentError::Transient(format!("provider channel closed, {} not enqueued", id))
        })
    }
}

impl OutboundReceiver {
    /// Next instruction; `None` once every sender is gone and the buffer is drained
    pub async fn recv(&self) -> Option<PaymentInstruction> {
        self.rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::types::fixtures::incoming;
    use crate::payment::PaymentProvider;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn instruction() -> PaymentInstruction {
        PaymentInstruction::received(
            incoming("1", "1", "EUR", NaiveDate::from_ymd_opt(2021, 6, 30).unwrap()),
            PaymentProvider::CrossBorder,
        )
    }

    #[tokio::test]
    async fn test_bounded_buffer_applies_backpressure() {
        let (tx, rx) = outbound_channel(1);
        tx.send(instruction()).await.unwrap();

        // buffer full: second send waits
        let blocked = tokio::time::timeout(Duration::from_millis(50), tx.send(instruction())).await;
        assert!(blocked.is_err());

        assert!(rx.recv().await.is_some());
        tx.send(instruction()).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped_is_transient() {
        let (tx, rx) = outbound_channel(4);
        drop(rx);
        let err = tx.send(instruction()).await.unwrap_err();
        assert!(matches!(err, PaymentError::Transient(_)));
    }
}
