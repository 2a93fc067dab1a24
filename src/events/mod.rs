use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Logs instead of failing when the channel is closed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("{}", e);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    SerialsGenerated {
        product_id: Uuid,
        serial_codes: Vec<String>,
    },
    SerialUpdated {
        serial_id: Uuid,
        status: String,
    },
    SerialBorrowed {
        serial_id: Uuid,
        transaction_id: Uuid,
    },
    SerialReturned {
        serial_id: Uuid,
        transaction_id: Uuid,
    },
    EmployeeChanged(Uuid),
    ImportCompleted {
        imported: usize,
        failed: usize,
    },
}

pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::SerialsGenerated {
                product_id,
                serial_codes,
            } => info!(
                product_id = %product_id,
                count = serial_codes.len(),
                first = serial_codes.first().map(String::as_str).unwrap_or(""),
                "serials generated"
            ),
            Event::SerialBorrowed {
                serial_id,
                transaction_id,
            } => info!(serial_id = %serial_id, transaction_id = %transaction_id, "serial borrowed"),
            Event::SerialReturned {
                serial_id,
                transaction_id,
            } => info!(serial_id = %serial_id, transaction_id = %transaction_id, "serial returned"),
            Event::ImportCompleted { imported, failed } => {
                if *failed > 0 {
                    warn!(imported, failed, "import finished with rejected rows");
                } else {
                    info!(imported, "import finished");
                }
            }
            other => info!(event = ?other, "event received"),
        }
    }

    info!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::ProductCreated(Uuid::new_v4())).await.is_err());
        sender.send_or_log(Event::ProductDeleted(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn events_are_delivered_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();
        sender.send_or_log(Event::ProductCreated(id)).await;
        sender.send_or_log(Event::ProductDeleted(id)).await;
        assert_eq!(rx.recv().await, Some(Event::ProductCreated(id)));
        assert_eq!(rx.recv().await, Some(Event::ProductDeleted(id)));
    }
}
