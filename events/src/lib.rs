//! Event system infrastructure for the weather station.
//!
//! This crate decouples producers of domain events (e.g. the sensor data
//! ingestion path) from their consumers (the live relay to connected clients).
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing all business events in the system
//! - **EventPublisher / EventReceiver**: the two ends of an unbounded FIFO queue.
//!   Publishers are cheap to clone and never block; the single receiver is
//!   drained by one background task.
//! - **EventHandler**: Trait for consuming events taken off the queue
//! - **Identity / PermissionCheck**: who a recipient is and whether they may see
//!   the resource an event refers to
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies. Entity data is carried as serialized JSON values.

use async_trait::async_trait;
use log::*;
use serde_json::Value;
use std::error::Error as StdError;
use tokio::sync::mpsc;
use uuid::Uuid;

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = Uuid;

/// Boxed error returned by collaborators this crate does not know the concrete type of.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Domain events that represent business-level changes in the system.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// Emitted after a new sensor reading was stored.
    SensorDataCreated {
        /// Sensor the reading belongs to. Recipients are authorized against it;
        /// an event without one is delivered to nobody.
        sensor_id: Option<Id>,
        /// Complete serialized sensor_data row, pushed to clients as-is.
        sensor_data: Value,
    },
}

impl DomainEvent {
    /// Id of the resource recipients must be allowed to read.
    pub fn resource_id(&self) -> Option<Id> {
        match self {
            DomainEvent::SensorDataCreated { sensor_id, .. } => *sensor_id,
        }
    }

    /// The data delivered to recipients.
    pub fn payload(&self) -> &Value {
        match self {
            DomainEvent::SensorDataCreated { sensor_data, .. } => sensor_data,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::SensorDataCreated { .. } => "sensor_data_created",
        }
    }
}

/// The authenticated principal behind a live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// `None` for principals that were never persisted; such identities cannot
    /// hold a connection.
    pub id: Option<Id>,
    pub username: String,
    pub superuser: bool,
}

/// Decides whether an identity may read a resource.
///
/// `Ok(false)` and any `Err` both mean "do not show this resource"; callers
/// fanning out events treat them the same.
#[async_trait]
pub trait PermissionCheck: Send + Sync {
    async fn can_read(&self, identity: &Identity, resource_id: Id) -> Result<bool, BoxError>;
}

/// Trait for handling domain events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Creates a connected publisher/receiver pair.
pub fn channel() -> (EventPublisher, EventReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (EventPublisher { sender }, EventReceiver { receiver })
}

/// Enqueues domain events. Events from one publisher are received in the
/// order they were published.
#[derive(Clone, Debug)]
pub struct EventPublisher {
    sender: mpsc::UnboundedSender<DomainEvent>,
}

impl EventPublisher {
    /// Enqueue an event without waiting for it to be handled.
    /// Returns `false` if the receiving side has shut down and the event was dropped.
    pub fn publish(&self, event: DomainEvent) -> bool {
        let name = event.name();
        match self.sender.send(event) {
            Ok(()) => {
                trace!("Published {name} event");
                true
            }
            Err(_) => {
                warn!("Dropping {name} event, the event receiver is gone");
                false
            }
        }
    }
}

/// The consuming end of the event queue.
#[derive(Debug)]
pub struct EventReceiver {
    receiver: mpsc::UnboundedReceiver<DomainEvent>,
}

impl EventReceiver {
    /// Waits for the next event. Returns `None` once every publisher is dropped
    /// and the queue is empty.
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reading(sensor_id: Option<Id>, n: u32) -> DomainEvent {
        DomainEvent::SensorDataCreated {
            sensor_id,
            sensor_data: json!({ "n": n }),
        }
    }

    #[tokio::test]
    async fn events_are_received_in_publish_order() {
        let (publisher, mut receiver) = channel();
        let sensor_id = Some(Id::new_v4());

        for n in 0..3 {
            assert!(publisher.publish(reading(sensor_id, n)));
        }

        for n in 0..3 {
            let event = receiver.recv().await.unwrap();
            assert_eq!(event.payload(), &json!({ "n": n }));
        }
    }

    #[tokio::test]
    async fn cloned_publishers_feed_the_same_queue() {
        let (publisher, mut receiver) = channel();
        let other = publisher.clone();

        publisher.publish(reading(None, 1));
        other.publish(reading(None, 2));
        drop(publisher);
        drop(other);

        assert_eq!(receiver.recv().await.unwrap().payload(), &json!({ "n": 1 }));
        assert_eq!(receiver.recv().await.unwrap().payload(), &json!({ "n": 2 }));
        assert!(receiver.recv().await.is_none());
    }

    #[test]
    fn publish_reports_a_closed_queue() {
        let (publisher, receiver) = channel();
        drop(receiver);

        assert!(!publisher.publish(reading(None, 1)));
    }

    #[test]
    fn resource_id_is_the_sensor_id() {
        let sensor_id = Id::new_v4();

        assert_eq!(reading(Some(sensor_id), 0).resource_id(), Some(sensor_id));
        assert_eq!(reading(None, 0).resource_id(), None);
        assert_eq!(reading(None, 0).name(), "sensor_data_created");
    }
}
