use crate::connection::{Connection, ConnectionRegistry};
use async_trait::async_trait;
use events::{DomainEvent, EventHandler, EventReceiver, Id, PermissionCheck};
use log::*;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Fans each domain event out to every registered connection whose owner may
/// read the event's resource.
///
/// Recipients are handled one after another. A recipient that is not
/// authorized, whose permission check fails, whose push fails, or that
/// disconnects mid-delivery is skipped; the remaining recipients still get the
/// event.
pub struct Relay {
    registry: Arc<ConnectionRegistry>,
    permissions: Arc<dyn PermissionCheck>,
}

impl Relay {
    pub fn new(registry: Arc<ConnectionRegistry>, permissions: Arc<dyn PermissionCheck>) -> Self {
        Self {
            registry,
            permissions,
        }
    }

    /// Push `event` to every authorized connection and return how many pushes succeeded.
    pub async fn deliver(&self, event: &DomainEvent) -> usize {
        let Some(resource_id) = event.resource_id() else {
            debug!("Skipping {} event without a resource id", event.name());
            return 0;
        };

        let payload = match serde_json::to_string(event.payload()) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize {} event: {e}", event.name());
                return 0;
            }
        };

        let mut delivered = 0;
        for connection in self.registry.snapshot() {
            if self.push(&connection, resource_id, &payload).await {
                delivered += 1;
            }
        }

        debug!(
            "Delivered {} event for resource {resource_id} to {delivered} connection(s)",
            event.name()
        );
        delivered
    }

    async fn push(&self, connection: &Connection, resource_id: Id, payload: &str) -> bool {
        let identity = connection.identity();

        // Each await below is a point where the connection may be unregistered.
        if !self.registry.is_live(connection) {
            trace!("Connection {} went away", connection.id().as_str());
            return false;
        }

        match self.permissions.can_read(identity, resource_id).await {
            Ok(true) => {}
            Ok(false) => {
                trace!("{} may not read {resource_id}", identity.username);
                return false;
            }
            Err(e) => {
                trace!(
                    "Permission check for {} on {resource_id} failed: {e}",
                    identity.username
                );
                return false;
            }
        }

        if !self.registry.is_live(connection) {
            trace!("Connection {} went away", connection.id().as_str());
            return false;
        }

        match connection.send(payload.to_owned()).await {
            Ok(()) => true,
            Err(e) => {
                debug!(
                    "Push to connection {} failed: {e}",
                    connection.id().as_str()
                );
                false
            }
        }
    }
}

#[async_trait]
impl EventHandler for Relay {
    async fn handle(&self, event: &DomainEvent) {
        self.deliver(event).await;
    }
}

/// Drain `receiver` one event at a time, handing each to `handler` before
/// taking the next. Returns once every publisher has been dropped.
pub async fn run(mut receiver: EventReceiver, handler: Arc<dyn EventHandler>) {
    info!("Event relay started");

    while let Some(event) = receiver.recv().await {
        handler.handle(&event).await;
    }

    info!("Event relay stopped: all event publishers are gone");
}

/// Run the relay loop as a background task for the lifetime of the process.
pub fn spawn(receiver: EventReceiver, handler: Arc<dyn EventHandler>) -> JoinHandle<()> {
    tokio::spawn(run(receiver, handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Transport, TransportError};
    use events::{BoxError, Identity};
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every push into a log shared by all transports of a test.
    struct LoggingTransport {
        name: &'static str,
        log: Arc<Mutex<Vec<(String, String)>>>,
        delay: Duration,
        fail: bool,
    }

    impl LoggingTransport {
        fn new(name: &'static str, log: &Arc<Mutex<Vec<(String, String)>>>) -> Self {
            Self {
                name,
                log: Arc::clone(log),
                delay: Duration::ZERO,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl Transport for LoggingTransport {
        async fn send(&self, payload: String) -> Result<(), TransportError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(TransportError::Closed);
            }
            self.log
                .lock()
                .unwrap()
                .push((self.name.to_string(), payload));
            Ok(())
        }
    }

    /// Grants read access to a fixed set of users; errors for unknown resources.
    struct StaticPermissions {
        readers: HashSet<Id>,
        known_resource: Id,
    }

    #[async_trait]
    impl PermissionCheck for StaticPermissions {
        async fn can_read(&self, identity: &Identity, resource_id: Id) -> Result<bool, BoxError> {
            if resource_id != self.known_resource {
                return Err("resource not found".into());
            }
            Ok(identity
                .id
                .is_some_and(|user_id| self.readers.contains(&user_id)))
        }
    }

    /// Unregisters `victim` the first time anyone's permission is checked.
    struct UnregisterDuringCheck {
        registry: Arc<ConnectionRegistry>,
        victim: Identity,
    }

    #[async_trait]
    impl PermissionCheck for UnregisterDuringCheck {
        async fn can_read(&self, _identity: &Identity, _resource_id: Id) -> Result<bool, BoxError> {
            self.registry.unregister(&self.victim);
            tokio::task::yield_now().await;
            Ok(true)
        }
    }

    fn identity(name: &str) -> Identity {
        Identity {
            id: Some(Id::new_v4()),
            username: name.to_string(),
            superuser: false,
        }
    }

    fn event(sensor_id: Option<Id>, label: &str) -> DomainEvent {
        DomainEvent::SensorDataCreated {
            sensor_id,
            sensor_data: json!({ "label": label }),
        }
    }

    fn names(log: &Arc<Mutex<Vec<(String, String)>>>) -> Vec<String> {
        let mut names: Vec<String> = log.lock().unwrap().iter().map(|(n, _)| n.clone()).collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn delivers_only_to_authorized_connections() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(ConnectionRegistry::new());
        let sensor_id = Id::new_v4();
        let (alice, bob, carol) = (identity("alice"), identity("bob"), identity("carol"));

        registry.register(alice.clone(), Arc::new(LoggingTransport::new("alice", &log)));
        registry.register(bob.clone(), Arc::new(LoggingTransport::new("bob", &log)));
        registry.register(carol, Arc::new(LoggingTransport::new("carol", &log)));

        let permissions = StaticPermissions {
            readers: HashSet::from([alice.id.unwrap(), bob.id.unwrap()]),
            known_resource: sensor_id,
        };
        let relay = Relay::new(registry, Arc::new(permissions));

        let delivered = relay.deliver(&event(Some(sensor_id), "reading")).await;

        assert_eq!(delivered, 2);
        assert_eq!(names(&log), vec!["alice".to_string(), "bob".to_string()]);
        let expected = json!({ "label": "reading" }).to_string();
        assert!(log.lock().unwrap().iter().all(|(_, payload)| *payload == expected));
    }

    #[tokio::test]
    async fn event_without_resource_id_is_delivered_to_nobody() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(ConnectionRegistry::new());
        let alice = identity("alice");
        registry.register(alice.clone(), Arc::new(LoggingTransport::new("alice", &log)));

        let permissions = StaticPermissions {
            readers: HashSet::from([alice.id.unwrap()]),
            known_resource: Id::new_v4(),
        };
        let relay = Relay::new(registry, Arc::new(permissions));

        assert_eq!(relay.deliver(&event(None, "orphan")).await, 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_permission_check_skips_every_recipient_quietly() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(ConnectionRegistry::new());
        let alice = identity("alice");
        registry.register(alice.clone(), Arc::new(LoggingTransport::new("alice", &log)));

        let permissions = StaticPermissions {
            readers: HashSet::from([alice.id.unwrap()]),
            known_resource: Id::new_v4(),
        };
        let relay = Relay::new(registry, Arc::new(permissions));

        assert_eq!(relay.deliver(&event(Some(Id::new_v4()), "unknown")).await, 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_push_does_not_stop_delivery_to_others() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(ConnectionRegistry::new());
        let sensor_id = Id::new_v4();
        let (alice, bob) = (identity("alice"), identity("bob"));

        let mut broken = LoggingTransport::new("alice", &log);
        broken.fail = true;
        registry.register(alice.clone(), Arc::new(broken));
        registry.register(bob.clone(), Arc::new(LoggingTransport::new("bob", &log)));

        let permissions = StaticPermissions {
            readers: HashSet::from([alice.id.unwrap(), bob.id.unwrap()]),
            known_resource: sensor_id,
        };
        let relay = Relay::new(registry.clone(), Arc::new(permissions));

        assert_eq!(relay.deliver(&event(Some(sensor_id), "reading")).await, 1);
        assert_eq!(names(&log), vec!["bob".to_string()]);
        // The registry is left alone; the disconnect path cleans up.
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn unregister_during_delivery_skips_the_vanished_connection() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(ConnectionRegistry::new());
        let (alice, bob) = (identity("alice"), identity("bob"));
        registry.register(alice.clone(), Arc::new(LoggingTransport::new("alice", &log)));
        registry.register(bob.clone(), Arc::new(LoggingTransport::new("bob", &log)));

        // Whichever connection is checked first removes bob. If bob is checked
        // first he is gone before his push; otherwise he is gone before his check.
        let permissions = UnregisterDuringCheck {
            registry: registry.clone(),
            victim: bob,
        };
        let relay = Relay::new(registry.clone(), Arc::new(permissions));

        let delivered = relay.deliver(&event(Some(Id::new_v4()), "reading")).await;

        assert_eq!(delivered, 1);
        assert_eq!(names(&log), vec!["alice".to_string()]);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn relay_loop_preserves_event_order_with_a_slow_recipient() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(ConnectionRegistry::new());
        let sensor_id = Id::new_v4();
        let (alice, bob) = (identity("alice"), identity("bob"));

        let mut slow = LoggingTransport::new("alice", &log);
        slow.delay = Duration::from_millis(30);
        registry.register(alice.clone(), Arc::new(slow));
        registry.register(bob.clone(), Arc::new(LoggingTransport::new("bob", &log)));

        let permissions = StaticPermissions {
            readers: HashSet::from([alice.id.unwrap(), bob.id.unwrap()]),
            known_resource: sensor_id,
        };
        let relay = Arc::new(Relay::new(registry, Arc::new(permissions)));

        let (publisher, receiver) = events::channel();
        let task = spawn(receiver, relay);

        publisher.publish(event(Some(sensor_id), "A"));
        publisher.publish(event(Some(sensor_id), "B"));
        drop(publisher);

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("relay loop did not finish")
            .unwrap();

        let payloads: Vec<String> = log
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload)| payload.clone())
            .collect();
        let a = json!({ "label": "A" }).to_string();
        let b = json!({ "label": "B" }).to_string();
        assert_eq!(payloads, vec![a.clone(), a, b.clone(), b]);
    }

    #[tokio::test]
    async fn relay_loop_can_be_aborted() {
        let registry = Arc::new(ConnectionRegistry::new());
        let permissions = StaticPermissions {
            readers: HashSet::new(),
            known_resource: Id::new_v4(),
        };
        let relay = Arc::new(Relay::new(registry, Arc::new(permissions)));
        let (_publisher, receiver) = events::channel();

        let task = spawn(receiver, relay);
        task.abort();

        assert!(task.await.unwrap_err().is_cancelled());
    }
}
