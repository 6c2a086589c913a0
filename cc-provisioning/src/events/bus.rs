//! Typed event bus.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, instrument};

use super::{EventKind, LifecycleEvent};
use crate::errors::ProvisionError;

/// Priority most subscribers register at.
pub const DEFAULT_PRIORITY: u32 = 10;
/// Site initialization runs after the runtime's own setup handlers.
pub const SITE_INIT_PRIORITY: u32 = 50;

/// A handler of lifecycle events.
#[async_trait]
pub trait LifecycleSubscriber: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Event kinds this subscriber wants.
    fn subscriptions(&self) -> &'static [EventKind];

    /// Handle one event.
    ///
    /// # Arguments
    ///
    /// * `event` - An event whose kind is listed in `subscriptions`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The event was handled, including recovered remote failures
    /// * `Err(ProvisionError)` - A failure the native action should see
    async fn handle(&self, event: &LifecycleEvent) -> Result<(), ProvisionError>;
}

struct Registration {
    subscriber: Arc<dyn LifecycleSubscriber>,
    priority: u32,
    sequence: usize,
}

/// Dispatches events to subscribers in (priority, registration) order.
///
/// Handlers run one after the other. The first error stops the dispatch and
/// is returned.
#[derive(Default)]
pub struct EventBus {
    registrations: Vec<Registration>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber`. Lower priorities run first.
    pub fn subscribe(&mut self, subscriber: Arc<dyn LifecycleSubscriber>, priority: u32) {
        let sequence = self.registrations.len();
        debug!(subscriber = subscriber.name(), priority, "Registered subscriber");
        self.registrations.push(Registration {
            subscriber,
            priority,
            sequence,
        });
        self.registrations
            .sort_by_key(|registration| (registration.priority, registration.sequence));
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Deliver `event` to every interested subscriber.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of subscribers that handled the event
    /// * `Err(ProvisionError)` - The first subscriber failure
    #[instrument(skip(self, event), fields(event = event.event_type()))]
    pub async fn dispatch(&self, event: &LifecycleEvent) -> Result<usize, ProvisionError> {
        let kind = event.kind();
        let mut handled = 0;

        for registration in &self.registrations {
            let subscriber = &registration.subscriber;
            if !subscriber.subscriptions().contains(&kind) {
                continue;
            }
            if let Err(e) = subscriber.handle(event).await {
                error!(
                    subscriber = subscriber.name(),
                    error = %e,
                    "Subscriber failed"
                );
                return Err(e);
            }
            handled += 1;
        }

        debug!(handled, "Dispatched event");
        Ok(handled)
    }
}
