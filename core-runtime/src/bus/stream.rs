//! Pull-style consumption of bus events.

use futures::Stream;
use std::fmt;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use core_async::sync::mpsc;

use super::subscription::SubscriptionId;
use super::Inner;
use crate::events::Event;

/// Receives the events matched by one subscription through a channel instead
/// of a callback.
///
/// Created by [`EventBus::stream`](super::EventBus::stream). Dropping the
/// stream removes its subscription. Once the bus shuts down and every pending
/// event has been read, [`recv`](EventStream::recv) returns `None`.
///
/// # Example
///
/// ```rust
/// use core_runtime::bus::{AddressFilter, EventBus};
/// use core_runtime::events::catalog::AppReadyEvent;
/// use core_runtime::events::{Event, EventType};
///
/// # #[tokio::main]
/// # async fn main() {
/// let bus = EventBus::new();
/// let mut stream = bus.stream(AppReadyEvent::NAMESPACE, AddressFilter::Any);
///
/// bus.publish_and_flush(Event::native::<AppReadyEvent>(())).await;
///
/// let event = stream.recv().await.unwrap();
/// assert!(event.is_native());
/// # }
/// ```
pub struct EventStream {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<Event>,
    bus: Weak<Inner>,
}

impl EventStream {
    pub(crate) fn new(
        id: SubscriptionId,
        receiver: mpsc::UnboundedReceiver<Event>,
        bus: Weak<Inner>,
    ) -> Self {
        Self { id, receiver, bus }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event. `None` once the subscription is gone and the
    /// buffer is empty.
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Returns a buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            inner.remove_subscription(self.id);
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("id", &self.id)
            .field("bus_alive", &(self.bus.strong_count() > 0))
            .finish()
    }
}
