//! # Event Bus
//!
//! Address-scoped publish/subscribe for one host process.
//!
//! ## Overview
//!
//! One [`EventBus`] is created per process and passed by handle (it is cheap
//! to clone) to every collaborator that publishes or subscribes. Subscriptions
//! name one [`Namespace`] and an [`AddressFilter`]:
//!
//! - native events reach every subscription on their namespace
//! - data events reach subscriptions whose filter is `Any` or names the
//!   event's target, provided the target is a registered account
//!
//! ## Delivery
//!
//! ```text
//!  publish(event)
//!     │  lock index: snapshot matching subscriptions, take one ticket each
//!     ▼
//!  delivery pass ──► sub#1 (wait ticket) ──► sub#2 (wait ticket) ──► ...
//! ```
//!
//! Each publish produces one delivery pass over a stable snapshot, invoking
//! handlers in registration order. A subscription only runs one invocation at
//! a time and sees events in publish order, while passes for different events
//! run concurrently. `publish` schedules the pass and returns; `publish_and_flush`
//! waits for it.
//!
//! Handler errors and panics go to the configured
//! [`DiagnosticSink`]; they never reach the publisher or stop the pass.
//!
//! ## Example
//!
//! ```rust
//! use core_runtime::accounts::AccountAddress;
//! use core_runtime::bus::{AddressFilter, EventBus};
//! use core_runtime::events::catalog::{MessageReceived, MessageReceivedEvent};
//! use core_runtime::events::Event;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new();
//! let acct = AccountAddress::new("acct-1");
//! bus.accounts().register(acct.clone());
//!
//! let received = Arc::new(AtomicUsize::new(0));
//! let counter = received.clone();
//! bus.subscribe_to::<MessageReceivedEvent, _, _>(acct.clone().into(), move |_event, message| {
//!     let counter = counter.clone();
//!     async move {
//!         assert_eq!(message.message_id, "MSG-1");
//!         counter.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     }
//! });
//!
//! let event = Event::data::<MessageReceivedEvent>(
//!     acct,
//!     MessageReceived {
//!         message_id: "MSG-1".to_string(),
//!         sender: "peer-9".to_string(),
//!     },
//! );
//! bus.publish_and_flush(event).await;
//! assert_eq!(received.load(Ordering::SeqCst), 1);
//! # }
//! ```
//!
//! ## Calling back into the bus from a handler
//!
//! Handlers may publish, subscribe, unsubscribe and tear down accounts.
//! Inside a handler `drain` (and therefore `remove_account` and `shutdown`)
//! only waits for deliveries that started before the current one, since
//! later ones may be queued behind the running handler. For the same reason
//! `publish_and_flush` inside a handler does not wait: it publishes and
//! returns. Work a handler spawns onto another task is not recognised as
//! running inside a delivery and must not wait on the bus.

mod diagnostics;
mod stream;
mod subscription;

pub use diagnostics::{CollectingDiagnostics, DiagnosticSink, HandlerFailure, TracingDiagnostics};
pub use stream::EventStream;
pub use subscription::{AddressFilter, EventHandler, HandlerFuture, SubscriptionId};

use bridge_traits::Clock;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, debug_span, info, warn, Instrument};

use core_async::sync::{mpsc, watch};

use crate::accounts::{AccountAddress, AccountRegistry};
use crate::config::EventBusConfig;
use crate::events::{Event, EventScope, EventType, Namespace};
use crate::logging::redact_address;
use subscription::{Outcome, Subscription, Ticket};

/// Delivery counters since the bus was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Events accepted for routing.
    pub published: u64,
    /// Handler invocations that completed successfully.
    pub delivered: u64,
    /// Events rejected before routing (unknown account, closed bus).
    pub dropped: u64,
    /// Handler invocations that returned an error or panicked.
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    published: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> BusStats {
        BusStats {
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

core_async::task::task_local! {
    /// Sequence number of the delivery pass whose handler is running.
    static CURRENT_PASS: u64;
}

fn current_pass() -> Option<u64> {
    CURRENT_PASS.try_with(|seq| *seq).ok()
}

#[derive(Default)]
struct Index {
    /// Subscriptions per namespace, each list in registration order.
    by_namespace: HashMap<Namespace, Vec<Arc<Subscription>>>,
    namespace_of: HashMap<SubscriptionId, Namespace>,
    next_pass: u64,
    closed: bool,
}

impl Index {
    fn insert(&mut self, subscription: Arc<Subscription>) {
        self.namespace_of
            .insert(subscription.id, subscription.namespace.clone());
        self.by_namespace
            .entry(subscription.namespace.clone())
            .or_default()
            .push(subscription);
    }

    fn remove(&mut self, id: SubscriptionId) -> Option<Arc<Subscription>> {
        let namespace = self.namespace_of.remove(&id)?;
        let list = self.by_namespace.get_mut(&namespace)?;
        let position = list.iter().position(|subscription| subscription.id == id)?;
        let removed = list.remove(position);
        if list.is_empty() {
            self.by_namespace.remove(&namespace);
        }
        Some(removed)
    }

    fn remove_bound_to(&mut self, address: &AccountAddress) -> Vec<Arc<Subscription>> {
        let mut removed = Vec::new();
        for list in self.by_namespace.values_mut() {
            list.retain(|subscription| {
                if subscription.filter.address() == Some(address) {
                    removed.push(Arc::clone(subscription));
                    false
                } else {
                    true
                }
            });
        }
        self.by_namespace.retain(|_, list| !list.is_empty());
        for subscription in &removed {
            self.namespace_of.remove(&subscription.id);
        }
        removed
    }

    fn take_all(&mut self) -> Vec<Arc<Subscription>> {
        self.namespace_of.clear();
        self.by_namespace
            .drain()
            .flat_map(|(_, list)| list)
            .collect()
    }

    fn len(&self) -> usize {
        self.namespace_of.len()
    }
}

pub(crate) struct Inner {
    index: Mutex<Index>,
    next_id: AtomicU64,
    accounts: Arc<AccountRegistry>,
    diagnostics: Arc<dyn DiagnosticSink>,
    clock: Arc<dyn Clock>,
    pending_warning_threshold: usize,
    /// Sequence numbers of passes that have not finished.
    in_flight: watch::Sender<BTreeSet<u64>>,
    counters: Counters,
}

impl Inner {
    fn lock_index(&self) -> MutexGuard<'_, Index> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add_subscription(
        &self,
        namespace: Namespace,
        filter: AddressFilter,
        handler: Arc<dyn EventHandler>,
    ) -> SubscriptionId {
        let id = SubscriptionId::from_raw(self.next_id.fetch_add(1, Ordering::SeqCst));
        let subscription = Arc::new(Subscription::new(id, namespace, filter, handler));

        debug!(
            subscription = %id,
            namespace = %subscription.namespace,
            filter = ?subscription.filter.address().map(|a| redact_address(a.as_str())),
            "Subscribed"
        );
        self.lock_index().insert(subscription);
        id
    }

    pub(crate) fn remove_subscription(&self, id: SubscriptionId) -> bool {
        // Dropped after the lock is released; a handler may own a stream.
        let removed = self.lock_index().remove(id);
        if removed.is_some() {
            debug!(subscription = %id, "Unsubscribed");
        }
        removed.is_some()
    }

    /// Routes `event` and reserves delivery slots, or returns `None` when
    /// there is nothing to deliver.
    fn prepare(self: &Arc<Self>, event: Event) -> Option<DeliveryPass> {
        let mut index = self.lock_index();
        if index.closed {
            drop(index);
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(namespace = %event.namespace(), "Event published after bus shutdown");
            return None;
        }

        // Checked under the index lock so `remove_account` cannot interleave.
        if let EventScope::Data { target } = event.scope() {
            if !self.accounts.contains(target) {
                drop(index);
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    namespace = %event.namespace(),
                    target = %redact_address(target.as_str()),
                    "Dropping data event for unknown account"
                );
                return None;
            }
        }

        self.counters.published.fetch_add(1, Ordering::Relaxed);
        let targets: VecDeque<Ticket> = index
            .by_namespace
            .get(event.namespace())
            .into_iter()
            .flatten()
            .filter(|subscription| subscription.filter.matches(event.scope()))
            .map(Subscription::take_ticket)
            .collect();

        if targets.is_empty() {
            drop(index);
            debug!(namespace = %event.namespace(), "No subscribers for event");
            return None;
        }

        let seq = index.next_pass;
        index.next_pass += 1;
        let mut pending = 0;
        self.in_flight.send_modify(|passes| {
            passes.insert(seq);
            pending = passes.len();
        });
        drop(index);

        if pending > self.pending_warning_threshold {
            warn!(
                pending,
                threshold = self.pending_warning_threshold,
                "Event deliveries are piling up"
            );
        }

        Some(DeliveryPass {
            bus: Arc::clone(self),
            seq,
            event,
            targets,
        })
    }

    fn report_failure(
        &self,
        subscription: SubscriptionId,
        event: &Event,
        error: anyhow::Error,
        panicked: bool,
    ) {
        self.counters.failed.fetch_add(1, Ordering::Relaxed);
        self.diagnostics.handler_failed(HandlerFailure {
            subscription,
            namespace: event.namespace().clone(),
            target: event.target().cloned(),
            error,
            panicked,
        });
    }

    /// Waits for in-flight passes. From inside a handler only passes that
    /// started before the running one are awaited.
    async fn drain(&self) {
        let mut in_flight = self.in_flight.subscribe();
        let current = current_pass();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = in_flight
            .wait_for(|passes| match current {
                Some(seq) => passes.range(..seq).next().is_none(),
                None => passes.is_empty(),
            })
            .await;
    }
}

/// One publish worth of handler invocations.
///
/// Dropping a pass before it finishes releases its remaining tickets, so
/// later events are not stuck behind it.
struct DeliveryPass {
    bus: Arc<Inner>,
    /// Publish order across the bus.
    seq: u64,
    event: Event,
    targets: VecDeque<Ticket>,
}

impl DeliveryPass {
    async fn run(mut self) {
        let span = debug_span!(
            "event_delivery",
            pass = self.seq,
            namespace = %self.event.namespace(),
            subscribers = self.targets.len()
        );

        let seq = self.seq;
        let deliveries = async move {
            while let Some(ticket) = self.targets.pop_front() {
                let subscription = ticket.subscription().id;
                match ticket.redeem(self.event.clone()).await {
                    Outcome::Delivered => {
                        self.bus.counters.delivered.fetch_add(1, Ordering::Relaxed);
                    }
                    Outcome::Skipped => {
                        debug!(subscription = %subscription, "Skipped retired subscription");
                    }
                    Outcome::Failed(failure) => {
                        self.bus.report_failure(
                            subscription,
                            &self.event,
                            failure.error,
                            failure.panicked,
                        );
                    }
                }
            }
        };
        CURRENT_PASS.scope(seq, deliveries.instrument(span)).await
    }
}

impl Drop for DeliveryPass {
    fn drop(&mut self) {
        let seq = self.seq;
        self.bus.in_flight.send_modify(|passes| {
            passes.remove(&seq);
        });
    }
}

/// Shared handle to the process-wide event bus.
///
/// # Example
///
/// ```rust
/// use core_runtime::bus::{AddressFilter, EventBus};
/// use core_runtime::events::{Event, EventType};
/// use core_runtime::events::catalog::{UrlOpened, UrlOpenedEvent};
///
/// # #[tokio::main]
/// # async fn main() {
/// let bus = EventBus::new();
/// let id = bus.subscribe(UrlOpenedEvent::NAMESPACE, AddressFilter::Any, |event: Event| async move {
///     println!("opened {:?}", event.payload::<UrlOpened>());
///     Ok(())
/// });
///
/// bus.publish(Event::native::<UrlOpenedEvent>(UrlOpened { url: "nmshd://x".into() }));
/// bus.drain().await;
/// assert!(bus.unsubscribe(id));
/// # }
/// ```
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    /// Creates a bus with default settings and an empty account registry.
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        let (in_flight, _) = watch::channel(BTreeSet::new());
        Self {
            inner: Arc::new(Inner {
                index: Mutex::new(Index::default()),
                next_id: AtomicU64::new(1),
                accounts: config.accounts,
                diagnostics: config.diagnostics,
                clock: config.clock,
                pending_warning_threshold: config.pending_warning_threshold,
                in_flight,
                counters: Counters::default(),
            }),
        }
    }

    /// Accounts whose data events this bus routes.
    pub fn accounts(&self) -> &Arc<AccountRegistry> {
        &self.inner.accounts
    }

    /// Time source for events the core creates itself.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    /// Registers `handler` for events on `namespace` that pass `filter`.
    ///
    /// Never fails. The handler runs for events published after this call.
    pub fn subscribe<F, Fut>(
        &self,
        namespace: Namespace,
        filter: AddressFilter,
        handler: F,
    ) -> SubscriptionId
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.inner
            .add_subscription(namespace, filter, Arc::new(handler))
    }

    /// Registers a prebuilt [`EventHandler`], e.g. one shared by several
    /// subscriptions.
    pub fn subscribe_handler(
        &self,
        namespace: Namespace,
        filter: AddressFilter,
        handler: Arc<dyn EventHandler>,
    ) -> SubscriptionId {
        self.inner.add_subscription(namespace, filter, handler)
    }

    /// Typed variant of [`subscribe`](Self::subscribe) for catalogued kinds.
    ///
    /// The handler receives the payload already downcast. An event on the
    /// namespace whose payload has another type is reported to the
    /// diagnostic sink instead of reaching the handler.
    pub fn subscribe_to<E, F, Fut>(&self, filter: AddressFilter, handler: F) -> SubscriptionId
    where
        E: EventType,
        F: Fn(Event, Arc<E::Payload>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.subscribe(E::NAMESPACE, filter, move |event: Event| {
            let invocation = match event.payload_arc::<E::Payload>() {
                Some(payload) => Ok(handler(event, payload)),
                None => Err(anyhow::anyhow!(
                    "payload of {} is {}, expected {}",
                    event.namespace(),
                    event.payload_type(),
                    std::any::type_name::<E::Payload>()
                )),
            };

            async move {
                match invocation {
                    Ok(future) => future.await,
                    Err(err) => Err(err),
                }
            }
        })
    }

    /// Registers a subscription that buffers matching events in an
    /// [`EventStream`].
    pub fn stream(&self, namespace: Namespace, filter: AddressFilter) -> EventStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.subscribe(namespace, filter, move |event: Event| {
            // A closed receiver means the stream is being dropped.
            let _ = sender.send(event);
            async { Ok(()) }
        });
        EventStream::new(id, receiver, Arc::downgrade(&self.inner))
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    ///
    /// Delivery passes that already snapshotted the subscription still
    /// invoke it once.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.remove_subscription(id)
    }

    /// Schedules delivery of `event` and returns immediately.
    ///
    /// Inside a Tokio runtime the pass is spawned. From plain synchronous
    /// code it runs to completion on the calling thread.
    pub fn publish(&self, event: Event) {
        if let Some(pass) = self.inner.prepare(event) {
            core_async::task::dispatch(pass.run());
        }
    }

    /// Delivers `event` and waits until every matching handler has finished.
    ///
    /// The pass runs as its own task, so cancelling the caller does not
    /// interrupt delivery. Called from inside a handler this only publishes:
    /// the new pass may need a turn the running handler still holds.
    pub async fn publish_and_flush(&self, event: Event) {
        if let Some(pass) = current_pass() {
            warn!(
                pass,
                namespace = %event.namespace(),
                "publish_and_flush called from a handler, not waiting for delivery"
            );
            self.publish(event);
            return;
        }

        let Some(pass) = self.inner.prepare(event) else {
            return;
        };

        match core_async::runtime::current() {
            Some(handle) => {
                if let Err(err) = handle.spawn(pass.run()).await {
                    warn!(error = %err, "Event delivery task did not complete");
                }
            }
            None => pass.run().await,
        }
    }

    /// Waits until every delivery pass started so far has finished.
    ///
    /// From inside a handler, waits for the passes published before the one
    /// running that handler.
    pub async fn drain(&self) {
        self.inner.drain().await;
    }

    /// Tears down routing for one account.
    ///
    /// Removes every subscription bound to `address` and unregisters it in
    /// one step, so events published from then on are neither routed to
    /// those subscriptions nor accepted for the address. Deliveries already
    /// queued for the removed subscriptions are skipped; then waits for
    /// in-flight passes. Returns the number of removed subscriptions.
    pub async fn remove_account(&self, address: &AccountAddress) -> usize {
        let removed = {
            let mut index = self.inner.lock_index();
            let removed = index.remove_bound_to(address);
            for subscription in &removed {
                subscription.retire();
            }
            self.inner.accounts.unregister(address);
            removed
        };
        let count = removed.len();
        drop(removed);

        self.inner.drain().await;
        info!(
            address = %redact_address(address.as_str()),
            subscriptions = count,
            "Account removed from event bus"
        );
        count
    }

    /// Stops accepting events, waits for in-flight deliveries and removes all
    /// subscriptions. Streams end once their buffers are read.
    pub async fn shutdown(&self) {
        self.inner.lock_index().closed = true;
        self.inner.drain().await;

        let removed = self.inner.lock_index().take_all();
        for subscription in &removed {
            subscription.retire();
        }
        info!(subscriptions = removed.len(), "Event bus shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock_index().closed
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.lock_index().len()
    }

    /// Delivery passes currently running or waiting for a turn.
    pub fn pending_deliveries(&self) -> usize {
        self.inner.in_flight.borrow().len()
    }

    pub fn stats(&self) -> BusStats {
        self.inner.counters.snapshot()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscription_count", &self.subscription_count())
            .field("pending_deliveries", &self.pending_deliveries())
            .field("stats", &self.stats())
            .finish()
    }
}
