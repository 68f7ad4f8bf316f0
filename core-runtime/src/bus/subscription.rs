//! Subscriptions and the per-subscription delivery turnstile.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use core_async::sync::watch;

use super::diagnostics::panic_error;
use crate::accounts::AccountAddress;
use crate::events::{Event, EventScope, Namespace};

/// Stable handle returned by `subscribe`, used to unsubscribe later.
///
/// Ids increase monotonically, so they also encode registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Which data events a subscription wants to see.
///
/// Native events ignore the filter and reach every subscription on their
/// namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AddressFilter {
    /// Data events for every account.
    Any,
    /// Data events for exactly this account.
    Specific(AccountAddress),
}

impl AddressFilter {
    pub fn matches(&self, scope: &EventScope) -> bool {
        match (self, scope) {
            (_, EventScope::Native) => true,
            (AddressFilter::Any, EventScope::Data { .. }) => true,
            (AddressFilter::Specific(address), EventScope::Data { target }) => address == target,
        }
    }

    /// The account this filter is bound to, if any.
    pub fn address(&self) -> Option<&AccountAddress> {
        match self {
            AddressFilter::Any => None,
            AddressFilter::Specific(address) => Some(address),
        }
    }
}

impl From<AccountAddress> for AddressFilter {
    fn from(address: AccountAddress) -> Self {
        AddressFilter::Specific(address)
    }
}

/// Future returned by an [`EventHandler`].
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Callback invoked for each delivered event.
///
/// Implemented for every `Fn(Event) -> impl Future<Output = anyhow::Result<()>>`
/// closure, so most subscribers never name this trait.
pub trait EventHandler: Send + Sync + 'static {
    fn handle(&self, event: Event) -> HandlerFuture;
}

impl<F, Fut> EventHandler for F
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn handle(&self, event: Event) -> HandlerFuture {
        Box::pin((self)(event))
    }
}

/// Why a handler invocation did not succeed.
pub(crate) struct InvocationError {
    pub(crate) error: anyhow::Error,
    pub(crate) panicked: bool,
}

/// Result of redeeming one [`Ticket`].
pub(crate) enum Outcome {
    Delivered,
    /// The subscription was retired before the ticket's turn came.
    Skipped,
    Failed(InvocationError),
}

/// Per-subscription turn state.
#[derive(Debug, Default)]
struct Turnstile {
    /// Ticket currently allowed to run the handler.
    serving: u64,
    /// Tickets given up before their turn came.
    abandoned: BTreeSet<u64>,
}

impl Turnstile {
    fn release(&mut self, ticket: u64) {
        if ticket != self.serving {
            self.abandoned.insert(ticket);
            return;
        }
        self.serving += 1;
        while self.abandoned.remove(&self.serving) {
            self.serving += 1;
        }
    }
}

pub(crate) struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) namespace: Namespace,
    pub(crate) filter: AddressFilter,
    handler: Arc<dyn EventHandler>,
    /// Next ticket to hand out. Tickets are taken under the index lock, so
    /// ticket order equals publish order.
    next_ticket: AtomicU64,
    turn: watch::Sender<Turnstile>,
    retired: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        namespace: Namespace,
        filter: AddressFilter,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        let (turn, _) = watch::channel(Turnstile::default());
        Self {
            id,
            namespace,
            filter,
            handler,
            next_ticket: AtomicU64::new(0),
            turn,
            retired: AtomicBool::new(false),
        }
    }

    pub(crate) fn take_ticket(self: &Arc<Self>) -> Ticket {
        Ticket {
            subscription: Arc::clone(self),
            number: self.next_ticket.fetch_add(1, Ordering::SeqCst),
        }
    }

    /// Tickets redeemed after this call skip the handler.
    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    async fn call(&self, event: Event) -> Result<(), InvocationError> {
        let handler = Arc::clone(&self.handler);
        let future = match panic::catch_unwind(AssertUnwindSafe(move || handler.handle(event))) {
            Ok(future) => future,
            Err(payload) => {
                return Err(InvocationError {
                    error: panic_error(payload),
                    panicked: true,
                })
            }
        };

        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(InvocationError {
                error,
                panicked: false,
            }),
            Err(payload) => Err(InvocationError {
                error: panic_error(payload),
                panicked: true,
            }),
        }
    }
}

/// A reserved slot in one subscription's delivery order.
///
/// Dropping a ticket, redeemed or not, lets the next one through without
/// needing a runtime.
pub(crate) struct Ticket {
    subscription: Arc<Subscription>,
    number: u64,
}

impl Ticket {
    pub(crate) fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Waits for this ticket's turn, then runs the handler unless the
    /// subscription was retired. Handler errors and panics are both captured.
    pub(crate) async fn redeem(self, event: Event) -> Outcome {
        let mut turn = self.subscription.turn.subscribe();
        // The sender lives in the subscription, so the channel cannot close here.
        let _ = turn
            .wait_for(|turnstile| turnstile.serving == self.number)
            .await;
        drop(turn);

        if self.subscription.retired.load(Ordering::SeqCst) {
            return Outcome::Skipped;
        }
        match self.subscription.call(event).await {
            Ok(()) => Outcome::Delivered,
            Err(failure) => Outcome::Failed(failure),
        }
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let number = self.number;
        self.subscription
            .turn
            .send_modify(|turnstile| turnstile.release(number));
    }
}
