//! Delivery guarantees of the event bus under concurrency.

use core_runtime::accounts::AccountAddress;
use core_runtime::bus::{AddressFilter, CollectingDiagnostics, EventBus, SubscriptionId};
use core_runtime::config::EventBusConfig;
use core_runtime::events::catalog::{
    AppReadyEvent, AttributeChanged, AttributeCreatedEvent, MessageReceived,
    MessageReceivedEvent, UrlOpened, UrlOpenedEvent,
};
use core_runtime::events::{Event, EventType, Namespace};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn message(address: &AccountAddress, id: &str) -> Event {
    Event::data::<MessageReceivedEvent>(
        address.clone(),
        MessageReceived {
            message_id: id.to_string(),
            sender: "peer-9".to_string(),
        },
    )
}

fn bus_with_diagnostics() -> (EventBus, Arc<CollectingDiagnostics>) {
    let diagnostics = Arc::new(CollectingDiagnostics::new());
    let config = EventBusConfig::builder()
        .diagnostics(diagnostics.clone())
        .build()
        .unwrap();
    (EventBus::with_config(config), diagnostics)
}

#[tokio::test]
async fn test_flush_waits_for_every_handler() {
    let bus = EventBus::new();
    let counter = Arc::new(AtomicUsize::new(0));

    for delay_ms in [30u64, 0, 10, 5, 20] {
        let counter = Arc::clone(&counter);
        bus.subscribe(AppReadyEvent::NAMESPACE, AddressFilter::Any, move |_event: Event| {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
    }

    bus.publish_and_flush(Event::native::<AppReadyEvent>(())).await;

    assert_eq!(counter.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_unsubscribe_during_delivery_keeps_current_pass() {
    let bus = EventBus::new();
    let h2_calls = Arc::new(AtomicUsize::new(0));
    let h2_id: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

    let remover = bus.clone();
    let target = Arc::clone(&h2_id);
    bus.subscribe(AppReadyEvent::NAMESPACE, AddressFilter::Any, move |_event: Event| {
        if let Some(id) = target.lock().unwrap().take() {
            remover.unsubscribe(id);
        }
        async { Ok(()) }
    });

    let calls = Arc::clone(&h2_calls);
    let id = bus.subscribe(AppReadyEvent::NAMESPACE, AddressFilter::Any, move |_event: Event| {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    });
    *h2_id.lock().unwrap() = Some(id);

    bus.publish_and_flush(Event::native::<AppReadyEvent>(())).await;
    assert_eq!(h2_calls.load(Ordering::SeqCst), 1);

    bus.publish_and_flush(Event::native::<AppReadyEvent>(())).await;
    assert_eq!(h2_calls.load(Ordering::SeqCst), 1);
    assert_eq!(bus.subscription_count(), 1);
}

#[tokio::test]
async fn test_failures_do_not_stop_the_pass() {
    let (bus, diagnostics) = bus_with_diagnostics();
    let after = Arc::new(AtomicUsize::new(0));

    bus.subscribe(AppReadyEvent::NAMESPACE, AddressFilter::Any, |_event: Event| async {
        Err(anyhow::anyhow!("storage offline"))
    });
    bus.subscribe(AppReadyEvent::NAMESPACE, AddressFilter::Any, |_event: Event| async {
        if true {
            panic!("handler bug");
        }
        Ok(())
    });
    let counter = Arc::clone(&after);
    bus.subscribe(AppReadyEvent::NAMESPACE, AddressFilter::Any, move |_event: Event| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    });

    bus.publish_and_flush(Event::native::<AppReadyEvent>(())).await;

    assert_eq!(after.load(Ordering::SeqCst), 1);
    let failures = diagnostics.take();
    assert_eq!(failures.len(), 2);
    assert!(!failures[0].panicked);
    assert_eq!(failures[0].error.to_string(), "storage offline");
    assert!(failures[1].panicked);
    assert!(failures[1].error.to_string().contains("handler bug"));
    assert_eq!(bus.stats().failed, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_handler_invocations_never_overlap() {
    let acct = AccountAddress::new("acct-1");
    let bus = EventBus::new();
    bus.accounts().register(acct.clone());

    let busy = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));

    {
        let busy = Arc::clone(&busy);
        let overlaps = Arc::clone(&overlaps);
        let seen = Arc::clone(&seen);
        bus.subscribe(MessageReceivedEvent::NAMESPACE, acct.clone().into(), move |event: Event| {
            let busy = Arc::clone(&busy);
            let overlaps = Arc::clone(&overlaps);
            let seen = Arc::clone(&seen);
            async move {
                if busy.swap(true, Ordering::SeqCst) {
                    overlaps.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
                let id = event.payload::<MessageReceived>().unwrap().message_id.clone();
                seen.lock().unwrap().push(id);
                busy.store(false, Ordering::SeqCst);
                Ok(())
            }
        });
    }

    for i in 0..20 {
        bus.publish(message(&acct, &format!("MSG-{i}")));
    }
    bus.drain().await;

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    let expected: Vec<String> = (0..20).map(|i| format!("MSG-{i}")).collect();
    assert_eq!(*seen.lock().unwrap(), expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_subscriber_does_not_block_other_events() {
    let bus = EventBus::new();
    let acct = AccountAddress::new("acct-1");
    bus.accounts().register(acct.clone());

    let release = Arc::new(tokio::sync::Notify::new());
    let gate = Arc::clone(&release);
    bus.subscribe(AppReadyEvent::NAMESPACE, AddressFilter::Any, move |_event: Event| {
        let gate = Arc::clone(&gate);
        async move {
            gate.notified().await;
            Ok(())
        }
    });

    let attribute_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attribute_calls);
    bus.subscribe(AttributeCreatedEvent::NAMESPACE, AddressFilter::Any, move |_event: Event| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    });

    bus.publish(Event::native::<AppReadyEvent>(()));
    bus.publish_and_flush(Event::data::<AttributeCreatedEvent>(
        acct,
        AttributeChanged {
            attribute_id: "ATT-1".to_string(),
        },
    ))
    .await;

    assert_eq!(attribute_calls.load(Ordering::SeqCst), 1);
    assert_eq!(bus.pending_deliveries(), 1);

    release.notify_one();
    bus.drain().await;
    assert_eq!(bus.pending_deliveries(), 0);
}

#[tokio::test]
async fn test_remove_account_drops_bound_subscriptions() {
    let bus = EventBus::new();
    let acct1 = AccountAddress::new("acct-1");
    let acct2 = AccountAddress::new("acct-2");
    bus.accounts().register(acct1.clone());
    bus.accounts().register(acct2.clone());
    bus.accounts().select(&acct1).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    for filter in [
        AddressFilter::from(acct1.clone()),
        AddressFilter::from(acct1.clone()),
        AddressFilter::from(acct2.clone()),
        AddressFilter::Any,
    ] {
        let calls = Arc::clone(&calls);
        bus.subscribe(MessageReceivedEvent::NAMESPACE, filter, move |_event: Event| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });
    }

    assert_eq!(bus.remove_account(&acct1).await, 2);
    assert_eq!(bus.subscription_count(), 2);
    assert!(!bus.accounts().contains(&acct1));
    assert_eq!(bus.accounts().active(), None);

    // Unregistered now, so the event is dropped before routing.
    bus.publish_and_flush(message(&acct1, "MSG-1")).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    bus.publish_and_flush(message(&acct2, "MSG-2")).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_shutdown_drains_and_closes() {
    let bus = EventBus::new();
    let done = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&done);
    bus.subscribe(AppReadyEvent::NAMESPACE, AddressFilter::Any, move |_event: Event| {
        let counter = Arc::clone(&counter);
        async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });
    let mut stream = bus.stream(AppReadyEvent::NAMESPACE, AddressFilter::Any);

    bus.publish(Event::native::<AppReadyEvent>(()));
    bus.shutdown().await;

    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert!(bus.is_closed());
    assert_eq!(bus.subscription_count(), 0);

    bus.publish(Event::native::<AppReadyEvent>(()));
    assert_eq!(bus.stats().dropped, 1);

    // Buffered event first, then the end of the stream.
    assert!(stream.recv().await.is_some());
    assert!(stream.recv().await.is_none());
}

#[tokio::test]
async fn test_stream_as_futures_stream() {
    use futures::StreamExt;

    let bus = EventBus::new();
    let acct = AccountAddress::new("acct-1");
    bus.accounts().register(acct.clone());

    let stream = bus.stream(MessageReceivedEvent::NAMESPACE, acct.clone().into());
    for i in 0..3 {
        bus.publish_and_flush(message(&acct, &format!("MSG-{i}"))).await;
    }

    let ids: Vec<String> = stream
        .take(3)
        .map(|event| event.payload::<MessageReceived>().unwrap().message_id.clone())
        .collect()
        .await;
    assert_eq!(ids, vec!["MSG-0", "MSG-1", "MSG-2"]);
}

#[tokio::test]
async fn test_handler_can_remove_an_account() {
    let bus = EventBus::new();
    let acct = AccountAddress::new("acct-1");
    bus.accounts().register(acct.clone());

    let scoped_calls = Arc::new(AtomicUsize::new(0));
    let calls = Arc::clone(&scoped_calls);
    bus.subscribe(MessageReceivedEvent::NAMESPACE, acct.clone().into(), move |_event: Event| {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    });

    let removed = Arc::new(AtomicUsize::new(0));
    {
        let bus_in_handler = bus.clone();
        let acct = acct.clone();
        let removed = Arc::clone(&removed);
        bus.subscribe(AppReadyEvent::NAMESPACE, AddressFilter::Any, move |_event: Event| {
            let bus = bus_in_handler.clone();
            let acct = acct.clone();
            let removed = Arc::clone(&removed);
            async move {
                removed.store(bus.remove_account(&acct).await, Ordering::SeqCst);
                Ok(())
            }
        });
    }

    tokio::time::timeout(
        Duration::from_secs(2),
        bus.publish_and_flush(Event::native::<AppReadyEvent>(())),
    )
    .await
    .expect("removing an account from a handler must not hang");

    assert_eq!(removed.load(Ordering::SeqCst), 1);
    assert!(!bus.accounts().contains(&acct));
    bus.publish_and_flush(message(&acct, "MSG-1")).await;
    assert_eq!(scoped_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_handler_can_drain_and_shut_down() {
    let bus = EventBus::new();
    let earlier_done = Arc::new(AtomicBool::new(false));
    let seen_by_drain = Arc::new(AtomicBool::new(false));

    {
        let done = Arc::clone(&earlier_done);
        bus.subscribe(AppReadyEvent::NAMESPACE, AddressFilter::Any, move |_event: Event| {
            let done = Arc::clone(&done);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.store(true, Ordering::SeqCst);
                Ok(())
            }
        });
    }
    {
        let bus_in_handler = bus.clone();
        let done = Arc::clone(&earlier_done);
        let seen = Arc::clone(&seen_by_drain);
        bus.subscribe(UrlOpenedEvent::NAMESPACE, AddressFilter::Any, move |_event: Event| {
            let bus = bus_in_handler.clone();
            let done = Arc::clone(&done);
            let seen = Arc::clone(&seen);
            async move {
                bus.drain().await;
                seen.store(done.load(Ordering::SeqCst), Ordering::SeqCst);
                bus.shutdown().await;
                Ok(())
            }
        });
    }

    bus.publish(Event::native::<AppReadyEvent>(()));
    tokio::time::timeout(
        Duration::from_secs(2),
        bus.publish_and_flush(Event::native::<UrlOpenedEvent>(UrlOpened {
            url: "nmshd://qr#close".to_string(),
        })),
    )
    .await
    .expect("draining from a handler must not hang");

    // The earlier pass finished before the handler's drain returned.
    assert!(seen_by_drain.load(Ordering::SeqCst));
    assert!(bus.is_closed());
    assert_eq!(bus.subscription_count(), 0);
}

#[tokio::test]
async fn test_nested_flush_into_a_shared_subscriber_completes() {
    let bus = EventBus::new();
    let acct1 = AccountAddress::new("acct-1");
    let acct2 = AccountAddress::new("acct-2");
    bus.accounts().register(acct1.clone());
    bus.accounts().register(acct2.clone());

    {
        let bus_in_handler = bus.clone();
        let acct2 = acct2.clone();
        bus.subscribe(MessageReceivedEvent::NAMESPACE, acct1.clone().into(), move |_event: Event| {
            let bus = bus_in_handler.clone();
            let forwarded = message(&acct2, "MSG-forwarded");
            async move {
                bus.publish_and_flush(forwarded).await;
                Ok(())
            }
        });
    }
    let everything = Arc::new(Mutex::new(Vec::new()));
    {
        let everything = Arc::clone(&everything);
        bus.subscribe(MessageReceivedEvent::NAMESPACE, AddressFilter::Any, move |event: Event| {
            let id = event.payload::<MessageReceived>().unwrap().message_id.clone();
            everything.lock().unwrap().push(id);
            async { Ok(()) }
        });
    }

    tokio::time::timeout(
        Duration::from_secs(2),
        bus.publish_and_flush(message(&acct1, "MSG-original")),
    )
    .await
    .expect("a flush from a handler must not wait on its own pass");
    bus.drain().await;

    assert_eq!(
        *everything.lock().unwrap(),
        vec!["MSG-original".to_string(), "MSG-forwarded".to_string()]
    );
}

#[tokio::test]
async fn test_routing_across_many_namespaces() {
    let bus = EventBus::new();
    let hits: Arc<Vec<AtomicUsize>> = Arc::new((0..50).map(|_| AtomicUsize::new(0)).collect());

    let mut ids = Vec::new();
    for i in 0..50 {
        let namespace = Namespace::parse(format!("app.hostSignal{i}")).unwrap();
        let hits = Arc::clone(&hits);
        ids.push(bus.subscribe(namespace, AddressFilter::Any, move |_event: Event| {
            hits[i].fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        }));
    }
    assert_eq!(bus.subscription_count(), 50);

    let signal =
        |i: usize| Event::native_with(Namespace::parse(format!("app.hostSignal{i}")).unwrap(), ());
    bus.publish_and_flush(signal(7)).await;
    bus.publish_and_flush(signal(42)).await;
    bus.publish_and_flush(Event::native::<AppReadyEvent>(())).await;

    for (i, count) in hits.iter().enumerate() {
        let expected = usize::from(i == 7 || i == 42);
        assert_eq!(count.load(Ordering::SeqCst), expected, "namespace {i}");
    }

    assert!(bus.unsubscribe(ids[7]));
    assert!(!bus.unsubscribe(ids[7]));
    assert_eq!(bus.subscription_count(), 49);
    bus.publish_and_flush(signal(7)).await;
    assert_eq!(hits[7].load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_events_published_during_removal_skip_removed_subscriptions() {
    let bus = EventBus::new();
    let acct = AccountAddress::new("acct-1");
    bus.accounts().register(acct.clone());

    let delivered = Arc::new(Mutex::new(Vec::new()));
    {
        let delivered = Arc::clone(&delivered);
        bus.subscribe(MessageReceivedEvent::NAMESPACE, acct.clone().into(), move |event: Event| {
            let delivered = Arc::clone(&delivered);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let id = event.payload::<MessageReceived>().unwrap().message_id.clone();
                delivered.lock().unwrap().push(id);
                Ok(())
            }
        });
    }

    // The first runs while the rest queue behind it on the same subscription.
    bus.publish(message(&acct, "MSG-running"));
    bus.publish(message(&acct, "MSG-queued"));
    tokio::time::sleep(Duration::from_millis(5)).await;

    let removal = {
        let bus = bus.clone();
        let acct = acct.clone();
        tokio::spawn(async move { bus.remove_account(&acct).await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    bus.publish(message(&acct, "MSG-late"));

    assert_eq!(removal.await.unwrap(), 1);
    bus.drain().await;
    assert_eq!(*delivered.lock().unwrap(), vec!["MSG-running".to_string()]);
}
