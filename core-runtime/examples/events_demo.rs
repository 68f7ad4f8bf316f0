//! Event bus walkthrough
//!
//! Registers two accounts, subscribes per account and globally, and shows how
//! data events stay with their account while native events reach everyone.
//!
//! Run with:
//! ```bash
//! cargo run -p core-runtime --example events_demo
//! cargo run -p core-runtime --example events_demo -- json
//! ```

use bridge_traits::LogLevel;
use core_runtime::accounts::AccountAddress;
use core_runtime::bus::{AddressFilter, EventBus};
use core_runtime::events::catalog::{
    MessageReceived, MessageReceivedEvent, UrlOpened, UrlOpenedEvent,
};
use core_runtime::events::{Event, EventType};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::env;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let format = match env::args().nth(1).as_deref() {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };
    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_level(LogLevel::Debug)
            .with_spans(false),
    )?;

    let bus = EventBus::new();
    let alice = AccountAddress::parse("acct-alice")?;
    let bob = AccountAddress::parse("acct-bob")?;
    bus.accounts().register(alice.clone());
    bus.accounts().register(bob.clone());

    for account in [&alice, &bob] {
        let label = account.to_string();
        bus.subscribe_to::<MessageReceivedEvent, _, _>(
            account.clone().into(),
            move |_event, message| {
                let label = label.clone();
                async move {
                    info!(account = %label, message_id = %message.message_id, "Inbox updated");
                    Ok(())
                }
            },
        );
    }

    bus.subscribe(UrlOpenedEvent::NAMESPACE, AddressFilter::Any, |event: Event| async move {
        if let Some(opened) = event.payload::<UrlOpened>() {
            info!(url = %opened.url, "Deep link received");
        }
        Ok(())
    });

    bus.publish(Event::data::<MessageReceivedEvent>(
        alice.clone(),
        MessageReceived {
            message_id: "MSG-1".to_string(),
            sender: "peer-9".to_string(),
        },
    ));
    bus.publish(Event::native::<UrlOpenedEvent>(UrlOpened {
        url: "nmshd://qr#template".to_string(),
    }));

    bus.drain().await;
    info!(stats = ?bus.stats(), "Removing account");
    bus.remove_account(&alice).await;
    bus.shutdown().await;

    Ok(())
}
