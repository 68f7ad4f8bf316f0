//! Host signals forwarded to the event bus as native events.

use core_runtime::bus::EventBus;
use core_runtime::events::catalog::{
    AppReadyEvent, RemoteNotification, RemoteNotificationReceivedEvent, UrlOpened, UrlOpenedEvent,
};
use core_runtime::events::{Event, NativeEventType};
use tracing::{debug, info};

/// Entry point for desktop shell callbacks (window ready, protocol handler,
/// local notification delivery).
#[derive(Debug, Clone)]
pub struct DesktopHost {
    bus: EventBus,
}

impl DesktopHost {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// The shell finished starting up.
    pub fn app_ready(&self) {
        info!("Host ready");
        self.emit::<AppReadyEvent>(());
    }

    /// The OS handed the app a URL through its protocol handler.
    pub fn open_url(&self, url: impl Into<String>) {
        let url = url.into();
        debug!(scheme = url.split(':').next().unwrap_or_default(), "URL opened");
        self.emit::<UrlOpenedEvent>(UrlOpened { url });
    }

    /// A push payload arrived. Resolving which account it belongs to is up
    /// to subscribers.
    pub fn receive_remote_notification(&self, content: serde_json::Value, foreground: bool) {
        debug!(foreground, "Remote notification received");
        self.emit::<RemoteNotificationReceivedEvent>(RemoteNotification {
            content,
            foreground,
        });
    }

    fn emit<E: NativeEventType>(&self, payload: E::Payload) {
        let event = Event::native::<E>(payload).with_published_at(self.bus.clock().now());
        self.bus.publish(event);
    }
}
