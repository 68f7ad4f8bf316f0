//! Local push registration.
//!
//! Desktop hosts have no vendor push service. Registration mints a local
//! token and reports it the same way a mobile host would: asynchronously, as
//! an `app.remoteNotificationRegistered` native event on the bus.

use async_trait::async_trait;
use bridge_traits::{BridgeError, PushPlatform, PushRegistrar, PushToken, Result};
use core_runtime::bus::EventBus;
use core_runtime::events::catalog::RemoteNotificationRegisteredEvent;
use core_runtime::events::Event;
use std::sync::{PoisonError, RwLock};
use tracing::info;
use uuid::Uuid;

pub struct DesktopPushRegistrar {
    bus: EventBus,
    environment: Option<String>,
    token: RwLock<Option<PushToken>>,
}

impl DesktopPushRegistrar {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            environment: None,
            token: RwLock::new(None),
        }
    }

    /// Tags minted tokens, e.g. `development` or `production`.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// The token minted by the last successful registration.
    pub fn token(&self) -> Option<PushToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn current_or_mint(&self) -> PushToken {
        let mut token = self.token.write().unwrap_or_else(PoisonError::into_inner);
        token
            .get_or_insert_with(|| PushToken {
                token: Uuid::new_v4().to_string(),
                platform: PushPlatform::Local,
                environment: self.environment.clone(),
            })
            .clone()
    }
}

#[async_trait]
impl PushRegistrar for DesktopPushRegistrar {
    /// Registration is idempotent: repeated calls re-announce the same token.
    async fn init_push_registration(&self) -> Result<()> {
        if self.bus.is_closed() {
            return Err(BridgeError::not_available(
                "Event bus is shut down; push token cannot be delivered",
            ));
        }

        let token = self.current_or_mint();
        info!(platform = ?token.platform, "Push registration complete");

        let event = Event::native::<RemoteNotificationRegisteredEvent>(token)
            .with_published_at(self.bus.clock().now());
        self.bus.publish(event);
        Ok(())
    }
}
