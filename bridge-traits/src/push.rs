//! Remote (push) notification registration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Push delivery service the token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PushPlatform {
    Apns,
    Fcm,
    /// Hosts without a vendor push service (desktop, tests).
    Local,
}

/// Token handed out by the push service once registration completes.
///
/// Delivered out-of-band: the host publishes it as a native event
/// (`app.remoteNotificationRegistered`) rather than returning it from
/// [`PushRegistrar::init_push_registration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushToken {
    pub token: String,
    pub platform: PushPlatform,
    /// `"production"` or `"development"` where the vendor distinguishes them.
    pub environment: Option<String>,
}

/// Starts registration with the host's push service.
///
/// `Ok(())` means the request was accepted, not that a token exists yet.
#[async_trait]
pub trait PushRegistrar: Send + Sync {
    async fn init_push_registration(&self) -> Result<()>;
}
