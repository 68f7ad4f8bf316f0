//! Authentication prompt stand-in for desktop hosts.

use async_trait::async_trait;
use bridge_traits::{AuthenticationOptions, Authenticator, BridgeError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How the desktop host answers authentication prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthenticationPolicy {
    /// The user is considered present; every prompt succeeds.
    #[default]
    Confirm,
    /// Every prompt is declined by the user.
    Decline,
    /// No authentication hardware; prompts fail with `bridge.notAvailable`.
    Unavailable,
}

/// Desktop machines have no biometric prompt, so the answer comes from a
/// configured policy.
#[derive(Debug, Clone, Default)]
pub struct PolicyAuthenticator {
    policy: AuthenticationPolicy,
}

impl PolicyAuthenticator {
    pub fn new(policy: AuthenticationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AuthenticationPolicy {
        self.policy
    }
}

#[async_trait]
impl Authenticator for PolicyAuthenticator {
    async fn authenticate(&self, options: &AuthenticationOptions) -> Result<bool> {
        debug!(
            reason = %options.reason,
            policy = ?self.policy,
            "Authentication requested"
        );

        match self.policy {
            AuthenticationPolicy::Confirm => Ok(true),
            AuthenticationPolicy::Decline => {
                info!("Authentication declined by policy");
                Ok(false)
            }
            AuthenticationPolicy::Unavailable => Err(BridgeError::not_available(
                "No local authentication available on this host",
            )),
        }
    }
}
