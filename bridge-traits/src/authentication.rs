//! Local user authentication (biometric / device passcode prompt).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Parameters forwarded to the host's authentication prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOptions {
    /// Localized reason shown to the user.
    pub reason: String,
    /// Optional title for hosts that render one.
    pub title: Option<String>,
    /// Allow falling back to the device passcode when biometrics fail.
    pub allow_passcode_fallback: bool,
}

impl AuthenticationOptions {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            title: None,
            allow_passcode_fallback: true,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_passcode_fallback(mut self, allow: bool) -> Self {
        self.allow_passcode_fallback = allow;
        self
    }
}

/// Prompts the user to confirm their identity.
///
/// # Contract
///
/// - `Ok(true)`: the host confirmed the identity
/// - `Ok(false)`: the user declined or dismissed the prompt
/// - `Err(_)`: host-level failure only (no hardware, no enrolled credential,
///   permission revoked). A user decline is never an error.
///
/// # Platform Support
///
/// - **iOS**: LocalAuthentication (Face ID / Touch ID / passcode)
/// - **Android**: BiometricPrompt
/// - **Desktop**: usually unavailable; see `bridge-desktop`
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, options: &AuthenticationOptions) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = AuthenticationOptions::new("Unlock your wallet")
            .with_title("Confirm")
            .with_passcode_fallback(false);

        assert_eq!(options.reason, "Unlock your wallet");
        assert_eq!(options.title.as_deref(), Some("Confirm"));
        assert!(!options.allow_passcode_fallback);
    }

    #[test]
    fn test_options_serialize_camel_case() {
        let json = serde_json::to_value(AuthenticationOptions::new("why")).unwrap();
        assert_eq!(json["allowPasscodeFallback"], true);
    }
}
