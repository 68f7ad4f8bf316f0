//! Scan results delivered through an inbox file.
//!
//! Desktop machines rarely have a camera pointed at a QR code. Companion
//! tooling (a phone app, a clipboard helper) drops the decoded payload into
//! an inbox file instead; `scan` consumes it.

use async_trait::async_trait;
use bridge_traits::{BridgeError, Result, Scanner};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const INBOX_FILE: &str = "scan-inbox.txt";

pub struct InboxScanner {
    inbox: PathBuf,
}

impl InboxScanner {
    /// Inbox under the platform data directory.
    pub fn new() -> Self {
        let inbox = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(crate::APP_DIR_NAME)
            .join(INBOX_FILE);
        Self { inbox }
    }

    pub fn with_inbox(inbox: impl Into<PathBuf>) -> Self {
        Self {
            inbox: inbox.into(),
        }
    }

    pub fn inbox(&self) -> &Path {
        &self.inbox
    }
}

impl Default for InboxScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl InboxScanner {
    /// Unique sibling path the inbox is moved to before reading, so that
    /// concurrent scans cannot consume the same payload twice.
    fn claim_path(&self) -> PathBuf {
        let name = self
            .inbox
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| INBOX_FILE.to_string());
        self.inbox
            .with_file_name(format!("{}.{}.claimed", name, Uuid::new_v4()))
    }
}

#[async_trait]
impl Scanner for InboxScanner {
    async fn scan(&self) -> Result<String> {
        let claimed = self.claim_path();
        match fs::rename(&self.inbox, &claimed).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(BridgeError::not_found("No scan result waiting in the inbox"))
            }
            Err(e) => return Err(e.into()),
        }

        let content = fs::read_to_string(&claimed).await;
        if let Err(e) = fs::remove_file(&claimed).await {
            warn!(error = %e, "Failed to remove claimed scan inbox");
        }

        let content = content?;
        let payload = content.trim();
        if payload.is_empty() {
            return Err(BridgeError::not_found("Scan inbox is empty"));
        }

        debug!(size = payload.len(), "Consumed scan result");
        Ok(payload.to_string())
    }
}
