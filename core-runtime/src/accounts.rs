//! Account addresses and the set of accounts known to the host process.
//!
//! The multi-account host owns account lifecycle; this module only tracks
//! which addresses are currently valid routing keys and which account the
//! user has selected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use crate::error::{Error, Result};
use crate::logging::redact_address;

const MAX_ADDRESS_LEN: usize = 256;

/// Opaque identifier of one locally managed account.
///
/// Structurally valid addresses are non-empty, at most 256 bytes long and
/// contain no whitespace or control characters. Beyond that the core treats
/// them as opaque, comparable routing keys.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountAddress(String);

impl AccountAddress {
    /// Validates `value` as an address.
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let reason = if value.is_empty() {
            Some("address is empty")
        } else if value.len() > MAX_ADDRESS_LEN {
            Some("address exceeds 256 bytes")
        } else if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            Some("address contains whitespace or control characters")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidAddress {
                address: value,
                reason: reason.to_string(),
            }),
            None => Ok(Self(value)),
        }
    }

    /// Builds an address the caller knows to be well formed.
    ///
    /// # Panics
    ///
    /// Panics on a malformed address. Routing a structurally broken address
    /// is a programmer error, not a recoverable condition.
    pub fn new(value: impl Into<String>) -> Self {
        match Self::parse(value) {
            Ok(address) => address,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({})", redact_address(&self.0))
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<AccountAddress> for String {
    fn from(address: AccountAddress) -> Self {
        address.0
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    /// Registration order is kept so hosts can list accounts stably.
    addresses: Vec<AccountAddress>,
    active: Option<AccountAddress>,
}

/// Accounts the hosting process currently manages.
///
/// Data events addressed to an account that is not registered here are
/// dropped by the event bus.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    state: RwLock<RegistryState>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `address`. Returns `false` if it was already known.
    pub fn register(&self, address: AccountAddress) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.addresses.contains(&address) {
            return false;
        }
        debug!(address = %redact_address(address.as_str()), "Account registered");
        state.addresses.push(address);
        true
    }

    /// Forgets `address`, clearing the selection if it was active.
    /// Returns `false` if the address was unknown.
    pub fn unregister(&self, address: &AccountAddress) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let Some(position) = state.addresses.iter().position(|known| known == address) else {
            return false;
        };
        state.addresses.remove(position);
        if state.active.as_ref() == Some(address) {
            state.active = None;
        }
        debug!(address = %redact_address(address.as_str()), "Account unregistered");
        true
    }

    pub fn contains(&self, address: &AccountAddress) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .addresses
            .contains(address)
    }

    /// Registered addresses in registration order.
    pub fn addresses(&self) -> Vec<AccountAddress> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .addresses
            .clone()
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .addresses
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Marks `address` as the account the user is working with.
    pub fn select(&self, address: &AccountAddress) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.addresses.contains(address) {
            return Err(Error::UnknownAccount(address.to_string()));
        }
        state.active = Some(address.clone());
        Ok(())
    }

    pub fn active(&self) -> Option<AccountAddress> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .clone()
    }

    pub fn clear_active(&self) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_validation() {
        assert!(AccountAddress::parse("did:e:localhost:dids:0f3a").is_ok());

        let too_long = "x".repeat(257);
        for bad in ["", "acct 1", "acct\n1", too_long.as_str()] {
            assert!(
                matches!(AccountAddress::parse(bad), Err(Error::InvalidAddress { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    #[should_panic(expected = "Invalid account address")]
    fn test_new_panics_on_malformed_address() {
        let _ = AccountAddress::new("has space");
    }

    #[test]
    fn test_address_serde_validates() {
        let address: AccountAddress = serde_json::from_str("\"acct-1\"").unwrap();
        assert_eq!(address.as_str(), "acct-1");
        assert!(serde_json::from_str::<AccountAddress>("\"\"").is_err());
    }

    #[test]
    fn test_register_is_idempotent_and_ordered() {
        let registry = AccountRegistry::new();
        assert!(registry.register(AccountAddress::new("acct-2")));
        assert!(registry.register(AccountAddress::new("acct-1")));
        assert!(!registry.register(AccountAddress::new("acct-2")));

        assert_eq!(
            registry.addresses(),
            vec![AccountAddress::new("acct-2"), AccountAddress::new("acct-1")]
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_select_requires_known_account() {
        let registry = AccountRegistry::new();
        let acct = AccountAddress::new("acct-1");

        assert_eq!(
            registry.select(&acct),
            Err(Error::UnknownAccount("acct-1".to_string()))
        );

        registry.register(acct.clone());
        registry.select(&acct).unwrap();
        assert_eq!(registry.active(), Some(acct));
    }

    #[test]
    fn test_unregister_clears_active_selection() {
        let registry = AccountRegistry::new();
        let acct = AccountAddress::new("acct-1");
        registry.register(acct.clone());
        registry.select(&acct).unwrap();

        assert!(registry.unregister(&acct));
        assert!(!registry.unregister(&acct));
        assert_eq!(registry.active(), None);
        assert!(registry.is_empty());
    }
}
