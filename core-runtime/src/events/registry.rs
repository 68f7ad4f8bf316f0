//! Static taxonomy of catalogued namespaces.
//!
//! Documentation and test-time validation only: runtime dispatch never looks
//! at this table, it matches namespaces by string equality.

use std::collections::HashSet;

use super::catalog::*;
use super::{Domain, EventType, Namespace, ScopeKind};

/// One catalogued event kind.
#[derive(Debug, Clone)]
pub struct NamespaceEntry {
    pub namespace: Namespace,
    pub scope: ScopeKind,
    payload_type: fn() -> &'static str,
}

impl NamespaceEntry {
    pub const fn of<E: EventType>() -> Self {
        Self {
            namespace: E::NAMESPACE,
            scope: E::SCOPE,
            payload_type: std::any::type_name::<E::Payload>,
        }
    }

    /// Fully qualified Rust type of the payload.
    pub fn payload_type(&self) -> &'static str {
        (self.payload_type)()
    }
}

/// Every namespace defined in [`catalog`](super::catalog).
pub static REGISTRY: &[NamespaceEntry] = &[
    NamespaceEntry::of::<MessageReceivedEvent>(),
    NamespaceEntry::of::<MessageSentEvent>(),
    NamespaceEntry::of::<RelationshipChangedEvent>(),
    NamespaceEntry::of::<PeerDeletionCancelledEvent>(),
    NamespaceEntry::of::<IdentityDeletionProcessStatusChangedEvent>(),
    NamespaceEntry::of::<AttributeCreatedEvent>(),
    NamespaceEntry::of::<AttributeDeletedEvent>(),
    NamespaceEntry::of::<AttributeSucceededEvent>(),
    NamespaceEntry::of::<IncomingRequestReceivedEvent>(),
    NamespaceEntry::of::<IncomingRequestStatusChangedEvent>(),
    NamespaceEntry::of::<OutgoingRequestCreatedEvent>(),
    NamespaceEntry::of::<OutgoingRequestStatusChangedEvent>(),
    NamespaceEntry::of::<MessageProcessedEvent>(),
    NamespaceEntry::of::<RelationshipTemplateProcessedEvent>(),
    NamespaceEntry::of::<AccountSelectedEvent>(),
    NamespaceEntry::of::<AppReadyEvent>(),
    NamespaceEntry::of::<UrlOpenedEvent>(),
    NamespaceEntry::of::<RemoteNotificationReceivedEvent>(),
    NamespaceEntry::of::<RemoteNotificationRegisteredEvent>(),
    NamespaceEntry::of::<AccountRemovedEvent>(),
];

/// Looks up a catalogued namespace.
pub fn lookup(namespace: &str) -> Option<&'static NamespaceEntry> {
    REGISTRY
        .iter()
        .find(|entry| entry.namespace.as_str() == namespace)
}

/// Catalogued entries owned by `domain`.
pub fn by_domain(domain: Domain) -> impl Iterator<Item = &'static NamespaceEntry> {
    REGISTRY
        .iter()
        .filter(move |entry| entry.namespace.domain() == domain)
}

/// Duplicate namespaces in [`REGISTRY`]; empty when the catalogue is sound.
pub fn validate() -> Vec<Namespace> {
    duplicates(REGISTRY)
}

/// Namespaces that appear more than once in `entries`.
pub fn duplicates(entries: &[NamespaceEntry]) -> Vec<Namespace> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for entry in entries {
        if !seen.insert(&entry.namespace) && !duplicates.contains(&entry.namespace) {
            duplicates.push(entry.namespace.clone());
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_has_no_collisions() {
        assert_eq!(validate(), Vec::<Namespace>::new());
        assert_eq!(REGISTRY.len(), 20);
    }

    #[test]
    fn test_duplicates_are_detected() {
        let entries = [
            NamespaceEntry::of::<AttributeCreatedEvent>(),
            NamespaceEntry::of::<AttributeDeletedEvent>(),
            NamespaceEntry::of::<AttributeCreatedEvent>(),
            NamespaceEntry::of::<AttributeCreatedEvent>(),
        ];
        assert_eq!(
            duplicates(&entries),
            vec![Namespace::from_static("consumption.attributeCreated")]
        );
    }

    #[test]
    fn test_only_app_domain_defines_native_events() {
        for entry in REGISTRY {
            if entry.scope == ScopeKind::Native {
                assert_eq!(entry.namespace.domain(), Domain::App, "{:?}", entry);
            }
        }
    }

    #[test]
    fn test_every_domain_is_populated() {
        for domain in Domain::ALL {
            assert!(by_domain(domain).count() > 0, "{domain} has no events");
        }
    }

    #[test]
    fn test_lookup_reports_payload_type() {
        let entry = lookup("transport.messageReceived").unwrap();
        assert_eq!(entry.scope, ScopeKind::Data);
        assert!(entry.payload_type().ends_with("MessageReceived"));

        assert!(lookup("transport.unknown").is_none());
    }

    #[test]
    fn test_payloads_shared_between_kinds_stay_distinct_namespaces() {
        let created = lookup("consumption.attributeCreated").unwrap();
        let deleted = lookup("consumption.attributeDeleted").unwrap();
        assert_eq!(created.payload_type(), deleted.payload_type());
        assert_ne!(created.namespace, deleted.namespace);
    }
}
