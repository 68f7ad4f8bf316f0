//! Catalogued event kinds and their payloads.
//!
//! Payload structs are deliberately small: they identify what changed and let
//! subscribers fetch details from the owning collaborator.

use bridge_traits::PushToken;
use serde::{Deserialize, Serialize};

use super::{DataEventType, EventType, Namespace, NativeEventType, ScopeKind};
use crate::accounts::AccountAddress;

macro_rules! event_type {
    (@define $(#[$meta:meta])* $name:ident, $scope:ident, $namespace:literal, $payload:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name;

        impl EventType for $name {
            const NAMESPACE: Namespace = Namespace::from_static($namespace);
            const SCOPE: ScopeKind = ScopeKind::$scope;
            type Payload = $payload;
        }
    };
    ($(#[$meta:meta])* $name:ident, data, $namespace:literal, $payload:ty) => {
        event_type!(@define $(#[$meta])* $name, Data, $namespace, $payload);
        impl DataEventType for $name {}
    };
    ($(#[$meta:meta])* $name:ident, native, $namespace:literal, $payload:ty) => {
        event_type!(@define $(#[$meta])* $name, Native, $namespace, $payload);
        impl NativeEventType for $name {}
    };
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReceived {
    pub message_id: String,
    /// Address of the peer that sent the message.
    pub sender: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSent {
    pub message_id: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipStatus {
    Pending,
    Active,
    Rejected,
    Revoked,
    Terminated,
    DeletionProposed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipChanged {
    pub relationship_id: String,
    pub peer: String,
    pub status: RelationshipStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerDeletionCancelled {
    pub relationship_id: String,
    pub peer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDeletionProcessStatusChanged {
    pub process_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeChanged {
    pub attribute_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSucceeded {
    pub predecessor_id: String,
    pub successor_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestReference {
    pub request_id: String,
    pub peer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatusChanged {
    pub request_id: String,
    pub old_status: String,
    pub new_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    /// Id of the processed message or template.
    pub reference: String,
    /// Outcome label chosen by the processing collaborator.
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSelected {
    pub address: AccountAddress,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRemoved {
    pub address: AccountAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlOpened {
    pub url: String,
}

/// Raw push payload, delivered before any account has been resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNotification {
    pub content: serde_json::Value,
    pub foreground: bool,
}

// ============================================================================
// Transport
// ============================================================================

event_type!(
    /// A message addressed to the account arrived.
    MessageReceivedEvent, data, "transport.messageReceived", MessageReceived
);
event_type!(
    /// The account sent a message.
    MessageSentEvent, data, "transport.messageSent", MessageSent
);
event_type!(
    RelationshipChangedEvent, data, "transport.relationshipChanged", RelationshipChanged
);
event_type!(
    /// A peer withdrew its pending identity deletion.
    PeerDeletionCancelledEvent, data, "transport.peerDeletionCancelled", PeerDeletionCancelled
);
event_type!(
    IdentityDeletionProcessStatusChangedEvent,
    data,
    "transport.identityDeletionProcessStatusChanged",
    IdentityDeletionProcessStatusChanged
);

// ============================================================================
// Consumption
// ============================================================================

event_type!(
    AttributeCreatedEvent, data, "consumption.attributeCreated", AttributeChanged
);
event_type!(
    AttributeDeletedEvent, data, "consumption.attributeDeleted", AttributeChanged
);
event_type!(
    /// An attribute was replaced by a successor version.
    AttributeSucceededEvent, data, "consumption.attributeSucceeded", AttributeSucceeded
);
event_type!(
    IncomingRequestReceivedEvent, data, "consumption.incomingRequestReceived", RequestReference
);
event_type!(
    IncomingRequestStatusChangedEvent,
    data,
    "consumption.incomingRequestStatusChanged",
    RequestStatusChanged
);
event_type!(
    OutgoingRequestCreatedEvent, data, "consumption.outgoingRequestCreated", RequestReference
);
event_type!(
    OutgoingRequestStatusChangedEvent,
    data,
    "consumption.outgoingRequestStatusChanged",
    RequestStatusChanged
);

// ============================================================================
// Runtime
// ============================================================================

event_type!(
    MessageProcessedEvent, data, "runtime.messageProcessed", ProcessingResult
);
event_type!(
    RelationshipTemplateProcessedEvent,
    data,
    "runtime.relationshipTemplateProcessed",
    ProcessingResult
);

// ============================================================================
// App
// ============================================================================

event_type!(
    /// The user switched to this account.
    AccountSelectedEvent, data, "app.accountSelected", AccountSelected
);
event_type!(
    /// The host finished booting and the core may start work.
    AppReadyEvent, native, "app.ready", ()
);
event_type!(
    /// The host was asked to open a deep link.
    UrlOpenedEvent, native, "app.urlOpened", UrlOpened
);
event_type!(
    RemoteNotificationReceivedEvent,
    native,
    "app.remoteNotificationReceived",
    RemoteNotification
);
event_type!(
    /// Push registration finished; carries the token out-of-band.
    RemoteNotificationRegisteredEvent,
    native,
    "app.remoteNotificationRegistered",
    PushToken
);
event_type!(
    /// An account was torn down. Native because its address is no longer routable.
    AccountRemovedEvent, native, "app.accountRemoved", AccountRemoved
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payloads_use_camel_case() {
        let notification = RemoteNotification {
            content: json!({ "accRef": "acct-1", "devicePushIdentifier": "dpi" }),
            foreground: true,
        };
        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["foreground"], json!(true));
        assert_eq!(value["content"]["accRef"], json!("acct-1"));

        let status = RequestStatusChanged {
            request_id: "REQ-1".to_string(),
            old_status: "Open".to_string(),
            new_status: "Decided".to_string(),
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["oldStatus"], json!("Open"));
        assert_eq!(value["newStatus"], json!("Decided"));
    }

    #[test]
    fn test_account_payload_rejects_bad_address() {
        let result: serde_json::Result<AccountSelected> =
            serde_json::from_value(json!({ "address": "has space", "name": null }));
        assert!(result.is_err());
    }

    #[test]
    fn test_relationship_status_wire_names() {
        assert_eq!(
            serde_json::to_value(RelationshipStatus::DeletionProposed).unwrap(),
            json!("deletionProposed")
        );
    }
}
