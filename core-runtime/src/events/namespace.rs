//! Event namespaces.
//!
//! A namespace is the stable, human-readable name of an event kind, shaped
//! `"<domain>.<eventName>"`. The domain names the collaborator family that
//! owns the event and the event name is lowerCamel ASCII. Dispatch is plain
//! string equality on the full namespace.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Collaborator family owning an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Messages, relationships and identity lifecycle on the transport layer.
    Transport,
    /// Attributes and requests processed by the consumption layer.
    Consumption,
    /// Higher level processing results of the runtime.
    Runtime,
    /// Host application signals (account selection, app lifecycle, push).
    App,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Transport,
        Domain::Consumption,
        Domain::Runtime,
        Domain::App,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Domain::Transport => "transport",
            Domain::Consumption => "consumption",
            Domain::Runtime => "runtime",
            Domain::App => "app",
        }
    }

    const fn from_segment(bytes: &[u8], len: usize) -> Option<Domain> {
        let mut idx = 0;
        while idx < Self::ALL.len() {
            let domain = Self::ALL[idx];
            if segment_eq(bytes, len, domain.as_str().as_bytes()) {
                return Some(domain);
            }
            idx += 1;
        }
        None
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    MissingSeparator,
    UnknownDomain,
    EmptyEventName,
    NotLowerCamel,
    ExtraSegment,
}

impl Fault {
    const fn describe(self) -> &'static str {
        match self {
            Fault::MissingSeparator => "expected '<domain>.<eventName>'",
            Fault::UnknownDomain => {
                "domain must be one of 'transport', 'consumption', 'runtime', 'app'"
            }
            Fault::EmptyEventName => "event name is empty",
            Fault::NotLowerCamel => "event name must be lowerCamel ASCII",
            Fault::ExtraSegment => "only one '.' separator is allowed",
        }
    }
}

const fn segment_eq(bytes: &[u8], len: usize, expected: &[u8]) -> bool {
    if len != expected.len() {
        return false;
    }
    let mut idx = 0;
    while idx < len {
        if bytes[idx] != expected[idx] {
            return false;
        }
        idx += 1;
    }
    true
}

const fn check(bytes: &[u8]) -> std::result::Result<Domain, Fault> {
    let mut dot = 0;
    while dot < bytes.len() && bytes[dot] != b'.' {
        dot += 1;
    }
    if dot == bytes.len() {
        return Err(Fault::MissingSeparator);
    }

    let domain = match Domain::from_segment(bytes, dot) {
        Some(domain) => domain,
        None => return Err(Fault::UnknownDomain),
    };

    let start = dot + 1;
    if start == bytes.len() {
        return Err(Fault::EmptyEventName);
    }
    if !bytes[start].is_ascii_lowercase() {
        return Err(Fault::NotLowerCamel);
    }

    let mut idx = start + 1;
    while idx < bytes.len() {
        let byte = bytes[idx];
        if byte == b'.' {
            return Err(Fault::ExtraSegment);
        }
        if !byte.is_ascii_alphanumeric() {
            return Err(Fault::NotLowerCamel);
        }
        idx += 1;
    }

    Ok(domain)
}

/// Stable identifier of an event kind.
///
/// Catalogued namespaces are built with [`Namespace::from_static`], which is
/// evaluated at compile time when used in a `const`, so a malformed literal
/// fails the build:
///
/// ```compile_fail
/// use core_runtime::events::Namespace;
///
/// const BROKEN: Namespace = Namespace::from_static("transport.MessageReceived");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace {
    domain: Domain,
    name: Cow<'static, str>,
}

impl Namespace {
    /// Builds a namespace from a literal.
    ///
    /// # Panics
    ///
    /// Panics (at compile time inside a `const`) if `value` is malformed.
    pub const fn from_static(value: &'static str) -> Self {
        match check(value.as_bytes()) {
            Ok(domain) => Self {
                domain,
                name: Cow::Borrowed(value),
            },
            Err(Fault::MissingSeparator) => panic!("event namespace is missing the '.' separator"),
            Err(Fault::UnknownDomain) => panic!("event namespace uses an unknown domain"),
            Err(Fault::EmptyEventName) => panic!("event namespace has an empty event name"),
            Err(Fault::NotLowerCamel) => panic!("event namespace event name is not lowerCamel"),
            Err(Fault::ExtraSegment) => panic!("event namespace has more than two segments"),
        }
    }

    /// Validates a namespace supplied at runtime.
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        match check(value.as_bytes()) {
            Ok(domain) => Ok(Self {
                domain,
                name: Cow::Owned(value),
            }),
            Err(fault) => Err(Error::InvalidNamespace {
                namespace: value,
                reason: fault.describe().to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// The part after the domain separator (`messageReceived`).
    pub fn event_name(&self) -> &str {
        &self.name[self.domain.as_str().len() + 1..]
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({})", self.name)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for Namespace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Namespace {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Namespace> for String {
    fn from(namespace: Namespace) -> Self {
        namespace.name.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIVED: Namespace = Namespace::from_static("transport.messageReceived");

    #[test]
    fn test_static_namespace_parts() {
        assert_eq!(RECEIVED.domain(), Domain::Transport);
        assert_eq!(RECEIVED.event_name(), "messageReceived");
        assert_eq!(RECEIVED.to_string(), "transport.messageReceived");
    }

    #[test]
    fn test_static_and_parsed_compare_equal() {
        let parsed = Namespace::parse("transport.messageReceived").unwrap();
        assert_eq!(parsed, RECEIVED);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let cases = [
            ("messageReceived", "expected '<domain>.<eventName>'"),
            ("mail.messageReceived", "domain must be one of"),
            ("app.", "event name is empty"),
            ("app.AccountSelected", "lowerCamel"),
            ("app.account_selected", "lowerCamel"),
            ("app.account.selected", "only one '.'"),
            ("Transport.messageReceived", "domain must be one of"),
        ];

        for (input, expected) in cases {
            match Namespace::parse(input) {
                Err(Error::InvalidNamespace { namespace, reason }) => {
                    assert_eq!(namespace, input);
                    assert!(reason.contains(expected), "{input}: {reason}");
                }
                other => panic!("{input} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let json = serde_json::to_string(&RECEIVED).unwrap();
        assert_eq!(json, "\"transport.messageReceived\"");
        assert!(serde_json::from_str::<Namespace>("\"nope\"").is_err());
    }

    #[test]
    #[should_panic(expected = "unknown domain")]
    fn test_from_static_panics_at_runtime_on_bad_literal() {
        let _ = Namespace::from_static("mail.sent");
    }
}
