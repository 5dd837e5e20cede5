//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Longest conversation identifier accepted from callers.
const MAX_CONVERSATION_ID_LEN: usize = 128;

/// Identity of an end user or agent, as issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new UserId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("user_id"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short, stable fingerprint of the user id.
    ///
    /// Used inside generated identifiers so raw user ids never leak into keys.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        let hex = format!("{:x}", digest);
        hex[..8].to_string()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque, immutable identifier of a conversation.
///
/// Generated ids look like `conv_<domain>_<user fingerprint>_<random>`, but
/// callers must treat the value as opaque. Ids produced by older clients
/// (any `[A-Za-z0-9_-]` string) are accepted on resume.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Allocates a fresh identifier for a new conversation.
    pub fn allocate(user_id: &UserId, domain: &DomainSlug) -> Self {
        Self(format!(
            "conv_{}_{}_{}",
            domain.as_str(),
            user_id.fingerprint(),
            Uuid::new_v4().simple()
        ))
    }

    /// Parses a caller-supplied identifier.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::empty_field("conversation_id"));
        }
        if raw.len() > MAX_CONVERSATION_ID_LEN {
            return Err(ValidationError::invalid_format(
                "conversation_id",
                format!("longer than {} characters", MAX_CONVERSATION_ID_LEN),
            ));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ValidationError::invalid_format(
                "conversation_id",
                "only letters, digits, '_' and '-' are allowed",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonical slug of a support domain (e.g. `finance`, `technical-support`).
///
/// Only the domain catalog hands out slugs for live requests; `new` exists
/// for rehydrating persisted rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainSlug(String);

impl DomainSlug {
    /// Creates a slug, checking it is lowercase ascii with dashes.
    pub fn new(slug: impl Into<String>) -> Result<Self, ValidationError> {
        let slug = slug.into();
        if slug.is_empty() {
            return Err(ValidationError::empty_field("domain"));
        }
        if !slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ValidationError::invalid_format(
                "domain",
                "slug must be lowercase letters, digits and '-'",
            ));
        }
        Ok(Self(slug))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a support ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Creates a new random TicketId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a TicketId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TicketId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for one entry of a ticket thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketMessageId(Uuid);

impl TicketMessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketMessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketMessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finance() -> DomainSlug {
        DomainSlug::new("finance").unwrap()
    }

    #[test]
    fn user_id_rejects_blank() {
        assert!(UserId::new("").is_err());
        assert!(UserId::new("   ").is_err());
    }

    #[test]
    fn user_id_trims_whitespace() {
        let id = UserId::new("  alice ").unwrap();
        assert_eq!(id.as_str(), "alice");
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let id = UserId::new("alice").unwrap();
        assert_eq!(id.fingerprint(), id.fingerprint());
        assert_eq!(id.fingerprint().len(), 8);
        assert_ne!(id.fingerprint(), UserId::new("bob").unwrap().fingerprint());
    }

    #[test]
    fn allocated_conversation_ids_are_unique_and_parseable() {
        let user = UserId::new("alice").unwrap();
        let a = ConversationId::allocate(&user, &finance());
        let b = ConversationId::allocate(&user, &finance());

        assert_ne!(a, b);
        assert!(a.as_str().starts_with("conv_finance_"));
        assert_eq!(ConversationId::parse(a.as_str()).unwrap(), a);
    }

    #[test]
    fn conversation_id_accepts_legacy_format() {
        let id: ConversationId = "conv_alice_1700000000".parse().unwrap();
        assert_eq!(id.as_str(), "conv_alice_1700000000");
    }

    #[test]
    fn conversation_id_rejects_bad_characters() {
        assert!(ConversationId::parse("conv/../etc").is_err());
        assert!(ConversationId::parse("").is_err());
        assert!(ConversationId::parse(&"x".repeat(200)).is_err());
    }

    #[test]
    fn domain_slug_requires_lowercase_slug() {
        assert!(DomainSlug::new("technical-support").is_ok());
        assert!(DomainSlug::new("Finance").is_err());
        assert!(DomainSlug::new("").is_err());
    }

    #[test]
    fn ticket_id_roundtrips_through_display() {
        let id = TicketId::new();
        let parsed: TicketId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
