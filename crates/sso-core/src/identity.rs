//! User identity as returned by the identity provider's profile endpoint.

use serde::{Deserialize, Serialize};

/// An authenticated user.
///
/// Field names on the wire follow the provider's profile response, so the same
/// type decodes both the profile document and a session token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Primary email address
    pub email: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Avatar URL
    #[serde(rename = "picture", default)]
    pub picture_url: String,
}

impl Identity {
    /// Create a new identity
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        picture_url: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            picture_url: picture_url.into(),
        }
    }

    /// Whether the email ends with `suffix` (e.g. `@example.com`)
    #[must_use]
    pub fn email_has_suffix(&self, suffix: &str) -> bool {
        !suffix.is_empty() && self.email.ends_with(suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_provider_profile() {
        let profile = r#"{
            "id": "1234",
            "email": "alice@org.com",
            "verified_email": true,
            "name": "Alice Liddell",
            "picture": "https://example.com/a.png"
        }"#;
        let identity: Identity = serde_json::from_str(profile).unwrap();
        assert_eq!(identity.email, "alice@org.com");
        assert_eq!(identity.name, "Alice Liddell");
        assert_eq!(identity.picture_url, "https://example.com/a.png");
    }

    #[test]
    fn missing_name_and_picture_default_to_empty() {
        let identity: Identity = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert_eq!(identity.name, "");
        assert_eq!(identity.picture_url, "");
    }

    #[test]
    fn missing_email_is_rejected() {
        assert!(serde_json::from_str::<Identity>(r#"{"name":"x"}"#).is_err());
    }

    #[test]
    fn suffix_check() {
        let alice = Identity::new("alice@org.com", "Alice", "");
        assert!(alice.email_has_suffix("@org.com"));
        assert!(!alice.email_has_suffix("@other.com"));
        assert!(!alice.email_has_suffix(""));

        let lookalike = Identity::new("mallory@evilorg.com", "", "");
        assert!(!lookalike.email_has_suffix("@org.com"));
    }
}
