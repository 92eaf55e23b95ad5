//! # Course References and Certificate Templates
//!
//! Read-only metadata a verification response is decorated with. Neither
//! type is ever consulted to recompute what a certificate certifies; if a
//! course reference is renamed or removed after issuance, the certificate's
//! own snapshot is unaffected.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::certificate::{bounded_text, MAX_NAME_LEN};
use crate::error::ValidationError;

/// Maximum length of a URL field.
const MAX_URL_LEN: usize = 2048;

/// Validate an optional http(s) URL field, treating blank as absent.
///
/// The stored value is the parsed URL's serialization, so control
/// characters never reach the database.
fn optional_url(field: &'static str, value: Option<String>) -> Result<Option<String>, ValidationError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.len() > MAX_URL_LEN {
        return Err(ValidationError::FieldTooLong {
            field,
            max: MAX_URL_LEN,
            actual: trimmed.len(),
        });
    }
    let invalid = || ValidationError::InvalidUrl {
        field,
        value: trimmed.to_string(),
    };
    let parsed = Url::parse(trimmed).map_err(|_| invalid())?;
    let web_scheme = matches!(parsed.scheme(), "http" | "https");
    if !web_scheme || parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid());
    }
    Ok(Some(parsed.into()))
}

/// A `#RRGGBB` color, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse a `#RRGGBB` color.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidColor`] for anything else.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let trimmed = s.trim();
        let valid = trimmed.len() == 7
            && trimmed.starts_with('#')
            && trimmed[1..].chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            return Err(ValidationError::InvalidColor(s));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Access the color string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for HexColor {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Visual styling applied when a certificate is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateTemplate {
    /// Template identifier.
    pub id: Uuid,
    /// Human-readable template name.
    pub name: String,
    /// Primary brand color.
    pub primary_color: HexColor,
    /// Secondary brand color.
    pub secondary_color: HexColor,
    /// Logo image URL.
    pub logo_url: Option<String>,
}

impl CertificateTemplate {
    /// Build a validated template with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the name is blank or too long, a
    /// color is not `#RRGGBB`, or the logo URL is not http(s).
    pub fn new(
        name: impl Into<String>,
        primary_color: impl Into<String>,
        secondary_color: impl Into<String>,
        logo_url: Option<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: bounded_text("name", name, MAX_NAME_LEN)?,
            primary_color: HexColor::new(primary_color)?,
            secondary_color: HexColor::new(secondary_color)?,
            logo_url: optional_url("logo_url", logo_url)?,
        })
    }
}

/// Display metadata for the course a certificate was issued for.
///
/// Owned by the course-management system; the registry only mirrors what
/// it needs to decorate a verification response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseReference {
    /// Course identifier in the course-management system.
    pub id: Uuid,
    /// Current course title.
    pub title: String,
    /// Current instructor display name.
    pub instructor_name: String,
    /// Public course page.
    pub url: Option<String>,
}

impl CourseReference {
    /// Build a validated course reference.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the title or instructor name is
    /// blank or too long, or the URL is not http(s).
    pub fn new(
        id: Uuid,
        title: impl Into<String>,
        instructor_name: impl Into<String>,
        url: Option<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            title: bounded_text("title", title, MAX_NAME_LEN)?,
            instructor_name: bounded_text("instructor_name", instructor_name, MAX_NAME_LEN)?,
            url: optional_url("url", url)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_normalizes_case() {
        assert_eq!(HexColor::new("#1A2B3C").unwrap().as_str(), "#1a2b3c");
    }

    #[test]
    fn hex_color_rejects_bad_values() {
        for bad in ["1a2b3c", "#1a2b3", "#1a2b3cd", "#gg0000", "", "#"] {
            assert!(HexColor::new(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn template_validates_all_fields() {
        let t = CertificateTemplate::new(
            "Classic",
            "#003366",
            "#ffcc00",
            Some("https://cdn.example.com/logo.png".into()),
        )
        .unwrap();
        assert_eq!(t.name, "Classic");
        assert_eq!(t.logo_url.as_deref(), Some("https://cdn.example.com/logo.png"));

        assert!(CertificateTemplate::new("", "#003366", "#ffcc00", None).is_err());
        assert!(CertificateTemplate::new("Classic", "blue", "#ffcc00", None).is_err());
        assert!(
            CertificateTemplate::new("Classic", "#003366", "#ffcc00", Some("ftp://x".into()))
                .is_err()
        );
    }

    #[test]
    fn blank_logo_url_is_none() {
        let t = CertificateTemplate::new("Classic", "#003366", "#ffcc00", Some("  ".into()))
            .unwrap();
        assert!(t.logo_url.is_none());
    }

    #[test]
    fn url_without_host_rejected() {
        assert!(optional_url("url", Some("https://".into())).is_err());
        assert!(optional_url("url", Some("https://a b".into())).is_err());
    }

    #[test]
    fn malformed_urls_rejected() {
        for bad in [
            "https://[",
            "http://:::",
            "https://%%%/",
            "http://a\0b",
            "mailto:someone@example.com",
            "file:///etc/passwd",
            "not a url",
        ] {
            let err = optional_url("logo_url", Some(bad.into())).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidUrl { field: "logo_url", .. }),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn url_is_stored_in_parsed_form() {
        let url = optional_url("url", Some(" https://Example.COM/course ".into())).unwrap();
        assert_eq!(url.as_deref(), Some("https://example.com/course"));
    }

    #[test]
    fn overlong_url_rejected() {
        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LEN));
        assert!(matches!(
            optional_url("url", Some(long)),
            Err(ValidationError::FieldTooLong { field: "url", .. })
        ));
    }

    #[test]
    fn hex_color_deserializing_validates() {
        let color: HexColor = serde_json::from_str("\"#ABCDEF\"").unwrap();
        assert_eq!(color.as_str(), "#abcdef");
        assert!(serde_json::from_str::<HexColor>("\"navy\"").is_err());
    }

    #[test]
    fn course_reference_validates() {
        let id = Uuid::new_v4();
        let c = CourseReference::new(id, "Intro to Algorithms", "Grace Hopper", None).unwrap();
        assert_eq!(c.id, id);
        assert!(CourseReference::new(id, " ", "Grace Hopper", None).is_err());
    }
}
