use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentKind {
    Banner,
    Page,
    Faq,
    Announcement,
}

/// A piece of storefront copy: a banner, a page, an FAQ entry or an
/// announcement.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    pub id: Uuid,
    #[serde(skip)]
    pub organization_id: Uuid,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub title: String,
    pub body: String,
    pub slug: Option<String>,
    pub published: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lowercase ASCII words joined by `-`.
pub fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("  Shipping & Returns!  "), "shipping-returns");
        assert_eq!(slugify("FAQ 2024"), "faq-2024");
        assert_eq!(slugify("!!!"), "");
    }
}
