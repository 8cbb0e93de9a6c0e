//! Current-version story document model.
//!
//! # Responsibility
//! - Provide typed access to a migrated story document.
//! - Refuse to represent documents that are not at [`DATA_VERSION`].
//!
//! # Invariants
//! - Every `StoryDocument` value has `version == DATA_VERSION`, whether it
//!   was built by `from_value`, `load` or plain serde deserialization.
//! - Unknown keys survive a decode/encode cycle through the `extra` maps.

use crate::migration::{migrate_document, MigrationError, DATA_VERSION};
use crate::model::resource::Resource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoryResult<T> = Result<T, StoryError>;

/// Error for building a typed document from JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryError {
    /// Document is older or newer than this build's schema.
    StaleVersion { found: u32, expected: u32 },
    /// JSON shape does not match the current schema.
    InvalidShape(String),
    Migration(MigrationError),
}

impl Display for StoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StaleVersion { found, expected } => write!(
                f,
                "story document is at version {found}; version {expected} is required"
            ),
            Self::InvalidShape(message) => write!(f, "invalid story document: {message}"),
            Self::Migration(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Migration(err) => Some(err),
            Self::StaleVersion { .. } | Self::InvalidShape(_) => None,
        }
    }
}

impl From<MigrationError> for StoryError {
    fn from(value: MigrationError) -> Self {
        Self::Migration(value)
    }
}

/// Element kinds the editor knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Text,
    Image,
    Video,
    Gif,
    Shape,
    Sticker,
}

impl ElementType {
    /// Whether elements of this kind carry a media `resource`.
    pub fn is_media(self) -> bool {
        matches!(self, Self::Image | Self::Video | Self::Gif)
    }
}

/// Positioned item on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    /// Serialized as `type`.
    #[serde(rename = "type")]
    pub kind: ElementType,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub rotation_angle: f64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_background: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
    /// Style and type-specific fields (`font`, `content`, `padding`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One screen of a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Solid or gradient pattern object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Page {
    /// Returns the element flagged as page background, if any.
    pub fn background_element(&self) -> Option<&Element> {
        self.elements.iter().find(|element| element.is_background)
    }
}

/// Story document at [`DATA_VERSION`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStoryDocument")]
pub struct StoryDocument {
    pub version: u32,
    pub pages: Vec<Page>,
    /// Story-level metadata outside the page tree.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawStoryDocument {
    version: u32,
    #[serde(default)]
    pages: Vec<Page>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<RawStoryDocument> for StoryDocument {
    type Error = StoryError;

    fn try_from(raw: RawStoryDocument) -> Result<Self, Self::Error> {
        if raw.version != DATA_VERSION {
            return Err(StoryError::StaleVersion {
                found: raw.version,
                expected: DATA_VERSION,
            });
        }
        Ok(Self {
            version: raw.version,
            pages: raw.pages,
            extra: raw.extra,
        })
    }
}

impl StoryDocument {
    /// Builds a typed document from JSON that is already at [`DATA_VERSION`].
    ///
    /// # Errors
    /// - `StaleVersion` when `version` differs from [`DATA_VERSION`].
    /// - `InvalidShape` when the JSON does not match the current schema.
    pub fn from_value(value: Value) -> StoryResult<Self> {
        let found = value
            .get("version")
            .and_then(Value::as_u64)
            .ok_or_else(|| StoryError::InvalidShape("missing integer `version`".to_string()))?;
        if found != u64::from(DATA_VERSION) {
            return Err(StoryError::StaleVersion {
                found: u32::try_from(found).unwrap_or(u32::MAX),
                expected: DATA_VERSION,
            });
        }
        serde_json::from_value(value).map_err(|err| StoryError::InvalidShape(err.to_string()))
    }

    /// Migrates `value` using its own `version` field, then builds the typed
    /// document. The input is left untouched.
    pub fn load(value: &Value) -> StoryResult<Self> {
        let migrated = migrate_document(value)?;
        Self::from_value(migrated)
    }

    /// Encodes this document back to JSON.
    pub fn to_value(&self) -> StoryResult<Value> {
        serde_json::to_value(self).map_err(|err| StoryError::InvalidShape(err.to_string()))
    }

    /// Total number of elements across all pages.
    pub fn element_count(&self) -> usize {
        self.pages.iter().map(|page| page.elements.len()).sum()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::{ElementType, StoryDocument, StoryError};
    use crate::migration::DATA_VERSION;
    use serde_json::json;

    fn current_document() -> serde_json::Value {
        json!({
            "version": DATA_VERSION,
            "title": "Kitchen Makeover",
            "pages": [{
                "id": "page-1",
                "backgroundColor": { "color": { "r": 255, "g": 255, "b": 255 } },
                "elements": [
                    { "id": "bg", "type": "shape", "x": 0, "y": 0, "width": 1080, "height": 1920, "isBackground": true },
                    { "id": "t1", "type": "text", "x": 40, "y": 80, "width": 400, "height": 120, "content": "Hi" }
                ]
            }]
        })
    }

    #[test]
    fn from_value_parses_current_document() {
        let story = StoryDocument::from_value(current_document()).unwrap();

        assert_eq!(story.version, DATA_VERSION);
        assert_eq!(story.extra["title"], json!("Kitchen Makeover"));
        assert_eq!(story.element_count(), 2);
        let page = &story.pages[0];
        assert_eq!(page.background_element().map(|e| e.id.as_str()), Some("bg"));
        assert_eq!(page.elements[1].kind, ElementType::Text);
        assert_eq!(page.elements[1].extra["content"], json!("Hi"));
    }

    #[test]
    fn stale_documents_are_rejected_by_every_constructor() {
        let mut stale = current_document();
        stale["version"] = json!(DATA_VERSION - 1);

        assert_eq!(
            StoryDocument::from_value(stale.clone()).unwrap_err(),
            StoryError::StaleVersion {
                found: DATA_VERSION - 1,
                expected: DATA_VERSION,
            }
        );
        let err = serde_json::from_value::<StoryDocument>(stale).unwrap_err();
        assert!(err.to_string().contains("version 10 is required"), "{err}");
    }

    #[test]
    fn unknown_keys_survive_round_trip() {
        let story = StoryDocument::from_value(current_document()).unwrap();
        let encoded = story.to_value().unwrap();
        assert_eq!(encoded["title"], json!("Kitchen Makeover"));
        assert_eq!(encoded["pages"][0]["elements"][1]["content"], json!("Hi"));
        assert_eq!(encoded["pages"][0]["elements"][0]["isBackground"], json!(true));
        assert!(encoded["pages"][0]["elements"][1].get("isBackground").is_none());
    }

    #[test]
    fn element_type_media_flag() {
        assert!(ElementType::Gif.is_media());
        assert!(!ElementType::Text.is_media());
    }
}
