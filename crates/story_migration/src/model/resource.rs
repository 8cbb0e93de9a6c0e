//! Media resource model and WordPress payload normalization.
//!
//! # Responsibility
//! - Define the `resource` object carried by media elements.
//! - Convert WordPress REST attachments and media-picker selections into
//!   resources.
//!
//! # Invariants
//! - `alt` is never empty when a title is available.
//! - GIF conversions are always typed `gif` with `mimeType: image/gif` and an
//!   `output` pointing at the converted video.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

const GIF_CONVERSION_SOURCE: &str = "gif-conversion";
const VIDEO_OPTIMIZATION_SOURCE: &str = "video-optimization";
const GIF_MIME_TYPE: &str = "image/gif";

/// Media family of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Image,
    Video,
    Gif,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// Mime type is neither `image/*` nor `video/*`.
    UnsupportedMime(String),
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedMime(mime) => write!(f, "unsupported media mime type `{mime}`"),
        }
    }
}

impl Error for ResourceError {}

/// Rendition actually played for converted media (GIF → video).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOutput {
    pub mime_type: String,
    pub src: String,
}

/// Asset referenced by a media element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Serialized as `type`.
    #[serde(rename = "type")]
    pub kind: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// WordPress intermediate sizes; opaque to the migrator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Value>,
    /// Duration in seconds for videos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    /// True while an upload is still in flight.
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub is_optimized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<ResourceOutput>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    fn new(kind: ResourceType, mime_type: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            kind,
            id: None,
            mime_type: mime_type.into(),
            src: src.into(),
            width: 0,
            height: 0,
            poster: None,
            poster_id: None,
            alt: None,
            title: None,
            sizes: None,
            length: None,
            length_formatted: None,
            creation_date: None,
            local: false,
            is_optimized: false,
            is_muted: None,
            output: None,
            extra: Map::new(),
        }
    }

    /// Builds a resource from a WordPress REST media attachment.
    ///
    /// # Errors
    /// - `UnsupportedMime` when the attachment is neither an image, a video
    ///   nor a GIF conversion.
    pub fn from_attachment(attachment: &Attachment) -> Result<Self, ResourceError> {
        let title = attachment.title.raw.clone();
        let alt = first_non_empty([attachment.alt_text.as_str(), title.as_str()]);
        let details = &attachment.media_details;
        let poster = &attachment.featured_media_src;

        if attachment.media_source == GIF_CONVERSION_SOURCE {
            let mut resource = Resource::new(ResourceType::Gif, GIF_MIME_TYPE, &attachment.source_url);
            (resource.width, resource.height) =
                resource_size(details.width, details.height, poster.width, poster.height);
            resource.id = Some(attachment.id);
            resource.poster = poster.src.clone();
            resource.poster_id = non_zero(attachment.featured_media);
            resource.alt = alt;
            resource.title = Some(title);
            resource.creation_date = attachment.date_gmt.clone();
            resource.is_optimized = true;
            resource.output = Some(ResourceOutput {
                mime_type: attachment.mime_type.clone(),
                src: attachment.source_url.clone(),
            });
            return Ok(resource);
        }

        let kind = resource_type_from_mime(&attachment.mime_type)?;
        let mut resource = Resource::new(kind, &attachment.mime_type, &attachment.source_url);
        resource.id = Some(attachment.id);
        resource.alt = alt;
        resource.title = Some(title);
        resource.creation_date = attachment.date_gmt.clone();

        if kind == ResourceType::Image {
            resource.width = details.width;
            resource.height = details.height;
            resource.sizes = details.sizes.clone();
            return Ok(resource);
        }

        (resource.width, resource.height) =
            resource_size(details.width, details.height, poster.width, poster.height);
        resource.poster = poster.src.clone();
        resource.poster_id = non_zero(attachment.featured_media);
        resource.length = details.length;
        resource.length_formatted = details.length_formatted.clone();
        resource.is_optimized = attachment.media_source == VIDEO_OPTIMIZATION_SOURCE;
        resource.is_muted = attachment.meta.web_stories_is_muted;
        Ok(resource)
    }

    /// Builds a resource from a WordPress media-picker selection.
    ///
    /// # Errors
    /// - `UnsupportedMime` when the selection is neither an image nor a video.
    pub fn from_media_picker(item: &MediaPickerItem) -> Result<Self, ResourceError> {
        let kind = resource_type_from_mime(&item.mime)?;
        let src = first_non_empty([item.url.as_str(), item.src.as_str()]).unwrap_or_default();
        let details = &item.media_details;
        let poster = &item.featured_media_src;

        let mut resource = Resource::new(kind, &item.mime, src);
        (resource.width, resource.height) =
            resource_size(details.width, details.height, poster.width, poster.height);
        resource.id = Some(item.id);
        resource.alt = first_non_empty([
            item.alt.as_str(),
            item.description.as_str(),
            item.title.as_str(),
        ]);
        resource.title = Some(item.title.clone());
        resource.creation_date = item.date.clone();
        resource.poster = poster.src.clone();
        resource.poster_id = non_zero(item.featured_media);
        resource.sizes = details.sizes.clone();
        resource.length = details.length;
        resource.length_formatted = details.length_formatted.clone();
        resource.is_optimized = item.media_source == VIDEO_OPTIMIZATION_SOURCE;
        resource.is_muted = item.meta.web_stories_is_muted;
        Ok(resource)
    }
}

/// Maps a mime type to its resource family.
///
/// # Errors
/// - `UnsupportedMime` for anything but `image/*` and `video/*`.
pub fn resource_type_from_mime(mime_type: &str) -> Result<ResourceType, ResourceError> {
    let family = mime_type.split('/').next().unwrap_or_default();
    match family.trim().to_ascii_lowercase().as_str() {
        "image" => Ok(ResourceType::Image),
        "video" => Ok(ResourceType::Video),
        _ => Err(ResourceError::UnsupportedMime(mime_type.to_string())),
    }
}

/// Picks display dimensions: the media's own when both are known, otherwise
/// the poster's, otherwise whatever partial media size exists.
pub fn resource_size(width: u32, height: u32, poster_width: u32, poster_height: u32) -> (u32, u32) {
    if width > 0 && height > 0 {
        (width, height)
    } else if poster_width > 0 && poster_height > 0 {
        (poster_width, poster_height)
    } else {
        (width, height)
    }
}

fn first_non_empty<const N: usize>(candidates: [&str; N]) -> Option<String> {
    candidates
        .into_iter()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .map(str::to_string)
}

fn non_zero(id: u64) -> Option<u64> {
    (id != 0).then_some(id)
}

/// WordPress REST `/wp/v2/media` item, restricted to the fields used here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attachment {
    pub id: u64,
    #[serde(default)]
    pub date_gmt: Option<String>,
    pub mime_type: String,
    pub source_url: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub media_source: String,
    /// Poster attachment ID; `0` when none.
    #[serde(default)]
    pub featured_media: u64,
    #[serde(default)]
    pub featured_media_src: PosterSource,
    #[serde(default)]
    pub media_details: MediaDetails,
    #[serde(default)]
    pub title: RawTitle,
    #[serde(default)]
    pub meta: AttachmentMeta,
}

/// Media-picker selection as handed over by the WordPress media modal.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaPickerItem {
    pub id: u64,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub url: String,
    pub mime: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub featured_media: u64,
    #[serde(default)]
    pub featured_media_src: PosterSource,
    #[serde(default)]
    pub media_details: MediaDetails,
    #[serde(default)]
    pub media_source: String,
    #[serde(default)]
    pub meta: AttachmentMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PosterSource {
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub generated: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaDetails {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub length_formatted: Option<String>,
    #[serde(default)]
    pub sizes: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTitle {
    #[serde(default)]
    pub raw: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentMeta {
    #[serde(default)]
    pub web_stories_is_muted: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::{resource_size, resource_type_from_mime, ResourceError, ResourceType};

    #[test]
    fn mime_families_map_to_resource_types() {
        assert_eq!(resource_type_from_mime("image/png"), Ok(ResourceType::Image));
        assert_eq!(resource_type_from_mime("Video/MP4"), Ok(ResourceType::Video));
        assert_eq!(
            resource_type_from_mime("application/pdf"),
            Err(ResourceError::UnsupportedMime("application/pdf".to_string()))
        );
    }

    #[test]
    fn resource_size_falls_back_to_poster() {
        assert_eq!(resource_size(640, 360, 1280, 720), (640, 360));
        assert_eq!(resource_size(0, 0, 1280, 720), (1280, 720));
        assert_eq!(resource_size(640, 0, 0, 0), (640, 0));
    }
}
