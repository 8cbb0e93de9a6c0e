use serde_json::json;
use story_migration::{Attachment, MediaPickerItem, Resource, ResourceError, ResourceType};

fn attachment(value: serde_json::Value) -> Attachment {
    serde_json::from_value(value).unwrap()
}

#[test]
fn image_attachment_keeps_sizes_and_falls_back_to_title_for_alt() {
    let resource = Resource::from_attachment(&attachment(json!({
        "id": 101,
        "date_gmt": "2021-05-01T10:00:00",
        "mime_type": "image/jpeg",
        "source_url": "https://example.com/uploads/cover.jpg",
        "alt_text": "",
        "title": { "raw": "Cover photo" },
        "media_details": {
            "width": 1080,
            "height": 1920,
            "sizes": { "thumbnail": { "width": 150, "height": 150 } }
        }
    })))
    .unwrap();

    assert_eq!(resource.kind, ResourceType::Image);
    assert_eq!(resource.id, Some(101));
    assert_eq!((resource.width, resource.height), (1080, 1920));
    assert_eq!(resource.alt.as_deref(), Some("Cover photo"));
    assert_eq!(resource.creation_date.as_deref(), Some("2021-05-01T10:00:00"));
    assert!(resource.sizes.is_some());
    assert!(!resource.local);
    assert!(!resource.is_optimized);
}

#[test]
fn video_attachment_uses_poster_size_when_media_size_unknown() {
    let resource = Resource::from_attachment(&attachment(json!({
        "id": 7,
        "mime_type": "video/mp4",
        "source_url": "https://example.com/uploads/clip.mp4",
        "alt_text": "Clip",
        "media_source": "video-optimization",
        "featured_media": 8,
        "featured_media_src": {
            "src": "https://example.com/uploads/clip.jpg",
            "width": 720,
            "height": 1280,
            "generated": true
        },
        "media_details": { "length": 12.5, "length_formatted": "0:12" },
        "title": { "raw": "Clip title" },
        "meta": { "web_stories_is_muted": true }
    })))
    .unwrap();

    assert_eq!(resource.kind, ResourceType::Video);
    assert_eq!((resource.width, resource.height), (720, 1280));
    assert_eq!(resource.poster.as_deref(), Some("https://example.com/uploads/clip.jpg"));
    assert_eq!(resource.poster_id, Some(8));
    assert_eq!(resource.length, Some(12.5));
    assert_eq!(resource.length_formatted.as_deref(), Some("0:12"));
    assert_eq!(resource.alt.as_deref(), Some("Clip"));
    assert!(resource.is_optimized);
    assert_eq!(resource.is_muted, Some(true));
}

#[test]
fn gif_conversion_becomes_gif_resource_with_video_output() {
    let resource = Resource::from_attachment(&attachment(json!({
        "id": 55,
        "mime_type": "video/mp4",
        "source_url": "https://example.com/uploads/dance.mp4",
        "media_source": "gif-conversion",
        "featured_media": 56,
        "featured_media_src": { "src": "https://example.com/uploads/dance.png", "width": 480, "height": 270 },
        "media_details": { "width": 480, "height": 270 },
        "title": { "raw": "Dance" }
    })))
    .unwrap();

    assert_eq!(resource.kind, ResourceType::Gif);
    assert_eq!(resource.mime_type, "image/gif");
    assert!(resource.is_optimized);
    let output = resource.output.as_ref().unwrap();
    assert_eq!(output.mime_type, "video/mp4");
    assert_eq!(output.src, "https://example.com/uploads/dance.mp4");

    let encoded = serde_json::to_value(&resource).unwrap();
    assert_eq!(encoded["type"], json!("gif"));
    assert_eq!(encoded["posterId"], json!(56));
    assert_eq!(encoded["isOptimized"], json!(true));
}

#[test]
fn unsupported_attachment_mime_is_rejected() {
    let err = Resource::from_attachment(&attachment(json!({
        "id": 1,
        "mime_type": "application/pdf",
        "source_url": "https://example.com/uploads/doc.pdf"
    })))
    .unwrap_err();
    assert_eq!(err, ResourceError::UnsupportedMime("application/pdf".to_string()));
}

#[test]
fn media_picker_prefers_url_and_description_fallback() {
    let item: MediaPickerItem = serde_json::from_value(json!({
        "id": 9,
        "src": "https://example.com/fallback.jpg",
        "url": "https://example.com/picked.jpg",
        "mime": "image/png",
        "title": "Picked",
        "alt": "",
        "description": "A picked image",
        "date": "2021-06-01",
        "media_details": { "width": 800, "height": 600 }
    }))
    .unwrap();

    let resource = Resource::from_media_picker(&item).unwrap();
    assert_eq!(resource.src, "https://example.com/picked.jpg");
    assert_eq!(resource.alt.as_deref(), Some("A picked image"));
    assert_eq!(resource.creation_date.as_deref(), Some("2021-06-01"));
    assert_eq!((resource.width, resource.height), (800, 600));
    assert_eq!(resource.poster_id, None);
}
