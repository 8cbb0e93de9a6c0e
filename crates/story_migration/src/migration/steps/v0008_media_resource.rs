//! v8: media fields move from the element into its `resource` object.
//!
//! Applies to `image`, `video` and `gif` elements. Keys already present on the
//! resource win over the legacy element-level copy.

use crate::migration::walk::{element_type, for_each_element, rename_key, StepResult};
use crate::migration::StepError;
use serde_json::{Map, Value};

const MEDIA_ELEMENT_TYPES: [&str; 3] = ["image", "video", "gif"];
const LEGACY_MEDIA_KEYS: [&str; 7] = [
    "src",
    "mimeType",
    "poster",
    "posterId",
    "alt",
    "length",
    "lengthFormatted",
];

pub(crate) fn migrate(mut document: Value) -> StepResult<Value> {
    for_each_element(&mut document, |path, element| {
        let Some(kind) = element_type(element).map(str::to_string) else {
            return Ok(());
        };
        if !MEDIA_ELEMENT_TYPES.contains(&kind.as_str()) {
            return Ok(());
        }

        let mut resource = match element.remove("resource") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(resource)) => resource,
            Some(_) => {
                return Err(StepError::malformed(
                    format!("{path}.resource"),
                    "expected an object",
                ))
            }
        };

        for key in LEGACY_MEDIA_KEYS {
            if let Some(value) = element.remove(key) {
                resource.entry(key).or_insert(value);
            }
        }
        rename_key(&mut resource, "videoId", "id");
        resource
            .entry("type")
            .or_insert_with(|| Value::String(kind.clone()));

        element.insert("resource".to_string(), Value::Object(resource));
        Ok(())
    })?;
    Ok(document)
}
