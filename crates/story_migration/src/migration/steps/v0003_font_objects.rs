//! v3: `fontFamily` + `fontFallback` on text elements become a `font` object.

use crate::migration::walk::{element_type, for_each_element, StepResult};
use crate::migration::StepError;
use serde_json::{json, Value};

pub(crate) fn migrate(mut document: Value) -> StepResult<Value> {
    for_each_element(&mut document, |path, element| {
        if element_type(element) != Some("text") {
            return Ok(());
        }

        let family = element.remove("fontFamily");
        let fallbacks = element.remove("fontFallback");
        let Some(family) = family else {
            return Ok(());
        };

        let Value::String(family) = family else {
            return Err(StepError::malformed(
                format!("{path}.fontFamily"),
                "expected a string",
            ));
        };
        let fallbacks = match fallbacks {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                if !items.iter().all(Value::is_string) {
                    return Err(StepError::malformed(
                        format!("{path}.fontFallback"),
                        "expected an array of strings",
                    ));
                }
                items
            }
            Some(_) => {
                return Err(StepError::malformed(
                    format!("{path}.fontFallback"),
                    "expected an array of strings",
                ))
            }
        };

        if !element.contains_key("font") {
            element.insert(
                "font".to_string(),
                json!({ "family": family, "fallbacks": fallbacks }),
            );
        }
        Ok(())
    })?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::migrate;
    use serde_json::json;

    #[test]
    fn builds_font_object_and_drops_legacy_keys() {
        let document = json!({
            "pages": [{ "elements": [{
                "type": "text",
                "fontFamily": "Roboto",
                "fontFallback": ["Helvetica Neue", "sans-serif"]
            }] }]
        });

        let migrated = migrate(document).unwrap();
        assert_eq!(
            migrated["pages"][0]["elements"][0],
            json!({
                "type": "text",
                "font": { "family": "Roboto", "fallbacks": ["Helvetica Neue", "sans-serif"] }
            })
        );
    }

    #[test]
    fn missing_fallback_defaults_to_empty_list() {
        let document = json!({
            "pages": [{ "elements": [{ "type": "text", "fontFamily": "Lora" }] }]
        });

        let migrated = migrate(document).unwrap();
        assert_eq!(
            migrated["pages"][0]["elements"][0]["font"],
            json!({ "family": "Lora", "fallbacks": [] })
        );
    }

    #[test]
    fn non_text_elements_are_untouched() {
        let document = json!({
            "pages": [{ "elements": [{ "type": "shape", "fontFamily": "Lora" }] }]
        });

        let migrated = migrate(document.clone()).unwrap();
        assert_eq!(migrated, document);
    }

    #[test]
    fn rejects_non_string_family() {
        let document = json!({
            "pages": [{ "elements": [{ "type": "text", "fontFamily": 12 }] }]
        });

        let err = migrate(document).unwrap_err();
        assert!(err.to_string().contains("pages[0].elements[0].fontFamily"));
    }
}
