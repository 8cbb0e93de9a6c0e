//! v5: hex color strings become solid patterns `{ "color": { r, g, b, a? } }`.
//!
//! Applies to text `color`, element `backgroundColor` and page
//! `backgroundColor`. Values that are already objects are kept as-is.

use crate::migration::walk::{element_type, for_each_page, page_elements_mut, Object, StepResult};
use crate::migration::StepError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#?([0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("valid hex color regex")
});

pub(crate) fn migrate(mut document: Value) -> StepResult<Value> {
    for_each_page(&mut document, |page_path, page| {
        convert_key(page, "backgroundColor", page_path)?;

        let Some(elements) = page_elements_mut(page_path, page)? else {
            return Ok(());
        };
        for (index, element) in elements.iter_mut().enumerate() {
            let path = format!("{page_path}.elements[{index}]");
            let element = element
                .as_object_mut()
                .ok_or_else(|| StepError::malformed(path.as_str(), "expected an object"))?;
            convert_key(element, "backgroundColor", &path)?;
            if element_type(element) == Some("text") {
                convert_key(element, "color", &path)?;
            }
        }
        Ok(())
    })?;
    Ok(document)
}

fn convert_key(object: &mut Object, key: &str, owner_path: &str) -> StepResult<()> {
    let Some(value) = object.get_mut(key) else {
        return Ok(());
    };
    let path = format!("{owner_path}.{key}");
    let pattern = match &*value {
        Value::Null | Value::Object(_) => return Ok(()),
        Value::String(raw) => solid_pattern(raw, &path)?,
        other => {
            return Err(StepError::InvalidColor {
                path,
                value: other.to_string(),
            })
        }
    };
    *value = pattern;
    Ok(())
}

fn solid_pattern(raw: &str, path: &str) -> StepResult<Value> {
    let invalid = || StepError::InvalidColor {
        path: path.to_string(),
        value: raw.to_string(),
    };
    let captures = HEX_COLOR_RE.captures(raw.trim()).ok_or_else(invalid)?;
    let digits = captures.get(1).map_or("", |m| m.as_str());

    let expanded: String = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };
    let channel = |index: usize| {
        expanded
            .get(index * 2..index * 2 + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .ok_or_else(invalid)
    };

    let mut color = Map::new();
    color.insert("r".to_string(), Value::from(channel(0)?));
    color.insert("g".to_string(), Value::from(channel(1)?));
    color.insert("b".to_string(), Value::from(channel(2)?));
    if expanded.len() == 8 {
        let alpha = channel(3)?;
        if alpha != u8::MAX {
            let rounded = (f64::from(alpha) / 255.0 * 100.0).round() / 100.0;
            color.insert("a".to_string(), Value::from(rounded));
        }
    }
    Ok(json!({ "color": color }))
}

#[cfg(test)]
mod tests {
    use super::{migrate, solid_pattern};
    use crate::migration::StepError;
    use serde_json::json;

    #[test]
    fn parses_short_long_and_alpha_hex() {
        assert_eq!(
            solid_pattern("#f0a", "p").unwrap(),
            json!({ "color": { "r": 255, "g": 0, "b": 170 } })
        );
        assert_eq!(
            solid_pattern("#1A2b3C", "p").unwrap(),
            json!({ "color": { "r": 26, "g": 43, "b": 60 } })
        );
        assert_eq!(
            solid_pattern("#00000080", "p").unwrap(),
            json!({ "color": { "r": 0, "g": 0, "b": 0, "a": 0.5 } })
        );
        assert_eq!(
            solid_pattern("#ffffffff", "p").unwrap(),
            json!({ "color": { "r": 255, "g": 255, "b": 255 } })
        );
    }

    #[test]
    fn converts_page_and_element_colors() {
        let document = json!({
            "pages": [{
                "backgroundColor": "#ffffff",
                "elements": [
                    { "type": "text", "color": "#000", "backgroundColor": "#ff0000" },
                    { "type": "shape", "color": "#000", "backgroundColor": { "color": { "r": 1, "g": 2, "b": 3 } } }
                ]
            }]
        });

        let migrated = migrate(document).unwrap();
        let page = &migrated["pages"][0];
        assert_eq!(
            page["backgroundColor"],
            json!({ "color": { "r": 255, "g": 255, "b": 255 } })
        );
        assert_eq!(
            page["elements"][0]["color"],
            json!({ "color": { "r": 0, "g": 0, "b": 0 } })
        );
        assert_eq!(
            page["elements"][0]["backgroundColor"],
            json!({ "color": { "r": 255, "g": 0, "b": 0 } })
        );
        assert_eq!(page["elements"][1]["color"], json!("#000"));
        assert_eq!(
            page["elements"][1]["backgroundColor"],
            json!({ "color": { "r": 1, "g": 2, "b": 3 } })
        );
    }

    #[test]
    fn rejects_named_colors() {
        let document = json!({ "pages": [{ "backgroundColor": "rebeccapurple" }] });

        let err = migrate(document).unwrap_err();
        assert_eq!(
            err,
            StepError::InvalidColor {
                path: "pages[0].backgroundColor".to_string(),
                value: "rebeccapurple".to_string(),
            }
        );
    }
}
