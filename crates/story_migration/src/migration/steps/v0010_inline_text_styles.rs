//! v10: element-level text styles are folded into inline spans in `content`.
//!
//! Wrapping order, outermost first: font weight, italic, underline.

use crate::migration::walk::{element_type, for_each_element, Object, StepResult};
use crate::migration::StepError;
use serde_json::Value;

const NORMAL_WEIGHT: u64 = 400;
const BOLD_WEIGHT: u64 = 700;

pub(crate) fn migrate(mut document: Value) -> StepResult<Value> {
    for_each_element(&mut document, |path, element| {
        if element_type(element) != Some("text") {
            return Ok(());
        }

        let weight = font_weight(element, path)?;
        let italic = keyword_flag(element, "fontStyle", "italic", path)?;
        let underline = keyword_flag(element, "textDecoration", "underline", path)?;
        if weight.is_none() && !italic && !underline {
            return Ok(());
        }

        let mut content = match element.remove("content") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(content)) => content,
            Some(_) => {
                return Err(StepError::malformed(
                    format!("{path}.content"),
                    "expected a string",
                ))
            }
        };
        if underline {
            content = wrap(&content, "text-decoration: underline");
        }
        if italic {
            content = wrap(&content, "font-style: italic");
        }
        if let Some(weight) = weight {
            content = wrap(&content, &format!("font-weight: {weight}"));
        }

        element.insert("content".to_string(), Value::String(content));
        Ok(())
    })?;
    Ok(document)
}

/// Removes `bold` and `fontWeight`, returning the weight to inline, if any.
fn font_weight(element: &mut Object, path: &str) -> StepResult<Option<u64>> {
    let bold = match element.remove("bold") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(bold)) => bold,
        Some(_) => return Err(StepError::malformed(format!("{path}.bold"), "expected a boolean")),
    };
    let explicit = match element.remove("fontWeight") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.as_u64().ok_or_else(|| {
            StepError::malformed(format!("{path}.fontWeight"), "expected an integer weight")
        })?),
    };

    Ok(match explicit {
        Some(weight) if weight != NORMAL_WEIGHT => Some(weight),
        _ if bold => Some(BOLD_WEIGHT),
        _ => None,
    })
}

/// Removes `key`, returning whether it was set to `keyword`.
fn keyword_flag(element: &mut Object, key: &str, keyword: &str, path: &str) -> StepResult<bool> {
    match element.remove(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::String(value)) => Ok(value.trim().eq_ignore_ascii_case(keyword)),
        Some(_) => Err(StepError::malformed(format!("{path}.{key}"), "expected a string")),
    }
}

fn wrap(content: &str, style: &str) -> String {
    format!("<span style=\"{style}\">{content}</span>")
}
