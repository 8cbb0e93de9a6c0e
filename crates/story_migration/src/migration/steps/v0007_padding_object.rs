//! v7: numeric text `padding` becomes `{ horizontal, vertical, locked }`.

use crate::migration::walk::{element_type, for_each_element, StepResult};
use crate::migration::StepError;
use serde_json::{json, Value};

pub(crate) fn migrate(mut document: Value) -> StepResult<Value> {
    for_each_element(&mut document, |path, element| {
        if element_type(element) != Some("text") {
            return Ok(());
        }
        let Some(padding) = element.get_mut("padding") else {
            return Ok(());
        };

        let object = match &*padding {
            Value::Object(_) | Value::Null => return Ok(()),
            Value::Number(amount) => json!({
                "horizontal": amount,
                "vertical": amount,
                "locked": true,
            }),
            _ => {
                return Err(StepError::malformed(
                    format!("{path}.padding"),
                    "expected a number or an object",
                ))
            }
        };
        *padding = object;
        Ok(())
    })?;
    Ok(document)
}
