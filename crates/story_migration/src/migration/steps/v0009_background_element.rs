//! v9: page `backgroundElementId` becomes an `isBackground` flag on the element.

use crate::migration::walk::{for_each_page, page_elements_mut, StepResult};
use crate::migration::StepError;
use serde_json::Value;

pub(crate) fn migrate(mut document: Value) -> StepResult<Value> {
    for_each_page(&mut document, |page_path, page| {
        let reference_path = format!("{page_path}.backgroundElementId");
        let background_id = match page.remove("backgroundElementId") {
            None | Some(Value::Null) => return Ok(()),
            Some(Value::String(id)) => id,
            Some(_) => {
                return Err(StepError::malformed(reference_path, "expected a string"));
            }
        };

        let background = page_elements_mut(page_path, page)?.and_then(|elements| {
            elements
                .iter_mut()
                .filter_map(Value::as_object_mut)
                .find(|element| {
                    element.get("id").and_then(Value::as_str) == Some(background_id.as_str())
                })
        });
        let Some(background) = background else {
            return Err(StepError::DanglingReference {
                path: reference_path,
                id: background_id,
            });
        };

        background.insert("isBackground".to_string(), Value::Bool(true));
        Ok(())
    })?;
    Ok(document)
}
