//! v4: `rotation` is renamed `rotationAngle`, which every element now carries.

use crate::migration::walk::{for_each_element, rename_key, StepResult};
use crate::migration::StepError;
use serde_json::Value;

pub(crate) fn migrate(mut document: Value) -> StepResult<Value> {
    for_each_element(&mut document, |path, element| {
        rename_key(element, "rotation", "rotationAngle");
        let missing = match element.get("rotationAngle") {
            None | Some(Value::Null) => true,
            Some(Value::Number(_)) => false,
            Some(_) => {
                return Err(StepError::malformed(
                    format!("{path}.rotationAngle"),
                    "expected a number",
                ))
            }
        };
        if missing {
            element.insert("rotationAngle".to_string(), Value::from(0));
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
    fn renames_rotation_and_defaults_missing_angle() {
        let document = json!({
            "pages": [{ "elements": [
                { "id": "a", "rotation": 45 },
                { "id": "b" },
                { "id": "c", "rotationAngle": 90, "rotation": 10 }
            ] }]
        });

        let migrated = migrate(document).unwrap();
        assert_eq!(
            migrated["pages"][0]["elements"],
            json!([
                { "id": "a", "rotationAngle": 45 },
                { "id": "b", "rotationAngle": 0 },
                { "id": "c", "rotationAngle": 90 }
            ])
        );
    }

    #[test]
    fn rejects_string_rotation() {
        let document = json!({ "pages": [{ "elements": [{ "rotation": "45deg" }] }] });
        assert!(migrate(document).is_err());
    }
}
