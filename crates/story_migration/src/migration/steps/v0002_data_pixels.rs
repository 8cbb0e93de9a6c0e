//! v2: element geometry moves from the legacy 540-wide page to 1080 data pixels.

use crate::migration::walk::{element_type, for_each_element, StepResult};
use crate::migration::StepError;
use serde_json::{Number, Value};

const SCALE: i64 = 2;
const GEOMETRY_KEYS: [&str; 4] = ["x", "y", "width", "height"];

pub(crate) fn migrate(mut document: Value) -> StepResult<Value> {
    for_each_element(&mut document, |path, element| {
        for key in GEOMETRY_KEYS {
            if let Some(value) = element.get_mut(key) {
                scale(value, &format!("{path}.{key}"))?;
            }
        }
        if element_type(element) == Some("text") {
            if let Some(value) = element.get_mut("fontSize") {
                scale(value, &format!("{path}.fontSize"))?;
            }
        }
        Ok(())
    })?;
    Ok(document)
}

fn scale(value: &mut Value, path: &str) -> StepResult<()> {
    let Value::Number(number) = value else {
        return Err(StepError::malformed(path, "expected a number"));
    };

    let out_of_range = || StepError::malformed(path, "value out of range");
    let scaled = if let Some(integer) = number.as_i64() {
        integer.checked_mul(SCALE).map(Value::from).ok_or_else(out_of_range)?
    } else if let Some(integer) = number.as_u64() {
        integer
            .checked_mul(SCALE.unsigned_abs())
            .map(Value::from)
            .ok_or_else(out_of_range)?
    } else {
        // as_f64 is always Some for numbers without arbitrary_precision.
        let float = number.as_f64().unwrap_or_default() * SCALE as f64;
        Number::from_f64(float)
            .map(Value::Number)
            .ok_or_else(out_of_range)?
    };
    *value = scaled;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::migrate;
    use crate::migration::StepError;
    use serde_json::json;

    #[test]
    fn doubles_geometry_and_text_font_size() {
        let document = json!({
            "pages": [{
                "elements": [
                    { "type": "text", "x": 10, "y": 20.5, "width": 100, "height": 40, "fontSize": 14 },
                    { "type": "shape", "x": 0, "y": 0, "width": 270, "height": 480, "fontSize": 3 }
                ]
            }]
        });

        let migrated = migrate(document).unwrap();
        let elements = &migrated["pages"][0]["elements"];
        assert_eq!(elements[0]["x"], json!(20));
        assert_eq!(elements[0]["y"], json!(41.0));
        assert_eq!(elements[0]["width"], json!(200));
        assert_eq!(elements[0]["fontSize"], json!(28));
        assert_eq!(elements[1]["width"], json!(540));
        assert_eq!(elements[1]["height"], json!(960));
        assert_eq!(elements[1]["fontSize"], json!(3));
    }

    #[test]
    fn rejects_non_numeric_geometry() {
        let document = json!({ "pages": [{ "elements": [{ "type": "image", "x": "10px" }] }] });

        let err = migrate(document).unwrap_err();
        assert_eq!(
            err,
            StepError::malformed("pages[0].elements[0].x", "expected a number")
        );
    }

    #[test]
    fn overflowing_values_are_rejected() {
        // Integers past i64::MAX must not fall back to a lossy float.
        for x in [json!(1e308), json!(i64::MAX as u64 + 1), json!(u64::MAX - 1)] {
            let document = json!({ "pages": [{ "elements": [{ "type": "shape", "x": x }] }] });

            let err = migrate(document).unwrap_err();
            assert_eq!(
                err,
                StepError::malformed("pages[0].elements[0].x", "value out of range")
            );
        }
    }
}
