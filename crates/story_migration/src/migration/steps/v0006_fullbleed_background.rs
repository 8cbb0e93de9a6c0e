//! v6: `isFullbleed` is renamed `isFullbleedBackground`.

use crate::migration::walk::{for_each_element, rename_key, StepResult};
use serde_json::Value;

pub(crate) fn migrate(mut document: Value) -> StepResult<Value> {
    for_each_element(&mut document, |_, element| {
        rename_key(element, "isFullbleed", "isFullbleedBackground");
        Ok(())
    })?;
    Ok(document)
}
