//! Traversal helpers shared by migration steps.
//!
//! Missing `pages` or `elements` arrays are treated as empty; present but
//! mistyped containers are reported with their JSON path.

use super::StepError;
use serde_json::{Map, Value};

pub(crate) type StepResult<T> = Result<T, StepError>;

pub(crate) type Object = Map<String, Value>;

/// Visits every page object of a document.
pub(crate) fn for_each_page<F>(document: &mut Value, mut visit: F) -> StepResult<()>
where
    F: FnMut(&str, &mut Object) -> StepResult<()>,
{
    let Some(pages) = document.get_mut("pages") else {
        return Ok(());
    };
    let pages = pages
        .as_array_mut()
        .ok_or_else(|| StepError::malformed("pages", "expected an array"))?;

    for (index, page) in pages.iter_mut().enumerate() {
        let path = format!("pages[{index}]");
        let page = page
            .as_object_mut()
            .ok_or_else(|| StepError::malformed(path.as_str(), "expected an object"))?;
        visit(&path, page)?;
    }
    Ok(())
}

/// Returns the element array of a page, or `None` when the page has none.
pub(crate) fn page_elements_mut<'a>(
    page_path: &str,
    page: &'a mut Object,
) -> StepResult<Option<&'a mut Vec<Value>>> {
    match page.get_mut("elements") {
        None => Ok(None),
        Some(elements) => elements.as_array_mut().map(Some).ok_or_else(|| {
            StepError::malformed(format!("{page_path}.elements"), "expected an array")
        }),
    }
}

/// Visits every element object of every page, in document order.
pub(crate) fn for_each_element<F>(document: &mut Value, mut visit: F) -> StepResult<()>
where
    F: FnMut(&str, &mut Object) -> StepResult<()>,
{
    for_each_page(document, |page_path, page| {
        let Some(elements) = page_elements_mut(page_path, page)? else {
            return Ok(());
        };
        for (index, element) in elements.iter_mut().enumerate() {
            let path = format!("{page_path}.elements[{index}]");
            let element = element
                .as_object_mut()
                .ok_or_else(|| StepError::malformed(path.as_str(), "expected an object"))?;
            visit(&path, element)?;
        }
        Ok(())
    })
}

pub(crate) fn element_type(element: &Object) -> Option<&str> {
    element.get("type").and_then(Value::as_str)
}

/// Moves `from` to `to`. An existing `to` value wins; `from` is always removed.
pub(crate) fn rename_key(object: &mut Object, from: &str, to: &str) {
    if let Some(value) = object.remove(from) {
        if !object.contains_key(to) {
            object.insert(to.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{for_each_element, rename_key};
    use crate::migration::StepError;
    use serde_json::json;

    #[test]
    fn for_each_element_reports_paths_in_document_order() {
        let mut document = json!({
            "pages": [
                { "elements": [{ "id": "a" }, { "id": "b" }] },
                {},
                { "elements": [{ "id": "c" }] }
            ]
        });

        let mut seen = Vec::new();
        for_each_element(&mut document, |path, element| {
            seen.push(format!("{path}={}", element["id"].as_str().unwrap_or("")));
            Ok(())
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                "pages[0].elements[0]=a",
                "pages[0].elements[1]=b",
                "pages[2].elements[0]=c"
            ]
        );
    }

    #[test]
    fn for_each_element_rejects_non_object_element() {
        let mut document = json!({ "pages": [{ "elements": [42] }] });

        let err = for_each_element(&mut document, |_, _| Ok(())).unwrap_err();
        assert_eq!(
            err,
            StepError::malformed("pages[0].elements[0]", "expected an object")
        );
    }

    #[test]
    fn rename_key_keeps_existing_target() {
        let mut object = json!({ "old": 1, "new": 2 }).as_object().cloned().unwrap();
        rename_key(&mut object, "old", "new");
        assert_eq!(object.get("new"), Some(&json!(2)));
        assert!(!object.contains_key("old"));
    }
}
