//! Template file loading, asset URL rewriting and migrate-on-load.

use super::{TemplateConfig, TemplateError, TemplateResult};
use crate::migration::migrate_document;
use crate::model::story::StoryDocument;
use log::{error, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Prefix used by bundled templates in place of the CDN base URL.
pub const TEMPLATE_BASE_URL_PLACEHOLDER: &str = "__WEB_STORIES_TEMPLATE_BASE_URL__/";

/// Named swatch shown next to a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateColor {
    pub label: String,
    pub color: String,
}

/// Display metadata stored at the top level of a template document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub colors: Vec<TemplateColor>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub vertical: String,
}

/// A loaded, migrated template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// File stem the template was loaded from.
    pub name: String,
    pub metadata: TemplateMetadata,
    pub document: StoryDocument,
}

/// Prepares a raw template for migration.
///
/// Returns a copy in which every element resource has its `sizes` cleared and
/// the placeholder prefix of `src` and `poster` replaced by `image_base_url`.
/// A missing `pages` array becomes an empty one. Shapes that do not match are
/// left for the migrator to reject.
pub fn prepare_template(raw: &Value, image_base_url: &str) -> Value {
    let mut template = raw.clone();
    let Some(root) = template.as_object_mut() else {
        return template;
    };

    let pages = root
        .entry("pages")
        .or_insert_with(|| Value::Array(Vec::new()));
    if pages.is_null() {
        *pages = Value::Array(Vec::new());
    }

    let resources = pages
        .as_array_mut()
        .into_iter()
        .flatten()
        .filter_map(|page| page.get_mut("elements").and_then(Value::as_array_mut))
        .flatten()
        .filter_map(|element| element.get_mut("resource").and_then(Value::as_object_mut));

    for resource in resources {
        if resource.get("sizes").is_some_and(|sizes| !sizes.is_null()) {
            resource.insert("sizes".to_string(), Value::Array(Vec::new()));
        }
        for key in ["src", "poster"] {
            if let Some(Value::String(url)) = resource.get_mut(key) {
                *url = url.replacen(TEMPLATE_BASE_URL_PLACEHOLDER, image_base_url, 1);
            }
        }
    }
    template
}

/// Loads, prepares and migrates a single template.
///
/// # Errors
/// - `Io` when `<template_dir>/<name>.json` cannot be read.
/// - `Parse` when the file is not JSON.
/// - `Migration` when the template version is missing or a step fails.
/// - `Story` when the migrated document does not fit the current schema.
pub fn load_template(config: &TemplateConfig, name: &str) -> TemplateResult<Template> {
    let name = name.trim();
    let path = config.template_path(name);
    let raw = std::fs::read_to_string(&path).map_err(|source| TemplateError::Io {
        path: path.clone(),
        source,
    })?;
    let raw: Value = serde_json::from_str(&raw).map_err(|source| TemplateError::Parse {
        name: name.to_string(),
        source,
    })?;

    let prepared = prepare_template(&raw, &config.normalized_base_url());
    let migrated = migrate_document(&prepared).map_err(|source| TemplateError::Migration {
        name: name.to_string(),
        source,
    })?;

    let metadata =
        TemplateMetadata::deserialize(&migrated).map_err(|source| TemplateError::Parse {
            name: name.to_string(),
            source,
        })?;
    let document = StoryDocument::from_value(migrated).map_err(|source| TemplateError::Story {
        name: name.to_string(),
        source,
    })?;

    Ok(Template {
        name: name.to_string(),
        metadata,
        document,
    })
}

/// Loads every configured template in parallel, preserving configured order.
///
/// With an empty `names` list every `*.json` file in `template_dir` is loaded,
/// sorted by file stem.
///
/// # Errors
/// - `InvalidConfig` when the config fails validation.
/// - The first error from [`load_template`].
pub fn load_templates(config: &TemplateConfig) -> TemplateResult<Vec<Template>> {
    let started_at = Instant::now();
    config.validate()?;

    let names = if config.names.is_empty() {
        discover_template_names(config)?
    } else {
        config.names.clone()
    };

    let result = names
        .par_iter()
        .map(|name| load_template(config, name))
        .collect::<TemplateResult<Vec<_>>>();

    match &result {
        Ok(templates) => info!(
            "event=load_templates module=template status=ok count={} duration_ms={}",
            templates.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=load_templates module=template status=error duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

fn discover_template_names(config: &TemplateConfig) -> TemplateResult<Vec<String>> {
    let io_error = |source: std::io::Error| TemplateError::Io {
        path: config.template_dir.clone(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(&config.template_dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}
