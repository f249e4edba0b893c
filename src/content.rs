//! Read-only content registry: articles, topics, and visuals, parsed once
//! from the embedded content file at first access and never mutated
//! afterwards, which makes concurrent reads safe by construction.

use crate::spec::{VisualSpec, VisualType};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const CONTENT_JSON: &str = include_str!("../data/content.json");

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// One chart definition as authored in content.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Visual {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub visual_type: VisualType,
    pub spec: VisualSpec,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub coverage: String,
    pub source: SourceRef,
    pub last_updated: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub topic_ids: Vec<String>,
    pub published_at: String,
    pub updated_at: String,
    pub reading_time: u32,
    #[serde(default)]
    pub visual_ids: Vec<String>,
    #[serde(default)]
    pub related_slugs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Registry {
    articles: Vec<Article>,
    topics: Vec<Topic>,
    visuals: Vec<Visual>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> Result<&'static Registry> {
    if let Some(r) = REGISTRY.get() {
        return Ok(r);
    }
    let parsed: Registry =
        serde_json::from_str(CONTENT_JSON).context("embedded content registry is malformed")?;
    Ok(REGISTRY.get_or_init(|| parsed))
}

pub fn articles() -> Result<&'static [Article]> {
    Ok(&registry()?.articles)
}

pub fn article_by_slug(slug: &str) -> Result<Option<&'static Article>> {
    Ok(registry()?.articles.iter().find(|a| a.slug == slug))
}

pub fn topics() -> Result<&'static [Topic]> {
    Ok(&registry()?.topics)
}

pub fn visuals() -> Result<&'static [Visual]> {
    Ok(&registry()?.visuals)
}

pub fn visual_by_id(id: &str) -> Result<Option<&'static Visual>> {
    Ok(registry()?.visuals.iter().find(|v| v.id == id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_parses() {
        assert!(!articles().unwrap().is_empty());
        assert!(!topics().unwrap().is_empty());
        assert!(!visuals().unwrap().is_empty());
    }

    #[test]
    fn test_visual_lookup() {
        let first = &visuals().unwrap()[0];
        let found = visual_by_id(&first.id).unwrap().unwrap();
        assert_eq!(found.title, first.title);
        assert!(visual_by_id("does-not-exist").unwrap().is_none());
    }

    #[test]
    fn test_article_lookup() {
        let first = &articles().unwrap()[0];
        assert!(article_by_slug(&first.slug).unwrap().is_some());
    }

    #[test]
    fn test_embedded_specs_are_valid() {
        for visual in visuals().unwrap() {
            visual
                .spec
                .validate()
                .unwrap_or_else(|e| panic!("visual '{}' has an invalid spec: {e}", visual.id));
        }
    }
}
