//! Expertise-area taxonomy model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::short_id;

/// A node in the expertise-area tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertiseArea {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// `None` for roots
    pub parent_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpertiseArea {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: short_id("exp"),
            slug: slugify(&name),
            name,
            description: None,
            parent_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Input for creating an area. A missing slug is derived from the name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewExpertiseArea {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<String>,
}

/// Partial update for an area.
///
/// `parent_id: Some(None)` detaches the area into a root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpertiseAreaUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// An area together with its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertiseAreaNode {
    #[serde(flatten)]
    pub area: ExpertiseArea,
    pub children: Vec<ExpertiseAreaNode>,
}

/// URL-friendly slug: lowercase, spaces to hyphens, other symbols dropped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().to_lowercase().chars() {
        let c = if c == ' ' { '-' } else { c };
        if c == '-' {
            if !slug.ends_with('-') {
                slug.push('-');
            }
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Machine Learning"), "machine-learning");
        assert_eq!(slugify("  C++ / Rust  "), "c-rust");
        assert_eq!(slugify("Data -- Science!"), "data-science");
        assert_eq!(slugify("Économie"), "conomie");
    }

    #[test]
    fn test_new_area_derives_slug() {
        let area = ExpertiseArea::new("Natural Language Processing");
        assert_eq!(area.slug, "natural-language-processing");
        assert!(area.id.starts_with("exp_"));
        assert!(area.is_root());
        assert!(area.is_active);
    }
}
