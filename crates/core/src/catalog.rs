//! Static syllabus reference data.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("category title cannot be empty")]
    EmptyTitle,

    #[error("category {0} has no topics")]
    EmptyCategory(String),

    #[error("duplicate catalog entry: {0}")]
    Duplicate(String),
}

/// A syllabus section, e.g. `"Data Modeling (14%)"`, and its topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    title: String,
    topics: Vec<String>,
}

impl Category {
    #[must_use]
    pub fn new(title: impl Into<String>, topics: Vec<String>) -> Self {
        Self {
            title: title.into(),
            topics,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Title without the trailing exam-weight label.
    #[must_use]
    pub fn name(&self) -> &str {
        match self.title.rfind(" (") {
            Some(pos) if self.exam_weight().is_some() => &self.title[..pos],
            _ => &self.title,
        }
    }

    /// Exam weight parsed from a trailing `(NN%)` label.
    #[must_use]
    pub fn exam_weight(&self) -> Option<u8> {
        let inner = self
            .title
            .trim_end()
            .strip_suffix("%)")?
            .rsplit_once('(')?
            .1;
        inner.trim().parse().ok()
    }

    #[must_use]
    pub fn contains(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t == topic)
    }
}

/// Ordered list of syllabus categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCatalog {
    categories: Vec<Category>,
}

impl TopicCatalog {
    /// # Errors
    ///
    /// Returns `CatalogError` for blank titles, empty categories, or names that
    /// appear twice anywhere in the catalog.
    pub fn new(categories: Vec<Category>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for category in &categories {
            if category.title.trim().is_empty() {
                return Err(CatalogError::EmptyTitle);
            }
            if category.topics.is_empty() {
                return Err(CatalogError::EmptyCategory(category.title.clone()));
            }
            for name in std::iter::once(&category.title).chain(&category.topics) {
                if !seen.insert(name.as_str()) {
                    return Err(CatalogError::Duplicate(name.clone()));
                }
            }
        }
        Ok(Self { categories })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            categories: Vec::new(),
        }
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category titles followed by their subtopics, in catalog order.
    pub fn flattened(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .map(|c| c.title.as_str())
            .chain(
                self.categories
                    .iter()
                    .flat_map(|c| c.topics.iter().map(String::as_str)),
            )
    }

    #[must_use]
    pub fn flattened_len(&self) -> usize {
        self.categories.len() + self.categories.iter().map(|c| c.topics.len()).sum::<usize>()
    }

    /// True if `name` is a category title or a subtopic.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.title == name || c.contains(name))
    }

    #[must_use]
    pub fn category(&self, title: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.title == title)
    }

    #[must_use]
    pub fn topics_of_category(&self, title: &str) -> Option<&[String]> {
        self.category(title).map(Category::topics)
    }

    #[must_use]
    pub fn exam_weight(&self, title: &str) -> Option<u8> {
        self.category(title).and_then(Category::exam_weight)
    }

    /// Parent category of a subtopic, or the category itself for a title.
    #[must_use]
    pub fn category_for_topic(&self, topic: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.title == topic || c.contains(topic))
    }

    /// Topic list for practising the whole category `topic` belongs to.
    #[must_use]
    pub fn practice_category(&self, topic: &str) -> Option<Vec<String>> {
        self.category_for_topic(topic).map(|c| c.topics.clone())
    }

    /// First subtopic for which `attempted` returns false.
    pub fn first_unattempted<'a>(&'a self, attempted: impl Fn(&str) -> bool) -> Option<&'a str> {
        self.categories
            .iter()
            .flat_map(|c| c.topics.iter())
            .map(String::as_str)
            .find(|topic| !attempted(*topic))
    }

    /// Sitecore XM Cloud developer certification syllabus.
    #[must_use]
    pub fn xm_cloud() -> Self {
        fn cat(title: &str, topics: &[&str]) -> Category {
            Category::new(title, topics.iter().map(|t| (*t).to_owned()).collect())
        }

        Self {
            categories: vec![
                cat(
                    "XM Cloud Architecture and Developer Workflow (12%)",
                    &[
                        "Sitecore XM Cloud-specific terminology",
                        "Benefits of cloud and SaaS architecture for composable DXP",
                        "Key components of XM Cloud developer workflow",
                        "Managing sites within site collections",
                        "Sitecore-first development workflow",
                    ],
                ),
                cat(
                    "Deployment of XM Cloud Projects (16%)",
                    &[
                        "XM Cloud Deploy app usage",
                        "Connecting to source control repositories",
                        "Setting up automatic deployments",
                        "Using Vercel + GitHub / Azure DevOps connector",
                        "Deployment logs and troubleshooting",
                    ],
                ),
                cat(
                    "Renderings and Layout (14%)",
                    &[
                        "Creating and modifying components",
                        "Placeholder settings",
                        "Allowed components",
                        "Adding components to the component builder",
                        "XM Cloud Components vs Headless SXA Components",
                        "Grid layout settings",
                    ],
                ),
                cat(
                    "Sitecore Content Serialization (14%)",
                    &[
                        "Serializing and deserializing items using Sitecore CLI",
                        "Connecting to local or remote XM Cloud instances",
                        "Configuring Serialization Module (included paths and rules)",
                        "Using serialization packages for continuous integration",
                        "Understanding sitecore.json and module.json files",
                    ],
                ),
                cat(
                    "Sitecore APIs & Webhooks (10%)",
                    &[
                        "GraphQL queries and their output",
                        "Experience Edge",
                        "Admin API",
                        "Webhooks implementation and usage",
                    ],
                ),
                cat(
                    "XM Cloud Pages (10%)",
                    &[
                        "Creating and editing items using Sitecore Pages",
                        "Adding and modifying components and properties",
                        "Managing placeholders",
                        "Changing component data sources",
                        "Multi-device preview",
                        "Device settings and breakpoints",
                    ],
                ),
                cat(
                    "Security for Developers (10%)",
                    &[
                        "Administrator roles and organization user/admin",
                        "Security editor and access viewer",
                        "Managing roles and assigning security rights",
                        "User roles for deployment",
                    ],
                ),
                cat(
                    "Data Modeling (14%)",
                    &[
                        "Setting up template structures",
                        "Using base templates",
                        "Configuring fields",
                        "Setting up complex fields in Sitecore",
                        "Adding languages in headless setup",
                    ],
                ),
            ],
        }
    }
}

impl Default for TopicCatalog {
    fn default() -> Self {
        Self::xm_cloud()
    }
}
