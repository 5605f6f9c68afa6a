use prep_core::Category;

use crate::error::ValidationError;

/// Topics picked on the selection screen, in the order they were picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicSelection {
    selected: Vec<String>,
}

impl TopicSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    #[must_use]
    pub fn is_selected(&self, topic: &str) -> bool {
        self.selected.iter().any(|t| t == topic)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Select `topic`, or deselect it if it was already selected.
    pub fn toggle_topic(&mut self, topic: &str) {
        if let Some(pos) = self.selected.iter().position(|t| t == topic) {
            self.selected.remove(pos);
        } else {
            self.selected.push(topic.to_owned());
        }
    }

    /// True when every topic of `category` is selected.
    #[must_use]
    pub fn is_category_selected(&self, category: &Category) -> bool {
        category.topics().iter().all(|t| self.is_selected(t))
    }

    /// Select all topics of `category`, or clear them if all were selected.
    pub fn toggle_category(&mut self, category: &Category) {
        if self.is_category_selected(category) {
            self.selected.retain(|t| !category.contains(t));
        } else {
            for topic in category.topics() {
                if !self.is_selected(topic) {
                    self.selected.push(topic.clone());
                }
            }
        }
    }

    /// # Errors
    ///
    /// Returns `ValidationError::NoTopicsSelected` when nothing is selected.
    pub fn into_topics(self) -> Result<Vec<String>, ValidationError> {
        if self.selected.is_empty() {
            return Err(ValidationError::NoTopicsSelected);
        }
        Ok(self.selected)
    }
}
