use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Study material generated for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicContent {
    pub explanation: String,
    pub example: String,
    pub exam_tips: String,
    #[serde(default)]
    pub common_questions: Vec<String>,
}

/// Reference links for a topic: the generator returns either one URL or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sources {
    Single(String),
    Multiple(Vec<String>),
}

impl Sources {
    /// All non-blank URLs, in the order the generator listed them.
    #[must_use]
    pub fn urls(&self) -> Vec<&str> {
        match self {
            Sources::Single(url) => vec![url.as_str()],
            Sources::Multiple(urls) => urls.iter().map(String::as_str).collect(),
        }
        .into_iter()
        .filter(|url| !url.trim().is_empty())
        .collect()
    }
}

/// Content-generation result, also the payload handed from topic selection
/// to the results and quiz steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicResponse {
    pub topics: Vec<String>,
    #[serde(default)]
    pub content: BTreeMap<String, TopicContent>,
    #[serde(default)]
    pub sources: BTreeMap<String, Sources>,
}

/// The selection result stored for downstream steps.
pub type TopicResult = TopicResponse;

impl TopicResponse {
    /// Topics listed in `topics` that have no entry in `content`.
    #[must_use]
    pub fn missing_topics(&self) -> Vec<&str> {
        self.topics
            .iter()
            .filter(|topic| !self.content.contains_key(topic.as_str()))
            .map(String::as_str)
            .collect()
    }

    #[must_use]
    pub fn content_for(&self, topic: &str) -> Option<&TopicContent> {
        self.content.get(topic)
    }

    #[must_use]
    pub fn sources_for(&self, topic: &str) -> Vec<&str> {
        self.sources.get(topic).map(Sources::urls).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_accept_string_or_list() {
        let json = r#"{
            "topics": ["A", "B"],
            "content": {},
            "sources": {"A": "https://a.example", "B": ["https://b1.example", "", "https://b2.example"]}
        }"#;
        let response: TopicResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.sources_for("A"), vec!["https://a.example"]);
        assert_eq!(
            response.sources_for("B"),
            vec!["https://b1.example", "https://b2.example"]
        );
        assert!(response.sources_for("C").is_empty());
    }

    #[test]
    fn reports_topics_without_content() {
        let mut response = TopicResponse {
            topics: vec!["A".into(), "B".into()],
            content: BTreeMap::new(),
            sources: BTreeMap::new(),
        };
        response.content.insert(
            "A".into(),
            TopicContent {
                explanation: "e".into(),
                example: "x".into(),
                exam_tips: "t".into(),
                common_questions: vec![],
            },
        );
        assert_eq!(response.missing_topics(), vec!["B"]);
    }

    #[test]
    fn content_and_sources_default_when_absent() {
        let response: TopicResponse = serde_json::from_str(r#"{"topics": ["A"]}"#).unwrap();
        assert!(response.content.is_empty());
        assert_eq!(response.missing_topics(), vec!["A"]);
    }
}
