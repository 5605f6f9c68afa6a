use prep_core::model::{TopicContent, TopicResponse};
use services::{ContentOrigin, StudyContent};

use super::markdown_vm::{inline_markdown_to_html, markdown_to_html, markdown_to_text};

const BULLET_PREFIX: &str = "*   **";

/// One rendered piece of an explanation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExplanationBlock {
    Bullet { html: String },
    Paragraph { html: String },
}

impl ExplanationBlock {
    #[must_use]
    pub fn is_bullet(&self) -> bool {
        matches!(self, ExplanationBlock::Bullet { .. })
    }
}

/// Split a generated explanation into bullet points and paragraphs.
///
/// A line opening with a bold list item (`*   **Term**: ...`) is a bullet;
/// every other non-blank line is a paragraph.
#[must_use]
pub fn parse_explanation(text: &str) -> Vec<ExplanationBlock> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.starts_with(BULLET_PREFIX) {
                ExplanationBlock::Bullet {
                    html: inline_markdown_to_html(line[1..].trim()),
                }
            } else {
                ExplanationBlock::Paragraph {
                    html: inline_markdown_to_html(line),
                }
            }
        })
        .collect()
}

fn explanation_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.starts_with(BULLET_PREFIX) {
                format!("• {}", markdown_to_text(line[1..].trim()))
            } else {
                markdown_to_text(line)
            }
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicCardVm {
    pub topic: String,
    pub explanation: Vec<ExplanationBlock>,
    /// Terminal rendering of `explanation`, bullets prefixed with `•`.
    pub explanation_lines: Vec<String>,
    pub example_html: String,
    pub example_text: String,
    pub exam_tips_html: String,
    pub exam_tips_text: String,
    pub common_questions: Vec<String>,
    pub sources: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsVm {
    pub cards: Vec<TopicCardVm>,
    /// Shown when placeholder content stands in for generated material.
    pub notice: Option<String>,
}

#[must_use]
pub fn map_topic_card(topic: &str, content: &TopicContent, sources: Vec<&str>) -> TopicCardVm {
    TopicCardVm {
        topic: topic.to_string(),
        explanation: parse_explanation(&content.explanation),
        explanation_lines: explanation_lines(&content.explanation),
        example_html: markdown_to_html(&content.example),
        example_text: markdown_to_text(&content.example),
        exam_tips_html: markdown_to_html(&content.exam_tips),
        exam_tips_text: markdown_to_text(&content.exam_tips),
        common_questions: content.common_questions.clone(),
        sources: sources.into_iter().map(str::to_string).collect(),
    }
}

/// Cards in topic order; topics without content are skipped.
#[must_use]
pub fn map_topic_results(response: &TopicResponse) -> Vec<TopicCardVm> {
    response
        .topics
        .iter()
        .filter_map(|topic| {
            response
                .content_for(topic)
                .map(|content| map_topic_card(topic, content, response.sources_for(topic)))
        })
        .collect()
}

#[must_use]
pub fn map_study_content(content: &StudyContent) -> ResultsVm {
    let notice = match &content.origin {
        ContentOrigin::Remote => None,
        ContentOrigin::Fallback { reason } => Some(format!(
            "Could not reach the content service ({reason}). Showing placeholder material instead."
        )),
    };
    ResultsVm {
        cards: map_topic_results(&content.response),
        notice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::{ApiError, placeholder_topic_response};

    #[test]
    fn splits_bullets_from_paragraphs() {
        let text = "Intro line.\n\n*   **Edge**: delivers content\n   plain follow-up  \n*not a bullet*";
        let blocks = parse_explanation(text);
        assert_eq!(
            blocks,
            vec![
                ExplanationBlock::Paragraph {
                    html: "Intro line.".into()
                },
                ExplanationBlock::Bullet {
                    html: "<strong>Edge</strong>: delivers content".into()
                },
                ExplanationBlock::Paragraph {
                    html: "plain follow-up".into()
                },
                ExplanationBlock::Paragraph {
                    html: "<em>not a bullet</em>".into()
                },
            ]
        );
        assert!(blocks[1].is_bullet());
        assert_eq!(
            explanation_lines(text),
            vec![
                "Intro line.".to_string(),
                "• Edge: delivers content".to_string(),
                "plain follow-up".to_string(),
                "not a bullet".to_string(),
            ]
        );
    }

    #[test]
    fn fallback_content_carries_notice() {
        let topics = vec!["Admin API".to_string()];
        let content = StudyContent {
            response: placeholder_topic_response(&topics),
            origin: ContentOrigin::Fallback {
                reason: ApiError::Timeout,
            },
        };
        let vm = map_study_content(&content);
        assert_eq!(vm.cards.len(), 1);
        assert_eq!(vm.cards[0].common_questions.len(), 3);
        assert_eq!(
            vm.cards[0].sources,
            vec!["https://developers.sitecore.com/learn/admin-api".to_string()]
        );
        assert!(vm.notice.unwrap().contains("placeholder"));
    }

    #[test]
    fn topics_without_content_are_skipped() {
        let mut response = placeholder_topic_response(&["A".to_string()]);
        response.topics.push("B".into());
        let cards = map_topic_results(&response);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].topic, "A");
    }
}
