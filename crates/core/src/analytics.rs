//! Progress analytics over quiz-attempt history.
//!
//! Metrics are always recomputed from the full attempt snapshot; nothing here
//! keeps state between calls.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::catalog::TopicCatalog;
use crate::model::QuizAttempt;
use crate::percent::{Ratio, score_percent};

const TOP_TOPICS: usize = 3;
const RECENT_ATTEMPTS: usize = 5;
const TREND_WINDOW: usize = 3;

//
// ─── TIME FILTER ───────────────────────────────────────────────────────────────
//

/// Dashboard time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeFilter {
    #[default]
    All,
    LastWeek,
    LastMonth,
}

impl TimeFilter {
    #[must_use]
    pub fn window(self) -> Option<Duration> {
        match self {
            TimeFilter::All => None,
            TimeFilter::LastWeek => Some(Duration::days(7)),
            TimeFilter::LastMonth => Some(Duration::days(30)),
        }
    }

    /// Earliest `created_at` kept by this filter.
    #[must_use]
    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.window().map(|window| now - window)
    }

    #[must_use]
    pub fn includes(self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.cutoff(now).is_none_or(|cutoff| created_at >= cutoff)
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeFilter::All => "all",
            TimeFilter::LastWeek => "week",
            TimeFilter::LastMonth => "month",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimeFilterError(String);

impl fmt::Display for ParseTimeFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown time filter: {} (expected all, week, month)", self.0)
    }
}

impl std::error::Error for ParseTimeFilterError {}

impl FromStr for TimeFilter {
    type Err = ParseTimeFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TimeFilter::All),
            "week" | "lastweek" | "last-week" => Ok(TimeFilter::LastWeek),
            "month" | "lastmonth" | "last-month" => Ok(TimeFilter::LastMonth),
            _ => Err(ParseTimeFilterError(s.to_owned())),
        }
    }
}

//
// ─── METRICS ───────────────────────────────────────────────────────────────────
//

/// Aggregated statistics for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicProgress {
    pub topic: String,
    pub attempt_count: usize,
    pub average_score_percent: u8,
    pub last_attempt_date: DateTime<Utc>,
    /// Signed percentage-point change from the first to the last attempt.
    pub trend: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Coverage {
    pub covered: usize,
    pub total: usize,
}

impl Coverage {
    #[must_use]
    pub fn percent(&self) -> u8 {
        score_percent(self.covered as u64, self.total as u64)
    }
}

/// What the dashboard suggests studying next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    /// Lowest-scoring attempted topic.
    Weakest(String),
    /// First syllabus topic with no attempts yet.
    Unattempted(String),
    /// Fallback to a whole category.
    Category(String),
}

impl Recommendation {
    #[must_use]
    pub fn topic(&self) -> &str {
        match self {
            Recommendation::Weakest(t)
            | Recommendation::Unattempted(t)
            | Recommendation::Category(t) => t,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub filter: TimeFilter,
    pub overall_progress: u8,
    pub correct_percentage: u8,
    pub incorrect_percentage: u8,
    pub total_attempts: usize,
    pub overall_trend: i32,
    /// Per-topic aggregates in first-appearance order.
    pub topics: Vec<TopicProgress>,
    pub strongest: Vec<TopicProgress>,
    pub weakest: Vec<TopicProgress>,
    pub recent: Vec<QuizAttempt>,
    pub coverage: Coverage,
    pub recommendation: Option<Recommendation>,
}

impl DashboardMetrics {
    /// Metrics for a window with no attempts.
    #[must_use]
    pub fn empty(filter: TimeFilter, catalog: &TopicCatalog) -> Self {
        Self {
            filter,
            overall_progress: 0,
            correct_percentage: 0,
            incorrect_percentage: 0,
            total_attempts: 0,
            overall_trend: 0,
            topics: Vec::new(),
            strongest: Vec::new(),
            weakest: Vec::new(),
            recent: Vec::new(),
            coverage: Coverage {
                covered: 0,
                total: catalog.flattened_len(),
            },
            recommendation: recommend(catalog, &[], &[]),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_attempts == 0
    }
}

//
// ─── ANALYTICS ─────────────────────────────────────────────────────────────────
//

/// Turns attempt history into dashboard metrics against a syllabus catalog.
#[derive(Debug, Clone, Default)]
pub struct AttemptAnalytics {
    catalog: TopicCatalog,
}

impl AttemptAnalytics {
    #[must_use]
    pub fn new(catalog: TopicCatalog) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &TopicCatalog {
        &self.catalog
    }

    /// Compute all dashboard metrics for attempts inside `filter`'s window.
    #[must_use]
    pub fn compute(
        &self,
        attempts: &[QuizAttempt],
        filter: TimeFilter,
        now: DateTime<Utc>,
    ) -> DashboardMetrics {
        let filtered: Vec<&QuizAttempt> = attempts
            .iter()
            .filter(|a| filter.includes(a.created_at(), now))
            .collect();

        if filtered.is_empty() {
            return DashboardMetrics::empty(filter, &self.catalog);
        }

        let score_sum: u64 = filtered.iter().map(|a| u64::from(a.score())).sum();
        let total_sum: u64 = filtered
            .iter()
            .map(|a| u64::from(a.total_questions()))
            .sum();
        let overall_progress = score_percent(score_sum, total_sum);
        let incorrect_percentage = if total_sum > 0 {
            100 - overall_progress
        } else {
            0
        };

        let topics = topic_progress(&filtered);
        let strongest = ranked(&topics, true);
        let weakest = ranked(&topics, false);

        let covered = topics
            .iter()
            .map(|t| t.topic.as_str())
            .filter(|t| self.catalog.contains(t))
            .collect::<HashSet<_>>()
            .len();

        DashboardMetrics {
            filter,
            overall_progress,
            correct_percentage: overall_progress,
            incorrect_percentage,
            total_attempts: filtered.len(),
            overall_trend: overall_trend(&filtered),
            recommendation: recommend(&self.catalog, &topics, &weakest),
            strongest,
            weakest,
            recent: recent(&filtered),
            coverage: Coverage {
                covered,
                total: self.catalog.flattened_len(),
            },
            topics,
        }
    }
}

fn chronological<'a>(attempts: &[&'a QuizAttempt]) -> Vec<&'a QuizAttempt> {
    let mut sorted = attempts.to_vec();
    sorted.sort_by_key(|a| a.created_at());
    sorted
}

fn topic_progress(attempts: &[&QuizAttempt]) -> Vec<TopicProgress> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&QuizAttempt>> = HashMap::new();
    for attempt in attempts {
        groups
            .entry(attempt.topic())
            .or_insert_with(|| {
                order.push(attempt.topic());
                Vec::new()
            })
            .push(attempt);
    }

    order
        .into_iter()
        .filter_map(|topic| {
            let group = chronological(groups.get(topic)?);
            let first = group.first()?;
            let last = group.last()?;

            let score: u64 = group.iter().map(|a| u64::from(a.score())).sum();
            let total: u64 = group.iter().map(|a| u64::from(a.total_questions())).sum();
            let trend = if group.len() >= 2 {
                (last.ratio() - first.ratio()).percent()
            } else {
                0
            };

            Some(TopicProgress {
                topic: topic.to_owned(),
                attempt_count: group.len(),
                average_score_percent: score_percent(score, total),
                last_attempt_date: last.created_at(),
                trend,
            })
        })
        .collect()
}

fn overall_trend(attempts: &[&QuizAttempt]) -> i32 {
    let sorted = chronological(attempts);
    let take = TREND_WINDOW.min(sorted.len());
    let mean = |window: &[&QuizAttempt]| {
        window
            .iter()
            .map(|a| a.ratio())
            .sum::<Ratio>()
            .div_count(window.len())
    };
    let first = mean(&sorted[..take]);
    let last = mean(&sorted[sorted.len() - take..]);
    (last - first).percent()
}

/// Top topics by average, descending for strongest and ascending for weakest.
/// `sort_by` is stable, so equal averages keep grouping order.
fn ranked(topics: &[TopicProgress], strongest: bool) -> Vec<TopicProgress> {
    let mut sorted = topics.to_vec();
    if strongest {
        sorted.sort_by(|a, b| b.average_score_percent.cmp(&a.average_score_percent));
    } else {
        sorted.sort_by(|a, b| a.average_score_percent.cmp(&b.average_score_percent));
    }
    sorted.truncate(TOP_TOPICS);
    sorted
}

fn recent(attempts: &[&QuizAttempt]) -> Vec<QuizAttempt> {
    let mut sorted = attempts.to_vec();
    sorted.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    sorted
        .into_iter()
        .take(RECENT_ATTEMPTS)
        .cloned()
        .collect()
}

fn recommend(
    catalog: &TopicCatalog,
    topics: &[TopicProgress],
    weakest: &[TopicProgress],
) -> Option<Recommendation> {
    if let Some(weakest) = weakest.first() {
        return Some(Recommendation::Weakest(weakest.topic.clone()));
    }
    let attempted: HashSet<&str> = topics.iter().map(|t| t.topic.as_str()).collect();
    if let Some(topic) = catalog.first_unattempted(|t| attempted.contains(t)) {
        return Some(Recommendation::Unattempted(topic.to_owned()));
    }
    catalog
        .categories()
        .first()
        .map(|c| Recommendation::Category(c.title().to_owned()))
}
