use prep_core::model::QuizAttempt;
use prep_core::{DashboardMetrics, Recommendation, TimeFilter, TopicCatalog, TopicProgress};

use super::time_fmt::{format_date, format_trend};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicRowVm {
    pub topic: String,
    pub attempts_label: String,
    pub average_label: String,
    pub trend_label: String,
    pub last_attempt_label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecentAttemptVm {
    pub topic: String,
    pub score_label: String,
    pub percent_label: String,
    pub date_label: String,
    pub marker: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardVm {
    pub filter_label: &'static str,
    pub overall_label: String,
    pub correct_label: String,
    pub incorrect_label: String,
    pub attempts_label: String,
    pub trend_label: String,
    pub coverage_label: String,
    pub topics: Vec<TopicRowVm>,
    pub strongest: Vec<TopicRowVm>,
    pub weakest: Vec<TopicRowVm>,
    pub recent: Vec<RecentAttemptVm>,
    pub recommendation_label: Option<String>,
    pub empty_message: Option<&'static str>,
}

#[must_use]
pub fn filter_label(filter: TimeFilter) -> &'static str {
    match filter {
        TimeFilter::All => "All time",
        TimeFilter::LastWeek => "Last 7 days",
        TimeFilter::LastMonth => "Last 30 days",
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("1 {one}")
    } else {
        format!("{count} {many}")
    }
}

#[must_use]
pub fn map_topic_row(progress: &TopicProgress) -> TopicRowVm {
    TopicRowVm {
        topic: progress.topic.clone(),
        attempts_label: plural(progress.attempt_count, "attempt", "attempts"),
        average_label: format!("{}%", progress.average_score_percent),
        trend_label: format_trend(progress.trend),
        last_attempt_label: format_date(progress.last_attempt_date),
    }
}

#[must_use]
pub fn map_recent_attempt(attempt: &QuizAttempt) -> RecentAttemptVm {
    RecentAttemptVm {
        topic: attempt.topic().to_string(),
        score_label: format!("{}/{}", attempt.score(), attempt.total_questions()),
        percent_label: format!("{}%", attempt.score_percent()),
        date_label: format_date(attempt.created_at()),
        marker: if attempt.is_perfect() { "✓" } else { "✗" },
    }
}

fn recommendation_label(recommendation: &Recommendation) -> String {
    match recommendation {
        Recommendation::Weakest(topic) => format!("Review your weakest topic: {topic}"),
        Recommendation::Unattempted(topic) => format!("Try a topic you have not attempted: {topic}"),
        Recommendation::Category(title) => format!("Start with the category: {title}"),
    }
}

/// Hint for practising the whole category the recommended topic belongs to.
#[must_use]
pub fn practice_label(catalog: &TopicCatalog, recommendation: &Recommendation) -> Option<String> {
    let topic = recommendation.topic();
    let category = catalog.category_for_topic(topic)?;
    let topics = catalog.practice_category(topic)?;
    Some(format!(
        "Practise all {} topics of {}: quiz --category \"{}\"",
        topics.len(),
        category.name(),
        category.title()
    ))
}

#[must_use]
pub fn map_dashboard(metrics: &DashboardMetrics) -> DashboardVm {
    let rows = |items: &[TopicProgress]| items.iter().map(map_topic_row).collect::<Vec<_>>();

    DashboardVm {
        filter_label: filter_label(metrics.filter),
        overall_label: format!("{}%", metrics.overall_progress),
        correct_label: format!("{}%", metrics.correct_percentage),
        incorrect_label: format!("{}%", metrics.incorrect_percentage),
        attempts_label: plural(metrics.total_attempts, "quiz attempt", "quiz attempts"),
        trend_label: format_trend(metrics.overall_trend),
        coverage_label: format!(
            "{}/{} topics ({}%)",
            metrics.coverage.covered,
            metrics.coverage.total,
            metrics.coverage.percent()
        ),
        topics: rows(&metrics.topics),
        strongest: rows(&metrics.strongest),
        weakest: rows(&metrics.weakest),
        recent: metrics.recent.iter().map(map_recent_attempt).collect(),
        recommendation_label: metrics.recommendation.as_ref().map(recommendation_label),
        empty_message: metrics
            .is_empty()
            .then_some("No quiz attempts in this period yet. Take a quiz to see your progress."),
    }
}
