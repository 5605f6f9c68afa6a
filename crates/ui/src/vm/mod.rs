mod dashboard_vm;
mod markdown_vm;
mod quiz_vm;
mod results_vm;
mod time_fmt;

pub use dashboard_vm::{
    DashboardVm, RecentAttemptVm, TopicRowVm, filter_label, map_dashboard, map_recent_attempt,
    map_topic_row, practice_label,
};
pub use markdown_vm::{inline_markdown_to_html, markdown_to_html, markdown_to_text, sanitize_html};
pub use quiz_vm::{FailureVm, OptionMark, OptionVm, QuestionVm, QuizVm, map_failure, map_quiz};
pub use results_vm::{
    ExplanationBlock, ResultsVm, TopicCardVm, map_study_content, map_topic_card,
    map_topic_results, parse_explanation,
};
pub use time_fmt::{format_date, format_datetime, format_trend};
