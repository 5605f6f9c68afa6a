use std::future::Future;
use std::io::{self, BufRead, Write};
use std::time::Duration;

use prep_core::model::QuizResponse;
use prep_core::{TimeFilter, TopicCatalog};
use services::{
    AppServices, GenerateOutcome, QuizPhase, QuizSession, QuizSessionError, RecoveryAction,
    TopicSelection, ValidationError,
};
use ui::LoadingTicker;
use ui::vm::{
    DashboardVm, OptionMark, QuizVm, ResultsVm, TopicRowVm, map_dashboard, map_failure, map_quiz,
    map_study_content, practice_label,
};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

const TICKER_POLL: Duration = Duration::from_millis(250);

//
// ─── DASHBOARD ─────────────────────────────────────────────────────────────────
//

pub async fn dashboard(
    services: &AppServices,
    filter: TimeFilter,
    out: &mut impl Write,
) -> CommandResult {
    let dashboard = services.dashboard();
    let snapshot = dashboard.snapshot(services.user()).await;
    if !snapshot.loaded {
        writeln!(out, "(attempt history could not be loaded)")?;
    }
    let metrics = dashboard.metrics(&snapshot, filter);
    render_dashboard(&map_dashboard(&metrics), out)?;
    if let Some(hint) = metrics
        .recommendation
        .as_ref()
        .and_then(|r| practice_label(dashboard.catalog(), r))
    {
        writeln!(out, "{hint}")?;
    }
    Ok(())
}

fn render_dashboard(vm: &DashboardVm, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Progress ({})", vm.filter_label)?;
    if let Some(message) = vm.empty_message {
        writeln!(out, "{message}")?;
    } else {
        writeln!(out, "  Overall:   {} ({})", vm.overall_label, vm.trend_label)?;
        writeln!(out, "  Correct:   {}", vm.correct_label)?;
        writeln!(out, "  Incorrect: {}", vm.incorrect_label)?;
        writeln!(out, "  Attempts:  {}", vm.attempts_label)?;
        render_rows("Topics", &vm.topics, out)?;
        render_rows("Strongest", &vm.strongest, out)?;
        render_rows("Needs work", &vm.weakest, out)?;

        if !vm.recent.is_empty() {
            writeln!(out)?;
            writeln!(out, "Recent")?;
            for attempt in &vm.recent {
                writeln!(
                    out,
                    "  {} {}  {} ({})  {}",
                    attempt.marker,
                    attempt.topic,
                    attempt.score_label,
                    attempt.percent_label,
                    attempt.date_label
                )?;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "Coverage: {}", vm.coverage_label)?;
    if let Some(next) = &vm.recommendation_label {
        writeln!(out, "Next: {next}")?;
    }
    Ok(())
}

fn render_rows(heading: &str, rows: &[TopicRowVm], out: &mut impl Write) -> io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "{heading}")?;
    for row in rows {
        writeln!(
            out,
            "  {}  {}  {}  {}  last {}",
            row.topic, row.average_label, row.trend_label, row.attempts_label, row.last_attempt_label
        )?;
    }
    Ok(())
}

//
// ─── STUDY ─────────────────────────────────────────────────────────────────────
//

/// Build the topic list from explicit topics plus whole categories.
///
/// # Errors
///
/// Returns `UnknownCategory` for a title that is not in the catalog and
/// `ValidationError::NoTopicsSelected` when nothing ends up selected.
pub fn select_topics(
    catalog: &TopicCatalog,
    topics: &[String],
    categories: &[String],
) -> Result<Vec<String>, SelectionError> {
    let mut selection = TopicSelection::new();
    for title in categories {
        let category = catalog
            .category(title)
            .ok_or_else(|| SelectionError::UnknownCategory(title.clone()))?;
        if !selection.is_category_selected(category) {
            selection.toggle_category(category);
        }
    }
    for topic in topics {
        if !selection.is_selected(topic) {
            selection.toggle_topic(topic);
        }
    }
    Ok(selection.into_topics()?)
}

#[derive(Debug)]
pub enum SelectionError {
    UnknownCategory(String),
    Empty(ValidationError),
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionError::UnknownCategory(title) => {
                write!(f, "unknown category: {title} (see `catalog`)")
            }
            SelectionError::Empty(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SelectionError {}

impl From<ValidationError> for SelectionError {
    fn from(err: ValidationError) -> Self {
        SelectionError::Empty(err)
    }
}

pub async fn study(
    services: &AppServices,
    topics: &[String],
    categories: &[String],
    out: &mut impl Write,
) -> CommandResult {
    let selected = select_topics(&services.catalog(), topics, categories)?;
    let content_service = services.content();
    let content = with_loading(content_service.fetch(&selected), out).await?;

    services.handoff().save_topic_results(&content.response).await?;
    render_results(&map_study_content(&content), out)?;
    writeln!(out)?;
    writeln!(out, "Run `quiz` to test yourself on these topics.")?;
    Ok(())
}

fn render_results(vm: &ResultsVm, out: &mut impl Write) -> io::Result<()> {
    if let Some(notice) = &vm.notice {
        writeln!(out, "! {notice}")?;
    }
    for card in &vm.cards {
        writeln!(out)?;
        writeln!(out, "== {} ==", card.topic)?;
        for line in &card.explanation_lines {
            writeln!(out, "{line}")?;
        }
        if !card.example_text.is_empty() {
            writeln!(out)?;
            writeln!(out, "Example:")?;
            writeln!(out, "{}", card.example_text)?;
        }
        if !card.exam_tips_text.is_empty() {
            writeln!(out)?;
            writeln!(out, "Exam tips:")?;
            writeln!(out, "{}", card.exam_tips_text)?;
        }
        if !card.common_questions.is_empty() {
            writeln!(out)?;
            writeln!(out, "Common questions:")?;
            for question in &card.common_questions {
                writeln!(out, "  - {question}")?;
            }
        }
        if !card.sources.is_empty() {
            writeln!(out)?;
            writeln!(out, "Sources:")?;
            for source in &card.sources {
                writeln!(out, "  {source}")?;
            }
        }
    }
    Ok(())
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

pub async fn quiz(
    services: &AppServices,
    category: Option<&str>,
    resume: bool,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> CommandResult {
    let mut session = services.quiz_session();
    let ready = if resume {
        resume_saved(services, &mut session, out).await?
    } else {
        generate_new(services, &mut session, category, input, out).await?
    };
    if !ready {
        return Ok(());
    }

    loop {
        answer_questions(&mut session, input, out)?;
        let submitted = session.submit().await?;
        render_quiz(&map_quiz(&session), out)?;
        if !submitted.persisted {
            writeln!(out, "(this attempt could not be saved to your history)")?;
        }

        if !confirm("Recheck answers? [y/N]", input, out)? {
            return Ok(());
        }
        match with_loading(session.recheck(), out).await {
            Ok(revised) => {
                writeln!(out, "Revised quiz with {revised} questions.")?;
                save_current_quiz(services, &session).await;
            }
            Err(err) => {
                writeln!(out, "Recheck failed: {err}")?;
                return Ok(());
            }
        }
    }
}

async fn resume_saved(
    services: &AppServices,
    session: &mut QuizSession,
    out: &mut impl Write,
) -> Result<bool, Box<dyn std::error::Error>> {
    let Some(saved) = services.handoff().quiz().await? else {
        writeln!(out, "No saved quiz yet. Run `quiz` to generate one.")?;
        return Ok(false);
    };
    let questions = session.resume(saved)?;
    writeln!(out, "Resuming the last quiz ({questions} questions).")?;
    Ok(true)
}

async fn generate_new(
    services: &AppServices,
    session: &mut QuizSession,
    category: Option<&str>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<bool, Box<dyn std::error::Error>> {
    let topics = match category {
        Some(title) => select_topics(&services.catalog(), &[], &[title.to_string()])?,
        None => match services.handoff().topic_results().await? {
            Some(results) => results.topics,
            None => {
                writeln!(out, "No topics selected yet. Run `study <topic>...` first.")?;
                return Ok(false);
            }
        },
    };

    let mut outcome = with_loading(session.generate(topics), out).await;
    loop {
        match outcome {
            Ok(GenerateOutcome::Generated { .. }) => break,
            Ok(GenerateOutcome::AlreadyRequested) => return Ok(false),
            Err(QuizSessionError::Api(_)) => {
                let Some(failure) = session.failure().cloned() else {
                    return Ok(false);
                };
                let vm = map_failure(&failure);
                writeln!(out, "{}", vm.message)?;
                if failure.action != RecoveryAction::Retry
                    || !confirm(&format!("{}? [y/N]", vm.action_label), input, out)?
                {
                    return Ok(false);
                }
                outcome = with_loading(session.retry_generate(), out).await;
            }
            Err(err) => return Err(err.into()),
        }
    }

    save_current_quiz(services, session).await;
    Ok(true)
}

/// Keep the quiz on screen in the `quizData` slot for `quiz --resume`.
async fn save_current_quiz(services: &AppServices, session: &QuizSession) {
    let current = QuizResponse {
        topics: session.topics().to_vec(),
        questions: session.questions().to_vec(),
    };
    if let Err(err) = services.handoff().save_quiz(&current).await {
        tracing::warn!(error = %err, "quiz not saved for resume");
    }
}

fn answer_questions(
    session: &mut QuizSession,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> CommandResult {
    while session.phase() == &QuizPhase::Ready {
        let vm = map_quiz(session);
        let Some(question) = vm
            .questions
            .iter()
            .find(|q| q.options.iter().all(|o| !o.selected))
        else {
            return Ok(());
        };

        writeln!(out)?;
        writeln!(out, "{} [{}]", question.heading, question.topic)?;
        writeln!(out, "{}", question.text)?;
        for (n, option) in question.options.iter().enumerate() {
            writeln!(out, "  {}) {}", n + 1, option.label)?;
        }
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "quiz abandoned").into());
        }
        match parse_choice(&line, question.options.len()) {
            Some(choice) => {
                let label = question.options[choice].label.clone();
                session.set_answer(question.index, label)?;
            }
            None => writeln!(out, "Enter a number from 1 to {}.", question.options.len())?,
        }
    }
    Ok(())
}

fn render_quiz(vm: &QuizVm, out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", vm.status_label)?;
    for question in &vm.questions {
        writeln!(out, "{}: {}", question.heading, question.text)?;
        for option in &question.options {
            let mark = match option.mark {
                Some(OptionMark::Correct) => "✓",
                Some(OptionMark::Incorrect) => "✗",
                None => " ",
            };
            let chosen = if option.selected { "*" } else { " " };
            writeln!(out, "  {mark}{chosen} {}", option.label)?;
        }
    }
    if let Some(score) = &vm.score_label {
        writeln!(out)?;
        writeln!(out, "Score: {score}")?;
    }
    for label in &vm.topic_score_labels {
        writeln!(out, "  {label}")?;
    }
    Ok(())
}

/// One-based option number typed by the user, as a zero-based index.
#[must_use]
pub fn parse_choice(input: &str, options: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=options).contains(&n) => Some(n - 1),
        _ => None,
    }
}

fn confirm(prompt: &str, input: &mut impl BufRead, out: &mut impl Write) -> io::Result<bool> {
    write!(out, "{prompt} ")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

pub fn catalog(catalog: &TopicCatalog, out: &mut impl Write) -> CommandResult {
    for category in catalog.categories() {
        match category.exam_weight() {
            Some(weight) => writeln!(out, "{} [{weight}% of exam]", category.name())?,
            None => writeln!(out, "{}", category.name())?,
        }
        writeln!(out, "  --category \"{}\"", category.title())?;
        for topic in category.topics() {
            writeln!(out, "    - {topic}")?;
        }
    }
    Ok(())
}

/// Await `work` while printing rotating loading messages to `out`.
async fn with_loading<F: Future>(work: F, out: &mut impl Write) -> F::Output {
    let ticker = LoadingTicker::start();
    let mut poll = tokio::time::interval(TICKER_POLL);
    let mut shown: Option<String> = None;
    tokio::pin!(work);

    loop {
        tokio::select! {
            output = &mut work => return output,
            _ = poll.tick() => {
                let current = ticker.current();
                if current != shown {
                    if let Some(message) = &current {
                        let _ = writeln!(out, "… {message}");
                    }
                    shown = current;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prep_core::Clock;
    use prep_core::model::{QuizQuestion, TopicResponse, UserIdentity};
    use prep_core::time::fixed_clock;
    use services::study_api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
    use services::{ApiError, ContentGenerator, QuizGenerator, QuizRechecker, StudyApiConfig};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use storage::repository::Storage;

    fn admin_api_quiz() -> QuizResponse {
        QuizResponse {
            topics: vec!["Admin API".into()],
            questions: vec![QuizQuestion {
                question: "Which style does the Admin API use?".into(),
                options: vec!["REST".into(), "SOAP".into()],
                correct_answer: "REST".into(),
                topic: "Admin API".into(),
            }],
        }
    }

    /// Study API fake that serves one quiz and counts generate calls.
    #[derive(Default)]
    struct CountingApi {
        generated: Mutex<usize>,
    }

    impl CountingApi {
        fn generated(&self) -> usize {
            *self.generated.lock().unwrap()
        }
    }

    #[async_trait]
    impl ContentGenerator for CountingApi {
        async fn generate_content(&self, _topics: &[String]) -> Result<TopicResponse, ApiError> {
            Err(ApiError::Network("offline".into()))
        }
    }

    #[async_trait]
    impl QuizGenerator for CountingApi {
        async fn generate_quiz(&self, _topics: &[String]) -> Result<QuizResponse, ApiError> {
            *self.generated.lock().unwrap() += 1;
            Ok(admin_api_quiz())
        }
    }

    #[async_trait]
    impl QuizRechecker for CountingApi {
        async fn recheck_quiz(
            &self,
            _quiz: &QuizResponse,
            _answers: &BTreeMap<usize, String>,
        ) -> Result<QuizResponse, ApiError> {
            Err(ApiError::Timeout)
        }
    }

    fn app_services(api: &Arc<CountingApi>, storage: Storage, clock: Clock) -> AppServices {
        AppServices::from_parts(
            storage,
            api.clone(),
            api.clone(),
            api.clone(),
            StudyApiConfig::new(DEFAULT_BASE_URL, DEFAULT_TIMEOUT).unwrap(),
            UserIdentity::new("me@example.com").unwrap(),
            clock,
        )
    }

    #[tokio::test]
    async fn resume_answers_the_saved_quiz_without_generating() {
        let api = Arc::new(CountingApi::default());
        let storage = Storage::in_memory();
        let services = app_services(&api, storage.clone(), fixed_clock());
        services.handoff().save_quiz(&admin_api_quiz()).await.unwrap();

        let mut out = Vec::new();
        quiz(&services, None, true, &mut "1\nn\n".as_bytes(), &mut out)
            .await
            .unwrap();

        assert_eq!(api.generated(), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Resuming the last quiz (1 questions)."));
        assert!(text.contains("Score: 1/1 correct (100%)"));
        let stored = storage.attempts.list_attempts(services.user()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].topic(), "Admin API");
    }

    #[tokio::test]
    async fn resume_without_saved_quiz_says_so() {
        let api = Arc::new(CountingApi::default());
        let services = app_services(&api, Storage::in_memory(), fixed_clock());

        let mut out = Vec::new();
        quiz(&services, None, true, &mut "".as_bytes(), &mut out)
            .await
            .unwrap();

        assert_eq!(api.generated(), 0);
        assert!(String::from_utf8(out).unwrap().contains("No saved quiz yet."));
    }

    #[tokio::test]
    async fn generated_quiz_is_saved_for_resume() {
        let api = Arc::new(CountingApi::default());
        let services = app_services(&api, Storage::in_memory(), fixed_clock());

        let mut out = Vec::new();
        quiz(
            &services,
            Some("Sitecore APIs & Webhooks (10%)"),
            false,
            &mut "2\nn\n".as_bytes(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(api.generated(), 1);
        assert_eq!(services.handoff().quiz().await.unwrap(), Some(admin_api_quiz()));
        assert!(String::from_utf8(out).unwrap().contains("Score: 0/1 correct (0%)"));
    }

    #[tokio::test]
    async fn dashboard_suggests_practising_the_weakest_category() {
        let api = Arc::new(CountingApi::default());
        let storage = Storage::in_memory();
        let services = app_services(&api, storage.clone(), fixed_clock());
        services.handoff().save_quiz(&admin_api_quiz()).await.unwrap();
        quiz(&services, None, true, &mut "2\nn\n".as_bytes(), &mut Vec::new())
            .await
            .unwrap();

        let mut out = Vec::new();
        dashboard(&services, TimeFilter::All, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Next: Review your weakest topic: Admin API"));
        assert!(text.contains(
            "Practise all 4 topics of Sitecore APIs & Webhooks: \
             quiz --category \"Sitecore APIs & Webhooks (10%)\""
        ));
    }

    #[test]
    fn parse_choice_is_one_based_and_bounded() {
        assert_eq!(parse_choice("1\n", 3), Some(0));
        assert_eq!(parse_choice(" 3 ", 3), Some(2));
        assert_eq!(parse_choice("0", 3), None);
        assert_eq!(parse_choice("4", 3), None);
        assert_eq!(parse_choice("b", 3), None);
    }

    #[test]
    fn select_topics_expands_categories_without_duplicates() {
        let catalog = TopicCatalog::xm_cloud();
        let title = "Sitecore APIs & Webhooks (10%)".to_string();
        let topics = select_topics(&catalog, &["Admin API".into()], &[title]).unwrap();
        assert_eq!(topics.len(), 4);
        assert_eq!(topics.iter().filter(|t| *t == "Admin API").count(), 1);
    }

    #[test]
    fn select_topics_rejects_unknown_and_empty() {
        let catalog = TopicCatalog::xm_cloud();
        assert!(matches!(
            select_topics(&catalog, &[], &["Nope".into()]),
            Err(SelectionError::UnknownCategory(_))
        ));
        let err = select_topics(&catalog, &[], &[]).unwrap_err();
        assert_eq!(err.to_string(), "Please select at least one topic");
    }

    #[test]
    fn confirm_accepts_yes_only() {
        let mut out = Vec::new();
        assert!(confirm("?", &mut "y\n".as_bytes(), &mut out).unwrap());
        assert!(!confirm("?", &mut "\n".as_bytes(), &mut out).unwrap());
        assert!(!confirm("?", &mut "".as_bytes(), &mut out).unwrap());
    }

    #[test]
    fn catalog_lists_weights_and_topics() {
        let mut out = Vec::new();
        catalog(&TopicCatalog::xm_cloud(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Data Modeling [14% of exam]"));
        assert!(text.contains("--category \"Data Modeling (14%)\""));
        assert!(text.contains("    - Configuring fields"));
    }

    #[tokio::test(start_paused = true)]
    async fn with_loading_returns_work_output() {
        let mut out = Vec::new();
        let value = with_loading(
            async {
                tokio::time::sleep(Duration::from_secs(4)).await;
                7
            },
            &mut out,
        )
        .await;
        assert_eq!(value, 7);
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().count() >= 2);
    }
}
