use std::sync::Arc;

use prep_core::TopicCatalog;
use prep_core::model::UserIdentity;
use storage::repository::Storage;

use crate::Clock;
use crate::content_service::ContentService;
use crate::dashboard_service::DashboardService;
use crate::error::AppServicesError;
use crate::handoff::SessionHandoff;
use crate::quiz::QuizSession;
use crate::study_api::{QuizGenerator, QuizRechecker, StudyApiClient, StudyApiConfig};

/// Assembles app-facing services for one configured user.
#[derive(Clone)]
pub struct AppServices {
    user: UserIdentity,
    storage: Storage,
    catalog: Arc<TopicCatalog>,
    content: Arc<ContentService>,
    dashboard: Arc<DashboardService>,
    handoff: SessionHandoff,
    generator: Arc<dyn QuizGenerator>,
    rechecker: Arc<dyn QuizRechecker>,
    timeout: std::time::Duration,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP study API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        api: StudyApiConfig,
        user: UserIdentity,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let client = Arc::new(StudyApiClient::new(api.clone()));
        Ok(Self::from_parts(
            storage,
            client.clone(),
            client.clone(),
            client,
            api,
            user,
            clock,
        ))
    }

    /// Wire services over explicit collaborators.
    #[must_use]
    pub fn from_parts(
        storage: Storage,
        content: Arc<dyn crate::study_api::ContentGenerator>,
        generator: Arc<dyn QuizGenerator>,
        rechecker: Arc<dyn QuizRechecker>,
        api: StudyApiConfig,
        user: UserIdentity,
        clock: Clock,
    ) -> Self {
        let catalog = Arc::new(TopicCatalog::xm_cloud());
        let content = Arc::new(ContentService::new(content).with_timeout(api.timeout));
        let dashboard = Arc::new(DashboardService::new(
            clock,
            Arc::clone(&storage.attempts),
            catalog.as_ref().clone(),
        ));
        let handoff = SessionHandoff::new(Arc::clone(&storage.handoff));

        Self {
            user,
            storage,
            catalog,
            content,
            dashboard,
            handoff,
            generator,
            rechecker,
            timeout: api.timeout,
        }
    }

    #[must_use]
    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<TopicCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn content(&self) -> Arc<ContentService> {
        Arc::clone(&self.content)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn handoff(&self) -> &SessionHandoff {
        &self.handoff
    }

    /// A fresh quiz session for the configured user.
    #[must_use]
    pub fn quiz_session(&self) -> QuizSession {
        QuizSession::new(
            self.user.clone(),
            Arc::clone(&self.generator),
            Arc::clone(&self.rechecker),
            Arc::clone(&self.storage.attempts),
        )
        .with_timeout(self.timeout)
    }
}
