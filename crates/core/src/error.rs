use thiserror::Error;

use crate::catalog::CatalogError;
use crate::model::{AttemptError, QuestionError, QuizError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
