#![forbid(unsafe_code)]

pub mod analytics;
pub mod catalog;
pub mod error;
pub mod model;
pub mod percent;
pub mod time;

pub use analytics::{AttemptAnalytics, DashboardMetrics, Recommendation, TimeFilter, TopicProgress};
pub use catalog::{Category, TopicCatalog};
pub use error::Error;
pub use time::Clock;
