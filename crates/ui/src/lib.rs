#![forbid(unsafe_code)]

pub mod loading;
pub mod vm;

pub use loading::{LoadingTicker, WITTY_MESSAGES};
