pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{bitbucket::BitbucketClient, google_calendar::GoogleCalendarClient, jira::JiraClient};
pub use config::{RawSettings, ReportConfig};
pub use core::{assembler::ReportAssembler, engine::ReportEngine, formatter::OutputFormat};
pub use domain::model::Report;
pub use utils::error::{ReportError, Result};
