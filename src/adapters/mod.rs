// Adapters layer: concrete clients for the external services behind the domain ports.

pub mod bitbucket;
pub mod google_calendar;
pub mod http;
pub mod jira;
