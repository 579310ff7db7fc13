pub mod assembler;
pub mod engine;
pub mod formatter;
pub mod queries;

pub use crate::domain::model::Report;
pub use crate::domain::ports::{CalendarSource, IssueSource, ReviewSource};
pub use crate::utils::error::Result;
