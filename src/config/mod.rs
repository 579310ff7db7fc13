#[cfg(feature = "cli")]
pub mod cli;
pub mod file;
pub mod settings;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use file::FileConfig;
pub use settings::{CalendarConfig, RawSettings, ReportConfig};
