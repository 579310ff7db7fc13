use crate::core::assembler::ReportAssembler;
use crate::core::formatter::{render, OutputFormat};
use crate::domain::ports::{CalendarSource, IssueSource, ReviewSource};
use crate::utils::error::Result;
use chrono::{DateTime, Local};

pub struct ReportEngine<I, R, C> {
    assembler: ReportAssembler<I, R, C>,
    format: OutputFormat,
}

impl<I: IssueSource, R: ReviewSource, C: CalendarSource> ReportEngine<I, R, C> {
    pub fn new(assembler: ReportAssembler<I, R, C>, format: OutputFormat) -> Self {
        Self { assembler, format }
    }

    pub async fn run(&self) -> Result<String> {
        self.run_at(Local::now()).await
    }

    pub async fn run_at(&self, now: DateTime<Local>) -> Result<String> {
        tracing::info!("Starting daily report");

        let report = self.assembler.build_report_at(now).await?;

        tracing::debug!("Rendering report as {:?}", self.format);
        render(&report, self.format)
    }
}
