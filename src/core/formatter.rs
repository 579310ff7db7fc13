use crate::domain::model::Report;
use crate::utils::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    /// `text` 之外的任何值都輸出結構化 JSON
    pub fn from_flag(value: &str) -> Self {
        if value == "text" {
            OutputFormat::Text
        } else {
            OutputFormat::Json
        }
    }
}

pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => render_json(report),
    }
}

pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// 三個區塊依序輸出，來源全空的區塊整段省略
pub fn render_text(report: &Report) -> String {
    let mut text = String::new();

    let done: Vec<String> = report
        .my_tickets_done_yesterday
        .iter()
        .cloned()
        .chain(
            report
                .tickets_created_by_me_yesterday
                .iter()
                .map(|item| format!("Created {}", item)),
        )
        .chain(
            report
                .my_tickets_cancelled_yesterday
                .iter()
                .map(|item| format!("Cancelled {}", item)),
        )
        .collect();
    if !done.is_empty() {
        push_block(&mut text, "Done yesterday:", &done);
    }

    // 只有會議時不輸出「今日計畫」
    if !report.daily_routines.is_empty()
        || !report.my_tickets_in_progress.is_empty()
        || !report.reviewing_prs.is_empty()
    {
        let planned: Vec<String> = report
            .daily_routines
            .iter()
            .chain(report.my_tickets_in_progress.iter())
            .cloned()
            .chain(report.reviewing_prs.iter().map(|item| format!("Reviewing PR {}", item)))
            .chain(report.daily_meetings.iter().cloned())
            .collect();
        push_block(&mut text, "Planned today:", &planned);
    }

    if !report.blocked_tickets.is_empty() {
        push_block(&mut text, "Blocked tickets:", &report.blocked_tickets);
    }

    text
}

fn push_block(text: &mut String, header: &str, items: &[String]) {
    text.push_str(header);
    text.push('\n');
    for item in items {
        text.push_str("* ");
        text.push_str(item);
        text.push('\n');
    }
}
