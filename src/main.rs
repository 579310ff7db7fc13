use anyhow::Context;
use clap::Parser;
use daily_report::adapters::google_calendar::GoogleCalendarClient;
use daily_report::utils::logger;
use daily_report::{BitbucketClient, CliConfig, JiraClient, ReportAssembler, ReportEngine, ReportError};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI config: {:?}", cli);

    match run(&cli).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            let exit_code = match e.downcast_ref::<ReportError>() {
                Some(report_error) => {
                    tracing::error!(
                        "❌ Daily report failed: {:#} (Category: {:?})",
                        e,
                        report_error.category()
                    );
                    eprintln!("❌ {}", report_error.user_friendly_message());
                    eprintln!("💡 {}", report_error.recovery_suggestion());
                    report_error.exit_code()
                }
                None => {
                    tracing::error!("❌ Daily report failed: {:#}", e);
                    eprintln!("❌ {:#}", e);
                    1
                }
            };
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: &CliConfig) -> anyhow::Result<String> {
    let config = cli.resolve()?;

    let jira = JiraClient::new(config.jira.clone(), config.credentials.clone())
        .context("Failed to set up Jira client")?;
    let bitbucket = BitbucketClient::new(config.bitbucket.clone(), config.credentials.clone())
        .context("Failed to set up Bitbucket client")?;

    let mut assembler: ReportAssembler<_, _, GoogleCalendarClient> =
        ReportAssembler::new(jira, bitbucket, config.report_settings());
    if let Some(calendar) = &config.calendar {
        tracing::debug!(
            "Calendar credentials: {}, token: {}",
            calendar.credentials_path.display(),
            calendar.token_path.display()
        );
        assembler = assembler.with_calendar(GoogleCalendarClient::new(
            calendar.credentials_path.clone(),
            calendar.token_path.clone(),
        ));
    } else {
        tracing::info!("Google Calendar disabled, meetings will be empty");
    }

    let engine = ReportEngine::new(assembler, config.format);
    Ok(engine.run().await?)
}
