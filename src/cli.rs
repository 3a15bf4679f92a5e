use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use crate::auth::BearerToken;
use crate::config::{AnalysisConfig, GroupBy};
use crate::render::{self, OutputFormat};
use crate::sources::http::AttendanceClient;
use crate::sources::{self, FileSource, HttpSource};

#[derive(Parser)]
#[command(name = "cohortlens")]
#[command(author, version, about = "Cohort retention for community engagement data", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Args)]
struct AnalysisArgs {
    /// Interval granularity used to bucket records
    #[arg(short, long, value_enum, default_value_t = GroupBy::Month)]
    group_by: GroupBy,

    /// Ignore records before this date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    since: Option<NaiveDate>,

    /// Ignore records after this date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    until: Option<NaiveDate>,
}

impl AnalysisArgs {
    fn to_config(&self) -> crate::error::Result<AnalysisConfig> {
        AnalysisConfig::new(self.group_by, self.since, self.until)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze records from a JSON file ("-" reads stdin)
    File {
        path: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Fetch records from the platform's REST API
    Fetch {
        /// Base URL of the admin API
        #[arg(short, long)]
        url: String,

        /// API token sent as a bearer token (optional)
        #[arg(short, long, env = "COHORTLENS_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Endpoint path relative to the base URL (repeatable)
        #[arg(short, long = "endpoint", required = true)]
        endpoints: Vec<String>,

        /// Rows requested per page
        #[arg(long, default_value_t = 100)]
        per_page: u32,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let report = match &self.command {
            Commands::File { path, analysis } => {
                let config = analysis.to_config()?;
                let source = FileSource::new(path.clone());
                sources::collect_report(&source, &config).await?
            }
            Commands::Fetch {
                url,
                token,
                endpoints,
                per_page,
                analysis,
            } => {
                let config = analysis.to_config()?;
                info!("Collecting attendance from {url}");

                let token = BearerToken::from_optional(token.as_deref());
                let client = AttendanceClient::new(url, token)?;
                let source = HttpSource::new(client, endpoints.clone(), *per_page)?;
                sources::collect_report(&source, &config).await?
            }
        };

        let rendered = render::render(&report, self.format, self.pretty)?;

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, rendered)?;
            info!("Report written to: {}", output_path.display());
        } else {
            println!("{rendered}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_file_command_with_window() {
        let cli = Cli::try_parse_from([
            "cohortlens",
            "--format",
            "markdown",
            "file",
            "records.json",
            "--group-by",
            "quarter",
            "--since",
            "2024-01-01",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Markdown);
        let Commands::File { path, analysis } = cli.command else {
            panic!("expected file command");
        };
        assert_eq!(path, PathBuf::from("records.json"));
        assert_eq!(analysis.group_by, GroupBy::Quarter);
        assert_eq!(analysis.since, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(analysis.until, None);
    }

    #[test]
    fn test_fetch_accepts_repeated_endpoints() {
        let cli = Cli::try_parse_from([
            "cohortlens",
            "fetch",
            "--url",
            "https://admin.example.com/api",
            "-e",
            "analytics/attendance",
            "-e",
            "analytics/events",
        ])
        .unwrap();

        let Commands::Fetch {
            endpoints,
            per_page,
            analysis,
            ..
        } = cli.command
        else {
            panic!("expected fetch command");
        };
        assert_eq!(endpoints, vec!["analytics/attendance", "analytics/events"]);
        assert_eq!(per_page, 100);
        assert_eq!(analysis.group_by, GroupBy::Month);
    }

    #[test]
    fn test_fetch_requires_an_endpoint() {
        let result = Cli::try_parse_from(["cohortlens", "fetch", "--url", "https://x.example"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_inverted_window_fails_config() {
        let args = AnalysisArgs {
            group_by: GroupBy::Day,
            since: NaiveDate::from_ymd_opt(2024, 5, 1),
            until: NaiveDate::from_ymd_opt(2024, 4, 1),
        };
        assert!(args.to_config().is_err());
    }
}
