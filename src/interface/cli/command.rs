//! CLI 명령 파싱 모듈.

use clap::{Parser, Subcommand};

use crate::domain::review::RunOptions;

#[derive(Debug, Parser)]
#[command(name = "mergemate")]
#[command(about = "AI code review for GitLab merge requests")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Merge request URL
    url: Option<String>,

    /// Print the review to stdout, do not post
    #[arg(long)]
    dry_run: bool,

    /// Abort remaining chunk reviews after this many seconds
    #[arg(long)]
    deadline_secs: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show effective merged config with secret sources masked
    Config,
}

pub enum CliAction {
    InspectConfig,
    Review(RunOptions),
}

impl Cli {
    pub fn parse_action() -> Result<CliAction, String> {
        let cli = Cli::parse();

        match cli.command {
            Some(Commands::Config) => Ok(CliAction::InspectConfig),
            None => {
                let Some(url) = cli.url else {
                    return Err("a merge request URL is required (see --help)".to_string());
                };

                Ok(CliAction::Review(RunOptions {
                    url,
                    dry_run: cli.dry_run,
                    deadline_secs: cli.deadline_secs,
                }))
            }
        }
    }
}
