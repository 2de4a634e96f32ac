use std::fmt::Display;
use std::path::PathBuf;

use anyhow::{
    Context,
    Result,
};
use buildlens_core::{
    BuildLensService,
    ConfigLoader,
};
use clap::{
    Args,
    Parser,
    Subcommand,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "buildlens")]
#[command(author, version, about = "Jenkins console log analysis", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file; defaults to BUILDLENS_CONFIG_PATH or the discovered buildlens.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Debug logging (RUST_LOG still wins when set)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Args)]
struct Target {
    /// Full job URL or job path such as `Folder/my-job`
    target: String,

    /// Build number or alias (lastBuild, lastSuccessfulBuild, lastFailedBuild, lastCompletedBuild)
    #[arg(short, long)]
    build: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full console log of a build
    Log(Target),

    /// Extract error context from a build's console log
    Analyze {
        #[command(flatten)]
        target: Target,

        /// Lines of context around each error line
        #[arg(long)]
        context_lines: Option<usize>,
    },

    /// Show normalized build metadata
    Info(Target),

    /// List git repositories, branches and commits checked out by a build
    GitRefs(Target),

    /// List configured Jenkins instances
    Instances,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let settings = ConfigLoader::load_settings(self.config.as_deref())
            .context("Failed to load configuration")?;
        let service = BuildLensService::from_settings(settings);

        match &self.command {
            Commands::Log(target) => {
                let report = service
                    .console_log(&target.target, target.build.as_deref())
                    .await
                    .with_context(|| format!("Failed to fetch console log for {}", target.target))?;
                self.emit(&report)
            }
            Commands::Analyze {
                target,
                context_lines,
            } => {
                let report = service
                    .analyze_errors(&target.target, target.build.as_deref(), *context_lines)
                    .await
                    .with_context(|| format!("Failed to analyze build log for {}", target.target))?;
                self.emit(&report)
            }
            Commands::Info(target) => {
                let report = service
                    .build_info(&target.target, target.build.as_deref())
                    .await
                    .with_context(|| format!("Failed to fetch build info for {}", target.target))?;
                self.emit(&report)
            }
            Commands::GitRefs(target) => {
                let report = service
                    .git_references(&target.target, target.build.as_deref())
                    .await
                    .with_context(|| {
                        format!("Failed to extract git references for {}", target.target)
                    })?;
                self.emit(&report)
            }
            Commands::Instances => self.emit(&service.instances()),
        }
    }

    fn emit<T: Serialize + Display>(&self, report: &T) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(report)?);
        } else {
            println!("{report}");
        }
        tracing::debug!(json = self.json, "report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "buildlens",
            "--json",
            "analyze",
            "https://ci.example.com/job/app/12",
            "--build",
            "lastFailedBuild",
            "--context-lines",
            "5",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Analyze {
                target,
                context_lines,
            } => {
                assert_eq!(target.target, "https://ci.example.com/job/app/12");
                assert_eq!(target.build.as_deref(), Some("lastFailedBuild"));
                assert_eq!(context_lines, Some(5));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_parse_git_refs_with_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["buildlens", "git-refs", "Folder/app", "-v", "-c", "x.toml"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Commands::GitRefs(_)));
    }
}
