use crate::utils::logging::LogLevel;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "reana-client")]
#[command(about = "Command line interface for interacting with a REANA cluster")]
#[command(version)]
pub struct Cli {
    /// Sets the log level
    #[arg(short = 'l', long, global = true, value_enum, default_value_t = LogLevel::Warning)]
    pub loglevel: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TokenArgs {
    /// Access token of the current user
    #[arg(short = 't', long = "access-token")]
    pub access_token: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct WorkflowArgs {
    /// Name or UUID of the workflow, defaults to $REANA_WORKON
    #[arg(short = 'w', long)]
    pub workflow: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PageArgs {
    /// Results page number (to be used with --size)
    #[arg(long)]
    pub page: Option<u32>,
    /// Size of results per page (to be used with --page)
    #[arg(long)]
    pub size: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check connection to the REANA server
    Ping(PingArgs),
    /// List cluster general information
    Info(InfoArgs),
    /// List all workflows and sessions
    #[command(disable_help_flag = true)]
    List(ListArgs),
    /// Get workspace disk usage
    #[command(disable_help_flag = true)]
    Du(DuArgs),
    /// Get workflow logs
    Logs(LogsArgs),
    /// Get status of a workflow
    Status(StatusArgs),
    /// List workspace files
    #[command(disable_help_flag = true)]
    Ls(LsArgs),
    /// Show differences between two workflows
    Diff(DiffArgs),
    /// Show user quota
    #[command(name = "quota-show")]
    #[command(disable_help_flag = true)]
    QuotaShow(QuotaShowArgs),
    /// Open an interactive session inside the workspace
    Open(OpenArgs),
    /// Close an interactive session
    Close(CloseArgs),
    /// Start a workflow
    Start(StartArgs),
    /// Delete a workflow
    Delete(DeleteArgs),
    /// Delete files from a workspace
    Rm(RmArgs),
    /// Move files within a workspace
    Mv(MvArgs),
    /// Add secrets from literal strings or from files
    #[command(name = "secrets-add")]
    SecretsAdd(SecretsAddArgs),
    /// List user secrets
    #[command(name = "secrets-list")]
    SecretsList(SecretsListArgs),
    /// Delete user secrets by name
    #[command(name = "secrets-delete")]
    SecretsDelete(SecretsDeleteArgs),
    /// Show the client version
    Version,
}

/// How a command declares the workflow flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowFlag<'a> {
    Absent,
    Required(Option<&'a str>),
    Optional(Option<&'a str>),
}

impl Commands {
    /// The `--access-token` value, or `None` when the command has no token flag.
    pub fn access_token_flag(&self) -> Option<Option<&str>> {
        let token = match self {
            Commands::Ping(args) => &args.token,
            Commands::Info(args) => &args.token,
            Commands::List(args) => &args.token,
            Commands::Du(args) => &args.token,
            Commands::Logs(args) => &args.token,
            Commands::Status(args) => &args.token,
            Commands::Ls(args) => &args.token,
            Commands::Diff(args) => &args.token,
            Commands::QuotaShow(args) => &args.token,
            Commands::Open(args) => &args.token,
            Commands::Close(args) => &args.token,
            Commands::Start(args) => &args.token,
            Commands::Delete(args) => &args.token,
            Commands::Rm(args) => &args.token,
            Commands::Mv(args) => &args.token,
            Commands::SecretsAdd(args) => &args.token,
            Commands::SecretsList(args) => &args.token,
            Commands::SecretsDelete(args) => &args.token,
            Commands::Version => return None,
        };
        Some(token.access_token.as_deref())
    }

    pub fn workflow_flag(&self) -> WorkflowFlag<'_> {
        match self {
            Commands::List(args) => WorkflowFlag::Optional(args.workflow.workflow.as_deref()),
            Commands::Du(args) => WorkflowFlag::Required(args.workflow.workflow.as_deref()),
            Commands::Logs(args) => WorkflowFlag::Required(args.workflow.workflow.as_deref()),
            Commands::Status(args) => WorkflowFlag::Required(args.workflow.workflow.as_deref()),
            Commands::Ls(args) => WorkflowFlag::Required(args.workflow.workflow.as_deref()),
            Commands::Open(args) => WorkflowFlag::Required(args.workflow.workflow.as_deref()),
            Commands::Close(args) => WorkflowFlag::Required(args.workflow.workflow.as_deref()),
            Commands::Start(args) => WorkflowFlag::Required(args.workflow.workflow.as_deref()),
            Commands::Delete(args) => WorkflowFlag::Required(args.workflow.workflow.as_deref()),
            Commands::Rm(args) => WorkflowFlag::Required(args.workflow.workflow.as_deref()),
            Commands::Mv(args) => WorkflowFlag::Required(args.workflow.workflow.as_deref()),
            _ => WorkflowFlag::Absent,
        }
    }
}

#[derive(Args, Debug)]
pub struct PingArgs {
    #[command(flatten)]
    pub token: TokenArgs,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    /// Get output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct ListArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    #[command(flatten)]
    pub workflow: WorkflowArgs,
    /// List only interactive sessions
    #[arg(long)]
    pub sessions: bool,
    /// Filter output by a column, e.g. --format name,status
    #[arg(long, value_delimiter = ',')]
    pub format: Vec<String>,
    /// Get output in JSON format
    #[arg(long)]
    pub json: bool,
    /// Show more details
    #[arg(short = 'v', long)]
    pub verbose: bool,
    /// Show human-readable sizes
    #[arg(short = 'h', long = "human-readable")]
    pub human_readable: bool,
    /// Sort the output by the given column
    #[arg(long, default_value = "created")]
    pub sort: String,
    /// Filter workflows, e.g. --filter status=running
    #[arg(long)]
    pub filter: Vec<String>,
    /// Include workflow progress
    #[arg(long)]
    pub include_progress: bool,
    /// Include workflow duration
    #[arg(long)]
    pub include_duration: bool,
    /// Include workspace size
    #[arg(long)]
    pub include_workspace_size: bool,
    /// Include deleted runs
    #[arg(long)]
    pub show_deleted_runs: bool,
    #[command(flatten)]
    pub page: PageArgs,
    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct DuArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    #[command(flatten)]
    pub workflow: WorkflowArgs,
    /// Display total disk usage only
    #[arg(short = 's', long)]
    pub summarize: bool,
    /// Show human-readable sizes
    #[arg(short = 'h', long = "human-readable")]
    pub human_readable: bool,
    /// Filter by name or size, e.g. --filter name=data.txt
    #[arg(long)]
    pub filter: Vec<String>,
    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

#[derive(Args, Debug)]
pub struct LogsArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    #[command(flatten)]
    pub workflow: WorkflowArgs,
    /// Get output in JSON format
    #[arg(long)]
    pub json: bool,
    /// Filter job logs, e.g. --filter status=finished
    #[arg(long)]
    pub filter: Vec<String>,
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    #[command(flatten)]
    pub workflow: WorkflowArgs,
    /// Filter output by a column, e.g. --format name,status
    #[arg(long, value_delimiter = ',')]
    pub format: Vec<String>,
    /// Get output in JSON format
    #[arg(long)]
    pub json: bool,
    /// Show more details
    #[arg(short = 'v', long)]
    pub verbose: bool,
    /// Include workflow duration
    #[arg(long)]
    pub include_duration: bool,
}

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct LsArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    #[command(flatten)]
    pub workflow: WorkflowArgs,
    /// File name or glob pattern to list
    pub filename: Option<String>,
    /// Filter output by a column, e.g. --format name,size
    #[arg(long, value_delimiter = ',')]
    pub format: Vec<String>,
    /// Get output in JSON format
    #[arg(long)]
    pub json: bool,
    /// Print file URLs instead of a table
    #[arg(long)]
    pub url: bool,
    /// Show human-readable sizes
    #[arg(short = 'h', long = "human-readable")]
    pub human_readable: bool,
    /// Sort the output by the given column
    #[arg(long, default_value = "last-modified")]
    pub sort: String,
    /// Filter files, e.g. --filter name=data.txt
    #[arg(long)]
    pub filter: Vec<String>,
    #[command(flatten)]
    pub page: PageArgs,
    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    /// First workflow
    pub workflow_a: String,
    /// Second workflow
    pub workflow_b: String,
    /// Show only whether the workflows differ
    #[arg(long)]
    pub brief: bool,
    /// Number of context lines around each difference
    #[arg(short = 'u', long = "unified", default_value_t = 5)]
    pub context_lines: u32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaReport {
    Limit,
    Usage,
}

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct QuotaShowArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    /// Resource to report on, e.g. cpu or disk
    #[arg(long)]
    pub resource: Option<String>,
    /// List the available resources
    #[arg(long)]
    pub resources: bool,
    /// Report only the limit or the usage
    #[arg(long, value_enum)]
    pub report: Option<QuotaReport>,
    /// Show human-readable values
    #[arg(short = 'h', long = "human-readable")]
    pub human_readable: bool,
    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    #[command(flatten)]
    pub workflow: WorkflowArgs,
    /// Interactive session type
    #[arg(default_value = "jupyter")]
    pub session_type: String,
    /// Docker image for the session
    #[arg(short = 'i', long)]
    pub image: Option<String>,
}

#[derive(Args, Debug)]
pub struct CloseArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    #[command(flatten)]
    pub workflow: WorkflowArgs,
}

#[derive(Args, Debug)]
pub struct StartArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    #[command(flatten)]
    pub workflow: WorkflowArgs,
    /// Input parameter, e.g. -p events=10
    #[arg(short = 'p', long = "parameter")]
    pub parameters: Vec<String>,
    /// Operational option, e.g. -o CACHE=off
    #[arg(short = 'o', long = "option")]
    pub options: Vec<String>,
    /// Follow the workflow until it finishes
    #[arg(long)]
    pub follow: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    #[command(flatten)]
    pub workflow: WorkflowArgs,
    /// Delete all runs of the workflow
    #[arg(long)]
    pub include_all_runs: bool,
    /// Delete the workspace as well
    #[arg(long)]
    pub include_workspace: bool,
}

#[derive(Args, Debug)]
pub struct RmArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    #[command(flatten)]
    pub workflow: WorkflowArgs,
    /// File names or glob patterns
    #[arg(required = true)]
    pub patterns: Vec<String>,
}

#[derive(Args, Debug)]
pub struct MvArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    #[command(flatten)]
    pub workflow: WorkflowArgs,
    pub source: String,
    pub target: String,
}

#[derive(Args, Debug)]
pub struct SecretsAddArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    /// Literal secret, e.g. --env PASSWORD=secret
    #[arg(long)]
    pub env: Vec<String>,
    /// File secret, stored under the file's base name
    #[arg(long)]
    pub file: Vec<String>,
    /// Replace secrets that already exist
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Args, Debug)]
pub struct SecretsListArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    /// Get output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SecretsDeleteArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    /// Secret names
    #[arg(required = true)]
    pub names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("valid arguments")
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_loglevel_default_and_value() {
        assert_eq!(parse(&["reana-client", "version"]).loglevel, LogLevel::Warning);
        let cli = parse(&["reana-client", "-l", "DEBUG", "ping"]);
        assert_eq!(cli.loglevel, LogLevel::Debug);
        assert!(Cli::try_parse_from(["reana-client", "-l", "TRACE", "ping"]).is_err());
    }

    #[test]
    fn test_human_readable_short_flag() {
        let cli = parse(&["reana-client", "du", "-w", "wf", "-h"]);
        match cli.command {
            Commands::Du(args) => {
                assert!(args.human_readable);
                assert_eq!(args.workflow.workflow.as_deref(), Some("wf"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_access_token_flag() {
        let cli = parse(&["reana-client", "ping", "-t", "1234"]);
        assert_eq!(cli.command.access_token_flag(), Some(Some("1234")));
        let cli = parse(&["reana-client", "secrets-list"]);
        assert_eq!(cli.command.access_token_flag(), Some(None));
        assert_eq!(parse(&["reana-client", "version"]).command.access_token_flag(), None);
    }

    #[test]
    fn test_workflow_flag() {
        let cli = parse(&["reana-client", "list"]);
        assert_eq!(cli.command.workflow_flag(), WorkflowFlag::Optional(None));
        let cli = parse(&["reana-client", "status", "-w", "wf.2"]);
        assert_eq!(cli.command.workflow_flag(), WorkflowFlag::Required(Some("wf.2")));
        let cli = parse(&["reana-client", "secrets-delete", "a"]);
        assert_eq!(cli.command.workflow_flag(), WorkflowFlag::Absent);
    }

    #[test]
    fn test_format_is_comma_separated() {
        let cli = parse(&["reana-client", "list", "--format", "name,status=running"]);
        match cli.command {
            Commands::List(args) => assert_eq!(args.format, vec!["name", "status=running"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_repeated_filters_and_parameters() {
        let cli = parse(&[
            "reana-client",
            "start",
            "-w",
            "wf",
            "-p",
            "a=1",
            "-p",
            "b=2",
            "-o",
            "CACHE=off",
            "--follow",
        ]);
        match cli.command {
            Commands::Start(args) => {
                assert_eq!(args.parameters, vec!["a=1", "b=2"]);
                assert_eq!(args.options, vec!["CACHE=off"]);
                assert!(args.follow);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_quota_report_values() {
        let cli = parse(&["reana-client", "quota-show", "--resource", "cpu", "--report", "limit", "-h"]);
        match cli.command {
            Commands::QuotaShow(args) => {
                assert_eq!(args.report, Some(QuotaReport::Limit));
                assert!(args.human_readable);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(
            Cli::try_parse_from(["reana-client", "quota-show", "--report", "total"]).is_err()
        );
    }
}
