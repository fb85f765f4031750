use crate::cli::main_types::{Cli, Commands, WorkflowFlag};
use crate::cli::secrets_handler::SecretsHandler;
use crate::cli::server_handler::ServerHandler;
use crate::cli::session_handler::SessionHandler;
use crate::cli::workflow_handler::WorkflowHandler;
use crate::cli::workspace_handler::WorkspaceHandler;
use crate::core::workflow::FollowParams;
use crate::error::{AppError, CliError, translate};
use crate::storage::config::{ACCESS_TOKEN_KEY, Config, Session, WORKFLOW_KEY};
use crate::utils::logging::init_logging;
use crate::utils::validation::{validate_access_token, validate_server_url, validate_workflow};
use clap::parser::ValueSource;
use clap::{ArgMatches, FromArgMatches};
use std::io::Write;
use std::time::Duration;

/// Routes a parsed command line to its handler.
///
/// Owns the configuration snapshot and the follow parameters; every
/// invocation resolves its own [`Session`] from them.
pub struct Dispatcher {
    config: Config,
    follow: FollowParams,
}

impl Dispatcher {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            follow: FollowParams::default(),
        }
    }

    /// Override the `start --follow` poll interval.
    pub fn with_check_interval(mut self, check_interval: Duration) -> Self {
        self.follow.check_interval = check_interval;
        self
    }

    pub async fn dispatch<W: Write>(&self, matches: &ArgMatches, out: &mut W) -> Result<(), AppError> {
        let cli = Cli::from_arg_matches(matches)
            .map_err(|e| CliError::InvalidArguments(e.to_string()))?;
        init_logging(cli.loglevel);

        let session = self.build_session(&cli.command)?;
        log_explicit_flags(matches);
        tracing::debug!(
            "server: {}, workflow: {}",
            session.server_url,
            if session.workflow.is_empty() { "-" } else { session.workflow.as_str() }
        );

        self.run(&cli.command, &session, out)
            .await
            .map_err(|e| translate(e, &session.server_url))
    }

    /// Resolve flags against the configuration and validate them before any
    /// API call.
    fn build_session(&self, command: &Commands) -> Result<Session, AppError> {
        let mut session = Session {
            server_url: self.config.server_url().to_string(),
            tls_skip_verify: self.config.tls_skip_verify(),
            ..Session::default()
        };

        if let Some(flag) = command.access_token_flag() {
            let access_token = self.config.resolve(ACCESS_TOKEN_KEY, flag);
            validate_access_token(&access_token)?;
            validate_server_url(&session.server_url)?;
            session.access_token = access_token;
        }

        match command.workflow_flag() {
            WorkflowFlag::Required(flag) => {
                let workflow = self.config.resolve(WORKFLOW_KEY, flag);
                validate_workflow(&workflow)?;
                session.workflow = workflow;
            }
            WorkflowFlag::Optional(flag) => {
                session.workflow = self.config.resolve(WORKFLOW_KEY, flag);
            }
            WorkflowFlag::Absent => {}
        }

        Ok(session)
    }

    async fn run<W: Write>(
        &self,
        command: &Commands,
        session: &Session,
        out: &mut W,
    ) -> Result<(), AppError> {
        let server = ServerHandler::new();
        let workflows = WorkflowHandler::new(self.follow.clone());
        let workspace = WorkspaceHandler::new();
        let sessions = SessionHandler::new();
        let secrets = SecretsHandler::new();

        match command {
            Commands::Ping(_) => server.handle_ping(session, out).await,
            Commands::Info(args) => server.handle_info(session, args, out).await,
            Commands::QuotaShow(args) => server.handle_quota_show(session, args, out).await,
            Commands::Version => server.handle_version(out),
            Commands::List(args) => workflows.handle_list(session, args, out).await,
            Commands::Status(args) => workflows.handle_status(session, args, out).await,
            Commands::Logs(args) => workflows.handle_logs(session, args, out).await,
            Commands::Diff(args) => workflows.handle_diff(session, args, out).await,
            Commands::Start(args) => workflows.handle_start(session, args, out).await,
            Commands::Delete(args) => workflows.handle_delete(session, args, out).await,
            Commands::Du(args) => workspace.handle_du(session, args, out).await,
            Commands::Ls(args) => workspace.handle_ls(session, args, out).await,
            Commands::Rm(args) => workspace.handle_rm(session, args, out).await,
            Commands::Mv(args) => workspace.handle_mv(session, args, out).await,
            Commands::Open(args) => sessions.handle_open(session, args, out).await,
            Commands::Close(_) => sessions.handle_close(session, out).await,
            Commands::SecretsAdd(args) => secrets.handle_add(session, args, out).await,
            Commands::SecretsList(args) => secrets.handle_list(session, args, out).await,
            Commands::SecretsDelete(args) => secrets.handle_delete(session, args, out).await,
        }
    }
}

/// Log every flag given on the command line, at DEBUG.
fn log_explicit_flags(matches: &ArgMatches) {
    let Some((name, sub_matches)) = matches.subcommand() else {
        return;
    };
    tracing::debug!("command: {}", name);
    for id in sub_matches.ids() {
        if sub_matches.value_source(id.as_str()) != Some(ValueSource::CommandLine) {
            continue;
        }
        let values: Vec<String> = match sub_matches.try_get_raw(id.as_str()) {
            Ok(Some(raw)) => raw.map(|value| value.to_string_lossy().into_owned()).collect(),
            _ => Vec::new(),
        };
        tracing::debug!("flag {} set to {:?}", id, values);
    }
}
