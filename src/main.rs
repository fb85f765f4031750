use clap::CommandFactory;
use reana_client::cli::dispatcher::Dispatcher;
use reana_client::cli::main_types::Cli;
use reana_client::display::{Severity, display_message};
use reana_client::storage::config::Config;
use std::io;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Color only when stdout is a terminal
    crossterm::style::force_color_output(atty::is(atty::Stream::Stdout));

    let matches = Cli::command().get_matches();
    let dispatcher = Dispatcher::new(Config::from_env());

    let mut stdout = io::stdout();
    match dispatcher.dispatch(&matches, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !e.is_empty() {
                let mut stderr = io::stderr();
                let _ = display_message(&mut stderr, &e.to_string(), Severity::Error, false);
                if let Some(hint) = e.troubleshooting_hint() {
                    let _ = display_message(&mut stderr, &hint, Severity::Info, true);
                }
            }
            ExitCode::FAILURE
        }
    }
}
