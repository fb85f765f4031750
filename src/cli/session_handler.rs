use crate::api::client::ReanaClient;
use crate::cli::main_types::OpenArgs;
use crate::display::{Severity, display_line, display_message};
use crate::error::AppError;
use crate::storage::config::Session;
use crate::utils::text::format_session_uri;
use crate::utils::validation::validate_choice;
use std::io::Write;

const SESSION_TYPES: &[&str] = &["jupyter"];

/// Handler for interactive sessions
pub struct SessionHandler;

impl SessionHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle_open<W: Write>(
        &self,
        session: &Session,
        args: &OpenArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        validate_choice(&args.session_type, SESSION_TYPES, "interactive session type")?;

        let client = ReanaClient::from_session(session)?;
        let opened = client
            .open_session(&session.workflow, &args.session_type, args.image.as_deref())
            .await?;

        display_message(out, "Interactive session opened successfully", Severity::Success, false)?;
        display_line(
            out,
            &format_session_uri(&session.server_url, &opened.path, &session.access_token),
        )?;
        display_message(
            out,
            "It could take several minutes to start the interactive session.",
            Severity::Info,
            true,
        )?;
        Ok(())
    }

    pub async fn handle_close<W: Write>(&self, session: &Session, out: &mut W) -> Result<(), AppError> {
        let client = ReanaClient::from_session(session)?;
        client.close_session(&session.workflow).await?;
        display_message(
            out,
            &format!(
                "Interactive session for workflow {} was successfully closed",
                session.workflow
            ),
            Severity::Success,
            false,
        )?;
        Ok(())
    }
}

impl Default for SessionHandler {
    fn default() -> Self {
        Self::new()
    }
}
