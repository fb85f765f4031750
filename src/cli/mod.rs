pub mod dispatcher;
pub mod main_types;
pub mod secrets_handler;
pub mod server_handler;
pub mod session_handler;
pub mod workflow_handler;
pub mod workspace_handler;
