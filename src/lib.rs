pub use error::AppError;

/// Main architecture layers (dependency flow: CLI → Core → Storage)
pub mod cli; // Command-line interface
pub mod core; // Filters, tables and the workflow lifecycle
pub mod storage; // Configuration snapshot

/// Support modules (used across layers)
pub mod api; // REANA REST client
pub mod display; // Output formatting
pub mod error; // Error handling
pub mod utils; // Shared utilities and helpers

pub type Result<T> = std::result::Result<T, AppError>;
