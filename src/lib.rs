pub mod cli;
pub mod config;
pub mod downloader;
pub mod error;
pub mod file_manager;
pub mod html_parser;
pub mod migrator;
pub mod progress;
pub mod rewriter;

// Re-export main types for convenience
pub use cli::LocalizeCommand;
pub use config::Config;
pub use downloader::MediaDownloader;
pub use error::{ConfigError, LocalizerError};
pub use file_manager::{FileManager, PartialFile};
pub use html_parser::{MediaKind, MediaLocator, MediaReference};
pub use migrator::{MediaMigrator, MigrationReport};
pub use progress::{AggregateProgress, ProgressEvent, ProgressReporter};
pub use rewriter::{Pattern, Replacement, Rewriter};
