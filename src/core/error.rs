//! Error handling for slimload
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** ([`SlimError`]) for precise handling in code
//! 2. **User-friendly messages** ([`ErrorContext`]) with suggestions for CLI users
//!
//! Most of the engine never fails: missing plugin files, unreadable headers
//! and malformed cache blobs all degrade to "no data". The variants here cover
//! the failures that genuinely stop an operation, such as an unreadable
//! plugins directory or a broken configuration file.
//!
//! # Examples
//!
//! ```rust,no_run
//! use slimload::core::{SlimError, user_friendly_error};
//!
//! let err = anyhow::Error::from(SlimError::PluginsDirNotFound {
//!     path: "/srv/www/wp-content/plugins".to_string(),
//! });
//! let ctx = user_friendly_error(err);
//! ctx.display(); // coloured error, details and suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for slimload operations.
#[derive(Error, Debug)]
pub enum SlimError {
    /// Configuration file could not be parsed.
    #[error("Invalid configuration file syntax in {file}")]
    ConfigParseError {
        /// Path of the configuration file.
        file: String,
        /// Parser message.
        reason: String,
    },

    /// Configuration values are inconsistent.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem.
        message: String,
    },

    /// The plugins directory does not exist.
    #[error("Plugins directory not found: {path}")]
    PluginsDirNotFound {
        /// Directory that was expected.
        path: String,
    },

    /// A named plugin is not installed.
    #[error("Plugin '{name}' not found")]
    PluginNotFound {
        /// Slug or identifier the user asked for.
        name: String,
    },

    /// A slug argument does not match the slug grammar.
    #[error("Invalid plugin slug '{slug}'")]
    InvalidSlug {
        /// Offending value.
        slug: String,
    },

    /// The durable store could not be read or written.
    #[error("Store operation failed: {operation} ({key})")]
    StoreError {
        /// What was being done (read, write, delete, lock).
        operation: String,
        /// Store key involved.
        key: String,
    },

    /// Anything else, with its full message.
    #[error("{message}")]
    Other {
        /// Rendered message including the cause chain.
        message: String,
    },
}

/// Error wrapper adding details and a suggestion for display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error.
    pub error: SlimError,
    /// Optional fix the user can try.
    pub suggestion: Option<String>,
    /// Optional extra explanation.
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error without details or suggestion.
    #[must_use]
    pub const fn new(error: SlimError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr with colours.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions where the
/// failure is recognised.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if error.downcast_ref::<ErrorContext>().is_some() {
        return match error.downcast::<ErrorContext>() {
            Ok(ctx) => ctx,
            Err(error) => ErrorContext::new(SlimError::Other {
                message: error.to_string(),
            }),
        };
    }

    if error.downcast_ref::<SlimError>().is_some() {
        return match error.downcast::<SlimError>() {
            Ok(slim) => create_error_context(slim),
            Err(error) => ErrorContext::new(SlimError::Other {
                message: error.to_string(),
            }),
        };
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(SlimError::ConfigParseError {
            file: crate::constants::CONFIG_FILE_NAME.to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of your configuration file")
        .with_details(toml_error.to_string());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(SlimError::Other {
            message: error.to_string(),
        })
        .with_suggestion("Check ownership and permissions of the plugins and state directories");
    }

    // Generic error - include the full chain for diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(SlimError::Other {
        message,
    })
}

fn create_error_context(error: SlimError) -> ErrorContext {
    match &error {
        SlimError::ConfigParseError {
            reason,
            ..
        } => {
            let reason = reason.clone();
            ErrorContext::new(error)
                .with_suggestion("Check the TOML syntax of your configuration file")
                .with_details(reason)
        }
        SlimError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Review slimload.toml or point SLIMLOAD_CONFIG at the right file"),
        SlimError::PluginsDirNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Set plugins_dir in slimload.toml to your wp-content/plugins directory")
            .with_details("Plugins are discovered from <plugins_dir>/<slug>/<main>.php and <plugins_dir>/<file>.php"),
        SlimError::PluginNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pass a plugin slug or a path relative to the plugins directory"),
        SlimError::InvalidSlug {
            ..
        } => ErrorContext::new(error).with_details(
            "Slugs are lowercase letters and digits separated by single hyphens, e.g. 'elementor-pro'",
        ),
        SlimError::StoreError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check that the state directory is writable, or run 'slimload invalidate'"),
        _ => ErrorContext::new(error),
    }
}
