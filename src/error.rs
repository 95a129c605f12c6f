//! Error type for record loading, configuration, and batch builds.
//!
//! Rendering itself never fails; only the edges that touch the file system
//! or parse input return [`Error`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the library.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A content record is not valid JSON for the content contract.
    #[error("invalid content record {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The site configuration file could not be parsed.
    #[error("invalid site config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },

    /// A locale's `date_format` contains an unknown strftime specifier.
    #[error("invalid date_format {format:?} for locale {locale} in {path}")]
    DateFormat {
        path: PathBuf,
        locale: String,
        format: String,
    },

    /// `--locale` named a locale the configuration does not define.
    #[error("unknown locale: {0}")]
    UnknownLocale(String),

    /// A record's slug would place output outside the build directory.
    #[error("invalid slug: {0}")]
    InvalidSlug(String),

    /// A fragment identifier has malformed percent-encoding.
    #[error("malformed fragment: {0}")]
    Fragment(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
