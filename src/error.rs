#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

/// Errors that make a whole workflow impossible to run.
#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    /// Marker allocation was requested without any markers.
    #[error("No marker usernames were provided, cannot allocate groups for marking.")]
    NoMarkers,
    /// A required setting is absent from the environment.
    #[error("Required setting `{0}` is not set (check the environment or `.env`).")]
    MissingSetting(&'static str),
    /// A setting is present but could not be interpreted.
    #[error("Setting `{name}` has an invalid value `{value}`: {reason}")]
    InvalidSetting {
        /// Name of the environment variable.
        name:   &'static str,
        /// Raw value that was rejected.
        value:  String,
        /// Why it was rejected.
        reason: String,
    },
    /// A CSV file could not be read from disk.
    #[error("Could not read `{}`: {source}", .path.display())]
    UnreadableFile {
        /// File that was being read.
        path:   PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// A CSV document is not well formed.
    #[error("Malformed CSV in `{origin}`: {reason}")]
    MalformedCsv {
        /// File name or other description of the source.
        origin: String,
        /// Parser or shape error.
        reason: String,
    },
    /// A CSV document lacks a column the workflow needs.
    #[error("`{origin}` has no `{column}` column.")]
    MissingColumn {
        /// File name or other description of the source.
        origin: String,
        /// Header that was expected.
        column: &'static str,
    },
}

/// Errors returned by remote directory operations. These fail a single item,
/// never a whole batch.
#[derive(thiserror::Error, Debug)]
pub enum ConduitError {
    /// The HTTP request itself failed.
    #[error("Request to `{method}` failed: {source}")]
    Transport {
        /// Conduit method being called.
        method: String,
        /// Underlying transport failure.
        source: reqwest::Error,
    },
    /// The server answered with a Conduit error envelope.
    #[error("`{method}` returned {code}: {info}")]
    Api {
        /// Conduit method being called.
        method: String,
        /// Conduit error code, eg. `ERR-CONDUIT-CORE`.
        code:   String,
        /// Human readable error description.
        info:   String,
    },
    /// The response decoded, but held no usable result.
    #[error("`{0}` returned no usable result")]
    MissingResult(String),
    /// No user with this username exists on the platform.
    #[error("No user named `{0}`")]
    UnknownUser(String),
    /// No project with this name exists on the platform.
    #[error("No project named `{0}`")]
    UnknownProject(String),
}
