/*!
 * Error types for the storycast application.
 *
 * This module contains custom error types for the different pipelines,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Map a non-success HTTP status and body to the matching variant
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

/// Errors produced while analyzing a single line or a batch of effects
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The provider call itself failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The provider answered but the answer was not the expected JSON
    #[error("Malformed analysis response: {0}")]
    MalformedResponse(String),
}

/// Errors raised by the progress store; all of them stop an annotation run
#[derive(Error, Debug)]
pub enum ProgressError {
    /// The progress file exists but cannot be parsed
    #[error("Progress file {path:?} is malformed: {reason}")]
    Malformed {
        /// Location of the progress file
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// More records are stored than there are input lines
    #[error("Progress file holds {stored} records but the input only has {lines} lines")]
    LongerThanInput {
        /// Records found in the store
        stored: usize,
        /// Lines in the current input
        lines: usize,
    },

    /// A stored record belongs to a different input line
    #[error("Progress record {index} does not match input line {index}: stored {stored:?}, input {input:?}")]
    InputMismatch {
        /// Zero-based line index
        index: usize,
        /// Text held by the stored record
        stored: String,
        /// Text of the current input line
        input: String,
    },

    /// Reading or writing the progress file failed
    #[error("Progress file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from decoding or exporting audio
#[derive(Error, Debug)]
pub enum AudioError {
    /// The file could not be decoded
    #[error("Failed to decode {path:?}: {reason}")]
    Decode {
        /// File that failed
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// The trimmed audio could not be written
    #[error("Failed to export {path:?}: {reason}")]
    Export {
        /// Output file
        path: PathBuf,
        /// Encoder message
        reason: String,
    },

    /// Plain file system error
    #[error("Audio I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that stop a whole trim batch
#[derive(Error, Debug)]
pub enum TrimError {
    /// Input directory does not exist
    #[error("Input directory {0:?} does not exist")]
    InputDirectoryMissing(PathBuf),

    /// Nothing in the directory matches the extension filter
    #[error("No audio files with extensions {extensions} found in {dir:?}")]
    NoMatchingFiles {
        /// Scanned directory
        dir: PathBuf,
        /// Comma separated extension list
        extensions: String,
    },

    /// Trimmed copies would be written over their own inputs
    #[error("Output directory {0:?} is the input directory; trimmed files would overwrite the originals")]
    OutputIsInput(PathBuf),

    /// Output directory could not be prepared
    #[error("Trim I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from line or effect analysis
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Error from the progress store
    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    /// Error from audio handling
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Error from a trim batch
    #[error("Trim error: {0}")]
    Trim(#[from] TrimError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
