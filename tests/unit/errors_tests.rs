/*!
 * Tests for error types and conversions
 */

use std::path::PathBuf;
use storycast::errors::{AnalysisError, AppError, ProgressError, ProviderError, TrimError};

#[test]
fn test_providerError_requestFailed_shouldDisplayCorrectly() {
    let error = ProviderError::RequestFailed("Connection timeout".to_string());
    let display = format!("{}", error);
    assert!(display.contains("API request failed"));
    assert!(display.contains("Connection timeout"));
}

#[test]
fn test_providerError_fromStatus_shouldClassifyStatusCodes() {
    assert!(matches!(ProviderError::from_status(401, "no".into()), ProviderError::AuthenticationError(_)));
    assert!(matches!(ProviderError::from_status(429, "slow".into()), ProviderError::RateLimitExceeded(_)));
    assert!(matches!(
        ProviderError::from_status(500, "boom".into()),
        ProviderError::ApiError { status_code: 500, .. }
    ));
}

#[test]
fn test_analysisError_fromProviderError_shouldWrap() {
    let error: AnalysisError = ProviderError::ConnectionError("refused".to_string()).into();
    assert!(matches!(error, AnalysisError::Provider(_)));
    assert!(error.to_string().contains("refused"));
}

#[test]
fn test_progressError_inputMismatch_shouldNameBothTexts() {
    let error = ProgressError::InputMismatch {
        index: 2,
        stored: "old line".to_string(),
        input: "new line".to_string(),
    };
    let display = error.to_string();
    assert!(display.contains("old line"));
    assert!(display.contains("new line"));
}

#[test]
fn test_trimError_noMatchingFiles_shouldListExtensions() {
    let error = TrimError::NoMatchingFiles {
        dir: PathBuf::from("/audio"),
        extensions: ".mp3,.wav".to_string(),
    };
    assert!(error.to_string().contains(".mp3,.wav"));
}

#[test]
fn test_appError_fromIoError_shouldBecomeFileError() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: AppError = io.into();
    assert!(matches!(error, AppError::File(_)));
}

#[test]
fn test_appError_fromTrimError_shouldWrap() {
    let error: AppError = TrimError::InputDirectoryMissing(PathBuf::from("/nope")).into();
    assert!(matches!(error, AppError::Trim(_)));
    assert!(error.to_string().contains("/nope"));
}
