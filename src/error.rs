//! Error handling for Hitmix
//!
//! Fatal conditions surface as [`HitmixError`]. Numerical trouble inside the
//! enhancer is not an error: it is reported through explicit outcome types and
//! the processing flags in the vocal metadata.

use thiserror::Error;

/// Result type alias for Hitmix operations
pub type Result<T> = std::result::Result<T, HitmixError>;

/// Main error type for Hitmix operations
#[derive(Error, Debug)]
pub enum HitmixError {
    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Audio Validation Errors
    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("Invalid sample rate: {sample_rate} Hz")]
    InvalidSampleRate { sample_rate: u32 },

    #[error("Channel mismatch: {left} vs {right} channels")]
    ChannelMismatch { left: usize, right: usize },

    // Configuration Errors
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    // Processing Errors
    #[error("Processing error: {reason}")]
    ProcessingError { reason: String },

    #[error("Voice conversion failed: {reason}")]
    ConverterError { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HitmixError {
    /// Shorthand for a configuration error on a named field
    pub fn invalid_config(field: &str, reason: impl Into<String>) -> Self {
        HitmixError::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            HitmixError::FileNotFound { .. } => "FILE_NOT_FOUND",
            HitmixError::InvalidAudio { .. } => "INVALID_AUDIO",
            HitmixError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            HitmixError::EmptyAudio => "EMPTY_AUDIO",
            HitmixError::InvalidSampleRate { .. } => "INVALID_SAMPLE_RATE",
            HitmixError::ChannelMismatch { .. } => "CHANNEL_MISMATCH",
            HitmixError::InvalidConfig { .. } => "INVALID_CONFIG",
            HitmixError::ProcessingError { .. } => "PROCESSING_ERROR",
            HitmixError::ConverterError { .. } => "CONVERTER_ERROR",
            HitmixError::Io(_) => "IO_ERROR",
            HitmixError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the caller can fix the condition and retry
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HitmixError::FileNotFound { .. }
                | HitmixError::InvalidAudio { .. }
                | HitmixError::UnsupportedFormat { .. }
                | HitmixError::InvalidConfig { .. }
                | HitmixError::ConverterError { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            HitmixError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the stem was generated before mixing",
            ],
            HitmixError::InvalidAudio { .. } => vec![
                "Try converting the file to WAV format first",
                "The file may be corrupted - try re-exporting from source",
            ],
            HitmixError::UnsupportedFormat { .. } => vec![
                "Convert to 16/24/32-bit PCM or 32-bit float WAV",
            ],
            HitmixError::InvalidSampleRate { .. } => vec![
                "Use a positive sample rate such as 44100 or 48000",
            ],
            HitmixError::ChannelMismatch { .. } => vec![
                "Render both stems as mono or stereo before mixing",
            ],
            HitmixError::InvalidConfig { .. } => vec![
                "Check the configuration file against the documented defaults",
            ],
            HitmixError::ConverterError { .. } => vec![
                "Check the RVC installation directory and voice model path",
                "Use --vocal-mode enhanced to skip voice conversion",
            ],
            _ => vec![],
        }
    }
}
