//! Error types for the voice assistant

use thiserror::Error;

/// Result type alias for voice operations
pub type VoiceResult<T> = Result<T, VoiceError>;

/// Errors that can occur in the voice assistant pipeline
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("invalid frame length: got {got} samples, not a 10/20/30ms frame at {sample_rate}Hz")]
    InvalidFrameLength { got: usize, sample_rate: u32 },

    #[error("audio device error: {0}")]
    AudioDevice(String),

    #[error("audio stream error: {0}")]
    AudioStream(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("chat completion failed: {0}")]
    Completion(String),

    #[error("speech synthesis timed out: {0}")]
    SynthesisTimeout(String),

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("local speech engine failed: {0}")]
    LocalSpeech(String),

    #[error("audio playback error: {0}")]
    Playback(String),

    #[error("channel send error: {0}")]
    ChannelSend(String),

    #[error("operation interrupted")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<cpal::DevicesError> for VoiceError {
    fn from(err: cpal::DevicesError) -> Self {
        VoiceError::AudioDevice(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for VoiceError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        VoiceError::AudioDevice(err.to_string())
    }
}

impl From<cpal::BuildStreamError> for VoiceError {
    fn from(err: cpal::BuildStreamError) -> Self {
        VoiceError::AudioStream(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for VoiceError {
    fn from(err: cpal::PlayStreamError) -> Self {
        VoiceError::AudioStream(err.to_string())
    }
}
