//! # Confab Voice - Voice-Driven Conversational Assistant
//!
//! Captures microphone audio, detects speech boundaries with frame-level
//! VAD, transcribes the utterance, asks a chat model for a reply, and
//! speaks it back, looping until the user declines to continue.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                     Voice Assistant Loop                       │
//! │  ┌────────────┐  ┌─────────────┐  ┌────────────────────────┐  │
//! │  │  Audio In  │→ │ WebRTC VAD  │→ │ Endpointer (silence    │  │
//! │  │   (cpal)   │  │ (per frame) │  │ run-length, 2.0s gap)  │  │
//! │  └────────────┘  └─────────────┘  └────────────────────────┘  │
//! │        ↓                                      ↓                │
//! │  ┌────────────┐  ┌─────────────┐  ┌────────────────────────┐  │
//! │  │ Audio Out  │← │ TTS + local │← │ Transcription → Chat   │  │
//! │  │  (rodio)   │  │  fallback   │  │ (OpenAI-compatible)    │  │
//! │  └────────────┘  └─────────────┘  └────────────────────────┘  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The VAD and output-stream handles are not `Send`; build the whole
//! assistant on one blocking thread and signal it through the shared
//! shutdown flag.

pub mod assistant;
pub mod audio;
pub mod chat;
pub mod config;
pub mod error;
pub mod events;
pub mod recorder;
pub mod speech;
pub mod stt;
pub mod vad;
pub mod wav;

pub use assistant::{parse_continuation, Continuation, SessionSummary, VoiceAssistant};
pub use audio::{AudioCapture, CaptureSettings};
pub use chat::{ChatBackend, OpenAiChat};
pub use config::AssistantConfig;
pub use error::{VoiceError, VoiceResult};
pub use events::{ChannelEventSink, EndReason, EventSink, TracingEventSink, TurnEvent};
pub use recorder::{Endpointer, RecorderState, Utterance, UtteranceRecorder, UtteranceSource, Verdict};
pub use speech::{
    CommandSpeech, LocalSpeech, OpenAiTts, Playback, RodioPlayback, SpeechOutput, TtsBackend,
};
pub use stt::{OpenAiTranscriber, TranscriptionBackend};
pub use vad::FrameClassifier;
pub use wav::{encode_wav, write_wav};
