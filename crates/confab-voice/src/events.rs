//! Structured events for the conversational loop
//!
//! The orchestrator reports progress through typed events instead of
//! console text, so hosts can observe the session programmatically. The
//! channel-backed sink feeds an external observer task; the tracing sink
//! logs events for the standalone binary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Why a conversation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndReason {
    /// Silence timeout with no speech detected.
    NoSpeech,
    /// Transcription produced no text.
    EmptyTranscript,
    /// User answered no to the continuation prompt.
    Declined,
    /// Continuation answer was empty or unrecognized.
    UnclearAnswer,
    /// Ctrl-C or host shutdown.
    Interrupted,
}

/// Events emitted by the assistant during a session.
#[derive(Debug, Clone, Serialize)]
pub enum TurnEvent {
    /// A round began; the assistant is about to listen.
    RoundStarted {
        round: u32,
        timestamp: DateTime<Utc>,
    },

    /// An utterance was captured and persisted.
    UtteranceCaptured {
        round: u32,
        duration: Duration,
        wav_path: String,
    },

    /// Transcription finished.
    Transcribed { round: u32, text: String },

    /// Chat completion finished.
    ReplyReady { round: u32, text: String },

    /// Playback of the reply started.
    SpeakingStarted { round: u32 },

    /// Playback of the reply finished.
    SpeakingFinished { round: u32 },

    /// The continuation answer as heard.
    ContinuationHeard { round: u32, answer: String },

    /// The session ended.
    SessionEnded {
        rounds_completed: u32,
        reason: EndReason,
    },
}

/// Receives events from the orchestrator. Emission is infallible; a sink
/// that loses its consumer drops events rather than stalling the loop.
pub trait EventSink {
    fn emit(&self, event: TurnEvent);
}

/// Sink that forwards events over an unbounded channel to an observer task.
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<TurnEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TurnEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: TurnEvent) {
        if self.tx.send(event).is_err() {
            warn!("event observer gone, dropping event");
        }
    }
}

/// Sink that logs events through tracing.
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: TurnEvent) {
        match &event {
            TurnEvent::RoundStarted { round, .. } => {
                info!(round, "round started, speak now");
            }
            TurnEvent::UtteranceCaptured {
                round,
                duration,
                wav_path,
            } => {
                info!(
                    round,
                    secs = duration.as_secs_f32(),
                    wav = %wav_path,
                    "utterance captured"
                );
            }
            TurnEvent::Transcribed { round, text } => {
                info!(round, %text, "transcript");
            }
            TurnEvent::ReplyReady { round, text } => {
                info!(round, %text, "reply");
            }
            TurnEvent::SpeakingStarted { round } => {
                info!(round, "speaking");
            }
            TurnEvent::SpeakingFinished { round } => {
                info!(round, "finished speaking");
            }
            TurnEvent::ContinuationHeard { round, answer } => {
                info!(round, %answer, "continuation answer");
            }
            TurnEvent::SessionEnded {
                rounds_completed,
                reason,
            } => {
                info!(rounds = rounds_completed, ?reason, "session ended");
            }
        }
    }
}
