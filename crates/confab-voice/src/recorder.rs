//! Utterance recording with silence-based endpointing
//!
//! The endpointer is a small state machine driven by one VAD decision per
//! frame: `Idle → Listening → SpeechDetected → EndOfUtterance`. The only
//! temporal logic is the consecutive-silence run length; there is no
//! look-ahead or smoothing. A session that times out without ever hearing
//! speech ends with an empty result, which the orchestrator treats
//! differently from a recorded utterance.

use crate::audio::{AudioCapture, CaptureSettings};
use crate::config::AssistantConfig;
use crate::error::{VoiceError, VoiceResult};
use crate::vad::FrameClassifier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How often the blocking frame pop wakes up to observe the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Recorder session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// No stream open.
    Idle,
    /// Frames being classified; no speech seen yet.
    Listening,
    /// Speech seen; trailing silence accumulates and resets on speech.
    SpeechDetected,
    /// Terminal: silence timeout reached.
    EndOfUtterance,
}

/// Outcome of feeding one frame to the endpointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep feeding frames.
    Pending,
    /// Session over. `spoke` distinguishes a real utterance from a
    /// no-speech timeout.
    Done { spoke: bool },
}

/// Pure endpointing state machine, one VAD decision per frame.
pub struct Endpointer {
    state: RecorderState,
    frame_ms: u32,
    timeout_ms: u64,
    silence_run: u64,
}

impl Endpointer {
    pub fn new(frame_ms: u32, silence_timeout: Duration) -> Self {
        Self {
            state: RecorderState::Listening,
            frame_ms,
            timeout_ms: silence_timeout.as_millis() as u64,
            silence_run: 0,
        }
    }

    /// Feed one frame's classification.
    pub fn push(&mut self, is_speech: bool) -> Verdict {
        if self.state == RecorderState::EndOfUtterance {
            return Verdict::Done {
                spoke: true,
            };
        }

        if is_speech {
            self.state = RecorderState::SpeechDetected;
            self.silence_run = 0;
            return Verdict::Pending;
        }

        self.silence_run += 1;
        if self.silence_run * self.frame_ms as u64 >= self.timeout_ms {
            let spoke = self.state == RecorderState::SpeechDetected;
            self.state = RecorderState::EndOfUtterance;
            return Verdict::Done { spoke };
        }
        Verdict::Pending
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }
}

/// A finished recording: all frames of the session in arrival order.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Signed 16-bit mono PCM.
    pub samples: Vec<i16>,
    /// Sample rate the PCM was captured at.
    pub sample_rate: u32,
}

impl Utterance {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// Source of recorded utterances. The production impl drives the
/// microphone; tests script it.
pub trait UtteranceSource {
    /// Record until the trailing-silence timeout. `None` means no speech
    /// was detected before the timeout.
    fn record(&mut self, silence_timeout: Duration) -> VoiceResult<Option<Utterance>>;
}

/// Microphone-backed recorder: capture stream + frame classifier + endpointer.
pub struct UtteranceRecorder {
    classifier: FrameClassifier,
    settings: CaptureSettings,
    frame_ms: u32,
    shutdown: Arc<AtomicBool>,
}

impl UtteranceRecorder {
    pub fn new(config: &AssistantConfig, shutdown: Arc<AtomicBool>) -> VoiceResult<Self> {
        let classifier = FrameClassifier::new(config.sample_rate, config.vad_mode)?;
        Ok(Self {
            classifier,
            settings: CaptureSettings {
                sample_rate: config.sample_rate,
                channels: config.channels,
                frame_len: config.frame_len(),
            },
            frame_ms: config.frame_ms,
            shutdown,
        })
    }
}

impl UtteranceSource for UtteranceRecorder {
    fn record(&mut self, silence_timeout: Duration) -> VoiceResult<Option<Utterance>> {
        let (frame_tx, frame_rx) = mpsc::channel();
        // Stream closes via drop on every exit path, including `?` and
        // interrupt, releasing the device deterministically.
        let _capture = AudioCapture::start(&self.settings, frame_tx)?;
        info!(
            timeout_ms = silence_timeout.as_millis() as u64,
            "listening for speech"
        );

        let classifier = &mut self.classifier;
        record_from_frames(
            |frame| classifier.is_speech(frame),
            &frame_rx,
            self.frame_ms,
            self.settings.sample_rate,
            silence_timeout,
            &self.shutdown,
        )
    }
}

/// Consume frames from a channel until the endpointer finishes. Split out
/// from the device-facing recorder so synthetic frame streams can drive it.
pub(crate) fn record_from_frames<F>(
    mut classify: F,
    frames: &Receiver<Vec<i16>>,
    frame_ms: u32,
    sample_rate: u32,
    silence_timeout: Duration,
    shutdown: &AtomicBool,
) -> VoiceResult<Option<Utterance>>
where
    F: FnMut(&[i16]) -> VoiceResult<bool>,
{
    let mut endpointer = Endpointer::new(frame_ms, silence_timeout);
    let mut samples: Vec<i16> = Vec::new();

    loop {
        if shutdown.load(Ordering::Relaxed) {
            return Err(VoiceError::Interrupted);
        }

        let frame = match frames.recv_timeout(SHUTDOWN_POLL) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(VoiceError::AudioStream(
                    "capture channel closed before end of utterance".to_string(),
                ))
            }
        };

        let is_speech = classify(&frame)?;
        samples.extend_from_slice(&frame);

        match endpointer.push(is_speech) {
            Verdict::Pending => {}
            Verdict::Done { spoke: true } => {
                debug!(samples = samples.len(), "end of utterance");
                return Ok(Some(Utterance {
                    samples,
                    sample_rate,
                }));
            }
            Verdict::Done { spoke: false } => {
                debug!("silence timeout with no speech");
                return Ok(None);
            }
        }
    }
}
