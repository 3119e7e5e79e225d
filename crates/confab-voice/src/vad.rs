//! Voice Activity Detection using WebRTC VAD
//!
//! Wraps the WebRTC VAD for per-frame speech classification. Each decision
//! depends only on the current frame; the silence run-length logic lives in
//! the recorder, not here.

use crate::error::{VoiceError, VoiceResult};
use tracing::debug;
use webrtc_vad::{SampleRate, Vad, VadMode};

/// Frame durations (ms) the WebRTC VAD accepts.
const SUPPORTED_FRAME_MS: [usize; 3] = [10, 20, 30];

/// Per-frame speech classifier.
///
/// Frames are signed 16-bit mono samples and must be exactly 10, 20, or
/// 30ms long at the configured sample rate; any other length is an error,
/// never a silent truncation.
pub struct FrameClassifier {
    vad: Vad,
    sample_rate: u32,
}

impl FrameClassifier {
    /// Create a classifier for the given sample rate and aggressiveness (0-3).
    ///
    /// Higher aggressiveness trades false negatives for fewer false
    /// positives on noise.
    pub fn new(sample_rate: u32, aggressiveness: u8) -> VoiceResult<Self> {
        let rate = match sample_rate {
            8000 => SampleRate::Rate8kHz,
            16000 => SampleRate::Rate16kHz,
            32000 => SampleRate::Rate32kHz,
            48000 => SampleRate::Rate48kHz,
            other => {
                return Err(VoiceError::Config(format!(
                    "VAD supports 8000, 16000, 32000, or 48000 Hz, got {}",
                    other
                )))
            }
        };

        let mode = match aggressiveness {
            0 => VadMode::Quality,
            1 => VadMode::LowBitrate,
            2 => VadMode::Aggressive,
            3 => VadMode::VeryAggressive,
            other => {
                return Err(VoiceError::Config(format!(
                    "VAD aggressiveness must be 0-3, got {}",
                    other
                )))
            }
        };

        let vad = Vad::new_with_rate_and_mode(rate, mode);
        Ok(Self { vad, sample_rate })
    }

    /// Classify one frame. Returns `InvalidFrameLength` for frames that are
    /// not exactly 10/20/30ms at the configured rate.
    pub fn is_speech(&mut self, frame: &[i16]) -> VoiceResult<bool> {
        let per_ms = self.sample_rate as usize / 1000;
        let valid = SUPPORTED_FRAME_MS.iter().any(|ms| frame.len() == ms * per_ms);
        if !valid {
            return Err(VoiceError::InvalidFrameLength {
                got: frame.len(),
                sample_rate: self.sample_rate,
            });
        }

        let is_speech = self.vad.is_voice_segment(frame).map_err(|e| {
            VoiceError::AudioStream(format!("VAD rejected frame: {:?}", e))
        })?;

        debug!(is_speech, "frame classified");
        Ok(is_speech)
    }

    /// Configured sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_sample_rate() {
        assert!(FrameClassifier::new(44100, 2).is_err());
    }

    #[test]
    fn rejects_out_of_range_aggressiveness() {
        assert!(FrameClassifier::new(16000, 4).is_err());
    }

    #[test]
    fn accepts_all_supported_frame_durations() {
        let mut vad = FrameClassifier::new(16000, 2).unwrap();
        for ms in [10usize, 20, 30] {
            let frame = vec![0i16; ms * 16];
            assert!(vad.is_speech(&frame).is_ok(), "{}ms frame should classify", ms);
        }
    }

    #[test]
    fn invalid_frame_length_is_an_error_not_truncation() {
        let mut vad = FrameClassifier::new(16000, 2).unwrap();
        let frame = vec![0i16; 100];
        match vad.is_speech(&frame) {
            Err(VoiceError::InvalidFrameLength { got, sample_rate }) => {
                assert_eq!(got, 100);
                assert_eq!(sample_rate, 16000);
            }
            other => panic!("expected InvalidFrameLength, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn silence_is_not_speech() {
        let mut vad = FrameClassifier::new(16000, 2).unwrap();
        let silence = vec![0i16; 320];
        assert!(!vad.is_speech(&silence).unwrap());
    }
}
