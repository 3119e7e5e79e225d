//! Microphone capture using CPAL
//!
//! The input callback downmixes to mono, converts to i16, and slices the
//! stream into fixed-size frames pushed FIFO onto a channel. The consumer
//! side (the recorder) blocks on that channel; frames are never reordered
//! or dropped while the stream is open.

use crate::error::{VoiceError, VoiceResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use std::sync::mpsc::Sender;
use tracing::{info, warn};

/// Capture parameters for one recording session.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Device channel count (downmixed to mono)
    pub channels: u16,

    /// Samples per delivered frame
    pub frame_len: usize,
}

/// Open capture session. The device is held exclusively while this value is
/// alive; dropping it (on any exit path) stops the stream and releases the
/// device.
pub struct AudioCapture {
    _stream: Stream,
}

impl AudioCapture {
    /// Open the default input device and start delivering frames.
    pub fn start(settings: &CaptureSettings, frame_tx: Sender<Vec<i16>>) -> VoiceResult<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| VoiceError::AudioDevice("no input device available".to_string()))?;

        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            sample_rate = settings.sample_rate,
            channels = settings.channels,
            "starting audio capture"
        );

        let stream_config = StreamConfig {
            channels: settings.channels,
            sample_rate: cpal::SampleRate(settings.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let channels = settings.channels as usize;
        let frame_len = settings.frame_len;
        let mut pending: Vec<i16> = Vec::with_capacity(frame_len);

        let stream = device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // Downmix to mono by averaging channels, then quantize to i16
                if channels > 1 {
                    for chunk in data.chunks(channels) {
                        let avg = chunk.iter().sum::<f32>() / channels as f32;
                        pending.push(quantize(avg));
                    }
                } else {
                    pending.extend(data.iter().map(|&s| quantize(s)));
                }

                while pending.len() >= frame_len {
                    let frame: Vec<i16> = pending.drain(..frame_len).collect();
                    // Receiver dropped means the session is over; stop quietly.
                    if frame_tx.send(frame).is_err() {
                        pending.clear();
                        return;
                    }
                }
            },
            move |err| {
                warn!("audio stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;

        Ok(Self { _stream: stream })
    }

    /// List available input devices (diagnostics).
    pub fn list_input_devices() -> VoiceResult<Vec<String>> {
        let devices = cpal::default_host().input_devices()?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }
}

fn quantize(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_clamps_out_of_range_samples() {
        assert_eq!(quantize(2.0), 32767);
        assert_eq!(quantize(-2.0), -32767);
        assert_eq!(quantize(0.0), 0);
    }

    #[test]
    fn list_devices_does_not_panic() {
        // May legitimately fail in CI environments without audio hardware.
        if let Ok(devices) = AudioCapture::list_input_devices() {
            println!("input devices: {:?}", devices);
        }
    }
}
