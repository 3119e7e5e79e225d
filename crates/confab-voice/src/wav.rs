//! WAV persistence for utterance artifacts
//!
//! All artifacts are single-channel 16-bit PCM at the capture rate. The
//! same encoder feeds both on-disk traceability files and in-memory bytes
//! for transcription uploads.

use crate::error::{VoiceError, VoiceResult};
use std::io::Cursor;
use std::path::Path;

fn spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Write samples to a WAV file at `path`.
pub fn write_wav(path: &Path, samples: &[i16], sample_rate: u32) -> VoiceResult<()> {
    let mut writer = hound::WavWriter::create(path, spec(sample_rate))
        .map_err(|e| VoiceError::Io(std::io::Error::other(e.to_string())))?;
    for &s in samples {
        writer
            .write_sample(s)
            .map_err(|e| VoiceError::Io(std::io::Error::other(e.to_string())))?;
    }
    writer
        .finalize()
        .map_err(|e| VoiceError::Io(std::io::Error::other(e.to_string())))?;
    Ok(())
}

/// Encode samples to in-memory WAV bytes for API upload.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> VoiceResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec(sample_rate))
            .map_err(|e| VoiceError::Io(std::io::Error::other(e.to_string())))?;
        for &s in samples {
            writer
                .write_sample(s)
                .map_err(|e| VoiceError::Io(std::io::Error::other(e.to_string())))?;
        }
        writer
            .finalize()
            .map_err(|e| VoiceError::Io(std::io::Error::other(e.to_string())))?;
    }
    Ok(cursor.into_inner())
}
