//! Sample data and file decoding.

use crate::error::{Error, Result};
use hound::{SampleFormat, WavReader};
use std::fmt;
use std::path::Path;

/// A mono sample ready for playback.
pub struct Sample {
    path: String,
    sample_rate: u32,
    data: Box<[f32]>,
}

impl Sample {
    pub fn new(path: impl Into<String>, sample_rate: u32, data: Vec<f32>) -> Self {
        Self {
            path: path.into(),
            sample_rate,
            data: data.into_boxed_slice(),
        }
    }

    /// Path the sample was loaded from.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn frames(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Debug for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sample")
            .field("path", &self.path)
            .field("sample_rate", &self.sample_rate)
            .field("frames", &self.data.len())
            .finish()
    }
}

/// Interleaved audio as decoded from a file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub frames: usize,
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

/// Turns a file into audio. Runs on the worker thread, so it may block.
pub trait SampleDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DecodedAudio>;
}

/// WAV decoding via hound. Integer formats are scaled to [-1, 1).
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

impl SampleDecoder for WavDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedAudio> {
        let mut reader = WavReader::open(path)?;
        let spec = reader.spec();

        let samples = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()?,
            SampleFormat::Int => {
                let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        };

        Ok(DecodedAudio {
            frames: samples.len() / usize::from(spec.channels.max(1)),
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            samples,
        })
    }
}

/// Decode `path` and check it is playable: exactly one channel and at least
/// one frame.
pub fn load_sample(decoder: &dyn SampleDecoder, path: &str) -> Result<Sample> {
    tracing::info!(path, "Loading sample");

    let audio = decoder.decode(Path::new(path))?;
    if audio.channels != 1 {
        return Err(Error::UnsupportedChannels {
            path: path.to_owned(),
            channels: audio.channels,
        });
    }
    if audio.frames == 0 || audio.samples.is_empty() {
        return Err(Error::EmptySample(path.to_owned()));
    }

    let mut data = audio.samples;
    data.truncate(audio.frames);
    Ok(Sample::new(path, audio.sample_rate, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hound::{WavSpec, WavWriter};
    use tempfile::TempDir;

    fn write_wav(dir: &TempDir, name: &str, channels: u16, samples: &[f32]) -> String {
        let path = dir.path().join(name);
        let spec = WavSpec {
            channels,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        path.to_string_lossy().into_owned()
    }

    struct Fixed(DecodedAudio);

    impl SampleDecoder for Fixed {
        fn decode(&self, _: &Path) -> Result<DecodedAudio> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_load_mono_wav() {
        let dir = TempDir::new().unwrap();
        let path = write_wav(&dir, "mono.wav", 1, &[0.0, 0.5, -0.5, 1.0]);

        let sample = load_sample(&WavDecoder, &path).unwrap();
        assert_eq!(sample.path(), path);
        assert_eq!(sample.sample_rate(), 48000);
        assert_eq!(sample.frames(), 4);
        assert_relative_eq!(sample.data()[1], 0.5);
        assert_relative_eq!(sample.data()[2], -0.5);
    }

    #[test]
    fn test_int_wav_is_normalized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("int.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(i16::MIN).unwrap();
        writer.write_sample(16384i16).unwrap();
        writer.finalize().unwrap();

        let audio = WavDecoder.decode(&path).unwrap();
        assert_eq!(audio.frames, 2);
        assert_relative_eq!(audio.samples[0], -1.0);
        assert_relative_eq!(audio.samples[1], 0.5);
    }

    #[test]
    fn test_stereo_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_wav(&dir, "stereo.wav", 2, &[0.1, 0.2, 0.3, 0.4]);

        let err = load_sample(&WavDecoder, &path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedChannels { channels: 2, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_sample(&WavDecoder, "/nonexistent/tessera/missing.wav").unwrap_err();
        assert!(matches!(err, Error::Hound(_)));
    }

    #[test]
    fn test_empty_rejected() {
        let decoder = Fixed(DecodedAudio {
            frames: 0,
            channels: 1,
            sample_rate: 48000,
            samples: vec![],
        });
        let err = load_sample(&decoder, "empty.wav").unwrap_err();
        assert!(matches!(err, Error::EmptySample(path) if path == "empty.wav"));
    }
}
