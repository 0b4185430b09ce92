use std::sync::Arc;
use std::time::Instant;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::{SampleFormat, WavSpec, WavWriter};
use parking_lot::Mutex;

use crate::clip::QueryClip;
use crate::error::SearchError;

/// Manages microphone capture using cpal.
///
/// `start` opens the default input device and begins accumulating samples on
/// the audio thread; `stop` tears the stream down (so the platform's mic
/// indicator turns off), downmixes to mono and finalizes the take into a
/// single WAV clip. Stopping while inactive is a no-op.
pub struct AudioCapture {
    stream: Option<cpal::Stream>,
    samples: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
    channels: u16,
    started_at: Option<Instant>,
    max_duration_secs: u32,
}

impl AudioCapture {
    pub fn new(max_duration_secs: u32) -> Self {
        Self {
            stream: None,
            samples: Arc::new(Mutex::new(Vec::new())),
            sample_rate: 0,
            channels: 0,
            started_at: None,
            max_duration_secs,
        }
    }

    /// Starts a new recording, discarding any previous unfinished take and
    /// resetting the elapsed timer.
    pub fn start(&mut self) -> Result<(), SearchError> {
        if self.stream.is_some() {
            return Ok(()); // Already recording
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| SearchError::DeviceUnavailable("no input device found".to_string()))?;

        let supported = device
            .default_input_config()
            .map_err(|e| classify_capture_error(&e.to_string()))?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        self.sample_rate = config.sample_rate.0;
        self.channels = config.channels;
        self.samples.lock().clear();

        let samples = self.samples.clone();
        let err_fn = |e| eprintln!("Audio input stream error: {}", e);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => device
                .build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        samples.lock().extend_from_slice(data);
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| classify_capture_error(&e.to_string()))?,
            cpal::SampleFormat::I16 => device
                .build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let mut buffer = samples.lock();
                        buffer.extend(data.iter().map(|s| *s as f32 / 32768.0));
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| classify_capture_error(&e.to_string()))?,
            other => {
                return Err(SearchError::DeviceUnavailable(format!(
                    "unsupported input sample format: {}",
                    other
                )))
            }
        };

        stream
            .play()
            .map_err(|e| classify_capture_error(&e.to_string()))?;

        self.stream = Some(stream);
        self.started_at = Some(Instant::now());
        Ok(())
    }

    /// Finalizes the current recording into a WAV clip named `filename`.
    /// Returns `Ok(None)` when no recording is active.
    pub fn stop(&mut self, filename: &str) -> Result<Option<QueryClip>, SearchError> {
        let Some(stream) = self.stream.take() else {
            return Ok(None);
        };
        // Dropping the stream releases the hardware; the mic indicator goes off
        drop(stream);
        self.started_at = None;

        let raw = std::mem::take(&mut *self.samples.lock());
        let mut mono = downmix_to_mono(&raw, self.channels.max(1) as usize);

        let max_samples = self.max_duration_secs as usize * self.sample_rate as usize;
        if max_samples > 0 && mono.len() > max_samples {
            mono.truncate(max_samples);
        }

        let wav = encode_wav(&mono, self.sample_rate)
            .map_err(|e| SearchError::DeviceUnavailable(format!("failed to encode take: {}", e)))?;

        Ok(Some(QueryClip::new(wav, "audio/wav", filename)))
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Whole seconds since the current recording started; zero when idle
    pub fn elapsed_secs(&self) -> u64 {
        self.started_at.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    pub fn max_duration_secs(&self) -> u32 {
        self.max_duration_secs
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stream = None;
    }
}

/// Average interleaved channels down to mono
fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Encode mono f32 samples as 16-bit PCM WAV
fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut buffer, spec)?;
        for &sample in samples {
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(sample_i16)?;
        }
        writer.finalize()?;
    }

    Ok(buffer.into_inner())
}

/// Map platform capture failures onto the two errors the UI distinguishes
fn classify_capture_error(message: &str) -> SearchError {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("denied") || lowered.contains("permission") {
        SearchError::PermissionDenied
    } else {
        SearchError::DeviceUnavailable(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_stereo_frames() {
        let samples = [0.5, -0.5, 1.0, 0.0, -1.0, -1.0];
        assert_eq!(downmix_to_mono(&samples, 2), vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn downmix_passes_mono_through() {
        let samples = [0.1, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&samples, 1), samples.to_vec());
    }

    #[test]
    fn encoded_wav_parses_back_with_the_same_spec() {
        let samples: Vec<f32> = (0..1600).map(|i| (i as f32 / 100.0).sin() * 0.5).collect();
        let wav = encode_wav(&samples, 16000).unwrap();

        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.duration() as usize, samples.len());
    }

    #[test]
    fn permission_failures_are_classified() {
        assert!(matches!(
            classify_capture_error("Access denied by the system"),
            SearchError::PermissionDenied
        ));
        assert!(matches!(
            classify_capture_error("device disconnected"),
            SearchError::DeviceUnavailable(_)
        ));
    }
}
