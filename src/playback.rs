use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use parking_lot::Mutex;
use rodio::{OutputStreamBuilder, Sink};

use crate::config::PlaybackConfig;
use crate::ranking::AudioHandle;
use crate::sound_generator::{FeedbackTone, ToneGenerator};

const TONE_SAMPLE_RATE: u32 = 44100;

enum PlaybackCommand {
    /// Start playing a result clip, replacing whatever was playing
    Clip(AudioHandle),
    /// Stop the current result clip, if any
    Stop,
    /// Fire-and-forget feedback tone
    Tone(FeedbackTone),
}

/// Owns all audio output on a dedicated thread.
///
/// The rodio output stream is not Send, so the thread holds it and drains a
/// command channel, the same shape the capture side uses for its stream. At
/// most one result clip plays at a time; playing a new one or sending `Stop`
/// drops the previous sink, so a play/pause toggle never leaks a live sink.
pub struct PlaybackController {
    command_tx: mpsc::Sender<PlaybackCommand>,
    enabled: Arc<AtomicBool>,
    feedback_tones: bool,
    volume: Arc<Mutex<f32>>,
}

impl PlaybackController {
    pub fn new(config: &PlaybackConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel::<PlaybackCommand>();
        let enabled = Arc::new(AtomicBool::new(config.enabled));
        let volume = Arc::new(Mutex::new(config.volume.clamp(0.0, 1.0)));

        let volume_for_thread = volume.clone();
        std::thread::spawn(move || {
            let stream = match OutputStreamBuilder::from_default_device()
                .and_then(|builder| builder.open_stream())
            {
                Ok(stream) => stream,
                Err(e) => {
                    eprintln!("No audio output available, playback disabled: {}", e);
                    return;
                }
            };
            let generator = ToneGenerator::new(TONE_SAMPLE_RATE);
            let mut current: Option<Sink> = None;

            while let Ok(command) = command_rx.recv() {
                let volume = *volume_for_thread.lock();
                match command {
                    PlaybackCommand::Clip(audio) => {
                        if let Some(sink) = current.take() {
                            sink.stop();
                        }
                        let reader = Cursor::new(audio.bytes.as_ref().clone());
                        match rodio::play(stream.mixer(), reader) {
                            Ok(sink) => {
                                sink.set_volume(volume);
                                current = Some(sink);
                            }
                            Err(e) => eprintln!("Failed to play result audio: {}", e),
                        }
                    }
                    PlaybackCommand::Stop => {
                        if let Some(sink) = current.take() {
                            sink.stop();
                        }
                    }
                    PlaybackCommand::Tone(tone) => {
                        let samples = generator.generate(tone);
                        let source =
                            rodio::buffer::SamplesBuffer::new(1, TONE_SAMPLE_RATE, samples);
                        let sink = Sink::connect_new(stream.mixer());
                        sink.set_volume(volume);
                        sink.append(source);
                        // Short blip; let it finish on its own
                        sink.detach();
                    }
                }
            }
        });

        Self {
            command_tx,
            enabled,
            feedback_tones: config.feedback_tones,
            volume,
        }
    }

    /// Begin playing a materialized result's audio, replacing any current one
    pub fn play_clip(&self, audio: &AudioHandle) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        let _ = self.command_tx.send(PlaybackCommand::Clip(audio.clone()));
    }

    /// Stop the currently playing result clip
    pub fn stop(&self) {
        let _ = self.command_tx.send(PlaybackCommand::Stop);
    }

    pub fn play_tone(&self, tone: FeedbackTone) {
        if !self.enabled.load(Ordering::Relaxed) || !self.feedback_tones {
            return;
        }
        let _ = self.command_tx.send(PlaybackCommand::Tone(tone));
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn set_volume(&self, volume: f32) {
        *self.volume.lock() = volume.clamp(0.0, 1.0);
    }
}
