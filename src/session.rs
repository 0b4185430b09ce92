use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::audio_capture::AudioCapture;
use crate::clip::QueryClip;
use crate::config::AppConfig;
use crate::error::SearchError;
use crate::export;
use crate::file_ingest;
use crate::playback::PlaybackController;
use crate::ranking::MaterializedResult;
use crate::result_store::ResultStore;
use crate::search_client::{SearchClient, SearchOutcome};
use crate::sound_generator::FeedbackTone;

/// Completion notifications from spawned network work, drained by the UI
/// loop. Each carries the generation of the ranking it targets so stale
/// completions can be recognized and dropped.
pub enum SessionEvent {
    SearchFinished {
        generation: u64,
        result: Result<SearchOutcome, SearchError>,
    },
    PageFinished {
        generation: u64,
        result: Result<Vec<MaterializedResult>, SearchError>,
    },
}

/// Coordinates capture, search, pagination and playback for one user.
///
/// The session lives on the UI task; network calls are spawned and report
/// back through the event channel, so the loop stays responsive while a
/// search or page fetch runs. At most one search and one page fetch are in
/// flight at a time; the flags double as the disabled state of the
/// corresponding commands. All ResultStore mutation happens in
/// `handle_event`, serialized by the UI loop.
pub struct SearchSession {
    client: Arc<SearchClient>,
    store: Arc<ResultStore>,
    capture: AudioCapture,
    playback: PlaybackController,
    clip: Option<QueryClip>,
    playing_row: Option<usize>,
    search_in_flight: Arc<AtomicBool>,
    page_in_flight: Arc<AtomicBool>,
    events_tx: mpsc::Sender<SessionEvent>,
    upload_filename: String,
    export_dir: String,
}

impl SearchSession {
    pub fn new(
        config: &AppConfig,
        events_tx: mpsc::Sender<SessionEvent>,
    ) -> Result<Self, SearchError> {
        let client = Arc::new(SearchClient::new(&config.service, &config.search)?);
        let store = Arc::new(ResultStore::new(config.search.page_size));

        Ok(Self {
            client,
            store,
            capture: AudioCapture::new(config.capture.max_recording_duration_secs),
            playback: PlaybackController::new(&config.playback),
            clip: None,
            playing_row: None,
            search_in_flight: Arc::new(AtomicBool::new(false)),
            page_in_flight: Arc::new(AtomicBool::new(false)),
            events_tx,
            upload_filename: config.search.upload_filename.clone(),
            export_dir: config.export.output_dir.clone(),
        })
    }

    pub fn store(&self) -> Arc<ResultStore> {
        self.store.clone()
    }

    /// Start recording, or finalize the current take into the query clip
    pub fn toggle_recording(&mut self) {
        if self.capture.is_active() {
            match self.capture.stop(&self.upload_filename) {
                Ok(Some(clip)) => {
                    self.playback.play_tone(FeedbackTone::RecordStop);
                    println!("Captured {} bytes of audio, ready to search", clip.len());
                    self.clip = Some(clip);
                }
                Ok(None) => {}
                Err(e) => eprintln!("Failed to finalize recording: {}", e),
            }
        } else {
            match self.capture.start() {
                Ok(()) => {
                    self.playback.play_tone(FeedbackTone::RecordStart);
                    println!("Recording... type 'stop' to finish.");
                }
                Err(e) => eprintln!("Cannot record: {}", e),
            }
        }
    }

    /// Stop recording if active; no-op otherwise
    pub fn stop_recording(&mut self) {
        if self.capture.is_active() {
            self.toggle_recording();
        } else {
            println!("Not recording.");
        }
    }

    pub fn is_recording(&self) -> bool {
        self.capture.is_active()
    }

    pub fn recording_elapsed_secs(&self) -> u64 {
        self.capture.elapsed_secs()
    }

    pub fn recording_limit_reached(&self) -> bool {
        self.capture.is_active()
            && self.capture.elapsed_secs() >= self.capture.max_duration_secs() as u64
    }

    pub fn has_clip(&self) -> bool {
        self.clip.is_some()
    }

    /// Replace the query clip with an audio file from disk
    pub fn load_file(&mut self, path: &str) {
        match file_ingest::load_clip(path) {
            Ok(clip) => {
                println!("Loaded '{}' ({} bytes)", clip.filename, clip.len());
                self.clip = Some(clip);
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    /// Kick off a search with the current clip. The store is cleared up
    /// front (a new search replaces the previous ranking) and the result
    /// arrives later as a `SearchFinished` event.
    pub fn start_search(&mut self) {
        if self.search_in_flight.load(Ordering::Relaxed) {
            println!("A search is already in progress.");
            return;
        }
        let Some(clip) = self.clip.clone() else {
            println!("No audio to search with. Record or load a clip first.");
            return;
        };

        // The old results are going away; silence any row still playing
        self.stop_playback();

        let generation = self.store.begin_search();
        self.search_in_flight.store(true, Ordering::Relaxed);
        println!("Searching for similar sounds...");

        let client = self.client.clone();
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.search(&clip).await;
            let _ = events_tx
                .send(SessionEvent::SearchFinished { generation, result })
                .await;
        });
    }

    /// Fetch the next page against the current cursor. Disabled while a
    /// fetch is already running or once every entry is materialized.
    pub fn show_more(&mut self) {
        if self.page_in_flight.load(Ordering::Relaxed) {
            println!("Still loading more results...");
            return;
        }
        if self.search_in_flight.load(Ordering::Relaxed) {
            println!("A search is in progress, hold on.");
            return;
        }

        let snapshot = self.store.snapshot();
        if snapshot.is_empty() {
            println!("Nothing to page through. Run a search first.");
            return;
        }
        if snapshot.is_exhausted() {
            println!("All {} results are already shown.", snapshot.len());
            return;
        }

        self.page_in_flight.store(true, Ordering::Relaxed);

        let client = self.client.clone();
        let events_tx = self.events_tx.clone();
        let generation = snapshot.generation;
        let cursor = snapshot.cursor;
        let page_size = snapshot.page_size;
        let ranking = snapshot.full_ranking.clone();
        tokio::spawn(async move {
            let result = client.fetch_page(&ranking, cursor, page_size).await;
            let _ = events_tx
                .send(SessionEvent::PageFinished { generation, result })
                .await;
        });
    }

    /// Commit a completion into the store. Returns true when the result list
    /// changed and should be re-rendered.
    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::SearchFinished { generation, result } => {
                self.search_in_flight.store(false, Ordering::Relaxed);
                match result {
                    Ok(outcome) => {
                        let committed = self.store.commit_search(
                            generation,
                            outcome.ranking,
                            outcome.first_page,
                        );
                        if committed {
                            println!("Search completed successfully");
                            true
                        } else {
                            // A newer search took over while this one ran
                            false
                        }
                    }
                    Err(e) => {
                        self.store.reset_if_current(generation);
                        eprintln!("{}", e);
                        println!("Failed to perform search, please try again");
                        true
                    }
                }
            }
            SessionEvent::PageFinished { generation, result } => {
                self.page_in_flight.store(false, Ordering::Relaxed);
                match result {
                    Ok(page) => self.store.commit_page(generation, page),
                    Err(e) => {
                        eprintln!("Failed to load more results: {}", e);
                        false
                    }
                }
            }
        }
    }

    /// Toggle playback of a result row (1-based index as displayed).
    /// Toggling the playing row off stops and drops its sink.
    pub fn toggle_play(&mut self, index: usize) {
        let snapshot = self.store.snapshot();
        let Some(result) = index.checked_sub(1).and_then(|i| snapshot.materialized.get(i)) else {
            println!("No result #{} to play.", index);
            return;
        };

        if self.playing_row == Some(index) {
            self.stop_playback();
            println!("Stopped playback.");
        } else {
            self.playback.play_clip(&result.audio);
            self.playing_row = Some(index);
            println!("Playing #{} '{}'", index, result.entry.id);
        }
    }

    pub fn playing_row(&self) -> Option<usize> {
        self.playing_row
    }

    /// Write a result row's audio into the export directory
    pub fn save(&self, index: usize) {
        let snapshot = self.store.snapshot();
        let Some(result) = index.checked_sub(1).and_then(|i| snapshot.materialized.get(i)) else {
            println!("No result #{} to save.", index);
            return;
        };

        match export::save_result(result, &self.export_dir) {
            Ok(path) => println!("Saved '{}' to {}", result.entry.id, path.display()),
            Err(e) => eprintln!("Failed to save result: {}", e),
        }
    }

    /// Probe the remote service and report what it says
    pub async fn health(&self) {
        match self.client.health().await {
            Ok(health) => println!(
                "Service is {} with {} reference sounds indexed",
                health.status, health.reference_files
            ),
            Err(e) => eprintln!("Service health check failed: {}", e),
        }
    }

    fn stop_playback(&mut self) {
        if self.playing_row.take().is_some() {
            self.playback.stop();
        }
    }

    /// Release the microphone and any playing audio on the way out
    pub fn shutdown(&mut self) {
        if self.capture.is_active() {
            let _ = self.capture.stop(&self.upload_filename);
        }
        self.stop_playback();
    }
}
