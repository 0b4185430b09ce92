use serde::{Deserialize, Serialize};

/// Fallback base URL for a locally running similarity service
pub const DEFAULT_BASE_URL: &str = "http://localhost:3002";

/// Configuration for reaching the remote similarity service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the deployment (local or hosted); the only value that
    /// varies between deployments
    pub base_url: String,
    /// Overall request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

/// Microphone capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Maximum recording duration in seconds; capture stops itself past this
    pub max_recording_duration_secs: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_recording_duration_secs: 60,
        }
    }
}

/// Search and pagination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of results materialized per page
    pub page_size: usize,
    /// Multipart field name the service expects the clip under
    pub upload_field: String,
    /// Filename attached to the uploaded clip
    pub upload_filename: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            upload_field: "audio_file".to_string(),
            upload_filename: "user_input.wav".to_string(),
        }
    }
}

/// Result playback and feedback-tone configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Master switch for all audio output
    pub enabled: bool,
    /// Output volume (0.0 - 1.0)
    pub volume: f32,
    /// Whether to play short tones when recording starts/stops
    pub feedback_tones: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.8,
            feedback_tones: true,
        }
    }
}

/// Where exported result audio lands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory result files are written into
    pub output_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: "downloads".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote similarity service
    pub service: ServiceConfig,
    /// Microphone capture
    pub capture: CaptureConfig,
    /// Search and pagination
    pub search: SearchConfig,
    /// Playback and feedback tones
    pub playback: PlaybackConfig,
    /// Result export
    pub export: ExportConfig,
}

/// Helper function to read the application configuration
pub fn read_app_config() -> AppConfig {
    match std::fs::read_to_string("config.toml") {
        Ok(config_str) => match toml::from_str(&config_str) {
            Ok(config) => config,
            Err(e) => {
                println!(
                    "Failed to parse config.toml: {}. Using default configuration.",
                    e
                );
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    }
}
