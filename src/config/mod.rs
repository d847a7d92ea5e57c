use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Execution mode, controls CORS strictness and error-detail verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Production,
}

impl RunMode {
    fn from_env() -> Self {
        match env::var("APP_ENV") {
            Ok(v) if v.eq_ignore_ascii_case("production") => RunMode::Production,
            _ => RunMode::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Development => "development",
            RunMode::Production => "production",
        }
    }
}

/// Conversion service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Execution mode (default: development)
    pub mode: RunMode,

    /// Listening port (default: 3000)
    pub port: u16,

    /// Allowed CORS origins in production mode (comma separated)
    pub allowed_origins: Vec<String>,

    /// Base directory for staging and converted output (default: ./storage)
    pub storage_root: PathBuf,

    /// Maximum size per uploaded file in bytes (default: 10 MB)
    pub max_file_size: usize,

    /// Maximum number of files per conversion request (default: 10)
    pub max_files_per_request: usize,

    /// Maximum age before staged/converted files are reaped (default: 1 hour)
    pub retention_max_age: Duration,

    /// Interval between retention sweeps (default: 1 hour)
    pub sweep_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Development,
            port: 3000,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
            storage_root: PathBuf::from("./storage"),
            max_file_size: 10 * 1024 * 1024, // 10 MB
            max_files_per_request: 10,
            retention_max_age: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(3600),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            mode: RunMode::from_env(),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),

            storage_root: env::var("STORAGE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.storage_root),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            max_files_per_request: env::var("MAX_FILES_PER_REQUEST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_files_per_request),

            retention_max_age: env::var("RETENTION_MAX_AGE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.retention_max_age),

            sweep_interval: env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.sweep_interval),
        }
    }

    /// Create config for development (permissive CORS, local storage)
    pub fn development() -> Self {
        Self {
            mode: RunMode::Development,
            ..Self::default()
        }
    }

    /// Create config for production (origin allowlist enforced)
    pub fn production() -> Self {
        Self {
            mode: RunMode::Production,
            ..Self::from_env()
        }
    }

    pub fn is_development(&self) -> bool {
        self.mode == RunMode::Development
    }

    /// Staging directory for uploaded files awaiting conversion
    pub fn uploads_dir(&self) -> PathBuf {
        self.storage_root.join("uploads")
    }

    /// Output directory for converted JPEG artifacts
    pub fn converted_dir(&self) -> PathBuf {
        self.storage_root.join("converted")
    }

    /// Request body ceiling: every file at its maximum plus multipart overhead
    pub fn body_limit(&self) -> usize {
        self.max_files_per_request * self.max_file_size + 10 * 1024 * 1024
    }
}
