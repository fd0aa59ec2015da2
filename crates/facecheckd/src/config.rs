use facecheck_core::StorageLayout;
use std::path::PathBuf;

/// Origins allowed by default: the usual local frontend dev servers.
const DEFAULT_CORS_ORIGINS: [&str; 5] = [
    "http://localhost:3000",
    "http://localhost:3001",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// Daemon configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address (default: 0.0.0.0:8000).
    pub bind_addr: String,
    /// Profile-picture collection directory.
    pub profile_dir: PathBuf,
    /// Live-capture collection directory.
    pub live_capture_dir: PathBuf,
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    /// Allowed CORS origins; `*` allows any origin without credentials.
    pub cors_origins: Vec<String>,
    /// ONNX Runtime intra-op threads per session.
    pub intra_threads: usize,
}

impl Config {
    /// Load configuration from `FACECHECK_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("FACECHECK_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| facecheck_core::default_model_dir());

        let cors_origins = std::env::var("FACECHECK_CORS_ORIGINS")
            .map(|v| parse_list(&v))
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect());

        Self {
            bind_addr: std::env::var("FACECHECK_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            profile_dir: env_path("FACECHECK_PROFILE_DIR", "profilePicture"),
            live_capture_dir: env_path("FACECHECK_LIVE_CAPTURE_DIR", "liveCamphotos"),
            model_dir,
            cors_origins,
            intra_threads: env_usize("FACECHECK_INTRA_THREADS", 2).max(1),
        }
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.profile_dir, &self.live_capture_dir)
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list(" http://a:1 , ,http://b:2,"),
            vec!["http://a:1".to_string(), "http://b:2".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_env_usize_fallback() {
        assert_eq!(env_usize("FACECHECK_TEST_UNSET_VARIABLE", 7), 7);
    }
}
