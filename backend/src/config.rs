use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Origins allowed to call the API with credentials.
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://asbisindo.vocasia.id",
    "http://asbisindo.vocasia.id",
    "http://localhost:8000",
    "http://127.0.0.1:8000",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// Absolute-URL prefix used to build artifact links.
    pub base_url: String,
    pub renderer_url: String,
    pub storage_dir: PathBuf,
    /// Durable storage is a persistent mount and is never swept.
    pub durable_storage: bool,
    pub records_file: PathBuf,
    pub max_html_bytes: usize,
    pub max_dimension: f64,
    pub render_workers: usize,
    pub render_timeout: Duration,
    pub cache_capacity: usize,
    pub artifact_ttl: Duration,
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8090".to_string(),
            base_url: "http://localhost:8090".to_string(),
            renderer_url: "http://localhost:32180".to_string(),
            storage_dir: PathBuf::from("static"),
            durable_storage: false,
            records_file: PathBuf::from("data/certificates.json"),
            max_html_bytes: 1024 * 1024,
            max_dimension: 2000.0,
            render_workers: 2,
            render_timeout: Duration::from_secs(120),
            cache_capacity: 64,
            artifact_ttl: Duration::from_secs(3600),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!("Invalid value for {}: {:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| {
            let v = v.trim().to_ascii_lowercase();
            v == "1" || v == "true" || v == "yes"
        })
        .unwrap_or(false)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let allowed_origins = match std::env::var("CERTGEN_ALLOWED_ORIGINS") {
            Ok(raw) => {
                let list: Vec<String> = raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if list.is_empty() {
                    defaults.allowed_origins.clone()
                } else {
                    list
                }
            }
            Err(_) => defaults.allowed_origins.clone(),
        };

        Self {
            bind_addr: env_string("CERTGEN_BIND", &defaults.bind_addr),
            base_url: env_string("BASE_URL", &defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            renderer_url: env_string("CERTGEN_RENDERER_URL", &defaults.renderer_url)
                .trim_end_matches('/')
                .to_string(),
            storage_dir: PathBuf::from(env_string("CERTGEN_STORAGE_DIR", "static")),
            durable_storage: env_flag("CERTGEN_DURABLE_STORAGE"),
            records_file: PathBuf::from(env_string(
                "CERTGEN_RECORDS_FILE",
                "data/certificates.json",
            )),
            max_html_bytes: env_parse("CERTGEN_MAX_HTML_BYTES", defaults.max_html_bytes),
            max_dimension: env_parse("CERTGEN_MAX_DIMENSION", defaults.max_dimension),
            render_workers: env_parse("CERTGEN_RENDER_WORKERS", defaults.render_workers).max(1),
            render_timeout: Duration::from_secs(env_parse("CERTGEN_RENDER_TIMEOUT_SECS", 120u64)),
            cache_capacity: env_parse("CERTGEN_CACHE_CAPACITY", defaults.cache_capacity).max(1),
            artifact_ttl: Duration::from_secs(env_parse("CERTGEN_ARTIFACT_TTL_SECS", 3600u64)),
            allowed_origins,
        }
    }
}
