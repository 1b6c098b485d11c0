//! Where the price CSV comes from.
//!
//! The dashboard reads one remote CSV by default. A local file can stand in
//! for it (offline use, tests).

use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::info;

use crate::error::AppError;

/// Published location of the food price dataset.
pub const DEFAULT_DATASET_URL: &str =
    "https://raw.githubusercontent.com/livinjohn27/DSPL_ICW/refs/heads/main/Final_Food_Prices.csv";

const URL_ENV: &str = "FOOD_PRICES_URL";
const TIMEOUT_ENV: &str = "FOOD_PRICES_TIMEOUT_SECS";

/// Anything that can produce the raw CSV text.
pub trait CsvSource {
    /// Short description for status lines and logs.
    fn describe(&self) -> String;

    /// Fetch the full CSV body.
    fn read_csv(&self) -> Result<String, AppError>;
}

/// Resolved loader settings (flags > environment > defaults).
#[derive(Debug, Clone, PartialEq)]
pub struct LoadConfig {
    pub url: String,
    pub file: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATASET_URL.to_string(),
            file: None,
            timeout: None,
        }
    }
}

impl LoadConfig {
    /// Build settings from `.env` / process environment, then apply CLI overrides.
    pub fn from_env(url: Option<String>, file: Option<PathBuf>) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let env_url = std::env::var(URL_ENV).ok().filter(|s| !s.trim().is_empty());
        let timeout = match std::env::var(TIMEOUT_ENV) {
            Ok(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| {
                    AppError::invalid_input(format!(
                        "{TIMEOUT_ENV} must be a whole number of seconds (got '{raw}')."
                    ))
                })?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        Ok(Self {
            url: url
                .or(env_url)
                .unwrap_or_else(|| DEFAULT_DATASET_URL.to_string()),
            file,
            timeout,
        })
    }

    /// Pick the concrete source: a local file wins over the URL.
    pub fn into_source(self) -> Result<Box<dyn CsvSource>, AppError> {
        match self.file {
            Some(path) => Ok(Box::new(FileSource::new(path))),
            None => Ok(Box::new(HttpSource::new(self.url, self.timeout)?)),
        }
    }
}

/// Blocking HTTP GET of a fixed URL.
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, AppError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::load(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl CsvSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn read_csv(&self) -> Result<String, AppError> {
        info!(url = %self.url, "fetching dataset");
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| AppError::load(format!("Dataset request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::load(format!(
                "Dataset request failed with status {}.",
                resp.status()
            )));
        }

        resp.text()
            .map_err(|e| AppError::load(format!("Failed to read dataset body: {e}")))
    }
}

/// A CSV file on disk.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CsvSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_csv(&self) -> Result<String, AppError> {
        info!(path = %self.path.display(), "reading dataset file");
        std::fs::read_to_string(&self.path).map_err(|e| {
            AppError::load(format!(
                "Failed to read CSV '{}': {e}",
                self.path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn file_source_reports_missing_file_as_load_error() {
        let source = FileSource::new("definitely/not/here.csv");
        let err = source.read_csv().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
        assert!(err.to_string().contains("definitely/not/here.csv"));
    }

    #[test]
    fn file_source_reads_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let source = FileSource::new(&path);
        assert_eq!(source.read_csv().unwrap(), "a,b\n1,2\n");
        assert_eq!(source.describe(), path.display().to_string());
    }

    #[test]
    fn explicit_flags_win_over_defaults() {
        let config = LoadConfig::from_env(
            Some("http://localhost/prices.csv".to_string()),
            Some(PathBuf::from("local.csv")),
        )
        .unwrap();
        assert_eq!(config.url, "http://localhost/prices.csv");
        assert_eq!(config.file, Some(PathBuf::from("local.csv")));
    }

    /// Serve one canned HTTP response on a local port and return its URL.
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = [0u8; 1024];
                let _ = stream.read(&mut request);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/prices.csv")
    }

    fn http(url: &str) -> HttpSource {
        HttpSource::new(url, Some(Duration::from_secs(5))).unwrap()
    }

    #[test]
    fn http_source_returns_body_on_success() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 8\r\nConnection: close\r\n\r\na,b\n1,2\n");
        let source = http(&url);
        assert_eq!(source.read_csv().unwrap(), "a,b\n1,2\n");
        assert_eq!(source.describe(), url);
    }

    #[test]
    fn http_error_status_is_a_load_error() {
        let url = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let err = http(&url).read_csv().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
        assert!(err.to_string().contains("404"), "{err}");
    }

    #[test]
    fn unreachable_host_is_a_load_error() {
        // Bind then drop to get a port with nothing listening.
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let err = http(&format!("http://{addr}/prices.csv")).read_csv().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
        assert!(err.to_string().starts_with("Dataset request failed"), "{err}");
    }
}
