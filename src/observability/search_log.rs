//! Append-only log of download requests.
//!
//! Each line records `[timestamp] IP: <ip> | URL: <url>`. Once the file grows
//! past `max_bytes` it is renamed to `<stem>_<YYYY-MM-DD>.<ext>` and a fresh
//! file is started.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::SearchLogConfig;

/// Written at the top of every new log file.
pub const LOG_HEADER: &str = "Link Proxy Search Log\n=================\n";

#[derive(Debug, thiserror::Error)]
pub enum SearchLogError {
    #[error("Search log IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> SearchLogError + '_ {
    move |source| SearchLogError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Request log with size-based rotation.
#[derive(Debug)]
pub struct SearchLog {
    path: PathBuf,
    max_bytes: u64,
    // Appends and rotation must not interleave.
    write_lock: Mutex<()>,
}

impl SearchLog {
    pub fn new(config: &SearchLogConfig) -> Self {
        Self {
            path: PathBuf::from(&config.path),
            max_bytes: config.max_bytes,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry stamped with the current local time.
    pub async fn record(&self, client_ip: Option<IpAddr>, url: &str) -> Result<(), SearchLogError> {
        self.record_at(Local::now(), client_ip, url).await
    }

    /// Append an entry stamped with `at`, rotating afterwards if needed.
    pub async fn record_at(
        &self,
        at: DateTime<Local>,
        client_ip: Option<IpAddr>,
        url: &str,
    ) -> Result<(), SearchLogError> {
        let _guard = self.write_lock.lock().await;

        self.ensure_started().await?;

        let entry = format_entry(at, client_ip, url);
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_err(&self.path))?;
        file.write_all(entry.as_bytes()).await.map_err(io_err(&self.path))?;
        file.flush().await.map_err(io_err(&self.path))?;

        let size = fs::metadata(&self.path)
            .await
            .map_err(io_err(&self.path))?
            .len();
        if size > self.max_bytes {
            self.rotate(at).await?;
        }

        Ok(())
    }

    async fn ensure_started(&self) -> Result<(), SearchLogError> {
        if fs::try_exists(&self.path).await.map_err(io_err(&self.path))? {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_err(parent))?;
        }
        fs::write(&self.path, LOG_HEADER).await.map_err(io_err(&self.path))
    }

    async fn rotate(&self, at: DateTime<Local>) -> Result<(), SearchLogError> {
        let archive = self.free_archive_path(at).await?;
        fs::rename(&self.path, &archive).await.map_err(io_err(&archive))?;
        fs::write(&self.path, LOG_HEADER).await.map_err(io_err(&self.path))?;

        tracing::info!(archive = %archive.display(), "Search log rotated");
        Ok(())
    }

    /// `<stem>_<date>.<ext>`, or `<stem>_<date>_<n>.<ext>` if that already exists.
    async fn free_archive_path(&self, at: DateTime<Local>) -> Result<PathBuf, SearchLogError> {
        let date = at.format("%Y-%m-%d").to_string();
        let mut n = 0u32;
        loop {
            let candidate = archive_path(&self.path, &date, n);
            if !fs::try_exists(&candidate).await.map_err(io_err(&candidate))? {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

/// One log line. Line breaks in the URL are flattened so every entry stays on one line.
pub fn format_entry(at: DateTime<Local>, client_ip: Option<IpAddr>, url: &str) -> String {
    let ip = client_ip
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let url: String = url
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!("[{}] IP: {} | URL: {}\n", at.format("%Y-%m-%d %H:%M:%S"), ip, url)
}

fn archive_path(path: &Path, date: &str, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "search".to_string());
    let suffix = if n == 0 {
        date.to_string()
    } else {
        format!("{}_{}", date, n)
    };
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    };
    path.with_file_name(name)
}
