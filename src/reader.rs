use anyhow::Result;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tracing::{debug, warn};

/// Configuration for input reading behavior
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Whether to fail fast on first error or record it and continue
    pub fail_fast: bool,
    /// Buffer size for async reading (default: 8KB)
    pub buffer_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            buffer_size: 8192,
        }
    }
}

/// Statistics for one read
#[derive(Debug, Clone)]
pub struct ReadStats {
    pub file_path: String,
    pub bytes_read: u64,
    pub duration_ms: u64,
    pub read_error: Option<String>,
}

/// Async reader returning whole documents
/// WHY: line endings and blank lines must survive cleaning byte for byte, so no line splitting
pub struct AsyncFileReader {
    config: ReaderConfig,
}

impl AsyncFileReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Read a UTF-8 file completely
    /// Without fail_fast, errors come back as empty content plus `read_error`
    pub async fn read_file<P: AsRef<Path>>(&self, file_path: P) -> Result<(String, ReadStats)> {
        let path = file_path.as_ref();
        let start_time = std::time::Instant::now();

        debug!("Starting async read of file: {}", path.display());

        let outcome = match File::open(path).await {
            Ok(file) => read_all(file, self.config.buffer_size)
                .await
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e)),
            Err(e) => Err(format!("Failed to open file {}: {}", path.display(), e)),
        };

        let duration_ms = start_time.elapsed().as_millis() as u64;
        match outcome {
            Ok(content) => {
                let stats = ReadStats {
                    file_path: path.display().to_string(),
                    bytes_read: content.len() as u64,
                    duration_ms,
                    read_error: None,
                };
                debug!("Read {}: {} bytes in {}ms", path.display(), stats.bytes_read, duration_ms);
                Ok((content, stats))
            }
            Err(error_msg) => {
                warn!("{}", error_msg);
                if self.config.fail_fast {
                    return Err(anyhow::anyhow!(error_msg));
                }
                let stats = ReadStats {
                    file_path: path.display().to_string(),
                    bytes_read: 0,
                    duration_ms,
                    read_error: Some(error_msg),
                };
                Ok((String::new(), stats))
            }
        }
    }
}

async fn read_all<R: AsyncRead + Unpin>(source: R, buffer_size: usize) -> std::io::Result<String> {
    let mut reader = BufReader::with_capacity(buffer_size, source);
    let mut content = String::new();
    reader.read_to_string(&mut content).await?;
    Ok(content)
}

/// Read all of standard input as UTF-8
pub async fn read_stdin() -> Result<String> {
    let content = read_all(tokio::io::stdin(), ReaderConfig::default().buffer_size).await?;
    debug!("Read {} bytes from stdin", content.len());
    Ok(content)
}
