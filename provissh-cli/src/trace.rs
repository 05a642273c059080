//! Per-batch wire transcript file.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use provissh::TranscriptSink;

/// Appends every SEND/RECV on the wire to a timestamped log file.
///
/// One instance per batch run, injected into the engine at construction;
/// write failures are swallowed — a full disk must not take the batch
/// down with it.
pub struct FileTranscript {
    file: Mutex<File>,
    path: PathBuf,
}

impl FileTranscript {
    /// Create `provissh_<timestamp>.log` under `dir`.
    pub fn create(dir: &Path) -> io::Result<Self> {
        let name = format!("provissh_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
        let path = dir.join(name);
        let file = File::create(&path)?;
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn line(&self, direction: &str, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(
                file,
                "{} - {direction}: {payload}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
            );
        }
    }
}

impl TranscriptSink for FileTranscript {
    fn sent(&self, text: &str) {
        self.line("SEND", &format!("{text:?}"));
    }

    fn received(&self, data: &[u8]) {
        self.line("RECV", &format!("{:?}", String::from_utf8_lossy(data)));
    }
}
