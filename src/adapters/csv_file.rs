//! CSV file record sink.
//!
//! Implements [`RecordSink`] by appending one line per record to the event
//! log file.  The file is opened in append mode per record and closed
//! again, so a power cut loses at most the line being written.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::warn;

use crate::app::ports::RecordSink;
use crate::error::LogWriteError;
use crate::event_log::LogRecord;

/// Mount the `storage` FAT partition at `/spiflash` (wear-levelled),
/// formatting it on first use.
#[cfg(target_os = "espidf")]
pub fn mount_spiflash() -> Result<(), LogWriteError> {
    use esp_idf_svc::sys::*;

    let mount_cfg = esp_vfs_fat_mount_config_t {
        format_if_mount_failed: true,
        max_files: 2,
        allocation_unit_size: 4096,
        ..Default::default()
    };
    let mut wl_handle: wl_handle_t = 0;
    // SAFETY: static null-terminated strings; called once from main()
    // before the writer thread starts.
    let ret = unsafe {
        esp_vfs_fat_spiflash_mount_rw_wl(
            b"/spiflash\0".as_ptr() as *const _,
            b"storage\0".as_ptr() as *const _,
            &mount_cfg,
            &mut wl_handle,
        )
    };
    if ret != ESP_OK {
        warn!("event log: FAT mount failed ({})", ret);
        return Err(LogWriteError::Open);
    }
    log::info!("event log: /spiflash mounted");
    Ok(())
}

pub struct FileRecordSink {
    path: PathBuf,
}

impl FileRecordSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for FileRecordSink {
    fn append(&mut self, record: &LogRecord) -> Result<(), LogWriteError> {
        let line = record.to_csv_line()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                warn!("event log: open {} failed: {}", self.path.display(), e);
                LogWriteError::Open
            })?;
        file.write_all(&line).map_err(|e| {
            warn!("event log: write failed: {}", e);
            LogWriteError::Io
        })
    }
}
