use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{PACK_DIR_PREFIX, SUMMARY_FILE};
use crate::timeutil::filename_stamp;
use crate::window::TimeWindow;

/// One gather invocation. Fixed once the window has been resolved.
#[derive(Debug, Clone)]
pub struct GatherSession {
    pub started_at: NaiveDateTime,
    pub window: TimeWindow,
    pub pack_dir: PathBuf,
}

pub fn pack_dir_name(started_at: NaiveDateTime) -> String {
    format!("{PACK_DIR_PREFIX}{}", filename_stamp(started_at))
}

impl GatherSession {
    /// Create `<store_dir>/gather_pack_<timestamp>`, creating `store_dir` too
    /// when it does not exist yet.
    pub fn start(store_dir: &Path, window: TimeWindow, started_at: NaiveDateTime) -> Result<Self> {
        if !store_dir.exists() {
            tracing::warn!(
                store_dir = %store_dir.display(),
                "store dir does not exist, creating it"
            );
        }
        let pack_dir = store_dir.join(pack_dir_name(started_at));
        fs::create_dir_all(&pack_dir)
            .with_context(|| format!("Failed to create pack dir {}", pack_dir.display()))?;
        tracing::info!(pack_dir = %pack_dir.display(), window = %window, "gather session started");
        Ok(Self {
            started_at,
            window,
            pack_dir,
        })
    }

    pub fn from_time(&self) -> String {
        self.window.from_time_str()
    }

    pub fn to_time(&self) -> String {
        self.window.to_time_str()
    }

    pub fn summary_path(&self) -> PathBuf {
        self.pack_dir.join(SUMMARY_FILE)
    }
}
