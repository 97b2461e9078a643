use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::constants::REPORT_FILE_EXT;
use crate::error::GatherError;
use crate::ocp::ControlPlane;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedReport {
    pub path: PathBuf,
    pub size_bytes: u64,
}

pub fn report_path(pack_dir: &Path, report_name: &str) -> PathBuf {
    pack_dir.join(format!("{report_name}.{REPORT_FILE_EXT}"))
}

/// Fetch a report into the pack directory. A partially written file is
/// removed when the transfer fails.
pub fn download_report(
    control_plane: &dyn ControlPlane,
    pack_dir: &Path,
    report_name: &str,
    report_id: i64,
) -> Result<DownloadedReport, GatherError> {
    let path = report_path(pack_dir, report_name);
    tracing::debug!(report = %report_name, report_id, path = %path.display(), "downloading report");

    let file = File::create(&path).map_err(|err| {
        GatherError::DownloadError(format!("failed to create {}: {err}", path.display()))
    })?;
    let mut writer = BufWriter::new(file);
    let transfer = control_plane
        .fetch_report(report_id, &mut writer)
        .and_then(|_| writer.flush().map_err(GatherError::from));
    drop(writer);
    if let Err(err) = transfer {
        let _ = fs::remove_file(&path);
        return Err(match err {
            GatherError::Io(io) => GatherError::DownloadError(io.to_string()),
            other => other,
        });
    }

    let size_bytes = fs::metadata(&path)
        .map_err(|err| GatherError::DownloadError(format!("failed to stat {}: {err}", path.display())))?
        .len();
    Ok(DownloadedReport { path, size_bytes })
}
