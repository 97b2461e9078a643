//! Tabular summary of a gather run.

use bytesize::ByteSize;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use crate::runner::GatheredArtifact;

pub const SUMMARY_BANNER: &str = "Gather AWR Summary:";
pub const SUMMARY_HEADERS: [&str; 5] = ["Cluster", "Status", "Size", "Time", "PackPath"];

// Header cells get this much extra room, matching common grid table layouts.
const HEADER_PADDING: usize = 2;

pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

pub fn summary_row(artifact: &GatheredArtifact) -> Vec<String> {
    let (status, pack_path) = if artifact.is_error {
        ("Error", format!("Error:{}", artifact.error_message))
    } else {
        (
            "Completed",
            artifact
                .local_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        )
    };
    vec![
        artifact.cluster_name.clone(),
        status.to_string(),
        format_size(artifact.size_bytes),
        format!("{} s", artifact.elapsed_seconds),
        pack_path,
    ]
}

/// Render the summary banner and grid, one row per artifact in the given order.
pub fn render_summary(artifacts: &[GatheredArtifact]) -> String {
    let rows: Vec<Vec<String>> = artifacts.iter().map(summary_row).collect();
    format!("\n{SUMMARY_BANNER}\n{}", render_grid(&SUMMARY_HEADERS, &rows))
}

pub fn render_grid(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|h| h.chars().count() + HEADER_PADDING)
        .collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = vec![grid_rule(&widths, '-')];
    lines.push(grid_line(&widths, headers.iter().copied()));
    lines.push(grid_rule(&widths, '='));
    for row in rows {
        lines.push(grid_line(&widths, row.iter().map(String::as_str)));
        lines.push(grid_rule(&widths, '-'));
    }
    lines.join("\n")
}

fn grid_rule(widths: &[usize], fill: char) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.extend(std::iter::repeat(fill).take(width + 2));
        line.push('+');
    }
    line
}

fn grid_line<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (width, cell) in widths.iter().zip(cells) {
        let pad = width.saturating_sub(cell.chars().count());
        line.push(' ');
        line.push_str(cell);
        line.extend(std::iter::repeat(' ').take(pad + 1));
        line.push('|');
    }
    line
}

/// Append the rendered summary to `path`, creating it on first use.
pub fn append_summary(path: &Path, rendered: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(rendered.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}
