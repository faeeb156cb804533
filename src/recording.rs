// src/recording.rs
//
// Recorded input sessions: JSON arrays of InputEvents, one file per session.

use crate::types::InputEvent;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

const RECORDING_EXTENSIONS: [&str; 2] = ["json", "JSON"];

/// All recording files below `input_dir`, sorted by path.
pub fn find_recording_files(input_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut recordings = Vec::new();

    for entry in WalkDir::new(input_dir.as_ref())
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(ext) = path.extension() {
            if RECORDING_EXTENSIONS.contains(&ext.to_str().unwrap_or("")) {
                recordings.push(path.to_path_buf());
            }
        }
    }

    recordings.sort();
    info!("Found {} recording file(s)", recordings.len());
    Ok(recordings)
}

pub fn load_recording(path: impl AsRef<Path>) -> Result<Vec<InputEvent>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading recording {}", path.display()))?;
    let events: Vec<InputEvent> = serde_json::from_str(&contents)
        .with_context(|| format!("parsing recording {}", path.display()))?;
    Ok(events)
}
