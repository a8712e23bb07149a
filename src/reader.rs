//! Notes directory scanner and document reader.
//!
//! [`scan_notes`] walks the configured raw-notes directory and returns
//! candidate files in a stable order; [`read_file`] turns one file into
//! plain text. Unsupported formats are not errors: they read as empty
//! text and are logged.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::NotesConfig;
use crate::extract;

/// Recognised note formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteFormat {
    PlainText,
    Markdown,
    WordDocument,
}

impl NoteFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(NoteFormat::PlainText),
            "md" => Some(NoteFormat::Markdown),
            "docx" => Some(NoteFormat::WordDocument),
            _ => None,
        }
    }
}

/// A file found in the notes directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFile {
    pub path: PathBuf,
    /// Path relative to the notes root, used for ordering and reporting.
    pub relative_path: String,
}

/// List the files under the notes root, sorted by relative path.
///
/// Hidden files (leading `.`) and anything matching `exclude_globs` are
/// left out. Files with unsupported extensions are still returned so the
/// reader can report them.
pub fn scan_notes(config: &NotesConfig) -> Result<Vec<NoteFile>> {
    let root = &config.raw_dir;
    if !root.exists() {
        bail!("Notes directory does not exist: {}", root.display());
    }

    let exclude_set = build_globset(&config.exclude_globs)?;

    let mut walker = WalkDir::new(root).min_depth(1);
    if !config.recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    let visible = walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
    for entry in visible {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            tracing::debug!(file = %rel_str, "excluded by glob");
            continue;
        }

        files.push(NoteFile {
            path: path.to_path_buf(),
            relative_path: rel_str,
        });
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok(files)
}

/// Read a note file as plain text.
///
/// `.txt` and `.md` are read verbatim; `.docx` paragraphs are joined with
/// newlines. Any other extension yields an empty string and a warning.
pub fn read_file(path: &Path) -> Result<String> {
    let Some(format) = NoteFormat::from_path(path) else {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        tracing::warn!(file = %path.display(), extension = %ext, "unsupported file type, skipping");
        return Ok(String::new());
    };

    match format {
        NoteFormat::PlainText | NoteFormat::Markdown => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read note: {}", path.display())),
        NoteFormat::WordDocument => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read note: {}", path.display()))?;
            extract::extract_docx(&bytes)
                .with_context(|| format!("Failed to extract text from {}", path.display()))
        }
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
