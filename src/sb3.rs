use crate::project::Program;
use std::fs;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::ZipArchive;

pub const PROJECT_ENTRY: &str = "project.json";

/// Everything that can go wrong before generation starts.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read '{path}'.")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Not a valid zip/.sb3 archive.")]
    Archive(#[source] zip::result::ZipError),
    #[error("project.json not found in archive.")]
    MissingProjectJson,
    #[error("Failed to read project.json from archive.")]
    Entry(#[source] std::io::Error),
    #[error("Invalid project.json.")]
    Json(#[source] serde_json::Error),
}

/// Loads a program from a `.sb3` archive or a bare `project.json` file.
pub fn load_project(path: &Path) -> Result<Program, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if is_json_path(path) || !looks_like_zip(&bytes) {
        return parse_project_json(&bytes);
    }
    load_sb3_bytes(&bytes)
}

pub fn load_sb3(path: &Path) -> Result<Program, LoadError> {
    let file = fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_archive(file)
}

pub fn load_sb3_bytes(bytes: &[u8]) -> Result<Program, LoadError> {
    read_archive(Cursor::new(bytes))
}

pub fn parse_project_json(bytes: &[u8]) -> Result<Program, LoadError> {
    serde_json::from_slice(bytes).map_err(LoadError::Json)
}

/// Root label for a project file: the file name without directory or extension.
pub fn project_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

fn read_archive<R: Read + Seek>(reader: R) -> Result<Program, LoadError> {
    let mut zip = ZipArchive::new(reader).map_err(LoadError::Archive)?;
    let mut entry = zip
        .by_name(PROJECT_ENTRY)
        .map_err(|_| LoadError::MissingProjectJson)?;
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).map_err(LoadError::Entry)?;
    parse_project_json(&bytes)
}

fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn looks_like_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK")
}
