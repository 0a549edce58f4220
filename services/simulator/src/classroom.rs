//! Classroom Seed Data
//!
//! Loads the roster, teacher, moderator and lesson from a JSON file, or falls
//! back to the built-in fractions lesson shipped with the binary.

use classroom_core::Classroom;
use std::path::{Path, PathBuf};

const BUILT_IN: &str = include_str!("../classroom.json");

#[derive(Debug, thiserror::Error)]
pub enum ClassroomError {
    #[error("Failed to read classroom file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid classroom data in {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_json::Error,
    },
}

/// The classroom bundled with the simulator.
pub fn built_in() -> Result<Classroom, ClassroomError> {
    parse(BUILT_IN, "built-in classroom")
}

/// Reads a classroom from `path`, or the built-in one when `path` is `None`.
pub fn load(path: Option<&Path>) -> Result<Classroom, ClassroomError> {
    let Some(path) = path else {
        return built_in();
    };
    let content = std::fs::read_to_string(path).map_err(|source| ClassroomError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content, &path.display().to_string())
}

fn parse(content: &str, origin: &str) -> Result<Classroom, ClassroomError> {
    serde_json::from_str(content).map_err(|source| ClassroomError::Parse {
        origin: origin.to_string(),
        source,
    })
}
