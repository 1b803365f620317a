use glam::IVec3;
use std::fmt;
use std::io;

/// Failures surfaced by the world API. None of these abort the process;
/// the host decides severity.
#[derive(Debug)]
pub enum WorldError {
    /// A configuration value is outside its accepted range.
    InvalidConfig(String),
    /// A mutation targeted a chunk outside the residency window.
    ChunkNotResident(IVec3),
    /// Filesystem failure from the persistence layer.
    Io(io::Error),
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::InvalidConfig(reason) => write!(f, "invalid configuration: {reason}"),
            WorldError::ChunkNotResident(position) => {
                write!(f, "chunk {position} is not resident")
            }
            WorldError::Io(err) => write!(f, "filesystem error: {err}"),
        }
    }
}

impl std::error::Error for WorldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorldError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for WorldError {
    fn from(err: io::Error) -> Self {
        WorldError::Io(err)
    }
}
