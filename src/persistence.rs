//! Per-chunk persistence: one file per chunk under a configured directory,
//! holding the serialized chunk bytes, optionally behind a length-prefixed
//! lz4 wrapper.

use crate::voxel::{Chunk, ChunkDataError};
use glam::IVec3;
use lz4_flex::block::{compress_prepend_size, decompress_size_prepended};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

pub struct ChunkStore {
    directory: PathBuf,
    compress: bool,
}

impl ChunkStore {
    /// Open a store rooted at `directory`, creating it (recursively) if
    /// needed. Opening an existing directory is a no-op.
    pub fn open(directory: impl Into<PathBuf>, compress: bool) -> io::Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self { directory, compress })
    }

    #[inline]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File name for a chunk position, sign-preserving decimal.
    pub fn chunk_file_name(position: IVec3) -> String {
        format!("chunk_{}_{}_{}.dat", position.x, position.y, position.z)
    }

    pub fn path_for(&self, position: IVec3) -> PathBuf {
        self.directory.join(Self::chunk_file_name(position))
    }

    /// Whether a save exists for the given chunk position.
    pub fn contains(&self, position: IVec3) -> bool {
        self.path_for(position).exists()
    }

    /// Persist a chunk's serialized bytes.
    pub fn save(&self, chunk: &Chunk) -> io::Result<()> {
        let serialized = chunk.serialize();
        let bytes = if self.compress {
            let compressed = compress_prepend_size(&serialized);
            let mut framed = Vec::with_capacity(4 + compressed.len());
            framed.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
            framed.extend_from_slice(&compressed);
            framed
        } else {
            serialized
        };
        fs::write(self.path_for(chunk.position()), bytes)
    }

    /// Load a chunk's saved bytes into `chunk`, if a save exists.
    ///
    /// Returns `Ok(false)` when there is nothing usable on disk: no file,
    /// or a file whose header names a different chunk (logged as a
    /// warning, chunk untouched). Corrupt payloads and filesystem
    /// failures return `Err`; the chunk is left all-air in the payload
    /// case.
    pub fn load_into(&self, chunk: &mut Chunk) -> io::Result<bool> {
        let position = chunk.position();
        let path = self.path_for(position);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
            Err(err) => {
                log::error!("failed to read chunk file {}: {err}", path.display());
                return Err(err);
            }
        };

        let serialized = if self.compress {
            self.unwrap_compressed(&bytes, &path)?
        } else {
            bytes
        };

        match chunk.deserialize(&serialized) {
            Ok(()) => Ok(true),
            Err(err @ ChunkDataError::HeaderMismatch { .. }) => {
                log::warn!("chunk file {} ignored: {err}", path.display());
                Ok(false)
            }
            Err(err) => {
                log::error!("chunk file {} is corrupt: {err}", path.display());
                Err(io::Error::new(ErrorKind::InvalidData, err.to_string()))
            }
        }
    }

    /// Strip the `[u32 LE compressed_len][compressed_bytes]` frame and
    /// decompress.
    fn unwrap_compressed(&self, bytes: &[u8], path: &Path) -> io::Result<Vec<u8>> {
        let invalid = |reason: String| {
            log::error!("chunk file {} is corrupt: {reason}", path.display());
            io::Error::new(ErrorKind::InvalidData, reason)
        };

        if bytes.len() < 4 {
            return Err(invalid("missing compression length prefix".into()));
        }
        let declared = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        let compressed = &bytes[4..];
        if compressed.len() != declared {
            return Err(invalid(format!(
                "compressed length prefix says {declared} bytes, file holds {}",
                compressed.len()
            )));
        }
        decompress_size_prepended(compressed).map_err(|err| invalid(err.to_string()))
    }
}
