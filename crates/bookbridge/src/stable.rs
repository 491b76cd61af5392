//! Owned snapshots for values that cross the task boundary.
//!
//! Worker closures never borrow from the caller: path and buffer arguments
//! are copied into these owned types on the calling thread before an
//! operation is admitted, and engine-owned output buffers are copied out
//! while the handle is still locked. Async entry points take
//! `impl Into<StablePath>` or `impl Into<StableBytes>`, which makes the
//! snapshot point explicit in every signature.

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Owned path snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StablePath(PathBuf);

impl StablePath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl Deref for StablePath {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl From<PathBuf> for StablePath {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&Path> for StablePath {
    fn from(path: &Path) -> Self {
        Self(path.to_path_buf())
    }
}

impl From<&str> for StablePath {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

impl From<String> for StablePath {
    fn from(path: String) -> Self {
        Self(PathBuf::from(path))
    }
}

/// Owned byte-buffer snapshot. Byte-exact in both directions: neither the
/// binding nor the bridge ever re-encodes the contents.
#[derive(Clone, PartialEq, Eq)]
pub struct StableBytes(Vec<u8>);

impl StableBytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for StableBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StableBytes").field("len", &self.0.len()).finish()
    }
}

impl Deref for StableBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for StableBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for StableBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for StableBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_snapshot_is_owned() {
        let source = String::from("reports/q3.bbk");
        let stable = StablePath::from(source.as_str());
        drop(source);
        assert_eq!(stable.as_path(), Path::new("reports/q3.bbk"));
    }

    #[test]
    fn test_bytes_snapshot_is_byte_exact() {
        let source = vec![0x00, 0xFF, 0x42, 0x42];
        let stable = StableBytes::from(source.as_slice());
        assert_eq!(stable.as_slice(), &[0x00, 0xFF, 0x42, 0x42]);
        assert_eq!(stable.into_vec(), source);
    }

    #[test]
    fn test_bytes_debug_prints_length_not_content() {
        let stable = StableBytes::from(vec![1u8; 4096]);
        assert_eq!(format!("{:?}", stable), "StableBytes { len: 4096 }");
    }
}
