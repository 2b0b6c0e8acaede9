//! Normalized absolute paths used as snapshot keys
//!
//! Every map in the status engine is keyed by [`DatasetPath`]. Two paths that
//! name the same location must compare equal no matter how they were spelled:
//! relative or absolute, with `.`/`..` segments, with backslashes, or through a
//! symlinked parent directory.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

/// An absolute, forward-slash path with `.` and `..` segments resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl DatasetPath {
    /// Create a path from any path-like input, cleaning it lexically.
    ///
    /// No filesystem access takes place. Backslashes become forward slashes,
    /// empty and `.` segments are dropped, and `..` pops the previous segment
    /// (never climbing above the root of an absolute path).
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        Self {
            inner: clean(&raw),
        }
    }

    /// Resolve `input` against `base` into a canonical absolute path.
    ///
    /// Relative input is joined onto `base`. The longest existing ancestor of
    /// the result is canonicalized so that a dataset reached through a
    /// symlinked directory maps onto its real location. The final component is
    /// never resolved: an annexed file is a symlink into the object store, and
    /// it must keep its own identity.
    pub fn resolve(base: &DatasetPath, input: impl AsRef<Path>) -> Self {
        let input = input.as_ref();
        let joined = if input.is_absolute() || input.to_string_lossy().starts_with('/') {
            Self::new(input)
        } else {
            base.join(&input.to_string_lossy())
        };
        joined.canonical_parent()
    }

    /// Fully canonicalize an existing path, resolving every symlink.
    pub fn canonical(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        dunce::canonicalize(path)
            .map(Self::new)
            .map_err(|e| crate::Error::io(path, e))
    }

    /// Canonicalize the longest existing strict ancestor of this path.
    fn canonical_parent(&self) -> Self {
        let mut tail: Vec<&str> = Vec::new();
        let mut cursor = self.inner.as_str();
        loop {
            let Some(idx) = cursor.rfind('/') else {
                return self.clone();
            };
            let (head, name) = (&cursor[..idx], &cursor[idx + 1..]);
            if !name.is_empty() {
                tail.push(name);
            }
            let head = if head.is_empty() { "/" } else { head };
            if let Ok(real) = dunce::canonicalize(head) {
                let mut resolved = Self::new(real);
                for segment in tail.iter().rev() {
                    resolved = resolved.join(segment);
                }
                return resolved;
            }
            if head == "/" {
                return self.clone();
            }
            cursor = head;
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a (possibly multi-segment) relative path.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment)
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Self {
            inner: clean(&joined),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        match self.inner.rfind('/') {
            Some(0) if self.inner.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) if idx > 0 => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.inner.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Component-wise prefix test: `/a/bc` does not start with `/a/b`.
    pub fn starts_with(&self, other: &DatasetPath) -> bool {
        if other.inner == "/" {
            return self.inner.starts_with('/');
        }
        self.inner == other.inner
            || (self.inner.starts_with(&other.inner)
                && self.inner.as_bytes().get(other.inner.len()) == Some(&b'/'))
    }

    /// Path of `self` relative to `root`, with forward slashes.
    ///
    /// Returns `"."` for the root itself and `None` when `self` is not
    /// underneath `root`.
    pub fn relative_to(&self, root: &DatasetPath) -> Option<String> {
        if self == root {
            return Some(".".to_string());
        }
        if !self.starts_with(root) {
            return None;
        }
        let offset = if root.inner == "/" { 1 } else { root.inner.len() + 1 };
        Some(self.inner[offset..].to_string())
    }

    /// Move this path from underneath `from` to the same place under `to`.
    pub fn rebase(&self, from: &DatasetPath, to: &DatasetPath) -> Option<Self> {
        match self.relative_to(from)?.as_str() {
            "." => Some(to.clone()),
            rel => Some(to.join(rel)),
        }
    }

    /// Check if this path exists on the filesystem (following symlinks).
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// True if something occupies this path, including a dangling symlink.
    pub fn exists_or_symlink(&self) -> bool {
        std::fs::symlink_metadata(self.to_native()).is_ok()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Check if this path itself is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        std::fs::symlink_metadata(self.to_native())
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false)
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }
}

/// Lexically clean a forward-slash path.
fn clean(raw: &str) -> String {
    let absolute = raw.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let body = parts.join("/");
    match (absolute, body.is_empty()) {
        (true, _) => format!("/{body}"),
        (false, true) => ".".to_string(),
        (false, false) => body,
    }
}

impl PartialOrd for DatasetPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DatasetPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.split('/').cmp(other.inner.split('/'))
    }
}

impl Serialize for DatasetPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner)
    }
}

impl AsRef<Path> for DatasetPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl fmt::Display for DatasetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for DatasetPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DatasetPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for DatasetPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for DatasetPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
