//! Canonical absolute paths used uniformly across backends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Separator used in canonical virtual paths.
pub const SEPARATOR: char = '/';

/// A canonical, absolute virtual path.
///
/// Both `/` and `\` are accepted as separators on input. The canonical form
/// uses `/`, has `.` and `..` resolved, no empty segments, and no trailing
/// separator except for the root `/`.
///
/// # Examples
///
/// ```rust
/// use vstorage_core::VirtualPath;
///
/// let path = VirtualPath::new("/tmp//a/./b/../c/").unwrap();
/// assert_eq!(path.as_str(), "/tmp/a/c");
///
/// assert!(VirtualPath::new("relative/path").is_err());
/// ```
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VirtualPath {
    path: String,
}

impl VirtualPath {
    /// Parse and canonicalize a raw path.
    ///
    /// Fails with [`Error::InvalidPath`] for empty input and with
    /// [`Error::RelativePathNotAllowed`] for anything that is not absolute.
    pub fn new(raw: &str) -> Result<Self, Error> {
        if raw.is_empty() {
            return Err(Error::invalid_path(raw));
        }
        if !Self::is_absolute_path(raw) {
            return Err(Error::RelativePathNotAllowed {
                path: raw.to_string(),
            });
        }
        Ok(VirtualPath {
            path: canonicalize(raw),
        })
    }

    /// The root path `/`.
    pub fn root() -> Self {
        VirtualPath {
            path: SEPARATOR.to_string(),
        }
    }

    /// True iff `raw` is non-empty and starts with a separator or a
    /// drive-letter prefix such as `C:` or `C:\`.
    pub fn is_absolute_path(raw: &str) -> bool {
        if raw.starts_with(['/', '\\']) {
            return true;
        }
        let bytes = raw.as_bytes();
        bytes.len() >= 2
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
            && (bytes.len() == 2 || bytes[2] == b'/' || bytes[2] == b'\\')
    }

    /// The canonical path string.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path.len() == 1
    }

    /// Number of separators in the canonical string. The root has depth 1.
    pub fn depth(&self) -> usize {
        separator_count(&self.path)
    }

    /// Last path segment, `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.path.rsplit(SEPARATOR).next()
    }

    /// Parent path, `None` for the root.
    pub fn parent(&self) -> Option<VirtualPath> {
        if self.is_root() {
            return None;
        }
        let cut = self.path.rfind(SEPARATOR).unwrap_or(0);
        if cut == 0 {
            Some(VirtualPath::root())
        } else {
            Some(VirtualPath {
                path: self.path[..cut].to_string(),
            })
        }
    }

    /// Iterate over path segments (none for the root).
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// True iff `other` lies strictly below this path.
    ///
    /// The match is bounded at segment granularity: `/ab` is not an ancestor
    /// of `/abc`, and a path is never its own child. The root is an ancestor
    /// of every other path.
    pub fn is_child(&self, other: &VirtualPath) -> bool {
        if self.path == other.path {
            return false;
        }
        if self.is_root() {
            return true;
        }
        other
            .path
            .strip_prefix(self.path.as_str())
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
    }
}

/// Count `/` in a canonical path string.
pub(crate) fn separator_count(path: &str) -> usize {
    path.matches(SEPARATOR).count()
}

fn canonicalize(raw: &str) -> String {
    let mut absolutes: Vec<&str> = Vec::new();
    for part in raw.split(['/', '\\']).filter(|p| !p.is_empty()) {
        match part {
            "." => continue,
            ".." => {
                absolutes.pop();
            }
            _ => absolutes.push(part),
        }
    }
    let mut path = String::with_capacity(raw.len() + 1);
    path.push(SEPARATOR);
    path.push_str(&absolutes.join("/"));
    path
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl AsRef<str> for VirtualPath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl FromStr for VirtualPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VirtualPath::new(s)
    }
}

impl TryFrom<&str> for VirtualPath {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        VirtualPath::new(value)
    }
}

impl TryFrom<String> for VirtualPath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        VirtualPath::new(&value)
    }
}

impl From<VirtualPath> for String {
    fn from(value: VirtualPath) -> Self {
        value.path
    }
}

/// Macro for creating virtual paths from literals.
///
/// # Example
///
/// ```rust
/// use vstorage_core::vpath;
///
/// let p = vpath!("/tmp/a");
/// assert_eq!(p.depth(), 2);
/// ```
#[macro_export]
macro_rules! vpath {
    ($s:expr) => {
        $crate::VirtualPath::new($s).expect("invalid virtual path literal")
    };
}
