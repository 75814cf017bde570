//! Entry name sanitising.
//!
//! Names stored in an archive are untrusted: they may climb out of the
//! extraction root with `..`, be absolute, carry a drive letter, or use
//! backslashes as separators. Every name must pass through [`sanitize`]
//! before it is used to touch the filesystem.
//!
//! ```
//! use std::path::Path;
//! use rezip::path::{sanitize, zip_name_fix};
//!
//! # #[cfg(unix)]
//! assert_eq!(
//!     sanitize(Path::new("/out"), "../../etc/passwd").unwrap(),
//!     Path::new("/out/passwd")
//! );
//! assert_eq!(zip_name_fix("..\\docs\\readme.txt"), "docs/readme.txt");
//! ```

use std::path::{Component, Path, PathBuf};

use crate::error::Result;

/// Splits an archive name on either separator, dropping a leading drive prefix such as `C:`.
fn segments(name: &str) -> impl Iterator<Item = &str> {
    let mut parts = name.split(['/', '\\']).peekable();
    if parts.peek().is_some_and(|first| first.ends_with(':')) {
        parts.next();
    }
    parts
}

/// Resolves `.` and `..` as if the name were rooted, so it can never climb above its start.
fn collapse<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out = Vec::new();
    for part in parts {
        match part {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            _ => out.push(part),
        }
    }
    out
}

/// Lexically resolves `.` and `..` components. `..` at the root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Normalizes a name for storage in an archive.
///
/// Backslashes become forward slashes, `.`/`..` segments are collapsed without
/// escaping the archive root, and leading separators are removed. A trailing
/// separator (directory marker) is kept.
pub fn zip_name_fix(name: &str) -> String {
    let mut fixed = collapse(segments(name)).join("/");
    if !fixed.is_empty() && (name.ends_with('/') || name.ends_with('\\')) {
        fixed.push('/');
    }
    fixed
}

/// Collapses `name` into a relative path that cannot escape the current directory.
///
/// This is the containment rule used when no extraction root is supplied.
pub fn canonical(name: &str) -> PathBuf {
    collapse(segments(name)).into_iter().collect()
}

/// Resolves an archive entry name against a trusted base directory.
///
/// The returned path is always `base` itself or a descendant of it. When the
/// normalized name stays inside `base` it is used as is; otherwise only its
/// final component is kept. An empty `base` stands for the current directory,
/// in which case the name is reduced with [`canonical`].
pub fn sanitize(base: &Path, name: &str) -> Result<PathBuf> {
    if base.as_os_str().is_empty() {
        let cwd = normalize(&std::env::current_dir()?);
        return Ok(cwd.join(canonical(name)));
    }

    let base = normalize(&std::path::absolute(base)?);

    let mut joined = base.clone();
    for part in segments(name).filter(|part| !part.is_empty()) {
        joined.push(part);
    }
    let candidate = normalize(&joined);
    if candidate.starts_with(&base) {
        return Ok(candidate);
    }

    let basename = segments(name)
        .filter(|part| !matches!(*part, "" | "." | ".."))
        .last();
    Ok(match basename {
        Some(basename) => base.join(basename),
        None => base,
    })
}
