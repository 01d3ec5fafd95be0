//! Path and file helpers used by the configuration loader.
//!
//! Joining, relativizing and normalizing are pure string/component
//! manipulation. The existence probes and directory listing go through
//! `tokio::fs`. Every helper has an `_all` variant that maps a slice to a
//! `Vec` in the same order.
//!
//! `is_file`/`is_directory` never fail: any stat error reads as `false`.
//! `list_directory` does fail on a missing directory, so callers can tell
//! a bad path from an empty directory.

use crate::error::{InitError, InitResult};
use futures::future;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Extension appended to init file names that have none.
pub const YAML_EXTENSION: &str = "yml";

/// Concatenate `segment` onto `base`.
///
/// Unlike [`Path::join`], a root or drive prefix on `segment` never replaces
/// `base`: `join("cfg", "/db")` is `cfg/db`. Empty segments leave `base`
/// untouched.
pub fn join(base: impl AsRef<Path>, segment: impl AsRef<Path>) -> PathBuf {
    let mut joined = base.as_ref().to_path_buf();
    for component in segment.as_ref().components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {}
            other => joined.push(other.as_os_str()),
        }
    }
    joined
}

/// Join every segment onto the same base.
pub fn join_all<S: AsRef<Path>>(base: impl AsRef<Path>, segments: &[S]) -> Vec<PathBuf> {
    let base = base.as_ref();
    segments.iter().map(|s| join(base, s)).collect()
}

/// Relative path leading from `base` to `target`.
///
/// Computed lexically on normalized components. If exactly one of the two
/// paths is absolute there is no relative route and `target` is returned
/// normalized.
pub fn relativize(base: impl AsRef<Path>, target: impl AsRef<Path>) -> PathBuf {
    let base = normalize(base);
    let target = normalize(target);
    if base.is_absolute() != target.is_absolute() {
        return target;
    }

    let base_parts: Vec<Component<'_>> = base.components().collect();
    let target_parts: Vec<Component<'_>> = target.components().collect();
    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part.as_os_str());
    }
    relative
}

/// Relativize every target against the same base.
pub fn relativize_all<S: AsRef<Path>>(base: impl AsRef<Path>, targets: &[S]) -> Vec<PathBuf> {
    let base = base.as_ref();
    targets.iter().map(|t| relativize(base, t)).collect()
}

/// True only when `path` exists and is not a directory.
pub async fn is_file(path: impl AsRef<Path>) -> bool {
    match tokio::fs::metadata(path.as_ref()).await {
        Ok(meta) => !meta.is_dir(),
        Err(_) => false,
    }
}

pub async fn is_file_all<S: AsRef<Path>>(paths: &[S]) -> Vec<bool> {
    future::join_all(paths.iter().map(|p| is_file(p.as_ref()))).await
}

/// True only when `path` exists and is a directory.
pub async fn is_directory(path: impl AsRef<Path>) -> bool {
    match tokio::fs::metadata(path.as_ref()).await {
        Ok(meta) => meta.is_dir(),
        Err(_) => false,
    }
}

pub async fn is_directory_all<S: AsRef<Path>>(paths: &[S]) -> Vec<bool> {
    future::join_all(paths.iter().map(|p| is_directory(p.as_ref()))).await
}

/// Entry names of a directory, sorted.
///
/// Fails with `DirectoryNotFound` when the directory cannot be read.
pub async fn list_directory(path: impl AsRef<Path>) -> InitResult<Vec<String>> {
    let path = path.as_ref();
    let mut entries = tokio::fs::read_dir(path)
        .await
        .map_err(|_| InitError::directory_not_found(path))?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(InitError::io)? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// List several directories; fails if any of them cannot be read.
pub async fn list_directory_all<S: AsRef<Path>>(paths: &[S]) -> InitResult<Vec<Vec<String>>> {
    future::try_join_all(paths.iter().map(|p| list_directory(p.as_ref()))).await
}

/// Parse YAML text into a JSON-shaped value.
///
/// An empty document parses to `null`.
pub fn parse_yaml(text: &str) -> InitResult<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str::<Value>(text).map_err(|e| InitError::invalid_yaml(None, e))
}

/// Read and parse a YAML file.
pub async fn read_yaml(path: impl AsRef<Path>) -> InitResult<Value> {
    let path = path.as_ref();
    debug!(path = %to_forward_slashes(path), "reading yaml");
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| InitError::file_not_found(path, e))?;
    parse_yaml(&text).map_err(|e| InitError::invalid_yaml(Some(path), e.message))
}

/// Append `.yml` unless the name already carries a YAML extension.
pub fn with_yaml_extension(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".yml") || lower.ends_with(".yaml") {
        name.to_string()
    } else {
        format!("{}.{}", name, YAML_EXTENSION)
    }
}

/// Normalize path components without requiring the path to exist.
/// Handles `.` and `..` components.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let mut components = Vec::new();

    for component in path.as_ref().components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                components.push(component)
            }
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `/..` stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(Component::ParentDir),
            },
        }
    }

    components.iter().collect()
}

/// Whether a relative path climbs above its base once normalized.
pub fn escapes_base(path: impl AsRef<Path>) -> bool {
    matches!(
        normalize(path).components().next(),
        Some(Component::ParentDir)
    )
}

/// Render a path with `/` separators regardless of platform.
pub fn to_forward_slashes(path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_join_skips_empty_segment() {
        assert_eq!(join("cfg", ""), PathBuf::from("cfg"));
        assert_eq!(join("cfg", "db"), Path::new("cfg").join("db"));
    }

    #[test]
    fn test_join_keeps_base_for_rooted_segment() {
        assert_eq!(join("cfg", "/db"), Path::new("cfg").join("db"));
        assert_eq!(join("", "/shared/db"), Path::new("shared").join("db"));
        assert_eq!(join("app", "/"), PathBuf::from("app"));
    }

    #[test]
    fn test_escapes_base() {
        assert!(escapes_base("../x"));
        assert!(escapes_base("a/../../x"));
        assert!(!escapes_base("a/../x"));
        assert!(!escapes_base(""));
    }

    #[test]
    fn test_join_all_preserves_order() {
        let joined = join_all("root", &["a", "b", "c"]);
        assert_eq!(
            joined,
            vec![
                Path::new("root").join("a"),
                Path::new("root").join("b"),
                Path::new("root").join("c"),
            ]
        );
    }

    #[test]
    fn test_relativize() {
        assert_eq!(relativize("/a/b", "/a/b/c/d"), PathBuf::from("c/d"));
        assert_eq!(relativize("/a/b/c", "/a/x"), PathBuf::from("../../x"));
        assert_eq!(relativize("a/b", "a/b"), PathBuf::new());
        assert_eq!(relativize("a", "/abs"), PathBuf::from("/abs"));
    }

    #[test]
    fn test_relativize_all_preserves_order() {
        let relative = relativize_all("/a", &["/a/x", "/b", "/a/y/z"]);
        assert_eq!(
            relative,
            vec![
                PathBuf::from("x"),
                PathBuf::from("../b"),
                Path::new("y").join("z"),
            ]
        );
    }

    #[test]
    fn test_normalize() {
        let result = to_forward_slashes(normalize("/foo/bar/../baz/./qux"));
        assert_eq!(result, "/foo/baz/qux");
        assert_eq!(to_forward_slashes(normalize("../x/./y")), "../x/y");
        assert_eq!(to_forward_slashes(normalize("/../x")), "/x");
    }

    #[test]
    fn test_to_forward_slashes() {
        assert_eq!(to_forward_slashes(Path::new("foo\\bar\\baz")), "foo/bar/baz");
    }

    #[test]
    fn test_with_yaml_extension() {
        assert_eq!(with_yaml_extension("init"), "init.yml");
        assert_eq!(with_yaml_extension("init.yml"), "init.yml");
        assert_eq!(with_yaml_extension("init.YAML"), "init.YAML");
        assert_eq!(with_yaml_extension("v1.2"), "v1.2.yml");
    }

    #[test]
    fn test_parse_yaml() {
        assert_eq!(parse_yaml("").unwrap(), Value::Null);
        assert_eq!(parse_yaml("color: red").unwrap()["color"], "red");
        let err = parse_yaml("a: [1, 2").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidYaml);
    }

    #[tokio::test]
    async fn test_probes_never_fail() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.yml");
        std::fs::write(&file, "x: 1").unwrap();
        let missing = temp.path().join("missing");

        assert!(is_file(&file).await);
        assert!(!is_file(temp.path()).await);
        assert!(!is_file(&missing).await);

        assert!(is_directory(temp.path()).await);
        assert!(!is_directory(&file).await);
        assert!(!is_directory(&missing).await);

        let probes = is_file_all(&[file.clone(), missing.clone(), file]).await;
        assert_eq!(probes, vec![true, false, true]);
    }

    #[tokio::test]
    async fn test_list_directory_rejects_missing() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("b.yml"), "").unwrap();
        std::fs::write(temp.path().join("a.yml"), "").unwrap();
        std::fs::create_dir(temp.path().join("empty")).unwrap();

        let names = list_directory(temp.path()).await.unwrap();
        assert_eq!(names, vec!["a.yml", "b.yml", "empty"]);

        assert!(list_directory(temp.path().join("empty")).await.unwrap().is_empty());

        let err = list_directory(temp.path().join("nope")).await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::DirectoryNotFound);
    }

    #[tokio::test]
    async fn test_directory_probes_preserve_order() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.yml");
        std::fs::write(&file, "").unwrap();
        let missing = temp.path().join("missing");

        let probes = is_directory_all(&[missing, temp.path().to_path_buf(), file]).await;
        assert_eq!(probes, vec![false, true, false]);
    }

    #[tokio::test]
    async fn test_list_directory_all() {
        let temp = TempDir::new().unwrap();
        for dir in ["one", "two"] {
            std::fs::create_dir(temp.path().join(dir)).unwrap();
        }
        std::fs::write(temp.path().join("one/x.yml"), "").unwrap();
        std::fs::write(temp.path().join("two/y.yml"), "").unwrap();
        std::fs::write(temp.path().join("two/z.yml"), "").unwrap();

        let two = temp.path().join("two");
        let one = temp.path().join("one");
        let listed = list_directory_all(&[two, one]).await.unwrap();
        assert_eq!(listed, vec![vec!["y.yml", "z.yml"], vec!["x.yml"]]);

        let err = list_directory_all(&[temp.path().join("one"), temp.path().join("nope")])
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::DirectoryNotFound);
    }

    #[tokio::test]
    async fn test_read_yaml_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = read_yaml(temp.path().join("none.yml")).await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::FileNotFound);
        assert!(err.path.unwrap().ends_with("none.yml"));
    }
}
