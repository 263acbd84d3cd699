//! Path helpers shared by source-map reconciliation and diagnostics.
//!
//! Backends report file identities in several forms: `file://` URIs,
//! percent-encoded paths, plain absolute paths. Everything downstream wants a
//! plain path expressed relative to some root, with `/` separators so the
//! result is stable across platforms when it ends up inside a JSON map.

use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

// Two or more characters so Windows drive letters are not mistaken for a scheme.
static URI_SCHEME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]+:(//)?").expect("URI scheme pattern is valid")
});

/// Convert a URI-style file reference into a plain path.
///
/// `file:` URIs go through [`Url::to_file_path`]; any other scheme prefix is
/// stripped and the remainder percent-decoded.
pub fn uri_to_path(uri: &str) -> PathBuf {
    if let Ok(url) = Url::parse(uri) {
        if url.scheme() == "file" {
            if let Ok(path) = url.to_file_path() {
                return path;
            }
        }
    }

    let stripped = URI_SCHEME.replace(uri, "");
    let decoded = percent_decode_str(&stripped).decode_utf8_lossy();
    PathBuf::from(decoded.as_ref())
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding segment where possible. Does not touch the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().map(|c| c.as_os_str()).collect()
}

/// Resolve `path` against the current directory and normalize it.
///
/// Lexical only: symlinks are not followed and the path need not exist.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize(path);
    }
    match std::env::current_dir() {
        Ok(cwd) => normalize(&cwd.join(path)),
        Err(_) => normalize(path),
    }
}

/// Express `path` relative to `base`.
///
/// Unless both sides are already absolute they are resolved against the
/// current directory first, so mixed and `..`-prefixed inputs share one
/// frame. Identical paths yield `.`.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let (path, base) = if path.is_absolute() && base.is_absolute() {
        (normalize(path), normalize(base))
    } else {
        (absolutize(path), absolutize(base))
    };

    let path_parts: Vec<_> = path.components().collect();
    let base_parts: Vec<_> = base.components().collect();
    let shared = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in shared..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[shared..] {
        relative.push(part.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        relative
    }
}

/// Render a path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    if path.is_absolute() {
        return path.to_string_lossy().replace('\\', "/");
    }
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("file:///project/src/app.scss", "/project/src/app.scss")]
    #[case("file:///project/src/my%20styles/app.scss", "/project/src/my styles/app.scss")]
    #[case("/project/src/a%2Bb.scss", "/project/src/a+b.scss")]
    #[case("styles/app.scss", "styles/app.scss")]
    #[case("sass://styles/_vars.scss", "styles/_vars.scss")]
    fn test_uri_to_path(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(uri_to_path(input), PathBuf::from(expected));
    }

    #[test]
    fn test_normalize_folds_parent_segments() {
        assert_eq!(
            normalize(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(normalize(Path::new("../x/../y")), PathBuf::from("../y"));
    }

    #[rstest]
    #[case("/project/src/styles/app.scss", "/project/src", "styles/app.scss")]
    #[case("/project/src", "/project/dist/styles", "../../src")]
    #[case("/project/src", "/project/src", ".")]
    #[case("/other/lib.scss", "/project/src", "../../other/lib.scss")]
    fn test_relative_to(#[case] path: &str, #[case] base: &str, #[case] expected: &str) {
        assert_eq!(
            relative_to(Path::new(path), Path::new(base)),
            PathBuf::from(expected)
        );
    }

    #[test]
    fn test_relative_to_mixed_frames() {
        let cwd = std::env::current_dir().unwrap();

        // Absolute path, relative base.
        assert_eq!(
            relative_to(&cwd.join("assets/styles/app.scss"), Path::new("./assets")),
            PathBuf::from("styles/app.scss")
        );
        // Relative path, absolute base.
        assert_eq!(
            relative_to(Path::new("dist/styles"), &cwd),
            PathBuf::from("dist/styles")
        );
        assert_eq!(
            relative_to(&cwd.join("src"), Path::new("dist/styles")),
            PathBuf::from("../../src")
        );
    }

    #[test]
    fn test_relative_to_parent_prefixed_base() {
        let cwd = std::env::current_dir().unwrap();
        let here = cwd.file_name().unwrap();

        let expected = Path::new("..").join(here).join("assets");
        assert_eq!(relative_to(Path::new("assets"), Path::new("../dist")), expected);
        assert_eq!(
            relative_to(Path::new("../dist/app.css"), Path::new("../dist")),
            PathBuf::from("app.css")
        );
    }

    #[test]
    fn test_absolutize() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolutize(Path::new("a/../b")), cwd.join("b"));
        assert_eq!(absolutize(Path::new("/x/./y")), PathBuf::from("/x/y"));
    }

    #[test]
    fn test_to_slash_relative() {
        let path: PathBuf = ["..", "src", "app.scss"].iter().collect();
        assert_eq!(to_slash(&path), "../src/app.scss");
    }
}
