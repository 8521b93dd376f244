//! Slash-separated path helpers.
//!
//! Paths are always relative to the repository root and use `/` whatever the
//! host platform; `.` names the root itself.

/// Whether `name` is an acceptable relative path: `.` alone, or elements
/// separated by single slashes with no empty, `.` or `..` element and no
/// leading or trailing slash.
pub fn valid_path(name: &str) -> bool {
    if name == "." {
        return true;
    }
    name.split('/')
        .all(|elem| !elem.is_empty() && elem != "." && elem != "..")
}

/// Lexically normalize a path. Empty and `.` elements are dropped and `..`
/// removes the preceding element (never climbing above the root). The root
/// itself comes back as `.`.
pub fn clean(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for elem in path.split('/') {
        match elem {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(elem),
        }
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Join two paths and clean the result.
pub fn join(base: &str, name: &str) -> String {
    clean(&format!("{}/{}", base, name))
}

/// Split a cleaned, non-root path into its parent directory and final
/// element. A top-level name has parent `.`.
pub fn split(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((parent, base)) => (parent, base),
        None => (".", path),
    }
}

/// The path as the remote API expects it: the root is the empty string.
pub fn remote(path: &str) -> &str {
    if path == "." {
        ""
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_path() {
        for ok in [".", "a", "a/b", "server/cmd/main.go", "a b/c", ".hidden", "a..b"] {
            assert!(valid_path(ok), "{ok} should be valid");
        }
        for bad in ["", "/", "/a", "a/", "a//b", "./a", "a/.", "../a", "a/../b", ".."] {
            assert!(!valid_path(bad), "{bad} should be invalid");
        }
    }

    #[test]
    fn test_clean_and_join() {
        assert_eq!(clean(""), ".");
        assert_eq!(clean("/"), ".");
        assert_eq!(clean("/deploy/"), "deploy");
        assert_eq!(clean("a/./b//c"), "a/b/c");
        assert_eq!(clean("a/../../b"), "b");

        assert_eq!(join("", "."), ".");
        assert_eq!(join(".", "server"), "server");
        assert_eq!(join("deploy", "."), "deploy");
        assert_eq!(join("deploy", "k8s/app.yaml"), "deploy/k8s/app.yaml");
    }

    #[test]
    fn test_split() {
        assert_eq!(split("server"), (".", "server"));
        assert_eq!(split("server/cmd/main.go"), ("server/cmd", "main.go"));
    }

    #[test]
    fn test_remote() {
        assert_eq!(remote("."), "");
        assert_eq!(remote("server/cmd"), "server/cmd");
    }
}
