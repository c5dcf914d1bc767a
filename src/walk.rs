use crate::error::{ReplaceTokensError, Result};
use globset::{GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Compiles a file selection glob
///
/// `*` stays within one path component, `**` crosses directories.
///
/// # Errors
///
/// Returns `ReplaceTokensError::Glob` if the pattern is invalid.
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| ReplaceTokensError::Glob {
            pattern: pattern.to_string(),
            source,
        })
}

/// Returns every regular file under `root` whose path relative to `root` matches `matcher`
///
/// Symbolic links are not followed and hidden entries are included. Entries that cannot be
/// read are logged and skipped. Results are sorted by path.
pub fn find_files(root: &Path, matcher: &GlobMatcher) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .min_depth(1)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        tracing::debug!(path = %relative.display(), "visiting");
        if matcher.is_match(relative) {
            files.push(entry.into_path());
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::create_dir_all(base.join("config/nested")).unwrap();
        fs::create_dir_all(base.join(".hidden")).unwrap();
        fs::write(base.join("root.txt"), "root").unwrap();
        fs::write(base.join("config/app.yaml"), "app").unwrap();
        fs::write(base.join("config/nested/db.yaml"), "db").unwrap();
        fs::write(base.join("config/nested/notes.txt"), "notes").unwrap();
        fs::write(base.join(".hidden/secret.yaml"), "secret").unwrap();
        temp_dir
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_match_everything() {
        let temp_dir = create_tree();
        let files = find_files(temp_dir.path(), &compile_glob("**").unwrap());
        assert_eq!(
            relative(temp_dir.path(), &files),
            vec![
                ".hidden/secret.yaml",
                "config/app.yaml",
                "config/nested/db.yaml",
                "config/nested/notes.txt",
                "root.txt",
            ]
        );
    }

    #[test]
    fn test_recursive_extension_glob() {
        let temp_dir = create_tree();
        let files = find_files(temp_dir.path(), &compile_glob("config/**/*.yaml").unwrap());
        assert_eq!(
            relative(temp_dir.path(), &files),
            vec!["config/app.yaml", "config/nested/db.yaml"]
        );
    }

    #[test]
    fn test_single_star_stays_in_component() {
        let temp_dir = create_tree();
        let files = find_files(temp_dir.path(), &compile_glob("*.txt").unwrap());
        assert_eq!(relative(temp_dir.path(), &files), vec!["root.txt"]);
    }

    #[test]
    fn test_character_class() {
        let temp_dir = create_tree();
        let files = find_files(temp_dir.path(), &compile_glob("config/[a-c]*.yaml").unwrap());
        assert_eq!(relative(temp_dir.path(), &files), vec!["config/app.yaml"]);
    }

    #[test]
    fn test_directories_excluded() {
        let temp_dir = create_tree();
        let files = find_files(temp_dir.path(), &compile_glob("config*").unwrap());
        assert!(files.is_empty());
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let files = find_files(&temp_dir.path().join("absent"), &compile_glob("**").unwrap());
        assert!(files.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_does_not_stop_walk() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        let locked = base.join("a_locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.txt"), "hidden").unwrap();
        fs::write(base.join("b_open.txt"), "open").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still read the directory; nothing to check then
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let files = find_files(base, &compile_glob("**").unwrap());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(relative(base, &files), vec!["b_open.txt"]);
    }

    #[test]
    fn test_invalid_glob() {
        let result = compile_glob("config/[a-");
        assert!(matches!(result, Err(ReplaceTokensError::Glob { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_not_followed() {
        let temp_dir = create_tree();
        let base = temp_dir.path();
        std::os::unix::fs::symlink(base.join("root.txt"), base.join("link.txt")).unwrap();
        std::os::unix::fs::symlink(base.join("config"), base.join("linked_dir")).unwrap();

        let files = find_files(base, &compile_glob("**").unwrap());
        let names = relative(base, &files);
        assert!(!names.iter().any(|n| n == "link.txt"));
        assert!(!names.iter().any(|n| n.starts_with("linked_dir")));
    }
}
