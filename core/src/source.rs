use std::path::{Path, PathBuf};

use itertools::Itertools;
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    DesignTokens,
};

/// A `**` that shares its path component with other characters (`**.json`)
/// only matches within one directory, like `*`.
pub(crate) fn normalize_globstar(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|part| {
            if part == "**" {
                return part.to_string();
            }
            let mut part = part.to_string();
            while part.contains("**") {
                part = part.replace("**", "*");
            }
            part
        })
        .join("/")
}

/// Expands the source patterns under `root` in sorted order; a file matched
/// by several patterns is only read once.
pub(crate) fn expand(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let escaped = glob::Pattern::escape(&root.to_string_lossy());
        let full = Path::new(&escaped).join(normalize_globstar(pattern));
        let paths = glob::glob(&full.to_string_lossy()).map_err(|source| Error::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        let mut matched = paths
            .map(|entry| {
                entry.map_err(|err| Error::Io {
                    path: err.path().to_path_buf(),
                    source: err.into_error(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        matched.retain(|x| x.is_file());
        if matched.is_empty() {
            warn!(%pattern, "source pattern matched no files");
        }
        matched.sort();
        for path in matched {
            if !files.contains(&path) {
                files.push(path);
            }
        }
    }
    Ok(files)
}

/// Reads and deep-merges every source file.
pub(crate) async fn load(root: &Path, patterns: &[String]) -> Result<DesignTokens> {
    let mut tokens = DesignTokens::default();
    for path in expand(root, patterns)? {
        debug!(path = %path.display(), "reading tokens");
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
        let value = serde_json::from_str(&text).map_err(|source| Error::Json {
            path: path.clone(),
            source,
        })?;
        let file = DesignTokens::from_value(value).map_err(|err| match err {
            Error::InvalidToken { path: token, reason } => Error::InvalidToken {
                path: format!("{}: {token}", path.display()),
                reason,
            },
            err => err,
        })?;
        tokens.merge(file);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globstar_inside_a_component_acts_like_star() {
        assert_eq!(normalize_globstar("configs/foo/**.json"), "configs/foo/*.json");
        assert_eq!(normalize_globstar("configs/**/*.json"), "configs/**/*.json");
        assert_eq!(normalize_globstar("a/***.json"), "a/*.json");
    }

    #[test]
    fn expands_top_level_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let brand = dir.path().join("configs/foo");
        std::fs::create_dir_all(brand.join("nested")).unwrap();
        std::fs::write(brand.join("spacing.json"), "{}").unwrap();
        std::fs::write(brand.join("colors.json"), "{}").unwrap();
        std::fs::write(brand.join("notes.txt"), "").unwrap();
        std::fs::write(brand.join("nested/deep.json"), "{}").unwrap();

        let files = expand(dir.path(), &["configs/foo/**.json".to_string()]).unwrap();
        assert_eq!(files, [brand.join("colors.json"), brand.join("spacing.json")]);

        let files = expand(dir.path(), &["configs/foo/**/*.json".to_string()]).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn root_is_matched_literally() {
        let dir = tempfile::tempdir().unwrap();
        for root in ["design[v2]", "design[v2", "what?*"] {
            let brand = dir.path().join(root).join("configs/foo");
            std::fs::create_dir_all(&brand).unwrap();
            std::fs::write(brand.join("colors.json"), "{}").unwrap();

            let files = expand(&dir.path().join(root), &["configs/foo/**.json".to_string()])
                .unwrap();
            assert_eq!(files, [brand.join("colors.json")]);
        }
    }

    #[tokio::test]
    async fn later_files_override_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            r#"{ "colors": { "primary": { "value": "red" } } }"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            r#"{ "colors": { "primary": { "value": "blue" }, "secondary": { "value": "green" } } }"#,
        )
        .unwrap();
        let tokens = load(dir.path(), &["*.json".to_string()]).await.unwrap();
        let resolved = crate::resolve::resolve_tokens(&tokens).unwrap();
        let values = resolved.iter().map(|x| x.value.to_css()).collect::<Vec<_>>();
        assert_eq!(values, ["blue", "green"]);
    }

    #[tokio::test]
    async fn reports_the_failing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let err = load(dir.path(), &["*.json".to_string()]).await.unwrap_err();
        assert!(matches!(err, Error::Json { ref path, .. } if path.ends_with("broken.json")));
    }
}
