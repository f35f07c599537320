use std::path::PathBuf;

use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::{
    config::{DictionaryConfig, PlatformConfig},
    error::{Error, Result},
    format::Format,
    resolve::{resolve_tokens, ResolvedToken},
    source,
    transform::{transform_tokens, Transform},
    DesignTokens, Token,
};

/// Builds the platforms of one [`DictionaryConfig`].
#[derive(Debug, Clone)]
pub struct TokenDictionary {
    config: DictionaryConfig,
    root: PathBuf,
}

impl TokenDictionary {
    /// Sources and destinations are relative to the current directory unless
    /// [`TokenDictionary::with_root`] says otherwise.
    pub fn new(config: DictionaryConfig) -> Self {
        Self {
            config,
            root: PathBuf::from("."),
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Reads and merges the configured sources.
    pub async fn load(&self) -> Result<DesignTokens> {
        source::load(&self.root, &self.config.source).await
    }

    /// Builds every configured platform in declaration order, stopping at the
    /// first failure.
    pub async fn build_all_platforms(&self) -> Result<()> {
        let resolved = resolve_tokens(&self.load().await?)?;
        for (name, platform) in &self.config.platforms {
            self.build(&resolved, name, platform).await?;
        }
        Ok(())
    }

    pub async fn build_platform(&self, name: &str) -> Result<()> {
        let platform = self.platform(name)?;
        let resolved = resolve_tokens(&self.load().await?)?;
        self.build(&resolved, name, platform).await
    }

    /// The transformed tokens of a platform, without writing anything.
    pub async fn export_platform(&self, name: &str) -> Result<Vec<Token>> {
        let platform = self.platform(name)?;
        let resolved = resolve_tokens(&self.load().await?)?;
        Ok(transform_tokens(&resolved, transforms(name, platform)?))
    }

    fn platform(&self, name: &str) -> Result<&PlatformConfig> {
        self.config
            .platforms
            .get(name)
            .ok_or_else(|| Error::UnknownPlatform(name.to_string()))
    }

    async fn build(
        &self,
        resolved: &[ResolvedToken],
        name: &str,
        platform: &PlatformConfig,
    ) -> Result<()> {
        let transforms = transforms(name, platform)?;
        info!(platform = name, "building platform");
        debug!(
            platform = name,
            transforms = %transforms.iter().map(Transform::name).join(", "),
            "applying transform group"
        );
        let tokens = transform_tokens(resolved, transforms);
        let base = match &platform.build_path {
            Some(build_path) => self.root.join(build_path),
            None => self.root.clone(),
        };

        for file in &platform.files {
            let format = Format::from_name(&file.format).ok_or_else(|| Error::UnknownFormat {
                destination: file.destination.clone(),
                name: file.format.clone(),
            })?;
            let selected = tokens
                .iter()
                .filter(|token| file.filter.as_ref().map_or(true, |f| f.matches(token)))
                .collect::<Vec<_>>();
            if selected.is_empty() {
                warn!(destination = %file.destination, "no tokens selected, file not created");
                continue;
            }

            let path = base.join(&file.destination);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| Error::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            let contents = format.render(&selected, &tokens, &file.options);
            tokio::fs::write(&path, contents)
                .await
                .map_err(|source| Error::Io {
                    path: path.clone(),
                    source,
                })?;
            info!(path = %path.display(), tokens = selected.len(), "wrote file");
        }
        Ok(())
    }
}

fn transforms(name: &str, platform: &PlatformConfig) -> Result<&'static [Transform]> {
    Transform::group(&platform.transform_group).ok_or_else(|| Error::UnknownTransformGroup {
        platform: name.to_string(),
        name: platform.transform_group.clone(),
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::{FileOptions, FileSpec, TokenFilter};

    fn write(root: &Path, file: &str, contents: &str) {
        let path = root.join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn config(transform_group: &str, format: &str) -> DictionaryConfig {
        let file = |component: &str| FileSpec {
            destination: format!("out/{component}.css"),
            format: format.to_string(),
            filter: Some(TokenFilter::Component(component.to_string())),
            options: FileOptions::default(),
        };
        DictionaryConfig {
            source: vec!["tokens/**.json".to_string()],
            platforms: [(
                "css".to_string(),
                PlatformConfig {
                    transform_group: transform_group.to_string(),
                    build_path: None,
                    files: vec![file("colors"), file("spacing"), file("missing")],
                },
            )]
            .into_iter()
            .collect(),
        }
    }

    const TOKENS: &str = r##"{
        "colors": { "primary": { "value": "#ff0000" } },
        "spacing": { "small": { "value": "4px" } }
    }"##;

    #[tokio::test]
    async fn builds_one_file_per_component() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "tokens/base.json", TOKENS);

        TokenDictionary::new(config("css", "css/variables"))
            .with_root(dir.path())
            .build_all_platforms()
            .await
            .unwrap();

        let colors = std::fs::read_to_string(dir.path().join("out/colors.css")).unwrap();
        assert!(colors.contains("--colors-primary: #ff0000;"));
        assert!(!colors.contains("spacing"));
        let spacing = std::fs::read_to_string(dir.path().join("out/spacing.css")).unwrap();
        assert!(spacing.contains("--spacing-small: 4px;"));
        assert!(!dir.path().join("out/missing.css").exists());
    }

    #[tokio::test]
    async fn honours_build_path() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "tokens/base.json", TOKENS);
        let mut config = config("css", "css/variables");
        config.platforms["css"].build_path = Some("dist".to_string());

        TokenDictionary::new(config)
            .with_root(dir.path())
            .build_platform("css")
            .await
            .unwrap();
        assert!(dir.path().join("dist/out/colors.css").exists());
    }

    #[tokio::test]
    async fn rejects_unknown_transform_group_and_format() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "tokens/base.json", TOKENS);

        let err = TokenDictionary::new(config("compose", "css/variables"))
            .with_root(dir.path())
            .build_all_platforms()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTransformGroup { ref name, .. } if name == "compose"));

        let err = TokenDictionary::new(config("css", "css/modules"))
            .with_root(dir.path())
            .build_all_platforms()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFormat { ref name, .. } if name == "css/modules"));
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn exports_transformed_tokens() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "tokens/base.json", TOKENS);
        let dictionary = TokenDictionary::new(config("css", "css/variables")).with_root(dir.path());

        let tokens = dictionary.export_platform("css").await.unwrap();
        let names = tokens.iter().map(|x| x.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["colors-primary", "spacing-small"]);
        assert!(matches!(
            dictionary.export_platform("android").await,
            Err(Error::UnknownPlatform(_))
        ));
    }
}
