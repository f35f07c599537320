//! Per-brand design token builds.
//!
//! Every brand declares the components it ships and the platforms it targets.
//! [`get_brand_dictionary_config`] turns that into a [`DictionaryConfig`] with
//! one output file per (platform, component) pair, and
//! [`build_brand_dictionaries`] builds the brands one after another.

use std::path::{Path, PathBuf};

use brand_tokens_core::{
    DictionaryConfig, FileOptions, FileSpec, PlatformConfig, TokenDictionary, TokenFilter,
};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Brand {
    pub name: String,
    pub components: Vec<String>,
    pub platforms: Vec<String>,
}

impl Brand {
    pub fn new(name: &str, components: &[&str], platforms: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            components: components.iter().map(|x| x.to_string()).collect(),
            platforms: platforms.iter().map(|x| x.to_string()).collect(),
        }
    }
}

/// The brands to build and the directory their sources and outputs are
/// relative to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    pub brands: Vec<Brand>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            brands: vec![
                Brand::new("bar", &["colors", "spacing"], &["css", "scss"]),
                Brand::new("foo", &["colors", "spacing", "other"], &["css", "scss"]),
            ],
        }
    }
}

impl BuildConfig {
    /// Reads a TOML brand list. A relative `root` is taken relative to the
    /// file itself.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| BuildError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: BuildConfig =
            toml::from_str(&text).map_err(|source| BuildError::ParseConfig {
                path: path.to_path_buf(),
                source,
            })?;
        if config.root.is_relative() {
            if let Some(dir) = path.parent() {
                config.root = dir.join(&config.root);
            }
        }
        Ok(config)
    }

    /// Keeps only the named brands, in their declared order.
    pub fn only(mut self, names: &[String]) -> Result<Self, BuildError> {
        if names.is_empty() {
            return Ok(self);
        }
        if let Some(unknown) = names
            .iter()
            .find(|name| !self.brands.iter().any(|brand| &brand.name == *name))
        {
            return Err(BuildError::UnknownBrand {
                name: unknown.clone(),
                known: self.brands.iter().map(|x| &x.name).join(", "),
            });
        }
        self.brands.retain(|brand| names.contains(&brand.name));
        Ok(self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to read {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unknown brand '{name}' (configured: {known})")]
    UnknownBrand { name: String, known: String },

    #[error("failed to build tokens for {brand}: {source}")]
    Dictionary {
        brand: String,
        source: brand_tokens_core::Error,
    },
}

/// One file per component: `lib/<brand>/<component>/<component>.<platform>`,
/// holding the tokens under the component's top-level group.
pub fn generate_component_files(
    components: &[String],
    platform: &str,
    brand_name: &str,
) -> Vec<FileSpec> {
    components
        .iter()
        .map(|component| FileSpec {
            destination: format!("lib/{brand_name}/{component}/{component}.{platform}"),
            format: format!("{platform}/variables"),
            filter: Some(TokenFilter::Component(component.clone())),
            options: FileOptions::default(),
        })
        .collect()
}

/// Platforms declared twice collapse into one entry at the position of the
/// first declaration.
pub fn get_brand_dictionary_config(brand: &Brand) -> DictionaryConfig {
    let mut platforms = IndexMap::new();
    for platform in &brand.platforms {
        let config = PlatformConfig {
            transform_group: platform.clone(),
            build_path: None,
            files: generate_component_files(&brand.components, platform, &brand.name),
        };
        if platforms.insert(platform.clone(), config).is_some() {
            warn!(brand = %brand.name, %platform, "platform declared more than once");
        }
    }
    DictionaryConfig {
        source: vec![format!("configs/{}/**.json", brand.name)],
        platforms,
    }
}

/// Builds every brand in order. The first failure stops the run; later brands
/// are not started.
pub async fn build_brand_dictionaries(config: &BuildConfig) -> Result<(), BuildError> {
    info!("Starting build...");
    for brand in &config.brands {
        info!("Building tokens for {}", brand.name);

        TokenDictionary::new(get_brand_dictionary_config(brand))
            .with_root(&config.root)
            .build_all_platforms()
            .await
            .map_err(|source| BuildError::Dictionary {
                brand: brand.name.clone(),
                source,
            })?;

        info!("Tokens successfully built for {}", brand.name);
    }
    info!("Build completed!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn component_files_follow_input_order() {
        let files = generate_component_files(&strings(&["spacing", "colors"]), "scss", "foo");
        let destinations = files.iter().map(|x| x.destination.as_str()).collect::<Vec<_>>();
        assert_eq!(
            destinations,
            ["lib/foo/spacing/spacing.scss", "lib/foo/colors/colors.scss"]
        );
        assert!(files.iter().all(|x| x.format == "scss/variables"));
        assert_eq!(
            files[0].filter,
            Some(TokenFilter::Component("spacing".to_string()))
        );
    }

    #[test]
    fn no_components_no_files() {
        assert!(generate_component_files(&[], "css", "bar").is_empty());
        assert!(generate_component_files(&[], "less", "").is_empty());
    }

    #[test]
    fn brand_config_has_a_file_per_platform_and_component() {
        let brand = Brand::new("bar", &["colors", "spacing"], &["css", "scss"]);
        let config = get_brand_dictionary_config(&brand);

        assert_eq!(config.source, ["configs/bar/**.json"]);
        assert_eq!(config.platforms.keys().collect::<Vec<_>>(), ["css", "scss"]);
        for (platform, block) in &config.platforms {
            assert_eq!(&block.transform_group, platform);
            assert_eq!(block.build_path, None);
            let destinations = block
                .files
                .iter()
                .map(|x| x.destination.clone())
                .collect::<Vec<_>>();
            assert_eq!(
                destinations,
                [
                    format!("lib/bar/colors/colors.{platform}"),
                    format!("lib/bar/spacing/spacing.{platform}"),
                ]
            );
        }
    }

    #[test]
    fn duplicate_platforms_collapse() {
        let brand = Brand::new("foo", &["colors"], &["scss", "css", "scss"]);
        let config = get_brand_dictionary_config(&brand);
        assert_eq!(config.platforms.keys().collect::<Vec<_>>(), ["scss", "css"]);
        assert_eq!(config.platforms["scss"].files.len(), 1);
    }

    #[test]
    fn default_brands() {
        let config = BuildConfig::default();
        let names = config.brands.iter().map(|x| x.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["bar", "foo"]);
        assert_eq!(config.brands[1].components, ["colors", "spacing", "other"]);
    }

    #[test]
    fn selects_brands_in_declared_order() {
        let config = BuildConfig::default()
            .only(&strings(&["foo", "bar"]))
            .unwrap();
        let names = config.brands.iter().map(|x| x.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["bar", "foo"]);

        let err = BuildConfig::default().only(&strings(&["baz"])).unwrap_err();
        assert!(matches!(err, BuildError::UnknownBrand { ref name, .. } if name == "baz"));
    }
}
