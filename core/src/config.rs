use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Token;

/// Everything a [`crate::TokenDictionary`] needs to know: where the token
/// sources live and which platforms to build from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictionaryConfig {
    pub source: Vec<String>,
    /// Built in insertion order.
    pub platforms: IndexMap<String, PlatformConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    pub transform_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_path: Option<String>,
    #[serde(default)]
    pub files: Vec<FileSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSpec {
    pub destination: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<TokenFilter>,
    #[serde(default)]
    pub options: FileOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileOptions {
    pub output_references: bool,
    pub show_file_header: bool,
    /// Rule selector wrapping CSS custom properties, `:root` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            output_references: false,
            show_file_header: true,
            selector: None,
        }
    }
}

/// Selects which tokens end up in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenFilter {
    /// Tokens whose top-level path segment is the component name.
    Component(String),
}

impl TokenFilter {
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            TokenFilter::Component(component) => {
                token.path.first().map(String::as_str) == Some(component.as_str())
            }
        }
    }
}

#[test]
fn component_filter() {
    let token = |path: &[&str]| Token {
        name: path.join("-"),
        path: path.iter().map(|x| x.to_string()).collect(),
        ..Token::default()
    };
    let colors = TokenFilter::Component("colors".to_string());
    assert!(colors.matches(&token(&["colors", "primary"])));
    assert!(!colors.matches(&token(&["spacing", "small"])));
    assert!(!colors.matches(&token(&["other", "colors"])));
    assert!(!colors.matches(&token(&[])));
}
