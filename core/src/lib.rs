//! Design token dictionary: reads token JSON, resolves references and writes
//! per-platform variable files.
//!
//! ```no_run
//! # async fn run() -> brand_tokens_core::Result<()> {
//! use brand_tokens_core::{DictionaryConfig, TokenDictionary};
//!
//! let config: DictionaryConfig = serde_json::from_str(
//!     r#"{
//!         "source": ["tokens/**.json"],
//!         "platforms": {
//!             "css": {
//!                 "transformGroup": "css",
//!                 "files": [{ "destination": "build/variables.css", "format": "css/variables" }]
//!             }
//!         }
//!     }"#,
//! )
//! .unwrap();
//! TokenDictionary::new(config).build_all_platforms().await
//! # }
//! ```

use indexmap::IndexMap;
use serde::Deserialize;

pub use config::{DictionaryConfig, FileOptions, FileSpec, PlatformConfig, TokenFilter};
pub use dictionary::TokenDictionary;
pub use error::{Error, Result};
pub use expression::{Expression, Value};
pub use extensions::Extensions;
pub use format::Format;
pub use transform::Transform;

pub mod config;
mod dictionary;
mod error;
mod expression;
pub mod extensions;
mod format;
mod resolve;
mod source;
mod transform;

/// A merged token tree, keyed by top-level group name.
#[derive(Debug, Clone, Default)]
pub struct DesignTokens {
    pub root: IndexMap<String, TokenOrGroup>,
}
impl DesignTokens {
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|source| Error::Json {
                path: "<inline>".into(),
                source,
            })?;
        Self::from_value(value)
    }
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        match TokenOrGroup::parse(&mut Vec::new(), value)? {
            TokenOrGroup::Group(root) => Ok(DesignTokens { root }),
            _ => Err(Error::InvalidToken {
                path: String::new(),
                reason: "a token file must contain a group object".to_string(),
            }),
        }
    }
    /// Deep-merges `other` into `self`; on conflicting definitions the one
    /// from `other` wins.
    pub fn merge(&mut self, other: DesignTokens) {
        merge(&mut self.root, other.root, &mut Vec::new());
    }
}

fn merge(
    into: &mut IndexMap<String, TokenOrGroup>,
    from: IndexMap<String, TokenOrGroup>,
    path: &mut Vec<String>,
) {
    use indexmap::map::Entry;

    for (key, value) in from {
        path.push(key.clone());
        match into.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(mut entry) => match (entry.get_mut(), value) {
                (TokenOrGroup::Group(existing), TokenOrGroup::Group(incoming)) => {
                    merge(existing, incoming, path)
                }
                (existing, value) => {
                    tracing::warn!(
                        token = %path.join("."),
                        "token collision, later definition wins"
                    );
                    *existing = value;
                }
            },
        }
        path.pop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    Color,
    Dimension,
    FontSize,
    FontSizes,
    Typography,
    Border,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone)]
pub enum TokenOrGroup {
    Token(TokenDefinition),
    Group(IndexMap<String, TokenOrGroup>),
}
impl TokenOrGroup {
    /// Objects carrying a `value` are tokens, other objects are groups.
    /// `$`-prefixed keys inside groups are metadata and dropped.
    fn parse(path: &mut Vec<String>, value: serde_json::Value) -> Result<Self> {
        let invalid = |path: &[String], reason: String| Error::InvalidToken {
            path: path.join("."),
            reason,
        };
        let map = match value {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(invalid(path, format!("expected a token or group, found {other}")));
            }
        };
        if map.contains_key("value") || map.contains_key("$value") {
            let token = serde_json::from_value(serde_json::Value::Object(map))
                .map_err(|err| invalid(path, err.to_string()))?;
            return Ok(TokenOrGroup::Token(token));
        }
        let mut group = IndexMap::new();
        for (key, child) in map {
            if key.starts_with('$') {
                continue;
            }
            path.push(key.clone());
            let node = Self::parse(path, child)?;
            path.pop();
            group.insert(key, node);
        }
        Ok(TokenOrGroup::Group(group))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenDefinition {
    #[serde(alias = "$value")]
    pub value: TokenValue,
    #[serde(rename = "type", alias = "$type", default)]
    pub type_: TokenType,
    #[serde(alias = "description", alias = "$description", default)]
    pub comment: Option<String>,
    #[serde(rename = "$extensions", default)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Single(Expression),
    /// Composite tokens such as typography; every property becomes its own
    /// output token.
    Dict(IndexMap<String, Expression>),
}

/// A flattened token after name and value transforms, ready to be formatted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Token {
    pub name: String,
    pub path: Vec<String>,
    pub value: String,
    /// Unresolved expression, kept for `output_references`. `None` when a
    /// modifier changed the value.
    pub original: Option<Expression>,
    pub token_type: TokenType,
    pub comment: Option<String>,
}

#[test]
fn parses_token_tree() {
    let tokens = DesignTokens::from_json(
        r##"{
            "$description": "brand palette",
            "colors": {
                "$type": "color",
                "primary": { "value": "#ff0000", "type": "color", "comment": "main" },
                "muted": { "$value": "{colors.primary}", "$description": "dimmed" }
            },
            "spacing": { "small": { "value": 4 } }
        }"##,
    )
    .unwrap();
    assert_eq!(tokens.root.keys().collect::<Vec<_>>(), ["colors", "spacing"]);
    let Some(TokenOrGroup::Group(colors)) = tokens.root.get("colors") else {
        panic!("colors should be a group");
    };
    assert_eq!(colors.keys().collect::<Vec<_>>(), ["primary", "muted"]);
    let Some(TokenOrGroup::Token(muted)) = colors.get("muted") else {
        panic!("muted should be a token");
    };
    assert_eq!(muted.comment.as_deref(), Some("dimmed"));
    assert!(matches!(
        &muted.value,
        TokenValue::Single(Expression::Ref(path)) if path == &["colors", "primary"]
    ));
}

#[test]
fn reports_invalid_token_path() {
    let err = DesignTokens::from_json(r#"{ "colors": { "primary": "red" } }"#).unwrap_err();
    assert!(matches!(err, Error::InvalidToken { ref path, .. } if path == "colors.primary"));
    let err = DesignTokens::from_json(r#"{ "colors": { "primary": { "value": "{oops" } } }"#)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidToken { ref path, .. } if path == "colors.primary"));
}

#[test]
fn merge_overrides_leaves_and_keeps_order() {
    let mut tokens =
        DesignTokens::from_json(r#"{ "colors": { "a": { "value": "1" }, "b": { "value": "2" } } }"#)
            .unwrap();
    tokens.merge(
        DesignTokens::from_json(r#"{ "colors": { "b": { "value": "3" }, "c": { "value": "4" } } }"#)
            .unwrap(),
    );
    let Some(TokenOrGroup::Group(colors)) = tokens.root.get("colors") else {
        panic!("colors should be a group");
    };
    assert_eq!(colors.keys().collect::<Vec<_>>(), ["a", "b", "c"]);
    let Some(TokenOrGroup::Token(b)) = colors.get("b") else {
        panic!("b should be a token");
    };
    assert!(matches!(&b.value, TokenValue::Single(Expression::Value(Value::Any(v))) if v == "3"));
}
