use std::collections::HashMap;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{
    error::{Error, Result},
    expression::{Expression, Value},
    extensions::StudioTokensModifier,
    DesignTokens, TokenOrGroup, TokenType, TokenValue,
};

/// A token with every reference and modifier applied, before any platform
/// transform.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedToken {
    pub path: Vec<String>,
    pub expression: Option<Expression>,
    pub value: Value,
    pub token_type: TokenType,
    pub comment: Option<String>,
}

struct RawToken<'a> {
    path: Vec<String>,
    expression: &'a Expression,
    token_type: TokenType,
    comment: Option<&'a str>,
    modifier: Option<&'a StudioTokensModifier>,
}

fn flatten<'a>(
    group: &'a IndexMap<String, TokenOrGroup>,
    path: &mut Vec<String>,
    out: &mut Vec<RawToken<'a>>,
) {
    for (key, node) in group {
        path.push(key.clone());
        match node {
            TokenOrGroup::Token(token) => match &token.value {
                TokenValue::Single(expression) => out.push(RawToken {
                    path: path.clone(),
                    expression,
                    token_type: token.type_,
                    comment: token.comment.as_deref(),
                    modifier: token
                        .extensions
                        .studio_tokens
                        .as_ref()
                        .and_then(|x| x.modify.as_ref()),
                }),
                TokenValue::Dict(properties) => {
                    out.extend(properties.iter().map(|(property, expression)| RawToken {
                        path: path.iter().cloned().chain([property.clone()]).collect(),
                        expression,
                        token_type: token.type_,
                        comment: token.comment.as_deref(),
                        modifier: None,
                    }))
                }
            },
            TokenOrGroup::Group(children) => flatten(children, path, out),
        }
        path.pop();
    }
}

struct Resolver<'a> {
    raw: &'a [RawToken<'a>],
    index: HashMap<&'a [String], usize>,
    values: Vec<Option<Value>>,
    stack: Vec<usize>,
}
impl<'a> Resolver<'a> {
    fn resolve(&mut self, i: usize) -> Result<Value> {
        if let Some(value) = &self.values[i] {
            return Ok(value.clone());
        }
        if let Some(start) = self.stack.iter().position(|&x| x == i) {
            let chain = self.stack[start..]
                .iter()
                .chain([&i])
                .map(|&x| self.raw[x].path.join("."))
                .join(" -> ");
            return Err(Error::CircularReference { chain });
        }
        self.stack.push(i);
        let raw = self.raw;
        let result = self.evaluate(&raw[i]);
        self.stack.pop();
        let value = result?;
        self.values[i] = Some(value.clone());
        Ok(value)
    }
    fn evaluate(&mut self, token: &RawToken<'_>) -> Result<Value> {
        let mut lookup = |path: &[String]| self.lookup(&token.path, path);
        let value = token.expression.resolve(&mut lookup)?;
        match token.modifier {
            Some(modifier) => {
                let amount = modifier.value.resolve(&mut lookup)?;
                modifier.apply(&token.path.join("."), &value, &amount)
            }
            None => Ok(value),
        }
    }
    fn lookup(&mut self, from: &[String], path: &[String]) -> Result<Value> {
        match self.index.get(path) {
            Some(&i) => self.resolve(i),
            None => Err(Error::MissingReference {
                token: from.join("."),
                reference: path.join("."),
            }),
        }
    }
}

/// Flattens the tree in declaration order and resolves every token.
pub(crate) fn resolve_tokens(tokens: &DesignTokens) -> Result<Vec<ResolvedToken>> {
    let mut raw = Vec::new();
    flatten(&tokens.root, &mut Vec::new(), &mut raw);

    let mut resolver = Resolver {
        raw: &raw,
        index: raw
            .iter()
            .enumerate()
            .map(|(i, x)| (x.path.as_slice(), i))
            .collect(),
        values: vec![None; raw.len()],
        stack: Vec::new(),
    };
    (0..raw.len())
        .map(|i| {
            let value = resolver.resolve(i)?;
            let token = &raw[i];
            Ok(ResolvedToken {
                path: token.path.clone(),
                expression: match token.modifier {
                    Some(_) => None,
                    None => Some(token.expression.clone()),
                },
                value,
                token_type: token.token_type,
                comment: token.comment.map(str::to_string),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(json: &str) -> Result<Vec<(String, String)>> {
        let tokens = DesignTokens::from_json(json)?;
        Ok(resolve_tokens(&tokens)?
            .into_iter()
            .map(|x| (x.path.join("."), x.value.to_css()))
            .collect())
    }

    #[test]
    fn resolves_chained_references() {
        let tokens = resolve(
            r##"{
                "colors": {
                    "accent": { "value": "{colors.brand}" },
                    "brand": { "value": "{colors.base.red}" },
                    "base": { "red": { "value": "#ff0000" } },
                    "border": { "value": "1px solid {colors.accent}" }
                },
                "spacing": {
                    "base": { "value": "4px" },
                    "large": { "value": "{spacing.base} * 4" }
                }
            }"##,
        )
        .unwrap();
        let value = |name: &str| tokens.iter().find(|x| x.0 == name).unwrap().1.clone();
        assert_eq!(value("colors.accent"), "#ff0000");
        assert_eq!(value("colors.border"), "1px solid #ff0000");
        assert_eq!(value("spacing.large"), "16px");
        assert_eq!(tokens[0].0, "colors.accent");
    }

    #[test]
    fn expands_composite_tokens() {
        let tokens = resolve(
            r#"{
                "font": { "size": { "value": "16px" } },
                "typography": {
                    "body": {
                        "type": "typography",
                        "value": { "fontFamily": "Inter", "fontSize": "{font.size}" }
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            tokens[1..],
            [
                ("typography.body.fontFamily".to_string(), "Inter".to_string()),
                ("typography.body.fontSize".to_string(), "16px".to_string()),
            ]
        );
    }

    #[test]
    fn applies_modifiers_after_resolution() {
        let tokens = resolve(
            r##"{
                "colors": {
                    "primary": { "value": "#ff0000" },
                    "faded": {
                        "value": "{colors.primary}",
                        "$extensions": { "studio.tokens": { "modify": { "type": "alpha", "value": "0.5" } } }
                    }
                }
            }"##,
        )
        .unwrap();
        assert_eq!(tokens[1].1, "#ff000080");
    }

    #[test]
    fn reports_missing_references() {
        let err = resolve(r#"{ "a": { "value": "{b.c}" } }"#).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingReference { ref token, ref reference }
                if token == "a" && reference == "b.c"
        ));
    }

    #[test]
    fn reports_cycles() {
        let err = resolve(
            r#"{ "a": { "value": "{b}" }, "b": { "value": "{c}" }, "c": { "value": "{a}" } }"#,
        )
        .unwrap_err();
        let Error::CircularReference { chain } = err else {
            panic!("expected a cycle, got {err:?}");
        };
        assert_eq!(chain, "a -> b -> c -> a");
    }
}
