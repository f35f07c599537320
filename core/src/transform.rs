use convert_case::{Boundary, Case, Casing};
use itertools::Itertools;

use crate::{
    expression::{format_number, rgba, Value},
    resolve::ResolvedToken,
    Token, TokenType,
};

/// Name and value transforms. Platforms pick them through a transform group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// `name/kebab`
    NameKebab,
    /// `color/css`
    ColorCss,
    /// `color/hex`
    ColorHex,
    /// `size/rem`
    SizeRem,
}

const CSS: &[Transform] = &[Transform::NameKebab, Transform::ColorCss, Transform::SizeRem];
const LESS: &[Transform] = &[Transform::NameKebab, Transform::ColorHex, Transform::SizeRem];

impl Transform {
    /// Looks up a transform group by name.
    pub fn group(name: &str) -> Option<&'static [Transform]> {
        match name {
            "css" | "scss" => Some(CSS),
            "less" => Some(LESS),
            _ => None,
        }
    }
    pub fn name(&self) -> &'static str {
        match self {
            Transform::NameKebab => "name/kebab",
            Transform::ColorCss => "color/css",
            Transform::ColorHex => "color/hex",
            Transform::SizeRem => "size/rem",
        }
    }
    fn apply_value(&self, token: &ResolvedToken, value: Value) -> Value {
        match (self, value) {
            (Transform::ColorCss, Value::Color(color)) if color.a < 1.0 => Value::Any(rgba(&color)),
            (Transform::ColorCss | Transform::ColorHex, Value::Color(color)) => {
                Value::Any(color.to_hex_string())
            }
            (Transform::SizeRem, Value::Any(raw)) if is_size(token) => {
                match raw.trim().parse::<f64>() {
                    Ok(n) if n == 0.0 => Value::Any("0".to_string()),
                    Ok(n) => Value::Any(format!("{}rem", format_number(n))),
                    Err(_) => Value::Any(raw),
                }
            }
            (_, value) => value,
        }
    }
}

fn is_size(token: &ResolvedToken) -> bool {
    matches!(
        token.token_type,
        TokenType::Dimension | TokenType::FontSize | TokenType::FontSizes
    ) || token.path.first().map(String::as_str) == Some("size")
}

pub(crate) fn slugify(s: &str) -> String {
    deunicode::deunicode(s).replace(['(', ')', ',', '+', '.'], " ")
}

pub(crate) fn kebab_name(path: &[String]) -> String {
    path.iter()
        .map(|x| slugify(x))
        .join(" ")
        .with_boundaries(&[
            Boundary::Space,
            Boundary::Underscore,
            Boundary::Hyphen,
            Boundary::LowerUpper,
        ])
        .to_case(Case::Kebab)
}

pub(crate) fn transform_tokens(resolved: &[ResolvedToken], transforms: &[Transform]) -> Vec<Token> {
    resolved
        .iter()
        .map(|token| {
            let name = if transforms.contains(&Transform::NameKebab) {
                kebab_name(&token.path)
            } else {
                token.path.join(".")
            };
            let value = transforms
                .iter()
                .fold(token.value.clone(), |value, transform| transform.apply_value(token, value));
            Token {
                name,
                path: token.path.clone(),
                value: value.to_css(),
                original: token.expression.clone(),
                token_type: token.token_type,
                comment: token.comment.clone(),
            }
        })
        .collect()
}
