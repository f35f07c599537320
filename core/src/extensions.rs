use csscolorparser::Color;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    expression::{Expression, Value},
};

/// The `$extensions` block of a token. Vendors other than Tokens Studio are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Extensions {
    #[serde(rename = "studio.tokens")]
    pub studio_tokens: Option<StudioTokensExtension>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudioTokensExtension {
    pub modify: Option<StudioTokensModifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub enum StudioTokensModify {
    #[serde(rename = "lighten")]
    Lighten,
    #[serde(rename = "darken")]
    Darken,
    #[serde(rename = "alpha")]
    Alpha,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub enum StudioTokensSpace {
    #[default]
    #[serde(rename = "hsl")]
    Hsl,
    #[serde(rename = "lch")]
    Lch,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudioTokensModifier {
    #[serde(rename = "type")]
    pub type_: StudioTokensModify,
    /// May itself reference another token.
    pub value: Expression,
    #[serde(default)]
    pub space: StudioTokensSpace,
}

impl StudioTokensModifier {
    /// Applies the modifier to an already resolved colour.
    pub fn apply(&self, token: &str, base_value: &Value, amount: &Value) -> Result<Value> {
        let unsupported = |reason: String| Error::UnsupportedModifier {
            token: token.to_string(),
            reason,
        };
        let amount: f64 = amount
            .to_css()
            .trim()
            .parse()
            .map_err(|_| unsupported(format!("amount '{}' is not a number", amount.to_css())))?;
        let Value::Color(color) = base_value else {
            return Err(unsupported(format!(
                "base value '{}' is not a colour",
                base_value.to_css()
            )));
        };
        let color = match (self.type_, self.space) {
            (StudioTokensModify::Alpha, _) => {
                Color::new(color.r, color.g, color.b, amount.clamp(0.0, 1.0))
            }
            (StudioTokensModify::Lighten | StudioTokensModify::Darken, StudioTokensSpace::Hsl) => {
                let (h, s, l, a) = color.to_hsla();
                let l2 = match self.type_ {
                    StudioTokensModify::Lighten => l + l * amount,
                    _ => l - l * amount,
                };
                Color::from_hsla(h, s, l2.clamp(0.0, 1.0), a)
            }
            (StudioTokensModify::Lighten | StudioTokensModify::Darken, StudioTokensSpace::Lch) => {
                let (l, c, h, a) = color.to_lch();
                let l2 = match self.type_ {
                    StudioTokensModify::Lighten => l + l * amount,
                    _ => l - l * amount,
                };
                Color::from_lch(l2.clamp(0.0, 100.0), c, h, a)
            }
            (type_, space) => {
                return Err(unsupported(format!("{type_:?} in {space:?} space")));
            }
        };
        Ok(Value::Color(color))
    }
}
