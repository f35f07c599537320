use std::{fmt, str::FromStr};

use csscolorparser::Color;
use itertools::Itertools;
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer,
};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Color(Color),
    Any(String),
}
impl Value {
    pub fn to_css(&self) -> String {
        match self {
            Value::Color(val) => val.to_hex_string(),
            Value::Any(val) => val.to_string(),
        }
    }
    /// Like [`Value::to_css`], but translucent colours become `rgba(...)` so
    /// they read the same inside a composed value as on their own.
    pub(crate) fn to_css_inline(&self) -> String {
        match self {
            Value::Color(color) if color.a < 1.0 => rgba(color),
            _ => self.to_css(),
        }
    }
    /// Splits `4px` into `(4.0, "px")`; `None` for anything that is not a
    /// number with an optional alphabetic or `%` unit.
    fn as_number(&self) -> Option<(f64, &str)> {
        let Value::Any(raw) = self else {
            return None;
        };
        let raw = raw.trim();
        let split = raw
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
            .unwrap_or(raw.len());
        let (number, unit) = raw.split_at(split);
        if !unit.chars().all(|c| c.is_ascii_alphabetic() || c == '%') {
            return None;
        }
        number.parse().ok().map(|n| (n, unit))
    }
}

pub(crate) fn rgba(color: &Color) -> String {
    let [r, g, b, _] = color.to_rgba8();
    format!("rgba({r}, {g}, {b}, {})", format_number(color.a))
}

pub(crate) fn format_number(n: f64) -> String {
    let n = (n * 10_000.0).round() / 10_000.0;
    if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Ref(Vec<String>),
    Mul(Box<Expression>, Box<Expression>),
    Div(Box<Expression>, Box<Expression>),
    /// Literal text interleaved with references, e.g. `1px solid {colors.border}`.
    Template(Vec<Expression>),
    Value(Value),
}
impl Expression {
    pub fn references(&self) -> Vec<Vec<String>> {
        match self {
            Expression::Ref(path) => vec![path.clone()],
            Expression::Mul(a, b) | Expression::Div(a, b) => {
                a.references().into_iter().chain(b.references()).collect()
            }
            Expression::Template(parts) => parts.iter().flat_map(|x| x.references()).collect(),
            Expression::Value(_) => Vec::new(),
        }
    }
    fn has_reference(&self) -> bool {
        !self.references().is_empty()
    }
    fn is_operation(&self) -> bool {
        matches!(self, Expression::Mul(..) | Expression::Div(..))
    }

    /// Computes the value, asking `lookup` for the value behind each reference.
    pub fn resolve<F>(&self, lookup: &mut F) -> Result<Value>
    where
        F: FnMut(&[String]) -> Result<Value>,
    {
        match self {
            Expression::Ref(path) => lookup(path),
            Expression::Mul(a, b) => Ok(arithmetic('*', &a.resolve(lookup)?, &b.resolve(lookup)?)),
            Expression::Div(a, b) => Ok(arithmetic('/', &a.resolve(lookup)?, &b.resolve(lookup)?)),
            Expression::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&part.resolve(lookup)?.to_css_inline());
                }
                Ok(Value::Any(out))
            }
            Expression::Value(value) => Ok(value.clone()),
        }
    }

    /// Writes the expression back out with every reference replaced by
    /// whatever `reference` returns for it. Arithmetic is wrapped in `calc()`
    /// when `calc` is set.
    pub fn render<F>(&self, calc: bool, reference: &mut F) -> String
    where
        F: FnMut(&[String]) -> String,
    {
        match self {
            Expression::Ref(path) => reference(path),
            Expression::Mul(a, b) | Expression::Div(a, b) => {
                let op = if matches!(self, Expression::Mul(..)) { '*' } else { '/' };
                let inner = format!(
                    "{} {op} {}",
                    a.render(false, reference),
                    b.render(false, reference)
                );
                if calc {
                    format!("calc({inner})")
                } else {
                    inner
                }
            }
            Expression::Template(parts) => {
                parts.iter().map(|x| x.render(calc, reference)).join("")
            }
            Expression::Value(val) => val.to_css_inline(),
        }
    }
}

fn arithmetic(op: char, a: &Value, b: &Value) -> Value {
    if let (Some((x, ux)), Some((y, uy))) = (a.as_number(), b.as_number()) {
        let folded = match op {
            '*' if uy.is_empty() => Some((x * y, ux)),
            '*' if ux.is_empty() => Some((x * y, uy)),
            '/' if uy.is_empty() && y != 0.0 => Some((x / y, ux)),
            _ => None,
        };
        if let Some((n, unit)) = folded {
            return Value::Any(format!("{}{unit}", format_number(n)));
        }
    }
    Value::Any(format!("calc({} {op} {})", a.to_css(), b.to_css()))
}

fn literal(v: &str) -> Expression {
    let v = v.trim();
    let functional = ["rgb(", "rgba(", "hsl(", "hsla("]
        .iter()
        .any(|prefix| v.starts_with(prefix));
    match csscolorparser::parse(v) {
        Ok(color) if functional => Expression::Value(Value::Color(color)),
        _ => Expression::Value(Value::Any(v.to_string())),
    }
}

peg::parser! {
  grammar expr_parser() for str {
    rule _ = quiet!{[' ' | '\n' | '\t']*}

    pub(crate) rule expr() -> Expression
        = e:arithmetic() ![_] {?
            if e.is_operation() && !e.has_reference() {
                Err("arithmetic without references")
            } else {
                Ok(e)
            }
        }
        / template()

    rule arithmetic() -> Expression = precedence!{
        x:(@) _ "*" _ y:@ { Expression::Mul(Box::new(x), Box::new(y)) }
        x:(@) _ "/" _ y:@ { Expression::Div(Box::new(x), Box::new(y)) }
        --
        r:reference() { r }
        c:color() { c }
        v:$(['a'..='z' | 'A'..='Z' | '0'..='9' | '%' | '-' | '.' | ' ']+) { literal(v) }
    }

    rule reference() -> Expression
        = "{" v:($((!"}" !"." [_])+) ++ ".") "}" {
            Expression::Ref(v.iter().map(|x| x.to_string()).collect())
        }

    rule color() -> Expression
        = "#" v:$(['a'..='f' | 'A'..='F' | '0'..='9']+) {?
            csscolorparser::parse(&format!("#{v}"))
                .map(|c| Expression::Value(Value::Color(c)))
                .or(Err("hex colour"))
        }

    rule text() -> Expression
        = v:$((!"{" [_])+) { Expression::Value(Value::Any(v.to_string())) }

    rule template() -> Expression
        = parts:(reference() / text())* {
            let mut parts = parts;
            match parts.len() {
                1 => match parts.remove(0) {
                    Expression::Value(Value::Any(v)) => literal(&v),
                    part => part,
                },
                _ => Expression::Template(parts),
            }
        }
  }
}

impl FromStr for Expression {
    type Err = peg::error::ParseError<peg::str::LineCol>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        expr_parser::expr(s)
    }
}

#[test]
fn test() {
    let any = |x: &str| Expression::Value(Value::Any(x.to_string()));
    let reference = |x: &[&str]| Expression::Ref(x.iter().map(|x| x.to_string()).collect());

    assert_eq!(expr_parser::expr("{hello.world}").unwrap(), reference(&["hello", "world"]));
    assert_eq!(
        expr_parser::expr("#ff00ff").unwrap(),
        Expression::Value(Value::Color(csscolorparser::parse("#ff00ff").unwrap()))
    );
    assert_eq!(expr_parser::expr("90%").unwrap(), any("90%"));
    assert_eq!(expr_parser::expr("-90%").unwrap(), any("-90%"));
    assert_eq!(
        expr_parser::expr("ABC Diatype Variable").unwrap(),
        any("ABC Diatype Variable")
    );
    assert_eq!(
        expr_parser::expr("232.8300018310547").unwrap(),
        any("232.8300018310547")
    );
    assert_eq!(
        expr_parser::expr("{x} * {y}").unwrap(),
        Expression::Mul(Box::new(reference(&["x"])), Box::new(reference(&["y"])))
    );
    assert_eq!(
        expr_parser::expr("{x}/5").unwrap(),
        Expression::Div(Box::new(reference(&["x"])), Box::new(any("5")))
    );
    assert_eq!(
        expr_parser::expr("1px solid {colors.border}").unwrap(),
        Expression::Template(vec![any("1px solid "), reference(&["colors", "border"])])
    );
    assert_eq!(
        expr_parser::expr("rgba(0, 0, 0, 0.5)").unwrap(),
        Expression::Value(Value::Color(Color::new(0.0, 0.0, 0.0, 0.5)))
    );
    assert_eq!(expr_parser::expr("16px/1.5").unwrap(), any("16px/1.5"));
    assert_eq!(expr_parser::expr("\"Inter\", sans-serif").unwrap(), any("\"Inter\", sans-serif"));
    assert!(expr_parser::expr("{unclosed").is_err());
}

#[test]
fn folds_arithmetic() {
    fn resolve(s: &str) -> Value {
        let mut lookup = |path: &[String]| -> Result<Value> {
            Ok(Value::Any(match path[0].as_str() {
                "base" => "4px".to_string(),
                "ratio" => "1.5".to_string(),
                _ => "auto".to_string(),
            }))
        };
        s.parse::<Expression>().unwrap().resolve(&mut lookup).unwrap()
    }
    assert_eq!(resolve("{base} * 2"), Value::Any("8px".to_string()));
    assert_eq!(resolve("{base} * {ratio}"), Value::Any("6px".to_string()));
    assert_eq!(resolve("{base} / 3"), Value::Any("1.3333px".to_string()));
    assert_eq!(resolve("{base} * {other}"), Value::Any("calc(4px * auto)".to_string()));
    assert_eq!(resolve("{base} / 0"), Value::Any("calc(4px / 0)".to_string()));
}

#[test]
fn template_colours_match_standalone_css() {
    let mut lookup = |_: &[String]| -> Result<Value> {
        Ok(Value::Color(Color::new(1.0, 0.0, 0.0, 0.5)))
    };
    let expr: Expression = "1px solid {colors.glass}".parse().unwrap();
    assert_eq!(
        expr.resolve(&mut lookup).unwrap(),
        Value::Any("1px solid rgba(255, 0, 0, 0.5)".to_string())
    );
    let expr: Expression = "0 0 4px #33669980".parse().unwrap();
    assert_eq!(
        expr.resolve(&mut lookup).unwrap(),
        Value::Any("0 0 4px #33669980".to_string())
    );
}

#[test]
fn renders_references() {
    let expr: Expression = "{spacing.base} * 2".parse().unwrap();
    let mut var = |path: &[String]| format!("var(--{})", path.join("-"));
    assert_eq!(expr.render(true, &mut var), "calc(var(--spacing-base) * 2)");
    let mut scss = |path: &[String]| format!("${}", path.join("-"));
    assert_eq!(expr.render(false, &mut scss), "$spacing-base * 2");
}

struct ExpressionVisitor;

impl<'de> Visitor<'de> for ExpressionVisitor {
    type Value = Expression;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a token expression string or number")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        match expr_parser::expr(value) {
            Ok(expr) => Ok(expr),
            Err(err) => Err(E::custom(format!("Invalid expression '{value}': {err}"))),
        }
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Expression::Value(Value::Any(value.to_string())))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Expression::Value(Value::Any(value.to_string())))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Expression::Value(Value::Any(value.to_string())))
    }

    fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Expression::Value(Value::Any(value.to_string())))
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D>(deserializer: D) -> Result<Expression, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ExpressionVisitor)
    }
}
