use std::collections::HashMap;

use itertools::Itertools;

use crate::{config::FileOptions, Token};

const HEADER: &str = "Do not edit directly, this file was auto-generated.";

/// Output formats for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `css/variables`: custom properties inside a `:root` rule.
    CssVariables,
    /// `scss/variables`
    ScssVariables,
    /// `less/variables`
    LessVariables,
}

impl Format {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "css/variables" => Some(Format::CssVariables),
            "scss/variables" => Some(Format::ScssVariables),
            "less/variables" => Some(Format::LessVariables),
            _ => None,
        }
    }

    /// Renders `tokens` into file contents. `all` is the full token set of the
    /// platform, used to resolve references that point outside this file.
    pub fn render(&self, tokens: &[&Token], all: &[Token], options: &FileOptions) -> String {
        let in_file: HashMap<&[String], &Token> =
            tokens.iter().map(|x| (x.path.as_slice(), *x)).collect();
        let everywhere: HashMap<&[String], &Token> =
            all.iter().map(|x| (x.path.as_slice(), x)).collect();

        let lines = tokens
            .iter()
            .map(|token| {
                let value = self.value(token, &in_file, &everywhere, options);
                let line = match self {
                    Format::CssVariables => format!("  --{}: {value};", token.name),
                    Format::ScssVariables => format!("${}: {value};", token.name),
                    Format::LessVariables => format!("@{}: {value};", token.name),
                };
                match (&token.comment, self) {
                    (Some(comment), Format::CssVariables) => format!("{line} /* {comment} */"),
                    (Some(comment), _) => format!("{line} // {comment}"),
                    (None, _) => line,
                }
            })
            .join("\n");

        let mut out = String::new();
        if options.show_file_header {
            match self {
                Format::CssVariables => out.push_str(&format!("/**\n * {HEADER}\n */\n\n")),
                _ => out.push_str(&format!("// {HEADER}\n\n")),
            }
        }
        match self {
            Format::CssVariables => {
                let selector = options.selector.as_deref().unwrap_or(":root");
                out.push_str(&format!("{selector} {{\n{lines}\n}}\n"));
            }
            _ => {
                out.push_str(&lines);
                out.push('\n');
            }
        }
        out
    }

    fn reference(&self, name: &str) -> String {
        match self {
            Format::CssVariables => format!("var(--{name})"),
            Format::ScssVariables => format!("${name}"),
            Format::LessVariables => format!("@{name}"),
        }
    }

    fn value(
        &self,
        token: &Token,
        in_file: &HashMap<&[String], &Token>,
        everywhere: &HashMap<&[String], &Token>,
        options: &FileOptions,
    ) -> String {
        if !options.output_references {
            return token.value.clone();
        }
        let Some(expression) = &token.original else {
            return token.value.clone();
        };
        let references = expression.references();
        if !references.iter().any(|x| in_file.contains_key(x.as_slice())) {
            return token.value.clone();
        }
        expression.render(*self == Format::CssVariables, &mut |path: &[String]| {
            match (in_file.get(path), everywhere.get(path)) {
                (Some(target), _) => self.reference(&target.name),
                (None, Some(target)) => target.value.clone(),
                (None, None) => path.join("."),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Expression;

    fn token(path: &str, value: &str, original: Option<&str>) -> Token {
        let path: Vec<String> = path.split('.').map(str::to_string).collect();
        Token {
            name: path.join("-"),
            path,
            value: value.to_string(),
            original: original.map(|x| x.parse::<Expression>().unwrap()),
            ..Token::default()
        }
    }

    #[test]
    fn css_variables() {
        let mut primary = token("colors.primary", "#ff0000", None);
        primary.comment = Some("brand red".to_string());
        let secondary = token("colors.secondary", "#00ff00", None);
        let out =
            Format::CssVariables.render(&[&primary, &secondary], &[], &FileOptions::default());
        assert_eq!(
            out,
            "/**\n * Do not edit directly, this file was auto-generated.\n */\n\n\
             :root {\n  --colors-primary: #ff0000; /* brand red */\n  --colors-secondary: #00ff00;\n}\n"
        );
    }

    #[test]
    fn scss_and_less_variables() {
        let small = token("spacing.small", "4px", None);
        let options = FileOptions {
            show_file_header: false,
            ..FileOptions::default()
        };
        assert_eq!(
            Format::ScssVariables.render(&[&small], &[], &options),
            "$spacing-small: 4px;\n"
        );
        assert_eq!(
            Format::LessVariables.render(&[&small], &[], &options),
            "@spacing-small: 4px;\n"
        );
    }

    #[test]
    fn output_references() {
        let base = token("spacing.base", "4px", Some("4px"));
        let large = token("spacing.large", "8px", Some("{spacing.base} * 2"));
        let brand = token("colors.brand", "#ff0000", Some("#ff0000"));
        let border = token("spacing.border", "1px solid #ff0000", Some("1px solid {colors.brand}"));
        let all = [base.clone(), large.clone(), brand, border.clone()];
        let options = FileOptions {
            output_references: true,
            show_file_header: false,
            selector: Some(".theme".to_string()),
        };
        assert_eq!(
            Format::CssVariables.render(&[&base, &large, &border], &all, &options),
            ".theme {\n  --spacing-base: 4px;\n  --spacing-large: calc(var(--spacing-base) * 2);\n  --spacing-border: 1px solid #ff0000;\n}\n"
        );
        assert_eq!(
            Format::ScssVariables.render(&[&base, &large], &all, &options),
            "$spacing-base: 4px;\n$spacing-large: $spacing-base * 2;\n"
        );
    }

    #[test]
    fn unknown_format() {
        assert_eq!(Format::from_name("css/variables"), Some(Format::CssVariables));
        assert_eq!(Format::from_name("android/colors"), None);
    }
}
