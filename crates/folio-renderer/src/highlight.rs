//! Class-based syntax highlighting for code blocks.

/// Prefix on every highlight class so theme CSS can't collide with page CSS.
pub const CSS_PREFIX: &str = "hl-";

/// Language names accepted from the source, mapped to the syntax token used
/// to look them up. Names outside this table render as plain text.
const LANGUAGES: &[(&str, &str)] = &[
    ("javascript", "js"),
    ("typescript", "js"),
    ("tsx", "js"),
    ("jsx", "js"),
    ("json", "json"),
    ("css", "css"),
    ("html", "html"),
    ("python", "py"),
    ("bash", "sh"),
    ("shell", "sh"),
    ("yaml", "yaml"),
    ("markdown", "md"),
    ("sql", "sql"),
];

/// The lookup token for a supported language, case-insensitively.
pub fn syntax_token(language: &str) -> Option<&'static str> {
    let language = language.trim().to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, token)| *token)
}

/// Highlighted HTML for `code`, or `None` if the language is unsupported or
/// highlighting failed.
#[cfg(feature = "syntax-highlighting")]
pub fn highlight(language: &str, code: &str) -> Option<String> {
    use std::sync::LazyLock;
    use syntect::html::{ClassStyle, ClassedHTMLGenerator};
    use syntect::parsing::SyntaxSet;
    use syntect::util::LinesWithEndings;

    static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

    let token = syntax_token(language)?;
    let syntax = SYNTAX_SET.find_syntax_by_token(token)?;

    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        syntax,
        &SYNTAX_SET,
        ClassStyle::SpacedPrefixed { prefix: CSS_PREFIX },
    );
    for line in LinesWithEndings::from(code) {
        if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
            tracing::warn!(language, error = %e, "highlighting failed, using plain text");
            return None;
        }
    }
    Some(generator.finalize())
}

#[cfg(not(feature = "syntax-highlighting"))]
pub fn highlight(_language: &str, _code: &str) -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_languages() {
        assert_eq!(syntax_token("TypeScript"), Some("js"));
        assert_eq!(syntax_token("python"), Some("py"));
        assert_eq!(syntax_token("plain text"), None);
        assert_eq!(syntax_token("haskell"), None);
    }

    #[test]
    fn test_unsupported_language_not_highlighted() {
        assert_eq!(highlight("haskell", "main = pure ()"), None);
    }

    #[cfg(feature = "syntax-highlighting")]
    #[test]
    fn test_highlight_emits_prefixed_classes() {
        let html = highlight("rust-is-not-listed", "fn main() {}");
        assert!(html.is_none());

        let html = highlight("javascript", "const x = 1;\n").unwrap();
        assert!(html.contains("hl-"));
        assert!(html.contains("const"));
    }
}
