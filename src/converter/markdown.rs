//! Markdown pages.

use crate::converter::{
    html_escapes, insert_localized_strings, process_links, Converter, Escapes, RenderParams,
};
use crate::error::Result;
use pulldown_cmark::{html, Options, Parser};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Characters with a meaning in markdown syntax.
const MARKDOWN_ESCAPED_CHARS: [char; 16] =
    ['\\', '`', '*', '_', '{', '}', '[', ']', '(', ')', '>', '#', '+', '-', '.', '!'];

static HEAD_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<head>.*?</head>").unwrap());
static NUMERIC_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#(\d+);").unwrap());

/// Escapes keeping localized strings from being read as markdown or HTML.
fn markdown_escapes() -> Escapes {
    let mut escapes: Escapes = MARKDOWN_ESCAPED_CHARS
        .iter()
        .map(|&c| (c, format!("&#{};", c as u32)))
        .collect();
    escapes.extend(html_escapes());
    escapes
}

/// Decodes numeric character references, except those of HTML markup characters.
fn remove_unnecessary_entities(html: &str) -> String {
    let escapes = html_escapes();
    NUMERIC_ENTITY
        .replace_all(html, |caps: &Captures| {
            match caps[1].parse().ok().and_then(char::from_u32) {
                Some(c) if !escapes.contains_key(&c) => c.to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Renders markdown with heading attributes (`# Title {#anchor}`) enabled.
///
/// `<head>` blocks are taken out before rendering and put back in front of the
/// result unchanged, so markdown never wraps or rewrites them.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownConverter;

impl Converter for MarkdownConverter {
    fn get_html(&self, content: &str, params: &RenderParams) -> Result<String> {
        let text = insert_localized_strings(content, params, &markdown_escapes())?;

        let mut result: String =
            HEAD_BLOCK.find_iter(&text).map(|m| m.as_str()).collect::<Vec<_>>().join("\n");
        let body = HEAD_BLOCK.replace_all(&text, "");

        let mut options = Options::empty();
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        options.insert(Options::ENABLE_TABLES);
        html::push_html(&mut result, Parser::new_ext(&body, options));

        let result = remove_unnecessary_entities(&result);
        process_links(&result, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_escapes_override_with_html() {
        let escapes = markdown_escapes();
        assert_eq!(escapes[&'*'], "&#42;");
        assert_eq!(escapes[&'>'], "&gt;");
        assert_eq!(escapes[&'&'], "&amp;");
    }

    #[test]
    fn test_remove_unnecessary_entities() {
        assert_eq!(remove_unnecessary_entities("&#42;a&#60;&#39;"), "*a&#60;&#39;");
    }
}
