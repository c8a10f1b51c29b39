//! Table of contents extraction from rendered HTML.

use html_escape::decode_html_entities;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static HEADING_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<h([1-6])\s[^<>]*\bid="([^<>"]+)"[^<>]*>"#).unwrap());

/// One heading in the outline, owning the headings nested below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocItem {
    pub level: u8,
    pub anchor: String,
    pub title: String,
    pub subitems: Vec<TocItem>,
}

/// Collects all headings carrying an `id`, in document order.
fn headings(content: &str) -> Vec<TocItem> {
    let mut result = Vec::new();
    let mut position = 0;
    while let Some(caps) = HEADING_OPEN.captures_at(content, position) {
        let open = caps.get(0).expect("group 0 always participates in a match");
        let level = &caps[1];
        let close = format!("</h{level}>");
        let Some(length) = content[open.end()..].find(&close) else {
            position = open.end();
            continue;
        };
        result.push(TocItem {
            level: level.parse().unwrap_or(1),
            anchor: decode_html_entities(&caps[2]).into_owned(),
            title: decode_html_entities(&content[open.end()..open.end() + length]).into_owned(),
            subitems: Vec::new(),
        });
        position = open.end() + length + close.len();
    }
    result
}

/// Builds the nested heading outline of `content`.
///
/// A heading becomes a child of the closest preceding heading with a lower
/// level. Levels may skip, `h1` followed by `h3` nests the `h3` directly.
pub fn toclist(content: &str) -> Vec<TocItem> {
    let mut stack = vec![TocItem {
        level: 0,
        anchor: String::new(),
        title: String::new(),
        subitems: Vec::new(),
    }];

    for item in headings(content) {
        while stack.last().is_some_and(|top| top.level >= item.level) {
            close_top(&mut stack);
        }
        stack.push(item);
    }
    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().map(|root| root.subitems).unwrap_or_default()
}

/// Pops the innermost open heading and attaches it to its parent.
fn close_top(stack: &mut Vec<TocItem>) {
    if let Some(done) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.subitems.push(done);
        }
    }
}
