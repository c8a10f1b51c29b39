//! Verbatim HTML pages.

use crate::converter::{html_escapes, insert_localized_strings, process_links, Converter, RenderParams};
use crate::error::Result;

/// Passes content through as HTML, only substituting localized strings and links.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawConverter;

impl Converter for RawConverter {
    fn get_html(&self, content: &str, params: &RenderParams) -> Result<String> {
        let result = insert_localized_strings(content, params, &html_escapes())?;
        process_links(&result, params)
    }
}
