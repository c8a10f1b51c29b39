//! Page rendering.
//! Converts one page for one locale and wraps it into its page template.

use crate::converter::{strip_params, ConverterRegistry, RenderParams, TEMPLATE_FORMAT};
use crate::error::{Error, Result};
use crate::source::Source;
use log::debug;
use std::sync::Arc;

/// Renders a page to its final HTML.
///
/// # Arguments
/// * `source` - Content tree to read from
/// * `registry` - Converters by format
/// * `locale` - Locale to render
/// * `page` - Logical page path
/// * `format` - Format of the page file
/// * `site_url_override` - Replaces `general.siteurl` when the settings define one
///
/// # Returns
/// * `Result<String>` - The page template rendered around the converted page
///
/// # Errors
/// * `Error::UnknownFormat` if no converter handles `format`; raised before
///   anything is read
/// * Any localization, include, filter or template error of the page
///
/// # Flow
/// 1. Reads the page and its translations and strips parameter headers
/// 2. Determines the locales the page is available in
/// 3. Converts the page into head and body
/// 4. Renders the page template (`default` unless a header names another)
pub fn process_page(
    source: &Arc<dyn Source>,
    registry: &ConverterRegistry,
    locale: &str,
    page: &str,
    format: &str,
    site_url_override: Option<&str>,
) -> Result<String> {
    let converter = registry.get(format).ok_or_else(|| Error::UnknownFormat {
        page: page.to_string(),
        format: format.to_string(),
    })?;
    let template_converter = registry.get(TEMPLATE_FORMAT).ok_or_else(|| Error::UnknownFormat {
        page: page.to_string(),
        format: TEMPLATE_FORMAT.to_string(),
    })?;

    debug!("Rendering page {page}.{format} for locale {locale}");

    let settings = source.read_config()?;
    let localedata = source.read_locale(locale, page)?;
    let mut params =
        RenderParams::new(Arc::clone(source), locale, page, Arc::clone(&settings), localedata);
    if let Some(site_url) = settings.site_url() {
        params.site_url = Some(site_url_override.unwrap_or(site_url).to_string());
    }

    let pagedata = strip_params(&source.read_page(page, format)?, &mut params);

    let mut available_locales = Vec::new();
    for candidate in source.list_locales()? {
        if source.has_locale(&candidate, page)? {
            available_locales.push(candidate);
        }
    }
    params.available_locales = available_locales;

    let (head, body) = registry.convert_page(converter, &pagedata, &mut params)?;
    params.head = head;
    params.body = body;

    // Headers may have changed the template, so it is only read now
    let templatedata = source.read_template(&params.template)?;
    registry.convert_fragment(template_converter, &templatedata, &mut params)
}
