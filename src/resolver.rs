//! Intra-site link resolution.
//! Decides which locale variant a same-site link should point at and rewrites
//! it to a locale-qualified path.

use crate::error::Result;
use crate::source::{ResolvedLink, Source};
use log::warn;
use url::Url;

/// Splits a URL reference into `(path, suffix)` where `suffix` holds the
/// query and fragment components, including their delimiters.
fn split_path(url: &str) -> (&str, &str) {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url.split_at(end)
}

/// Resolves a link to a page or localizable file.
///
/// # Arguments
/// * `source` - Content tree the link points into
/// * `url` - Link target as written in the page
/// * `locale` - Locale of the page containing the link
///
/// # Returns
/// * `Ok(None)` - The URL is not a page link (has a scheme, is absolute or
///   dot-relative, only carries a query/fragment, or is empty) and must be left untouched
/// * `Ok(Some(link))` - The locale to link to and the rewritten URL
///   `/{locale}/{page}` with the original query and fragment preserved
///
/// # Notes
/// The default locale is the authority: if it has the target as a localizable
/// file, file existence decides the fallback, otherwise translation file
/// existence does. Targets unknown to the default locale keep the requested
/// locale and are reported as a warning. The default page collapses to the
/// locale root.
pub fn resolve_link<S: Source + ?Sized>(
    source: &S,
    url: &str,
    locale: &str,
) -> Result<Option<ResolvedLink>> {
    if url.is_empty() || Url::parse(url).is_ok() {
        return Ok(None);
    }

    let (page, suffix) = split_path(url);
    if page.is_empty() || page.starts_with('/') || page.starts_with('.') {
        return Ok(None);
    }

    let settings = source.read_config()?;
    let default_locale = settings.default_locale()?;
    let checked_page = settings.locale_file(page);

    let mut locale = locale;
    if source.has_localizable_file(default_locale, checked_page) {
        if !source.has_localizable_file(locale, checked_page) {
            locale = default_locale;
        }
    } else if source.has_locale(default_locale, page)? {
        if !source.has_locale(locale, page)? {
            locale = default_locale;
        }
    } else {
        warn!("Link to {page} cannot be resolved");
    }

    let page = if page == settings.default_page()? { "" } else { page };

    Ok(Some(ResolvedLink {
        locale: locale.to_string(),
        url: format!("/{locale}/{page}{suffix}"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("page"), ("page", ""));
        assert_eq!(split_path("page?a=1#top"), ("page", "?a=1#top"));
        assert_eq!(split_path("page#top"), ("page", "#top"));
        assert_eq!(split_path("#top"), ("", "#top"));
    }
}
