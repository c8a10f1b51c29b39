//! Conversion of page, include and template bodies into HTML.
//!
//! Each content format has a [`Converter`]. The shared steps every format goes
//! through live here: parameter headers, localized string substitution, link
//! rewriting, include resolution and the `<head>` split.

use crate::config::Settings;
use crate::constants::{DEFAULT_TEMPLATE, MAX_INCLUDE_DEPTH};
use crate::error::{Error, Result};
use crate::source::{LocaleData, Source};
use html_escape::decode_html_entities;
use indexmap::IndexMap;
use log::debug;
use minijinja::Value;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

pub mod filters;
pub mod markdown;
pub mod raw;
pub mod template;
pub mod toc;

pub use filters::{FilterProvider, TemplateFilterProvider};
pub use markdown::MarkdownConverter;
pub use raw::RawConverter;
pub use template::TemplateConverter;

pub const RAW_FORMAT: &str = "raw";
pub const MARKDOWN_FORMAT: &str = "md";
pub const TEMPLATE_FORMAT: &str = "tmpl";

/// Characters replaced by their entity when a localized string is inserted.
pub type Escapes = HashMap<char, String>;

static PARAM_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[\w\-]+\s*=").unwrap());
static LOCALIZED_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([\w\-]+)(\([^()$]+\))?\$").unwrap());
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(<a\s[^<>]*\b(href)=")([^<>"]+)(")"#).unwrap());
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(<img\s[^<>]*\b(src)=")([^<>"]+)(")"#).unwrap());
static INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<\?\s*include\s+"?([^\s<>"]+)"?\s*\?>"#).unwrap());
static HEAD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<head>(.*?)</head>").unwrap());

/// The five characters with a meaning in HTML markup.
pub fn html_escapes() -> Escapes {
    [('<', "&lt;"), ('>', "&gt;"), ('&', "&amp;"), ('"', "&quot;"), ('\'', "&#39;")]
        .into_iter()
        .map(|(c, e)| (c, e.to_string()))
        .collect()
}

pub fn escape(text: &str, escapes: &Escapes) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match escapes.get(&c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    result
}

pub fn escape_html(text: &str) -> String {
    escape(text, &html_escapes())
}

/// Like [`Regex::replace_all`], but the replacement may fail.
pub(crate) fn try_replace_all<F>(re: &Regex, text: &str, mut replacement: F) -> Result<String>
where
    F: FnMut(&Captures) -> Result<String>,
{
    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let whole = caps.get(0).expect("group 0 always participates in a match");
        result.push_str(&text[last..whole.start()]);
        result.push_str(&replacement(&caps)?);
        last = whole.end();
    }
    result.push_str(&text[last..]);
    Ok(result)
}

/// Context threaded through the conversion of one page.
///
/// Includes share the params of the page that includes them, so parameter
/// headers in an include are visible to everything rendered after it.
#[derive(Clone)]
pub struct RenderParams {
    pub source: Arc<dyn Source>,
    pub template: String,
    pub title: String,
    pub locale: String,
    pub page: String,
    pub settings: Arc<Settings>,
    pub localedata: Arc<LocaleData>,
    pub site_url: Option<String>,
    pub available_locales: Vec<String>,
    pub head: String,
    pub body: String,
    /// Parameter-header values that have no dedicated field.
    pub extra: IndexMap<String, String>,
}

impl RenderParams {
    pub fn new(
        source: Arc<dyn Source>,
        locale: &str,
        page: &str,
        settings: Arc<Settings>,
        localedata: Arc<LocaleData>,
    ) -> Self {
        Self {
            source,
            template: DEFAULT_TEMPLATE.to_string(),
            title: "title".to_string(),
            locale: locale.to_string(),
            page: page.to_string(),
            settings,
            localedata,
            site_url: None,
            available_locales: Vec::new(),
            head: String::new(),
            body: String::new(),
            extra: IndexMap::new(),
        }
    }

    pub fn set(&mut self, name: &str, value: &str) {
        match name {
            "template" => self.template = value.to_string(),
            "title" => self.title = value.to_string(),
            _ => {
                self.extra.insert(name.to_string(), value.to_string());
            }
        }
    }

    /// Variables visible to templates.
    pub fn context(&self) -> BTreeMap<String, Value> {
        let mut context: BTreeMap<String, Value> = self
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect();
        context.insert("template".into(), Value::from(self.template.as_str()));
        context.insert("title".into(), Value::from(self.title.as_str()));
        context.insert("locale".into(), Value::from(self.locale.as_str()));
        context.insert("page".into(), Value::from(self.page.as_str()));
        context.insert("config".into(), Value::from_serialize(&*self.settings));
        context.insert(
            "available_locales".into(),
            Value::from_serialize(&self.available_locales),
        );
        context.insert("head".into(), Value::from_safe_string(self.head.clone()));
        context.insert("body".into(), Value::from_safe_string(self.body.clone()));
        if let Some(site_url) = &self.site_url {
            context.insert("site_url".into(), Value::from(site_url.as_str()));
        }
        context
    }
}

/// Pops leading `key = value` lines off `content` and stores them in `params`.
pub fn strip_params(content: &str, params: &mut RenderParams) -> String {
    let mut rest = content;
    while !rest.is_empty() {
        let end = rest.find('\n').map_or(rest.len(), |i| i + 1);
        let line = &rest[..end];
        if !PARAM_LINE.is_match(line) {
            break;
        }
        if let Some((name, value)) = line.split_once('=') {
            params.set(name.trim(), value.trim());
        }
        rest = &rest[end..];
    }
    rest.to_string()
}

/// Looks up and formats one localized string.
///
/// The text is escaped with `escapes`; `<a>` placeholders then receive the
/// given `links` in order, and `<strong>`/`<em>` are the only tags let through.
///
/// # Errors
/// * `Error::LocalizationError` if `name` is not defined
pub fn localize_string(
    name: &str,
    localedata: &LocaleData,
    escapes: &Escapes,
    links: &[String],
    page: &str,
) -> Result<String> {
    let text = localedata.get(name).ok_or_else(|| Error::LocalizationError {
        name: name.to_string(),
        page: page.to_string(),
    })?;

    let tag = |t: &str| regex::escape(&escape(t, escapes));
    let mut result = escape(text.trim(), escapes);

    let anchor = Regex::new(&format!("(?s){}([^<>]*?){}", tag("<a>"), tag("</a>")))
        .expect("escaped placeholder is a valid pattern");
    for link in links {
        let href = escape_html(link);
        result = anchor
            .replacen(&result, 1, |caps: &Captures| format!(r#"<a href="{href}">{}</a>"#, &caps[1]))
            .into_owned();
    }

    for allowed in ["strong", "em"] {
        let pattern = Regex::new(&format!(
            "(?s){}([^<>]*?){}",
            tag(&format!("<{allowed}>")),
            tag(&format!("</{allowed}>"))
        ))
        .expect("escaped placeholder is a valid pattern");
        result = pattern
            .replace_all(&result, |caps: &Captures| format!("<{allowed}>{}</{allowed}>", &caps[1]))
            .into_owned();
    }
    Ok(result)
}

/// Replaces every `$name$` and `$name(link, ...)$` token in `text`.
pub fn insert_localized_strings(
    text: &str,
    params: &RenderParams,
    escapes: &Escapes,
) -> Result<String> {
    try_replace_all(&LOCALIZED_STRING, text, |caps| {
        let links: Vec<String> = caps
            .get(2)
            .map(|m| {
                m.as_str()
                    .trim_matches(['(', ')'])
                    .split(',')
                    .map(|link| link.trim().to_string())
                    .collect()
            })
            .unwrap_or_default();
        localize_string(&caps[1], &params.localedata, escapes, &links, &params.page)
    })
}

/// Rewrites `<a href>` and `<img src>` targets that point at pages of this site.
/// Links also get an `hreflang` attribute naming the chosen locale.
pub fn process_links(text: &str, params: &RenderParams) -> Result<String> {
    let process_link = |caps: &Captures| -> Result<String> {
        let (pre, attr, post) = (&caps[1], &caps[2], &caps[4]);
        let mut url = decode_html_entities(&caps[3]).into_owned();
        let mut post = post.to_string();

        if let Some(resolved) = params.source.resolve_link(&url, &params.locale)? {
            url = resolved.url;
            if attr == "href" {
                post.push_str(&format!(r#" hreflang="{}""#, escape_html(&resolved.locale)));
            }
        }
        Ok(format!("{pre}{}{post}", escape_html(&url)))
    };

    let text = try_replace_all(&LINK, text, &process_link)?;
    try_replace_all(&IMAGE, &text, &process_link)
}

/// Removes every `<head>...</head>` block, returning `(head, body)`.
pub fn split_head(html: &str) -> (String, String) {
    let head: String = HEAD.captures_iter(html).map(|caps| caps[1].to_string()).collect();
    let body = HEAD.replace_all(html, "").into_owned();
    (head, body)
}

/// Turns the text of one content format into HTML.
pub trait Converter: Send + Sync {
    /// Converts `content` (parameter headers already removed) into HTML.
    /// Includes are not resolved yet.
    fn get_html(&self, content: &str, params: &RenderParams) -> Result<String>;
}

/// Converters by format name, in the order includes are looked up.
#[derive(Default)]
pub struct ConverterRegistry {
    converters: IndexMap<String, Box<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `raw`, `md` and `tmpl` converters.
    pub fn with_defaults(filters: Arc<dyn FilterProvider>) -> Self {
        let mut registry = Self::new();
        registry.register(RAW_FORMAT, RawConverter);
        registry.register(MARKDOWN_FORMAT, MarkdownConverter);
        registry.register(TEMPLATE_FORMAT, TemplateConverter::new(filters));
        registry
    }

    pub fn register<C: Converter + 'static>(&mut self, format: &str, converter: C) {
        self.converters.insert(format.to_string(), Box::new(converter));
    }

    pub fn get(&self, format: &str) -> Option<&dyn Converter> {
        self.converters.get(format).map(|c| c.as_ref())
    }

    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.converters.keys().map(String::as_str)
    }

    /// Converts a page body into `(head, body)`.
    ///
    /// `content` must already have its parameter headers stripped, see [`strip_params`].
    pub fn convert_page(
        &self,
        converter: &dyn Converter,
        content: &str,
        params: &mut RenderParams,
    ) -> Result<(String, String)> {
        let html = converter.get_html(content, params)?;
        let html = self.resolve_includes(&html, params, 0)?;
        Ok(split_head(&html))
    }

    /// Converts an include or outer template into a single fragment.
    pub fn convert_fragment(
        &self,
        converter: &dyn Converter,
        content: &str,
        params: &mut RenderParams,
    ) -> Result<String> {
        self.convert_nested(converter, content, params, 0)
    }

    fn convert_nested(
        &self,
        converter: &dyn Converter,
        content: &str,
        params: &mut RenderParams,
        depth: usize,
    ) -> Result<String> {
        let content = strip_params(content, params);
        let html = converter.get_html(&content, params)?;
        self.resolve_includes(&html, params, depth)
    }

    /// Replaces `<? include name ?>` markers with the converted include.
    ///
    /// Formats are tried in registration order; the first existing include wins.
    fn resolve_includes(&self, text: &str, params: &mut RenderParams, depth: usize) -> Result<String> {
        try_replace_all(&INCLUDE, text, |caps| {
            let name = &caps[1];
            if depth >= MAX_INCLUDE_DEPTH {
                return Err(Error::IncludeCycle {
                    name: name.to_string(),
                    page: params.page.clone(),
                    depth: MAX_INCLUDE_DEPTH,
                });
            }

            let source = Arc::clone(&params.source);
            for (format, converter) in &self.converters {
                if source.has_include(name, format) {
                    debug!("Including {name}.{format} in page {}", params.page);
                    let includedata = source.read_include(name, format)?;
                    return self.convert_nested(converter.as_ref(), &includedata, params, depth + 1);
                }
            }
            Err(Error::UnresolvedInclude { name: name.to_string(), page: params.page.clone() })
        })
    }
}
