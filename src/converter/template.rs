//! Template pages, includes and outer page templates.
//! Renders content with MiniJinja and exposes the localization helpers to it.

use crate::converter::filters::FilterProvider;
use crate::converter::toc::toclist;
use crate::converter::{escape_html, html_escapes, localize_string, Converter, RenderParams};
use crate::error::{Error, Result};
use crate::source::{LocaleData, Source};
use indexmap::IndexMap;
use log::debug;
use minijinja::value::Rest;
use minijinja::{AutoEscape, Environment, ErrorKind, State, Value};
use std::sync::{Arc, Mutex, PoisonError};

/// Page state the template helpers are bound to.
struct Binding {
    source: Arc<dyn Source>,
    locale: String,
    page: String,
    localedata: Arc<LocaleData>,
    /// First error a helper failed with, handed back to the caller after rendering.
    failure: Mutex<Option<Error>>,
}

impl Binding {
    fn fail(&self, err: Error) -> minijinja::Error {
        let template_err = minijinja::Error::new(ErrorKind::InvalidOperation, err.to_string());
        let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if failure.is_none() {
            *failure = Some(err);
        }
        template_err
    }

    fn take_failure(&self) -> Option<Error> {
        self.failure.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// Optional helper arguments, passed by position or by keyword.
struct HelperArgs {
    helper: &'static str,
    values: IndexMap<&'static str, Value>,
}

impl HelperArgs {
    /// Binds `args` to the parameter `names` in order, then adds keyword arguments.
    fn bind(
        helper: &'static str,
        names: &[&'static str],
        args: Rest<Value>,
    ) -> std::result::Result<Self, minijinja::Error> {
        let mut positional = args.0;
        let keywords = match positional.last() {
            Some(last) if last.is_kwargs() => positional.pop(),
            _ => None,
        };
        if positional.len() > names.len() {
            return Err(minijinja::Error::new(
                ErrorKind::TooManyArguments,
                format!("{helper} takes at most {} optional argument(s)", names.len()),
            ));
        }

        let mut values: IndexMap<&'static str, Value> =
            names.iter().copied().zip(positional).collect();
        if let Some(keywords) = keywords {
            for key in keywords.try_iter()? {
                let name = key
                    .as_str()
                    .and_then(|key| names.iter().copied().find(|name| *name == key))
                    .ok_or_else(|| {
                        minijinja::Error::new(
                            ErrorKind::TooManyArguments,
                            format!("{helper} got an unexpected keyword argument {key}"),
                        )
                    })?;
                if values.contains_key(name) {
                    return Err(minijinja::Error::new(
                        ErrorKind::InvalidOperation,
                        format!("{helper} got multiple values for argument {name}"),
                    ));
                }
                values.insert(name, keywords.get_item(&key)?);
            }
        }
        Ok(Self { helper, values })
    }

    fn given(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|value| !value.is_none() && !value.is_undefined())
    }

    fn invalid(&self, name: &str, expected: &str) -> minijinja::Error {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("{}: argument {name} must be {expected}", self.helper),
        )
    }

    fn string(&self, name: &str) -> std::result::Result<Option<String>, minijinja::Error> {
        self.given(name)
            .map(|value| {
                value.as_str().map(str::to_string).ok_or_else(|| self.invalid(name, "a string"))
            })
            .transpose()
    }

    fn strings(&self, name: &str) -> std::result::Result<Vec<String>, minijinja::Error> {
        let Some(value) = self.given(name) else {
            return Ok(Vec::new());
        };
        value
            .try_iter()
            .map_err(|_| self.invalid(name, "a list of strings"))?
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(name, "a list of strings"))
            })
            .collect()
    }
}

/// Creates the `translate` helper: `translate(name, page=none, links=[])`.
///
/// Usage in templates:
///   {{ "heading"|translate }}
///   {{ "heading"|translate("other/page") }}
///   {{ translate("notice", links=["/download"]) }}
fn create_translate_filter(
    binding: Arc<Binding>,
) -> impl Fn(String, Rest<Value>) -> std::result::Result<Value, minijinja::Error>
       + Send
       + Sync
       + 'static {
    move |name: String, args: Rest<Value>| {
        let args = HelperArgs::bind("translate", &["page", "links"], args)?;
        let page = args.string("page")?;
        let links = args.strings("links")?;

        let localedata = match &page {
            Some(page) => binding
                .source
                .read_locale(&binding.locale, page)
                .map_err(|e| binding.fail(e))?,
            None => Arc::clone(&binding.localedata),
        };
        let page = page.as_deref().unwrap_or(&binding.page);
        localize_string(&name, &localedata, &html_escapes(), &links, page)
            .map(Value::from_safe_string)
            .map_err(|e| binding.fail(e))
    }
}

/// Creates the `linkify` helper, which opens an anchor to a page of the site:
/// `linkify(page, locale=none)`.
///
/// Usage in templates:
///   {{ "download"|linkify }}Download</a>
///   {{ "download"|linkify(locale="de") }}Herunterladen</a>
fn create_linkify_filter(
    binding: Arc<Binding>,
) -> impl Fn(String, Rest<Value>) -> std::result::Result<Value, minijinja::Error>
       + Send
       + Sync
       + 'static {
    move |page: String, args: Rest<Value>| {
        let args = HelperArgs::bind("linkify", &["locale"], args)?;
        let locale = args.string("locale")?.unwrap_or_else(|| binding.locale.clone());

        let resolved =
            binding.source.resolve_link(&page, &locale).map_err(|e| binding.fail(e))?;
        let tag = match resolved {
            Some(link) => format!(
                r#"<a href="{}" hreflang="{}">"#,
                escape_html(&link.url),
                escape_html(&link.locale)
            ),
            None => format!(r#"<a href="{}">"#, escape_html(&page)),
        };
        Ok(Value::from_safe_string(tag))
    }
}

/// `toclist` helper: the heading outline of an HTML string.
fn toclist_filter(content: String) -> Value {
    Value::from_serialize(toclist(&content))
}

/// Renders content as a MiniJinja template with HTML autoescaping.
pub struct TemplateConverter {
    filters: Arc<dyn FilterProvider>,
}

impl TemplateConverter {
    /// Creates a converter loading extension filters through `filters`.
    pub fn new(filters: Arc<dyn FilterProvider>) -> Self {
        Self { filters }
    }

    /// Builds the environment for one conversion, with helpers bound to `binding`.
    ///
    /// # Errors
    /// * `Error::FilterError` if a filter extension is broken
    fn environment<'source>(
        &self,
        params: &RenderParams,
        binding: &Arc<Binding>,
    ) -> Result<Environment<'source>> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        env.add_filter("translate", create_translate_filter(Arc::clone(binding)));
        env.add_function("translate", create_translate_filter(Arc::clone(binding)));
        env.add_filter("linkify", create_linkify_filter(Arc::clone(binding)));
        env.add_function("linkify", create_linkify_filter(Arc::clone(binding)));
        env.add_filter("toclist", toclist_filter);
        env.add_function("toclist", toclist_filter);

        for (name, filter) in self.filters.filters(params.source.as_ref())? {
            env.add_filter(name, move |state: &State, value: Value, args: Rest<Value>| {
                filter(state, value, args)
            });
        }
        Ok(env)
    }
}

impl Converter for TemplateConverter {
    /// # Errors
    /// A helper failing with a crate error (a missing string, an unreadable
    /// locale file) returns that error; other template failures are
    /// `Error::MinijinjaError`.
    fn get_html(&self, content: &str, params: &RenderParams) -> Result<String> {
        let binding = Arc::new(Binding {
            source: Arc::clone(&params.source),
            locale: params.locale.clone(),
            page: params.page.clone(),
            localedata: Arc::clone(&params.localedata),
            failure: Mutex::new(None),
        });
        let env = self.environment(params, &binding)?;

        env.render_str(content, params.context()).map_err(|err| match binding.take_failure() {
            Some(failure) => {
                debug!("Template helper failed in page {}: {err}", params.page);
                failure
            }
            None => Error::MinijinjaError(err),
        })
    }
}
