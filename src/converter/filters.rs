//! Template filter extensions shipped with the content.
//!
//! The template converter does not know where extension filters come from; it
//! asks a [`FilterProvider`] for a name to function mapping. The provided
//! implementation, [`TemplateFilterProvider`], reads `filters/<name>.tmpl`
//! files, each of which defines a macro named after its file.

use crate::constants::{FILTERS_DIR, TEMPLATE_EXTENSION};
use crate::error::{Error, Result};
use crate::source::{split_extension, Source};
use indexmap::IndexMap;
use log::debug;
use minijinja::value::Rest;
use minijinja::{context, AutoEscape, Environment, ErrorKind, State, Value};
use std::sync::{Arc, Mutex, PoisonError};

/// A template filter: receives the filtered value and any extra arguments.
pub type FilterFn = Arc<
    dyn Fn(&State, Value, Rest<Value>) -> std::result::Result<Value, minijinja::Error>
        + Send
        + Sync,
>;

/// Supplies extension filters for the template environment.
pub trait FilterProvider: Send + Sync {
    /// Returns the filters defined by `source`, by filter name.
    ///
    /// # Errors
    /// * `Error::FilterError` if an extension does not define its filter
    fn filters(&self, source: &dyn Source) -> Result<IndexMap<String, FilterFn>>;
}

/// Provider without any extension filters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFilters;

impl FilterProvider for NoFilters {
    fn filters(&self, _source: &dyn Source) -> Result<IndexMap<String, FilterFn>> {
        Ok(IndexMap::new())
    }
}

/// Loads filters from macros in `filters/*.tmpl`.
///
/// `filters/shout.tmpl` must define `{% macro shout(value) %}...{% endmacro %}`;
/// it is then available as `{{ text|shout }}`.
///
/// The compiled filters are kept until the source reports another version.
#[derive(Default)]
pub struct TemplateFilterProvider {
    cache: Mutex<Option<(String, IndexMap<String, FilterFn>)>>,
}

impl TemplateFilterProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Whether template `filename` exports `func`.
fn defines_macro(
    env: &Environment<'static>,
    filename: &str,
    func: &str,
) -> std::result::Result<bool, minijinja::Error> {
    let template = env.get_template(filename)?;
    let captured = template.render_captured(context! {})?;
    Ok(captured.state().lookup(func).is_some())
}

fn load_filters(source: &dyn Source) -> Result<IndexMap<String, FilterFn>> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);

    let mut definitions = Vec::new();
    for filename in source.list_files(FILTERS_DIR)? {
        let (root, extension) = split_extension(&filename);
        if extension != TEMPLATE_EXTENSION {
            continue;
        }
        let func = root.rsplit('/').next().unwrap_or(root).to_string();
        let code = source.read_text(&format!("{FILTERS_DIR}/{filename}"))?;
        env.add_template_owned(filename.clone(), code)?;
        definitions.push((func, filename));
    }

    let env = Arc::new(env);
    let mut filters: IndexMap<String, FilterFn> = IndexMap::new();
    for (func, filename) in definitions {
        if !defines_macro(&env, &filename, &func)? {
            return Err(Error::FilterError(format!(
                "Expected function {func} not found in filter file {filename}"
            )));
        }
        debug!("Registering filter {func} from {filename}");

        let env = Arc::clone(&env);
        let name = func.clone();
        let filter: FilterFn = Arc::new(move |_state: &State, value: Value, args: Rest<Value>| {
            let template = env.get_template(&filename)?;
            let captured = template.render_captured(context! {})?;
            let module = captured.state();
            let function = module.lookup(&name).ok_or_else(|| {
                minijinja::Error::new(
                    ErrorKind::UnknownFunction,
                    format!("filter {name} went missing from {filename}"),
                )
            })?;
            let mut call_args = vec![value];
            call_args.extend(args.iter().cloned());
            function.call(module, &call_args)
        });
        filters.insert(func, filter);
    }
    Ok(filters)
}

impl FilterProvider for TemplateFilterProvider {
    fn filters(&self, source: &dyn Source) -> Result<IndexMap<String, FilterFn>> {
        let version = source.version();
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached, filters)) = cache.as_ref() {
            if *cached == version {
                return Ok(filters.clone());
            }
        }

        let filters = load_filters(source)?;
        *cache = Some((version, filters.clone()));
        Ok(filters)
    }
}
