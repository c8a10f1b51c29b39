//! Memoizing source decorator.

use crate::config::Settings;
use crate::error::Result;
use crate::resolver;
use crate::source::{layer_locale, LocaleData, ResolvedLink, Source};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

type Cache<K, V> = Mutex<HashMap<K, V>>;

/// Wraps a source and remembers the results of its expensive lookups.
///
/// Only valid while the wrapped content does not change, which holds for a
/// single generation run.
pub struct CachedSource<S> {
    inner: S,
    config: Mutex<Option<Arc<Settings>>>,
    locales: Cache<(String, String), Arc<LocaleData>>,
    templates: Cache<String, String>,
    includes: Cache<(String, String), String>,
    links: Cache<(String, String), Option<ResolvedLink>>,
}

fn memoize<K, V>(cache: &Cache<K, V>, key: K, load: impl FnOnce() -> Result<V>) -> Result<V>
where
    K: Eq + Hash,
    V: Clone,
{
    if let Some(value) = cache.lock().unwrap_or_else(PoisonError::into_inner).get(&key) {
        return Ok(value.clone());
    }
    // The lock is not held while loading: loaders may recurse into the cache.
    let value = load()?;
    cache.lock().unwrap_or_else(PoisonError::into_inner).insert(key, value.clone());
    Ok(value)
}

impl<S: Source> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            config: Mutex::new(None),
            locales: Mutex::default(),
            templates: Mutex::default(),
            includes: Mutex::default(),
            links: Mutex::default(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Source> Source for CachedSource<S> {
    fn has_file(&self, filename: &str) -> bool {
        self.inner.has_file(filename)
    }

    fn read_file(&self, filename: &str) -> Result<Vec<u8>> {
        self.inner.read_file(filename)
    }

    fn list_files(&self, subdir: &str) -> Result<Vec<String>> {
        self.inner.list_files(subdir)
    }

    fn version(&self) -> String {
        self.inner.version()
    }

    fn read_config(&self) -> Result<Arc<Settings>> {
        let mut config = self.config.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(settings) = config.as_ref() {
            return Ok(Arc::clone(settings));
        }
        let settings = self.inner.read_config()?;
        *config = Some(Arc::clone(&settings));
        Ok(settings)
    }

    fn read_locale(&self, locale: &str, page: &str) -> Result<Arc<LocaleData>> {
        memoize(&self.locales, (locale.to_string(), page.to_string()), || {
            layer_locale(self, locale, page)
        })
    }

    fn read_template(&self, template: &str) -> Result<String> {
        memoize(&self.templates, template.to_string(), || self.inner.read_template(template))
    }

    fn read_include(&self, include: &str, format: &str) -> Result<String> {
        memoize(&self.includes, (include.to_string(), format.to_string()), || {
            self.inner.read_include(include, format)
        })
    }

    fn resolve_link(&self, url: &str, locale: &str) -> Result<Option<ResolvedLink>> {
        memoize(&self.links, (url.to_string(), locale.to_string()), || {
            resolver::resolve_link(self, url, locale)
        })
    }
}
