//! Memoized pattern compilation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::builder::PathBuilder;
use crate::error::Result;
use crate::pattern::{PathPattern, PatternOptions};

/// Caches compiled matchers and builders.
///
/// Matchers are keyed by their template alternatives and the `end` flag;
/// an empty template is compiled strict. Repeated lookups return the same
/// `Arc`.
#[derive(Debug, Default)]
pub struct PatternCache {
    patterns: Mutex<HashMap<(Vec<String>, bool), Arc<PathPattern>>>,
    builders: Mutex<HashMap<String, Arc<PathBuilder>>>,
}

impl PatternCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the matcher for `templates`, compiling it on first use.
    pub fn pattern(&self, templates: &[String], end: bool) -> Result<Arc<PathPattern>> {
        let key = (templates.to_vec(), end);
        if let Some(pattern) = self.patterns.lock().get(&key) {
            return Ok(Arc::clone(pattern));
        }

        let options = PatternOptions {
            end,
            strict: templates.iter().all(String::is_empty),
            ..PatternOptions::default()
        };
        let pattern = Arc::new(PathPattern::compile_many(templates, &options)?);
        Ok(Arc::clone(
            self.patterns.lock().entry(key).or_insert(pattern),
        ))
    }

    /// Returns the builder for `template`, parsing it on first use.
    pub fn builder(&self, template: &str) -> Result<Arc<PathBuilder>> {
        if let Some(builder) = self.builders.lock().get(template) {
            return Ok(Arc::clone(builder));
        }

        let builder = Arc::new(PathBuilder::new(template)?);
        Ok(Arc::clone(
            self.builders
                .lock()
                .entry(template.to_string())
                .or_insert(builder),
        ))
    }

    /// Drops every cached builder.
    pub fn clear_builders(&self) {
        self.builders.lock().clear();
    }

    /// Number of cached matchers.
    pub fn len(&self) -> usize {
        self.patterns.lock().len()
    }

    /// Returns whether no matcher is cached.
    pub fn is_empty(&self) -> bool {
        self.patterns.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referentially_stable() {
        let cache = PatternCache::new();
        let a = cache.pattern(&["/users/:id".to_string()], true).unwrap();
        let b = cache.pattern(&["/users/:id".to_string()], true).unwrap();
        let c = cache.pattern(&["/users/:id".to_string()], false).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_empty_template_is_strict() {
        let cache = PatternCache::new();
        let root = cache.pattern(&[String::new()], false).unwrap();
        assert_eq!(root.exec("/", None).unwrap().path, "");
    }

    #[test]
    fn test_builders_cleared() {
        let cache = PatternCache::new();
        let a = cache.builder("/a/:id").unwrap();
        cache.clear_builders();
        let b = cache.builder("/a/:id").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
