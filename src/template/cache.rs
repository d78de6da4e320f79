//! Shape cache keyed on statics identity

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::{compile, Shape, Statics};
use crate::config::EngineConfig;
use crate::error::CompileError;

struct Entry {
    statics: Weak<Statics>,
    shape: Rc<Shape>,
}

/// Compiled shapes, one per live `Rc<Statics>` allocation
///
/// Entries hold the statics weakly. Once every `Rc` to a statics is dropped
/// its entry is dead and gets pruned on the next miss.
#[derive(Default)]
pub struct ShapeCache {
    entries: HashMap<*const Statics, Entry>,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached shape for `statics`, if it is still live
    pub fn get(&self, statics: &Rc<Statics>) -> Option<Rc<Shape>> {
        let entry = self.entries.get(&Rc::as_ptr(statics))?;
        let live = entry.statics.upgrade()?;
        Rc::ptr_eq(&live, statics).then(|| Rc::clone(&entry.shape))
    }

    /// Cached shape for `statics`, compiling it on a miss
    ///
    /// A failed compile caches nothing.
    pub fn get_or_compile(
        &mut self,
        statics: &Rc<Statics>,
        config: &EngineConfig,
    ) -> Result<Rc<Shape>, CompileError> {
        if let Some(shape) = self.get(statics) {
            trace!("shape cache hit");
            return Ok(shape);
        }
        self.prune();
        let shape = Rc::new(compile(statics, config)?);
        self.entries.insert(
            Rc::as_ptr(statics),
            Entry {
                statics: Rc::downgrade(statics),
                shape: Rc::clone(&shape),
            },
        );
        Ok(shape)
    }

    /// Drop entries whose statics are gone
    pub fn prune(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.statics.strong_count() > 0);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "pruned dead template shapes");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_statics_hit() {
        let mut cache = ShapeCache::new();
        let config = EngineConfig::default();
        let statics = Rc::new(Statics::parse("<p>{}</p>"));
        let a = cache.get_or_compile(&statics, &config).expect("Should compile");
        let b = cache.get_or_compile(&statics, &config).expect("Should compile");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_equal_text_distinct_identity_misses() {
        let mut cache = ShapeCache::new();
        let config = EngineConfig::default();
        let a = Rc::new(Statics::parse("<p>{}</p>"));
        let b = Rc::new(Statics::parse("<p>{}</p>"));
        let shape_a = cache.get_or_compile(&a, &config).expect("Should compile");
        let shape_b = cache.get_or_compile(&b, &config).expect("Should compile");
        assert!(!Rc::ptr_eq(&shape_a, &shape_b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_dead_entries_pruned_on_miss() {
        let mut cache = ShapeCache::new();
        let config = EngineConfig::default();
        let first = Rc::new(Statics::parse("<i></i>"));
        cache.get_or_compile(&first, &config).expect("Should compile");
        drop(first);
        let second = Rc::new(Statics::parse("<b></b>"));
        cache.get_or_compile(&second, &config).expect("Should compile");
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&second).is_some());
    }

    #[test]
    fn test_failed_compile_not_cached() {
        let mut cache = ShapeCache::new();
        let statics = Rc::new(Statics::parse("<p>"));
        assert!(cache
            .get_or_compile(&statics, &EngineConfig::default())
            .is_err());
        assert!(cache.is_empty());
    }
}
