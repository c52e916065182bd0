//! Utility module to safely refer to a replaceable Arc.

use std::sync::{Arc, RwLock};

/// A shareable optional reference to an [`Arc`] whose value can be
/// swapped out as a whole.
///
/// Readers get their own `Arc`, so they keep seeing a consistent value
/// even if it is replaced while they hold it.
#[derive(Debug)]
pub(crate) struct SharedMutArc<T> {
    /// Locked reference to the current value.
    ///
    /// (It's okay to use RwLock here, because we never suspend
    /// while holding the lock.)
    val: RwLock<Option<Arc<T>>>,
}

impl<T> Default for SharedMutArc<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SharedMutArc<T> {
    /// Construct a new empty SharedMutArc.
    pub(crate) fn new() -> Self {
        SharedMutArc {
            val: RwLock::new(None),
        }
    }

    /// Replace the current value with `new_val`.
    pub(crate) fn replace(&self, new_val: T) {
        let mut w = self.val.write().expect("Poisoned lock");
        *w = Some(Arc::new(new_val));
    }

    /// Remove the current value of this SharedMutArc.
    pub(crate) fn clear(&self) {
        let mut w = self.val.write().expect("Poisoned lock");
        *w = None;
    }

    /// Return a new reference to the current value, if there is one.
    pub(crate) fn get(&self) -> Option<Arc<T>> {
        let r = self.val.read().expect("Poisoned lock");
        r.as_ref().map(Arc::clone)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn replace_and_clear() {
        let val: SharedMutArc<Vec<u32>> = SharedMutArc::new();
        assert_eq!(val.get(), None);

        val.replace(vec![1]);
        let old = val.get().unwrap();
        val.replace(vec![2, 3]);
        assert_eq!(old.as_ref()[..], [1]);
        assert_eq!(val.get().unwrap().as_ref()[..], [2, 3]);

        val.clear();
        assert_eq!(val.get(), None);
    }
}
