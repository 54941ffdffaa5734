//! Background scroll lock.
//!
//! While the overlay is open the page behind it must not scroll.  The lock
//! remembers the inline `overflow` values it replaced and puts exactly those
//! back on release, so pages that set their own overflow are left as they
//! were.

use crate::traits::{PageScroll, ScrollTarget};
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;

const TARGETS: [ScrollTarget; 2] = [ScrollTarget::Body, ScrollTarget::Document];

/// Saved inline values while the lock is held.
#[derive(Debug, Default)]
pub struct ScrollLock {
    saved: Option<HashMap<ScrollTarget, String>>,
}

impl ScrollLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.saved.is_some()
    }

    /// Save the current values and set `overflow: hidden`.  Locking twice
    /// keeps the values saved by the first call.
    pub fn lock<P: PageScroll>(&mut self, page: &P) {
        if self.saved.is_some() {
            return;
        }
        let saved = TARGETS
            .iter()
            .map(|t| (*t, page.overflow(*t)))
            .collect::<HashMap<_, _>>();
        debug!("scroll lock (saved {:?})", saved);
        for t in TARGETS {
            page.set_overflow(t, "hidden");
        }
        self.saved = Some(saved);
    }

    /// Restore the saved values.  No-op when not locked.
    pub fn unlock<P: PageScroll>(&mut self, page: &P) {
        if let Some(saved) = self.saved.take() {
            for t in TARGETS {
                let value = saved.get(&t).map(String::as_str).unwrap_or("");
                page.set_overflow(t, value);
            }
            debug!("scroll unlocked");
        }
    }
}

/// A page that only remembers its overflow values.
///
/// Used by the binaries, which have no real page, and by tests.
#[derive(Debug, Default)]
pub struct InMemoryPage {
    values: RefCell<HashMap<ScrollTarget, String>>,
}

impl InMemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page whose author already set inline overflow values.
    pub fn with_overflow(body: &str, document: &str) -> Self {
        let page = Self::new();
        page.set_overflow(ScrollTarget::Body, body);
        page.set_overflow(ScrollTarget::Document, document);
        page
    }
}

impl PageScroll for InMemoryPage {
    fn overflow(&self, target: ScrollTarget) -> String {
        self.values.borrow().get(&target).cloned().unwrap_or_default()
    }

    fn set_overflow(&self, target: ScrollTarget, value: &str) {
        self.values.borrow_mut().insert(target, value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_hides_and_unlock_restores_exact_values() {
        let page = InMemoryPage::with_overflow("scroll", "auto");
        let mut lock = ScrollLock::new();

        lock.lock(&page);
        assert!(lock.is_locked());
        assert_eq!(page.overflow(ScrollTarget::Body), "hidden");
        assert_eq!(page.overflow(ScrollTarget::Document), "hidden");

        lock.unlock(&page);
        assert!(!lock.is_locked());
        assert_eq!(page.overflow(ScrollTarget::Body), "scroll");
        assert_eq!(page.overflow(ScrollTarget::Document), "auto");
    }

    #[test]
    fn double_lock_keeps_first_snapshot() {
        let page = InMemoryPage::with_overflow("visible", "");
        let mut lock = ScrollLock::new();
        lock.lock(&page);
        lock.lock(&page);
        lock.unlock(&page);
        assert_eq!(page.overflow(ScrollTarget::Body), "visible");
        assert_eq!(page.overflow(ScrollTarget::Document), "");
    }

    #[test]
    fn unlock_without_lock_is_noop() {
        let page = InMemoryPage::with_overflow("clip", "clip");
        let mut lock = ScrollLock::new();
        lock.unlock(&page);
        assert_eq!(page.overflow(ScrollTarget::Body), "clip");
    }
}
