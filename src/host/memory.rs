//! In-memory [`TabDirectory`].
//!
//! Behaves like a small browser: tabs live in groups, positions are
//! renumbered `0..n` inside each group after every mutation, every group
//! keeps one active tab while it has any, and a page only accepts messages
//! while an overlay is injected and the page has not navigated since.

use crate::message::{GroupId, HostMessage, TabId, TabRecord};
use crate::traits::TabDirectory;
use log::debug;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::mpsc;

/// Errors produced by [`MemoryDirectory`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryDirectoryError {
    #[error("no tab with id {0}")]
    NoSuchTab(TabId),
    #[error("no group with id {0}")]
    NoSuchGroup(GroupId),
    #[error("could not reach {0}: no overlay is listening")]
    NoReceiver(TabId),
}

#[derive(Debug, Default)]
struct Inner {
    /// Contiguous per group, in position order.
    tabs: Vec<TabRecord>,
    focused: Option<GroupId>,
    /// Pages with a running overlay.
    live: HashSet<TabId>,
    popups: HashMap<TabId, String>,
    fail_deliveries: usize,
    injections: usize,
}

impl Inner {
    fn find(&self, id: TabId) -> Result<usize, MemoryDirectoryError> {
        self.tabs
            .iter()
            .position(|t| t.id == id)
            .ok_or(MemoryDirectoryError::NoSuchTab(id))
    }

    fn has_group(&self, group: GroupId) -> bool {
        self.tabs.iter().any(|t| t.group_id == group)
    }

    /// Regroup and assign positions `0..n` in vector order.
    fn renumber(&mut self) {
        self.tabs.sort_by_key(|t| t.group_id);
        let mut counters: HashMap<GroupId, i64> = HashMap::new();
        for tab in &mut self.tabs {
            let next = counters.entry(tab.group_id).or_insert(0);
            tab.position = *next;
            *next += 1;
        }
    }

    /// Make sure `group` has an active tab, preferring the one at `near`.
    fn ensure_active(&mut self, group: GroupId, near: i64) {
        let members: Vec<usize> = (0..self.tabs.len())
            .filter(|&i| self.tabs[i].group_id == group)
            .collect();
        if members.is_empty() || members.iter().any(|&i| self.tabs[i].is_active) {
            return;
        }
        let pick = near.clamp(0, members.len() as i64 - 1) as usize;
        self.tabs[members[pick]].is_active = true;
    }

    /// Keep focus on an existing group.
    fn ensure_focus(&mut self) {
        let focused_exists = self.focused.is_some_and(|g| self.has_group(g));
        if !focused_exists {
            self.focused = self.tabs.first().map(|t| t.group_id);
        }
    }
}

/// A tab directory that lives entirely in memory.
///
/// Messages delivered to live pages are forwarded to the outbox channel, if
/// one is attached, as `(page, message)` pairs.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    inner: RefCell<Inner>,
    outbox: Option<mpsc::Sender<(TabId, HostMessage)>>,
}

impl MemoryDirectory {
    /// Build a directory from `tabs`.  Positions are normalized per group
    /// (keeping their relative order) and the focused group is the one
    /// holding the first active tab.
    pub fn new(tabs: Vec<TabRecord>) -> Self {
        let mut inner = Inner {
            tabs,
            ..Inner::default()
        };
        inner.tabs.sort_by_key(|t| (t.group_id, t.position));
        inner.renumber();
        let groups: Vec<GroupId> = {
            let mut g: Vec<GroupId> = inner.tabs.iter().map(|t| t.group_id).collect();
            g.dedup();
            g
        };
        for group in groups {
            inner.ensure_active(group, 0);
        }
        inner.focused = inner
            .tabs
            .iter()
            .find(|t| t.is_active)
            .map(|t| t.group_id);
        inner.ensure_focus();
        Self {
            inner: RefCell::new(inner),
            outbox: None,
        }
    }

    /// Forward delivered messages into `tx`.
    pub fn set_outbox(&mut self, tx: mpsc::Sender<(TabId, HostMessage)>) {
        self.outbox = Some(tx);
    }

    /// Snapshot of every tab.
    pub fn tabs(&self) -> Vec<TabRecord> {
        self.inner.borrow().tabs.clone()
    }

    pub fn focused_group(&self) -> Option<GroupId> {
        self.inner.borrow().focused
    }

    /// Whether an overlay is running in `page`.
    pub fn is_live(&self, page: TabId) -> bool {
        self.inner.borrow().live.contains(&page)
    }

    /// How many times an overlay has been injected.
    pub fn injection_count(&self) -> usize {
        self.inner.borrow().injections
    }

    /// The informational popup configured for `page`.
    pub fn popup(&self, page: TabId) -> Option<String> {
        self.inner.borrow().popups.get(&page).cloned()
    }

    /// Make the next `n` deliveries fail as if the overlay's context had
    /// been invalidated.
    pub fn fail_next_deliveries(&self, n: usize) {
        self.inner.borrow_mut().fail_deliveries = n;
    }

    /// Load `url` in `page`.  Any overlay running there is gone afterwards.
    pub fn navigate(&self, page: TabId, url: &str) -> Result<(), MemoryDirectoryError> {
        let mut inner = self.inner.borrow_mut();
        let idx = inner.find(page)?;
        inner.tabs[idx].url = url.to_string();
        inner.live.remove(&page);
        debug!("{} navigated to {}", page, url);
        Ok(())
    }
}

impl TabDirectory for MemoryDirectory {
    type Error = MemoryDirectoryError;

    fn query_all(&self) -> Result<Vec<TabRecord>, MemoryDirectoryError> {
        Ok(self.tabs())
    }

    fn active_tab(&self) -> Result<Option<TabRecord>, MemoryDirectoryError> {
        let inner = self.inner.borrow();
        let Some(group) = inner.focused else {
            return Ok(None);
        };
        Ok(inner
            .tabs
            .iter()
            .find(|t| t.group_id == group && t.is_active)
            .cloned())
    }

    fn get(&self, id: TabId) -> Result<Option<TabRecord>, MemoryDirectoryError> {
        Ok(self.inner.borrow().tabs.iter().find(|t| t.id == id).cloned())
    }

    fn remove(&self, ids: &[TabId]) -> Result<(), MemoryDirectoryError> {
        let mut inner = self.inner.borrow_mut();
        for id in ids {
            inner.find(*id)?;
        }
        let mut orphaned: Vec<(GroupId, i64)> = Vec::new();
        inner.tabs.retain(|t| {
            let gone = ids.contains(&t.id);
            if gone && t.is_active {
                orphaned.push((t.group_id, t.position));
            }
            !gone
        });
        for id in ids {
            inner.live.remove(id);
            inner.popups.remove(id);
        }
        inner.renumber();
        for (group, position) in orphaned {
            inner.ensure_active(group, position);
        }
        inner.ensure_focus();
        debug!("removed {} tab(s)", ids.len());
        Ok(())
    }

    fn focus_group(&self, group: GroupId) -> Result<(), MemoryDirectoryError> {
        let mut inner = self.inner.borrow_mut();
        if !inner.has_group(group) {
            return Err(MemoryDirectoryError::NoSuchGroup(group));
        }
        inner.focused = Some(group);
        Ok(())
    }

    fn activate(&self, id: TabId) -> Result<(), MemoryDirectoryError> {
        let mut inner = self.inner.borrow_mut();
        let idx = inner.find(id)?;
        let group = inner.tabs[idx].group_id;
        for tab in inner.tabs.iter_mut().filter(|t| t.group_id == group) {
            tab.is_active = tab.id == id;
        }
        Ok(())
    }

    fn move_tab(&self, id: TabId, group: GroupId, index: i64) -> Result<(), MemoryDirectoryError> {
        let mut inner = self.inner.borrow_mut();
        let idx = inner.find(id)?;
        if !inner.has_group(group) {
            return Err(MemoryDirectoryError::NoSuchGroup(group));
        }

        let mut tab = inner.tabs.remove(idx);
        let from_group = tab.group_id;
        let from_position = tab.position;
        if from_group != group {
            tab.is_active = false;
        }
        tab.group_id = group;
        inner.renumber();

        let members: Vec<usize> = (0..inner.tabs.len())
            .filter(|&i| inner.tabs[i].group_id == group)
            .collect();
        // -1 (or anything past the end) appends.
        let insert_at = match usize::try_from(index) {
            Ok(i) if i < members.len() => members[i],
            _ => members.last().map_or(inner.tabs.len(), |&last| last + 1),
        };
        inner.tabs.insert(insert_at, tab);
        inner.renumber();

        if from_group != group {
            inner.ensure_active(from_group, from_position);
            inner.ensure_focus();
        }
        debug!("moved {} to {} in {}", id, index, group);
        Ok(())
    }

    fn inject(&self, page: TabId) -> Result<(), MemoryDirectoryError> {
        let mut inner = self.inner.borrow_mut();
        inner.find(page)?;
        inner.live.insert(page);
        inner.injections += 1;
        debug!("overlay injected into {}", page);
        Ok(())
    }

    fn deliver(&self, page: TabId, message: &HostMessage) -> Result<(), MemoryDirectoryError> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.fail_deliveries > 0 {
                inner.fail_deliveries -= 1;
                return Err(MemoryDirectoryError::NoReceiver(page));
            }
            if !inner.live.contains(&page) {
                return Err(MemoryDirectoryError::NoReceiver(page));
            }
        }
        if let Some(tx) = &self.outbox {
            tx.send((page, message.clone()))
                .map_err(|_| MemoryDirectoryError::NoReceiver(page))?;
        }
        Ok(())
    }

    fn set_popup(&self, page: TabId, popup: Option<&str>) -> Result<(), MemoryDirectoryError> {
        let mut inner = self.inner.borrow_mut();
        match popup {
            Some(p) => {
                inner.popups.insert(page, p.to_string());
            }
            None => {
                inner.popups.remove(&page);
            }
        }
        Ok(())
    }
}

//  Tests
