//! The host-side coordinator.
//!
//! [`Coordinator`] is the only writer of tab state.  It toggles the overlay
//! in the active page (injecting it first when needed), applies the
//! mutations the overlay relays and pushes the refreshed list back to the
//! page that asked.

use crate::config::HostConfig;
use crate::host::policy::RestrictionPolicy;
use crate::message::{HostMessage, OverlayRequest, TabId, TabsReply};
use crate::traits::TabDirectory;
use log::{debug, info, warn};
use std::collections::HashSet;

/// Possible errors from the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// The underlying [`TabDirectory`] returned an error.
    #[error("tab directory error: {0}")]
    Directory(String),
    /// The overlay in this page did not answer even after re-injection.
    #[error("overlay in {0} is unreachable after re-injection")]
    StaleInjection(TabId),
}

/// What [`Coordinator::toggle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// There is no active tab to show the overlay in.
    NoActiveTab,
    /// The active page cannot host the overlay.
    Restricted(TabId),
    /// The toggle reached the overlay in `page`.  `reinjected` is set when
    /// the first delivery failed and the overlay had to be loaded again.
    Delivered { page: TabId, reinjected: bool },
}

/// Host side of the relay, generic over the [`TabDirectory`] backend.
pub struct Coordinator<D: TabDirectory> {
    directory: D,
    policy: RestrictionPolicy,
    popup: String,
    /// Pages believed to have a running overlay.
    injected: HashSet<TabId>,
}

fn dir_err<E: std::fmt::Display>(e: E) -> CoordinatorError {
    CoordinatorError::Directory(e.to_string())
}

impl<D: TabDirectory> Coordinator<D> {
    pub fn new(directory: D, config: &HostConfig) -> Self {
        Self {
            directory,
            policy: RestrictionPolicy::from_config(config),
            popup: config.restricted_popup.clone(),
            injected: HashSet::new(),
        }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn policy(&self) -> &RestrictionPolicy {
        &self.policy
    }

    pub fn is_injected(&self, page: TabId) -> bool {
        self.injected.contains(&page)
    }

    //  Toggle

    /// Show or hide the overlay in the active page.
    ///
    /// Restricted pages and a missing active tab are silent no-ops.  If the
    /// overlay does not answer, the page is re-injected and the toggle is
    /// sent exactly once more.
    pub fn toggle(&mut self) -> Result<ToggleOutcome, CoordinatorError> {
        let Some(active) = self.directory.active_tab().map_err(dir_err)? else {
            debug!("toggle: no active tab");
            return Ok(ToggleOutcome::NoActiveTab);
        };
        let page = active.id;
        if self.policy.is_restricted(Some(active.url.as_str())) {
            debug!("toggle: {} is restricted ({})", page, active.url);
            return Ok(ToggleOutcome::Restricted(page));
        }

        self.ensure_injected(page)?;
        let tabs = self.directory.query_all().map_err(dir_err)?;
        let message = HostMessage::ToggleOverlay { tabs };

        if let Err(e) = self.directory.deliver(page, &message) {
            warn!("overlay in {} did not answer ({}), re-injecting", page, e);
            self.injected.remove(&page);
            self.ensure_injected(page)?;
            self.directory
                .deliver(page, &message)
                .map_err(|_| CoordinatorError::StaleInjection(page))?;
            info!("toggled overlay in {} after re-injection", page);
            return Ok(ToggleOutcome::Delivered {
                page,
                reinjected: true,
            });
        }

        info!("toggled overlay in {}", page);
        Ok(ToggleOutcome::Delivered {
            page,
            reinjected: false,
        })
    }

    fn ensure_injected(&mut self, page: TabId) -> Result<(), CoordinatorError> {
        if self.injected.contains(&page) {
            return Ok(());
        }
        self.directory.inject(page).map_err(dir_err)?;
        self.injected.insert(page);
        Ok(())
    }

    //  Requests

    /// Apply a request relayed by the overlay running in `sender`.
    ///
    /// Mutations answer by pushing `TABS_UPDATED` to `sender` (when known).
    /// Only `GET_TABS` has a direct reply.  Failures are logged and never
    /// propagate.
    pub fn handle_request(
        &mut self,
        sender: Option<TabId>,
        request: OverlayRequest,
    ) -> Option<TabsReply> {
        debug!("request from {:?}: {}", sender, request);
        let result = match request {
            OverlayRequest::CloseTab { tab_id } => self
                .directory
                .remove(&[tab_id])
                .map_err(dir_err)
                .and_then(|()| self.push_update(sender)),
            OverlayRequest::SwitchTab { tab_id, group_id } => group_id
                .map_or(Ok(()), |g| self.directory.focus_group(g).map_err(dir_err))
                .and_then(|()| self.directory.activate(tab_id).map_err(dir_err)),
            OverlayRequest::MoveTab {
                tab_id,
                group_id,
                new_index,
            } => self
                .directory
                .move_tab(tab_id, group_id, new_index)
                .map_err(dir_err)
                .and_then(|()| self.push_update(sender)),
            OverlayRequest::CloseAllTabs => self
                .close_all_except(sender)
                .and_then(|()| self.push_update(sender)),
            OverlayRequest::GetTabs => {
                return Some(match self.directory.query_all() {
                    Ok(tabs) => TabsReply { tabs },
                    Err(e) => {
                        warn!("get tabs failed: {}", e);
                        TabsReply::default()
                    }
                });
            }
        };
        if let Err(e) = result {
            warn!("request failed: {}", e);
        }
        None
    }

    fn close_all_except(&self, keep: Option<TabId>) -> Result<(), CoordinatorError> {
        let ids: Vec<TabId> = self
            .directory
            .query_all()
            .map_err(dir_err)?
            .into_iter()
            .map(|t| t.id)
            .filter(|id| Some(*id) != keep)
            .collect();
        if ids.is_empty() {
            return Ok(());
        }
        info!("closing {} tab(s)", ids.len());
        self.directory.remove(&ids).map_err(dir_err)
    }

    fn push_update(&self, sender: Option<TabId>) -> Result<(), CoordinatorError> {
        let Some(page) = sender else {
            return Ok(());
        };
        let tabs = self.directory.query_all().map_err(dir_err)?;
        self.directory
            .deliver(page, &HostMessage::TabsUpdated { tabs })
            .map_err(dir_err)
    }

    //  Page lifecycle

    /// The tab was closed.
    pub fn on_tab_removed(&mut self, page: TabId) {
        self.injected.remove(&page);
    }

    /// The tab started loading a new document; its overlay is gone.
    pub fn on_tab_loading(&mut self, page: TabId) {
        if self.injected.remove(&page) {
            debug!("{} reloading, forgetting injection", page);
        }
    }

    /// The tab's URL changed.
    pub fn on_url_changed(&mut self, page: TabId, url: &str) {
        self.update_popup(page, Some(url));
    }

    /// The user switched to `page`.
    pub fn on_tab_activated(&mut self, page: TabId) {
        match self.directory.get(page) {
            Ok(Some(tab)) => self.update_popup(page, Some(tab.url.as_str())),
            Ok(None) => debug!("activated {} is already gone", page),
            Err(e) => warn!("looking up {} failed: {}", page, e),
        }
    }

    /// Set the popup state of whatever page is active at startup.
    pub fn on_startup(&mut self) {
        match self.directory.active_tab() {
            Ok(Some(tab)) => self.update_popup(tab.id, Some(tab.url.as_str())),
            Ok(None) => {}
            Err(e) => warn!("startup: no active tab ({})", e),
        }
    }

    fn update_popup(&self, page: TabId, url: Option<&str>) {
        let popup = self
            .policy
            .is_restricted(url)
            .then_some(self.popup.as_str());
        if let Err(e) = self.directory.set_popup(page, popup) {
            warn!("setting popup for {} failed: {}", page, e);
        }
    }
}

//  Tests
