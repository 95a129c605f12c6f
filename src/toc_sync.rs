//! Scroll-synchronised table of contents.
//!
//! [`TocScrollSync`] intercepts clicks on TOC anchors to perform an
//! offset-aware smooth scroll, and keeps the anchor of the section being
//! read marked active while the page scrolls.
//!
//! The engine holds no DOM references. Everything it reads or mutates goes
//! through a [`TocHost`]; the host calls back into the engine with the
//! listener and timer ids it handed out (`on_click`, `on_scroll`,
//! `on_timer`). The browser binding lives in `dom` (feature `wasm`).

use std::time::Duration;

use crate::config::TocSettings;
use crate::throttle::{Decision, Throttle};
use crate::toc;

/// Handle for a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Handle for an armed one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Current page location, without fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    /// Query string including its leading `?`, or empty.
    pub search: String,
}

/// Environment the engine drives: a TOC subtree inside a scrollable page.
pub trait TocHost {
    /// Opaque reference to one anchor element.
    type Anchor;

    /// Anchors under the TOC root, in document order.
    fn anchors(&self) -> Vec<Self::Anchor>;
    /// Raw `href` attribute of an anchor.
    fn href(&self, anchor: &Self::Anchor) -> Option<String>;
    /// Top of the element with `id`, relative to the viewport.
    fn heading_top(&self, id: &str) -> Option<f64>;
    fn scroll_y(&self) -> f64;
    fn viewport_height(&self) -> f64;
    fn location(&self) -> Location;

    fn set_active(&mut self, anchor: &Self::Anchor, class: &str, active: bool);
    /// Replace the current history entry's URL without navigating.
    fn replace_history(&mut self, url: &str);
    fn smooth_scroll_to(&mut self, top: f64);

    /// Register a click interceptor on `anchor`. The host must prevent the
    /// default navigation for clicks delivered to this listener.
    fn listen_click(&mut self, anchor: &Self::Anchor) -> ListenerId;
    fn listen_scroll(&mut self) -> ListenerId;
    fn unlisten(&mut self, id: ListenerId);
    /// Arm a one-shot timer. `None` when the host could not arm one.
    fn set_timer(&mut self, delay: Duration) -> Option<TimerId>;
    fn clear_timer(&mut self, id: TimerId);
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// Fixed header clearance, in px.
    pub scroll_offset: f64,
    pub throttle: Duration,
    pub active_class: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings::from(&TocSettings::default())
    }
}

impl From<&TocSettings> for SyncSettings {
    fn from(s: &TocSettings) -> Self {
        Self {
            scroll_offset: s.scroll_offset,
            throttle: s.throttle_interval(),
            active_class: s.active_class.clone(),
        }
    }
}

/// Result of delivering a click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    /// Not one of this handle's listeners, or the handle is detached.
    Ignored,
    /// The anchor's target does not exist; nothing happened.
    Unresolved,
    /// History replaced and a smooth scroll started towards `top`.
    Scrolled { top: f64 },
}

#[derive(Debug, Clone)]
struct ClickBinding {
    listener: ListenerId,
    fragment: String,
}

/// Index of the current section's anchor.
///
/// `tops[i]` is the viewport-relative top of anchor `i`'s heading, `None`
/// when it does not resolve. The current section is the last heading that
/// has scrolled above the first quarter of the viewport.
pub fn current_heading(tops: &[Option<f64>], viewport_height: f64) -> Option<usize> {
    let threshold = viewport_height / 4.0;
    tops.iter()
        .enumerate()
        .filter_map(|(i, top)| match top {
            Some(t) if *t < threshold => Some(i),
            _ => None,
        })
        .last()
}

/// An attached TOC. Owns every listener and timer it registered.
#[derive(Debug)]
pub struct TocScrollSync {
    settings: SyncSettings,
    clicks: Vec<ClickBinding>,
    scroll: Option<ListenerId>,
    throttle: Throttle,
    timer: Option<TimerId>,
    attached: bool,
}

impl TocScrollSync {
    /// Bind to the anchors currently under the host's TOC root.
    ///
    /// Registers one click listener per same-page anchor and one scroll
    /// listener, then marks the current section immediately.
    pub fn attach<H: TocHost>(host: &mut H, settings: SyncSettings, now: Duration) -> Self {
        let mut clicks = Vec::new();
        for anchor in host.anchors() {
            let Some(href) = host.href(&anchor) else {
                continue;
            };
            let Some(fragment) = toc::href_fragment(&href) else {
                continue;
            };
            let fragment = fragment.to_owned();
            let listener = host.listen_click(&anchor);
            clicks.push(ClickBinding { listener, fragment });
        }
        let scroll = Some(host.listen_scroll());

        let mut sync = Self {
            throttle: Throttle::new(settings.throttle),
            settings,
            clicks,
            scroll,
            timer: None,
            attached: true,
        };
        tracing::debug!(anchors = sync.clicks.len(), "toc sync attached");

        sync.throttle.mark_run(now);
        sync.refresh_active(host);
        sync
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Deliver a click on one of this handle's anchors.
    pub fn on_click<H: TocHost>(&mut self, host: &mut H, listener: ListenerId) -> ClickOutcome {
        if !self.attached {
            return ClickOutcome::Ignored;
        }
        let Some(binding) = self.clicks.iter().find(|b| b.listener == listener) else {
            return ClickOutcome::Ignored;
        };

        let id = toc::heading_id(&binding.fragment);
        let Some(element_top) = host.heading_top(&id) else {
            tracing::debug!(id = %id, "toc target missing, click ignored");
            return ClickOutcome::Unresolved;
        };

        let top = host.scroll_y() + element_top - self.settings.scroll_offset;
        let loc = host.location();
        let url = format!("{}{}#{}", loc.path, loc.search, binding.fragment);
        host.replace_history(&url);
        host.smooth_scroll_to(top);
        ClickOutcome::Scrolled { top }
    }

    /// Deliver a scroll event. Returns `true` when the active anchor was
    /// recomputed during this call.
    pub fn on_scroll<H: TocHost>(&mut self, host: &mut H, now: Duration) -> bool {
        if !self.attached {
            return false;
        }
        match self.throttle.call(now) {
            Decision::Run => {
                self.refresh_active(host);
                true
            }
            Decision::Schedule(delay) => {
                self.timer = host.set_timer(delay);
                if self.timer.is_none() {
                    // Nothing will fire; the next event starts a fresh attempt.
                    self.throttle.cancel();
                }
                false
            }
            Decision::Coalesced => false,
        }
    }

    /// Deliver an elapsed timer. Stale or foreign timer ids are ignored.
    pub fn on_timer<H: TocHost>(&mut self, host: &mut H, timer: TimerId, now: Duration) -> bool {
        if !self.attached || self.timer != Some(timer) {
            return false;
        }
        self.timer = None;
        if !self.throttle.fire(now) {
            return false;
        }
        self.refresh_active(host);
        true
    }

    /// Recompute and apply the active marker.
    ///
    /// Anchors are re-queried from the host on every pass so TOC markup
    /// replaced after attach is still tracked.
    pub fn refresh_active<H: TocHost>(&mut self, host: &mut H) -> Option<usize> {
        let anchors = host.anchors();
        let tops: Vec<Option<f64>> = anchors
            .iter()
            .map(|a| {
                let href = host.href(a)?;
                let fragment = toc::href_fragment(&href)?;
                host.heading_top(&toc::heading_id(fragment))
            })
            .collect();

        let class = self.settings.active_class.as_str();
        for anchor in &anchors {
            host.set_active(anchor, class, false);
        }
        let current = current_heading(&tops, host.viewport_height());
        if let Some(i) = current {
            host.set_active(&anchors[i], class, true);
        }
        current
    }

    /// Remove every listener, cancel the pending timer, and stop reacting to
    /// events. Calling it again is a no-op.
    pub fn detach<H: TocHost>(&mut self, host: &mut H) {
        if !self.attached {
            return;
        }
        self.attached = false;
        for binding in self.clicks.drain(..) {
            host.unlisten(binding.listener);
        }
        if let Some(id) = self.scroll.take() {
            host.unlisten(id);
        }
        if let Some(id) = self.timer.take() {
            host.clear_timer(id);
        }
        self.throttle.cancel();
        tracing::debug!("toc sync detached");
    }
}

/// Re-attach guard keyed on TOC content identity.
///
/// A host that re-renders calls [`TocMount::mount`] after every render; the
/// engine is only torn down and re-attached when the TOC markup changed.
#[derive(Debug, Default)]
pub struct TocMount {
    fingerprint: Option<u64>,
    sync: Option<TocScrollSync>,
}

impl TocMount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach for `markup` unless already attached for identical markup.
    /// Returns `true` when a new attachment was made.
    pub fn mount<H: TocHost>(
        &mut self,
        host: &mut H,
        markup: &str,
        settings: &SyncSettings,
        now: Duration,
    ) -> bool {
        let fp = toc::fingerprint(markup);
        let attached = self.sync.as_ref().is_some_and(TocScrollSync::is_attached);
        if attached && self.fingerprint == Some(fp) {
            return false;
        }
        self.unmount(host);
        self.sync = Some(TocScrollSync::attach(host, settings.clone(), now));
        self.fingerprint = Some(fp);
        true
    }

    pub fn unmount<H: TocHost>(&mut self, host: &mut H) {
        if let Some(mut sync) = self.sync.take() {
            sync.detach(host);
        }
        self.fingerprint = None;
    }

    pub fn sync_mut(&mut self) -> Option<&mut TocScrollSync> {
        self.sync.as_mut()
    }
}
