//! Browser binding for [`TocScrollSync`].
//!
//! [`DomHost`] implements [`TocHost`] over `web-sys`. Listener and timer
//! closures hold a weak reference to the shared state and forward events
//! into the engine; a closure that finds the state already borrowed (a
//! re-entrant event) skips that event.
//!
//! From JavaScript:
//!
//! ```js
//! import init, { attachToc } from "/assets/mdpage.js";
//! await init();
//! window.mdpageToc = attachToc(".toc", 102, 100, "active");
//! // later, on navigation away:
//! window.mdpageToc.detach();
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, EventTarget, ScrollBehavior, ScrollToOptions, Window};

use crate::toc_sync::{ListenerId, Location, SyncSettings, TimerId, TocHost, TocScrollSync};

struct Registered {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

struct ArmedTimer {
    id: TimerId,
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

struct Shared {
    host: DomHost,
    sync: Option<TocScrollSync>,
}

/// `TocHost` over the live document.
pub struct DomHost {
    window: Window,
    document: Document,
    root: Element,
    next_id: u64,
    listeners: HashMap<ListenerId, Registered>,
    // The throttle keeps at most one timer armed.
    timer: Option<ArmedTimer>,
    shared: Weak<RefCell<Shared>>,
}

impl DomHost {
    fn now(&self) -> Duration {
        let ms = self.window.performance().map(|p| p.now()).unwrap_or(0.0);
        Duration::from_secs_f64(ms.max(0.0) / 1000.0)
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn listen(&mut self, target: EventTarget, kind: &'static str, click: bool) -> ListenerId {
        let id = ListenerId(self.next_id());
        let shared = self.shared.clone();
        let callback = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
            if click {
                ev.prevent_default();
            }
            with_engine(&shared, |host, sync| {
                if click {
                    sync.on_click(host, id);
                } else {
                    let now = host.now();
                    sync.on_scroll(host, now);
                }
            });
        });
        if let Err(e) = target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
        {
            tracing::warn!(kind, error = ?e, "addEventListener failed");
        }
        self.listeners.insert(
            id,
            Registered {
                target,
                kind,
                callback,
            },
        );
        id
    }
}

fn with_engine(shared: &Weak<RefCell<Shared>>, f: impl FnOnce(&mut DomHost, &mut TocScrollSync)) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let Ok(mut guard) = shared.try_borrow_mut() else {
        return;
    };
    let Shared { host, sync } = &mut *guard;
    if let Some(sync) = sync.as_mut() {
        f(host, sync);
    }
}

impl TocHost for DomHost {
    type Anchor = Element;

    fn anchors(&self) -> Vec<Element> {
        let Ok(list) = self.root.query_selector_all("a") else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn href(&self, anchor: &Element) -> Option<String> {
        anchor.get_attribute("href")
    }

    fn heading_top(&self, id: &str) -> Option<f64> {
        self.document
            .get_element_by_id(id)
            .map(|el| el.get_bounding_client_rect().top())
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn viewport_height(&self) -> f64 {
        self.window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    fn location(&self) -> Location {
        let loc = self.window.location();
        Location {
            path: loc.pathname().unwrap_or_default(),
            search: loc.search().unwrap_or_default(),
        }
    }

    fn set_active(&mut self, anchor: &Element, class: &str, active: bool) {
        let list = anchor.class_list();
        let result = if active {
            list.add_1(class)
        } else {
            list.remove_1(class)
        };
        if let Err(e) = result {
            tracing::debug!(class, active, error = ?e, "classList update failed");
        }
    }

    fn replace_history(&mut self, url: &str) {
        if let Ok(history) = self.window.history() {
            if let Err(e) = history.replace_state_with_url(&JsValue::NULL, "", Some(url)) {
                tracing::warn!(url, error = ?e, "history.replaceState failed");
            }
        }
    }

    fn smooth_scroll_to(&mut self, top: f64) {
        let opts = ScrollToOptions::new();
        opts.set_top(top);
        opts.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&opts);
    }

    fn listen_click(&mut self, anchor: &Element) -> ListenerId {
        self.listen(anchor.clone().into(), "click", true)
    }

    fn listen_scroll(&mut self) -> ListenerId {
        self.listen(self.window.clone().into(), "scroll", false)
    }

    fn unlisten(&mut self, id: ListenerId) {
        if let Some(reg) = self.listeners.remove(&id) {
            if let Err(e) = reg
                .target
                .remove_event_listener_with_callback(reg.kind, reg.callback.as_ref().unchecked_ref())
            {
                tracing::debug!(kind = reg.kind, error = ?e, "removeEventListener failed");
            }
        }
    }

    fn set_timer(&mut self, delay: Duration) -> Option<TimerId> {
        let id = TimerId(self.next_id());
        let shared = self.shared.clone();
        let callback = Closure::<dyn FnMut()>::new(move || {
            with_engine(&shared, |host, sync| {
                let now = host.now();
                sync.on_timer(host, id, now);
            });
        });
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                millis,
            ) {
            Ok(handle) => {
                self.timer = Some(ArmedTimer {
                    id,
                    handle,
                    _callback: callback,
                });
                Some(id)
            }
            Err(e) => {
                tracing::warn!(error = ?e, "setTimeout failed");
                None
            }
        }
    }

    fn clear_timer(&mut self, id: TimerId) {
        if self.timer.as_ref().is_some_and(|t| t.id == id) {
            if let Some(t) = self.timer.take() {
                self.window.clear_timeout_with_handle(t.handle);
            }
        }
    }
}

/// JavaScript-owned handle to an attached TOC.
///
/// Freeing the handle does not detach; listeners stay registered until
/// [`TocHandle::detach`] is called.
#[wasm_bindgen]
pub struct TocHandle {
    shared: Rc<RefCell<Shared>>,
}

#[wasm_bindgen]
impl TocHandle {
    /// Remove all listeners and cancel the pending timer.
    pub fn detach(&self) {
        let Ok(mut guard) = self.shared.try_borrow_mut() else {
            return;
        };
        let Shared { host, sync } = &mut *guard;
        if let Some(mut sync) = sync.take() {
            sync.detach(host);
        }
    }
}

/// Attach scroll sync to the TOC container matching `selector`.
#[wasm_bindgen(js_name = attachToc)]
pub fn attach_toc(
    selector: &str,
    scroll_offset: f64,
    throttle_ms: u32,
    active_class: &str,
) -> Result<TocHandle, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let root = document
        .query_selector(selector)?
        .ok_or_else(|| JsValue::from_str(&format!("no element matches {selector}")))?;

    let settings = SyncSettings {
        scroll_offset,
        throttle: Duration::from_millis(u64::from(throttle_ms)),
        active_class: active_class.to_owned(),
    };

    let shared = Rc::new_cyclic(|weak| {
        RefCell::new(Shared {
            host: DomHost {
                window,
                document,
                root,
                next_id: 0,
                listeners: HashMap::new(),
                timer: None,
                shared: weak.clone(),
            },
            sync: None,
        })
    });

    {
        let mut guard = shared.borrow_mut();
        let Shared { host, sync } = &mut *guard;
        let now = host.now();
        *sync = Some(TocScrollSync::attach(host, settings, now));
    }

    Ok(TocHandle { shared })
}
