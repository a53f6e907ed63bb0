use std::rc::Rc;

use crate::core::{callback::Callback, engine::HandleId, geo::LatLng};

/// Payload handed to named event listeners
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name, e.g. `click` or `moveend`
    pub name: String,
    /// Handle the event was fired on
    pub target: HandleId,
    pub lat_lng: Option<LatLng>,
    pub zoom: Option<f64>,
}

impl Event {
    pub fn new(name: impl Into<String>, target: HandleId) -> Self {
        Self {
            name: name.into(),
            target,
            lat_lng: None,
            zoom: None,
        }
    }

    pub fn with_lat_lng(mut self, lat_lng: LatLng) -> Self {
        self.lat_lng = Some(lat_lng);
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }
}

/// Event listener
pub type Handler = Callback<dyn Fn(&Event)>;

impl Callback<dyn Fn(&Event)> {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self::from_rc(Rc::new(f))
    }
}

/// Ordered mapping of event names to listeners.
///
/// Equality is identity: a clone equals its source, two maps built
/// separately never do, even with the same listeners. Components rebind
/// their listeners whenever the map they receive is a different one, so
/// build it once and clone it into every render.
#[derive(Debug, Clone, Default)]
pub struct EventHandlers(Rc<Vec<(String, Handler)>>);

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener for `name`
    pub fn on(mut self, name: impl Into<String>, f: impl Fn(&Event) + 'static) -> Self {
        Rc::make_mut(&mut self.0).push((name.into(), Handler::new(f)));
        self
    }

    /// Adds an existing listener for `name`
    pub fn with_handler(mut self, name: impl Into<String>, handler: Handler) -> Self {
        Rc::make_mut(&mut self.0).push((name.into(), handler));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Handler)> {
        self.0.iter().map(|(name, handler)| (name.as_str(), handler))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for EventHandlers {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Anything listeners can be attached to by name
pub trait Evented {
    fn on(&self, name: &str, handler: Handler);

    /// Removes one registration of `handler` under `name`
    fn off(&self, name: &str, handler: &Handler);

    /// Fires `name` on this target
    fn fire(&self, name: &str);
}

/// Listener registry embedded in every handle
#[derive(Debug, Default)]
pub(crate) struct Listeners {
    entries: Vec<(String, Handler)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, name: &str, handler: Handler) {
        self.entries.push((name.to_string(), handler));
    }

    pub(crate) fn remove(&mut self, name: &str, handler: &Handler) -> bool {
        match self
            .entries
            .iter()
            .position(|(n, h)| n == name && h == handler)
        {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Listeners for `name`, cloned out so they can run without a borrow held
    pub(crate) fn matching(&self, name: &str) -> Vec<Handler> {
        self.entries
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, h)| h.clone())
            .collect()
    }

    pub(crate) fn count(&self, name: &str) -> usize {
        self.entries.iter().filter(|(n, _)| n == name).count()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A set of listeners attached to one target.
///
/// Detaches everything it attached when dropped or when
/// [`detach`](Subscription::detach) is called, whichever comes first.
pub struct Subscription<T: Evented> {
    target: T,
    handlers: EventHandlers,
    attached: bool,
}

impl<T: Evented> Subscription<T> {
    pub fn attach(target: T, handlers: EventHandlers) -> Self {
        for (name, handler) in handlers.iter() {
            target.on(name, handler.clone());
        }
        Self {
            target,
            handlers,
            attached: true,
        }
    }

    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        for (name, handler) in self.handlers.iter() {
            self.target.off(name, handler);
        }
    }

    pub fn handlers(&self) -> &EventHandlers {
        &self.handlers
    }

    pub fn target(&self) -> &T {
        &self.target
    }
}

impl<T: Evented> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.detach();
    }
}
