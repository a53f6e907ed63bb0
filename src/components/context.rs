//! Subtree-scoped sharing of the live map and the enclosing marker.

use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    core::{engine::Engine, map::MapHandle},
    input::events::{EventHandlers, Subscription},
    layers::marker::MarkerHandle,
    ui::dom::DomNode,
    MapError, Result,
};

/// Shared slot written by one owner and read by its descendants.
///
/// Clones share the slot, so a descendant always sees the owner's latest
/// value. Equality is identity of the slot.
pub struct ContextCell<T>(Rc<RefCell<Option<T>>>);

impl<T: Clone> ContextCell<T> {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    pub fn get(&self) -> Option<T> {
        self.0.borrow().clone()
    }

    pub fn set(&self, value: Option<T>) {
        *self.0.borrow_mut() = value;
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_none()
    }
}

impl<T: Clone> Default for ContextCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ContextCell<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> PartialEq for ContextCell<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: fmt::Debug> fmt::Debug for ContextCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContextCell").field(&self.0.borrow()).finish()
    }
}

/// Map published by the nearest `MapContainer` or `MapProvider`.
/// Empty before the map exists and after it is removed.
pub type MapContext = ContextCell<MapHandle>;

/// Marker published by the nearest `Marker` component
pub type MarkerContext = ContextCell<MarkerHandle>;

impl ContextCell<MapHandle> {
    pub fn map(&self) -> Option<MapHandle> {
        self.get()
    }

    /// Publishes `map` to every descendant reading this context
    pub fn set_map(&self, map: Option<MapHandle>) {
        self.set(map);
    }
}

/// What a component can see from where it sits in the tree
#[derive(Debug, Clone)]
pub struct Scope {
    engine: Engine,
    surface: DomNode,
    map: Option<MapContext>,
    marker: Option<MarkerContext>,
}

impl Scope {
    /// Top-level scope rendering into `surface`, with no map in reach
    pub fn new(engine: Engine, surface: DomNode) -> Self {
        Self {
            engine,
            surface,
            map: None,
            marker: None,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Element that DOM children are appended to
    pub fn surface(&self) -> &DomNode {
        &self.surface
    }

    pub fn map_context(&self) -> Option<&MapContext> {
        self.map.as_ref()
    }

    pub fn marker_context(&self) -> Option<&MarkerContext> {
        self.marker.as_ref()
    }

    /// Scope below a map owner. Markers from outside do not reach into it.
    pub(crate) fn with_map(&self, context: MapContext, surface: DomNode) -> Self {
        Self {
            engine: self.engine.clone(),
            surface,
            map: Some(context),
            marker: None,
        }
    }

    pub(crate) fn with_marker(&self, context: MarkerContext) -> Self {
        Self {
            marker: Some(context),
            ..self.clone()
        }
    }

    pub(crate) fn with_surface(&self, surface: DomNode) -> Self {
        Self {
            surface,
            ..self.clone()
        }
    }
}

fn map_context(scope: &Scope, hook: &'static str) -> Result<MapContext> {
    scope
        .map
        .clone()
        .ok_or(MapError::ContextMissing { hook })
}

fn live_map(scope: &Scope, hook: &'static str) -> Result<MapHandle> {
    map_context(scope, hook)?
        .map()
        .ok_or(MapError::MapUnavailable)
}

/// Context of the enclosing map owner.
///
/// Fails with [`MapError::ContextMissing`] outside a `MapContainer` or
/// `MapProvider`.
pub fn use_map_context(scope: &Scope) -> Result<MapContext> {
    map_context(scope, "use_map_context")
}

/// The live map of the enclosing `MapContainer`.
///
/// Fails with [`MapError::ContextMissing`] outside a container and with
/// [`MapError::MapUnavailable`] while no map is published.
pub fn use_map(scope: &Scope) -> Result<MapHandle> {
    live_map(scope, "use_map")
}

/// Marker of the enclosing `Marker` component, if any
pub fn use_marker(scope: &Scope) -> Option<MarkerHandle> {
    scope.marker.as_ref().and_then(ContextCell::get)
}

/// Attaches `handlers` to the live map. They stay attached until the
/// returned subscription is dropped or detached.
pub fn use_map_events(scope: &Scope, handlers: EventHandlers) -> Result<Subscription<MapHandle>> {
    let map = live_map(scope, "use_map_events")?;
    Ok(Subscription::attach(map, handlers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::MapOptions;

    #[test]
    fn test_hooks_outside_container() {
        let scope = Scope::new(Engine::new(), DomNode::element("body"));

        let err = use_map(&scope).unwrap_err();
        assert!(matches!(err, MapError::ContextMissing { hook: "use_map" }));
        assert_eq!(err.to_string(), "use_map must be used within a MapContainer");
        assert!(use_map_context(&scope).is_err());
        assert!(use_map_events(&scope, EventHandlers::new()).is_err());
        assert!(use_marker(&scope).is_none());
    }

    #[test]
    fn test_empty_context_reports_unavailable_map() {
        let engine = Engine::new();
        let body = DomNode::element("body");
        let context = MapContext::new();
        let scope = Scope::new(engine.clone(), body.clone()).with_map(context.clone(), body);

        assert!(matches!(use_map(&scope), Err(MapError::MapUnavailable)));

        let map = engine
            .map(&DomNode::element("div"), MapOptions::default())
            .unwrap();
        context.set_map(Some(map.clone()));
        assert_eq!(use_map(&scope).unwrap(), map);
        assert_eq!(use_map_context(&scope).unwrap(), context);
    }

    #[test]
    fn test_map_events_detach_on_drop() {
        let engine = Engine::new();
        let body = DomNode::element("body");
        let map = engine
            .map(&DomNode::element("div"), MapOptions::default())
            .unwrap();
        let context = MapContext::new();
        context.set_map(Some(map.clone()));
        let scope = Scope::new(engine, body.clone()).with_map(context, body);

        let subscription =
            use_map_events(&scope, EventHandlers::new().on("click", |_| {})).unwrap();
        assert_eq!(map.listens("click"), 1);

        drop(subscription);
        assert_eq!(map.listens("click"), 0);
    }
}
