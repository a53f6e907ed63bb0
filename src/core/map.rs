use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    core::{
        engine::{Call, Engine, HandleId},
        geo::LatLng,
        options::MapOptions,
    },
    input::events::{Event, Evented, Handler, Listeners},
    layers::{
        base::{dispatch, Layer, LayerType},
        manager::LayerManager,
        popup::PopupHandle,
    },
    ui::dom::DomNode,
    MapError, Result,
};

/// Attribute marking a surface that hosts a map
pub const MAP_ID_ATTRIBUTE: &str = "data-map-id";

struct MapState {
    id: HandleId,
    surface: DomNode,
    options: MapOptions,
    center: LatLng,
    zoom: f64,
    layers: LayerManager,
    listeners: Listeners,
    open_popups: Vec<PopupHandle>,
    removed: bool,
}

impl MapState {
    fn clamp_zoom(&self, zoom: f64) -> f64 {
        let min = self.options.min_zoom.unwrap_or(f64::NEG_INFINITY);
        let max = self.options.max_zoom.unwrap_or(f64::INFINITY);
        zoom.max(min).min(max)
    }
}

/// The map instance: viewport, attached layers and map-level events
#[derive(Clone)]
pub struct MapHandle {
    engine: Engine,
    inner: Rc<RefCell<MapState>>,
}

impl MapHandle {
    pub(crate) fn create(engine: Engine, surface: &DomNode, options: MapOptions) -> Result<Self> {
        if let Some(existing) = surface.attribute(MAP_ID_ATTRIBUTE) {
            return Err(MapError::Map(format!(
                "map container is already initialized by map #{}",
                existing
            )));
        }
        if !options.center.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "map center {:?} is out of range",
                options.center
            )));
        }

        let id = engine.next_id();
        let mut state = MapState {
            id,
            surface: surface.clone(),
            center: options.center,
            zoom: options.zoom,
            options,
            layers: LayerManager::new(),
            listeners: Listeners::default(),
            open_popups: Vec::new(),
            removed: false,
        };
        state.zoom = state.clamp_zoom(state.zoom);

        surface.set_attribute(MAP_ID_ATTRIBUTE, id.get().to_string());
        engine.record(Call::CreateMap {
            map: id,
            center: state.center,
            zoom: state.zoom,
        });

        Ok(Self {
            engine,
            inner: Rc::new(RefCell::new(state)),
        })
    }

    pub fn id(&self) -> HandleId {
        self.inner.borrow().id
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn center(&self) -> LatLng {
        self.inner.borrow().center
    }

    pub fn zoom(&self) -> f64 {
        self.inner.borrow().zoom
    }

    pub fn options(&self) -> MapOptions {
        self.inner.borrow().options.clone()
    }

    /// Element the map was created on
    pub fn surface(&self) -> DomNode {
        self.inner.borrow().surface.clone()
    }

    pub fn is_removed(&self) -> bool {
        self.inner.borrow().removed
    }

    /// Moves the viewport, clamping the zoom to the configured range.
    ///
    /// Fires `move` and `moveend`, plus `zoom` and `zoomend` when the zoom
    /// level changed.
    pub fn set_view(&self, center: impl Into<LatLng>, zoom: f64) -> Result<()> {
        let center = center.into();
        if !center.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "view center {:?} is out of range",
                center
            )));
        }

        let (id, zoom, zoom_changed) = {
            let mut state = self.inner.borrow_mut();
            if state.removed {
                return Err(MapError::Map(format!("map {} has been removed", state.id)));
            }
            let zoom = state.clamp_zoom(zoom);
            let zoom_changed = zoom != state.zoom;
            state.center = center;
            state.zoom = zoom;
            (state.id, zoom, zoom_changed)
        };
        self.engine.record(Call::SetView {
            map: id,
            center,
            zoom,
        });

        if zoom_changed {
            self.fire("zoom");
            self.fire("zoomend");
        }
        self.fire("move");
        self.fire("moveend");
        Ok(())
    }

    pub fn has_layer(&self, id: HandleId) -> bool {
        self.inner.borrow().layers.contains(id)
    }

    /// Attached layer ids in render order
    pub fn layer_ids(&self) -> Vec<HandleId> {
        self.inner.borrow().layers.list_layers()
    }

    pub fn layer_count(&self) -> usize {
        self.inner.borrow().layers.len()
    }

    pub fn count_layers(&self, layer_type: LayerType) -> usize {
        self.inner.borrow().layers.count_of(layer_type)
    }

    pub fn open_popups(&self) -> Vec<PopupHandle> {
        self.inner.borrow().open_popups.clone()
    }

    /// Destroys the map. Layers still attached are dropped from it but keep
    /// their own handles; later calls do nothing.
    pub fn remove(&self) {
        let (id, surface, popups) = {
            let mut state = self.inner.borrow_mut();
            if state.removed {
                log::trace!("map {} already removed", state.id);
                return;
            }
            state.removed = true;
            state.layers.clear();
            state.listeners.clear();
            (
                state.id,
                state.surface.clone(),
                std::mem::take(&mut state.open_popups),
            )
        };
        for popup in popups {
            popup.container().detach();
        }
        surface.remove_attribute(MAP_ID_ATTRIBUTE);
        self.engine.record(Call::RemoveMap { map: id });
    }

    /// Fires `event` at map listeners.
    ///
    /// A `click` closes open popups that have `close_on_click` set.
    pub fn emit(&self, event: Event) {
        let handlers = self.inner.borrow().listeners.matching(&event.name);
        dispatch(handlers, &event);
        if event.name == "click" {
            self.close_popups(|popup| popup.popup_options().close_on_click);
        }
    }

    /// Number of listeners registered for `name`
    pub fn listens(&self, name: &str) -> usize {
        self.inner.borrow().listeners.count(name)
    }

    pub(crate) fn close_popups(&self, predicate: impl Fn(&PopupHandle) -> bool) {
        let popups: Vec<PopupHandle> = self
            .inner
            .borrow()
            .open_popups
            .iter()
            .filter(|popup| predicate(popup))
            .cloned()
            .collect();
        for popup in popups {
            popup.close();
        }
    }

    pub(crate) fn register_layer(&self, id: HandleId, layer_type: LayerType, z_index: i32) {
        self.inner
            .borrow_mut()
            .layers
            .add_layer(id, layer_type, z_index);
    }

    pub(crate) fn unregister_layer(&self, id: HandleId) {
        self.inner.borrow_mut().layers.remove_layer(id);
    }

    pub(crate) fn track_popup(&self, popup: PopupHandle) {
        let mut state = self.inner.borrow_mut();
        if !state.open_popups.contains(&popup) {
            state.open_popups.push(popup);
        }
    }

    pub(crate) fn untrack_popup(&self, id: HandleId) {
        self.inner
            .borrow_mut()
            .open_popups
            .retain(|popup| popup.id() != id);
    }
}

impl Evented for MapHandle {
    fn on(&self, name: &str, handler: Handler) {
        let id = {
            let mut state = self.inner.borrow_mut();
            state.listeners.add(name, handler);
            state.id
        };
        self.engine.record(Call::On {
            id,
            event: name.to_string(),
        });
    }

    fn off(&self, name: &str, handler: &Handler) {
        let (id, removed) = {
            let mut state = self.inner.borrow_mut();
            (state.id, state.listeners.remove(name, handler))
        };
        if removed {
            self.engine.record(Call::Off {
                id,
                event: name.to_string(),
            });
        }
    }

    fn fire(&self, name: &str) {
        let event = {
            let state = self.inner.borrow();
            Event::new(name, state.id)
                .with_lat_lng(state.center)
                .with_zoom(state.zoom)
        };
        self.emit(event);
    }
}

impl PartialEq for MapHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for MapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("MapHandle")
            .field("id", &state.id)
            .field("center", &state.center)
            .field("zoom", &state.zoom)
            .field("layers", &state.layers.len())
            .field("removed", &state.removed)
            .finish()
    }
}
