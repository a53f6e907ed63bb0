//! Headless, Leaflet-style map engine.
//!
//! [`Engine`] is the imperative library the components drive. It hands out
//! handles for maps and layers and appends every state-changing operation to
//! a call journal, which doubles as the recording surface for tests and
//! diagnostics.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use crate::{
    core::{
        geo::LatLng,
        map::MapHandle,
        options::{MapOptions, MarkerOptions, PopupOptions, TileLayerOptions},
    },
    data::geojson::GeoJson,
    layers::{
        base::LayerType,
        marker::MarkerHandle,
        popup::PopupHandle,
        tile::TileLayerHandle,
        vector::{GeoJsonHandle, GeoJsonOptions},
    },
    ui::dom::DomNode,
    Result,
};

/// Identity of a map or layer handle within one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One journaled engine operation
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateMap { map: HandleId, center: LatLng, zoom: f64 },
    SetView { map: HandleId, center: LatLng, zoom: f64 },
    RemoveMap { map: HandleId },
    Create { id: HandleId, layer_type: LayerType },
    AddTo { id: HandleId, map: HandleId },
    Remove { id: HandleId, layer_type: LayerType },
    SetLatLng { id: HandleId, position: LatLng },
    SetOpacity { id: HandleId, opacity: f64 },
    EnableDragging { id: HandleId },
    DisableDragging { id: HandleId },
    On { id: HandleId, event: String },
    Off { id: HandleId, event: String },
    BindPopup { marker: HandleId, popup: HandleId },
    UnbindPopup { marker: HandleId, popup: HandleId },
    SetContent { popup: HandleId },
    OpenOn { popup: HandleId, map: HandleId },
    Close { popup: HandleId },
    ClearLayers { id: HandleId },
    AddData { id: HandleId, features: usize },
}

#[derive(Default)]
struct EngineInner {
    next_id: Cell<u64>,
    journal: RefCell<Vec<Call>>,
    /// Layers alive right now, independent of journal clears
    live: Cell<usize>,
}

/// Factory for maps and layers, shared by every handle it creates
#[derive(Clone, Default)]
pub struct Engine {
    inner: Rc<EngineInner>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map bound to `surface`.
    ///
    /// Fails when the surface already hosts a live map.
    pub fn map(&self, surface: &DomNode, options: MapOptions) -> Result<MapHandle> {
        MapHandle::create(self.clone(), surface, options)
    }

    pub fn tile_layer(&self, url: impl Into<String>, options: TileLayerOptions) -> TileLayerHandle {
        TileLayerHandle::create(self.clone(), url.into(), options)
    }

    pub fn marker(&self, position: impl Into<LatLng>, options: MarkerOptions) -> MarkerHandle {
        MarkerHandle::create(self.clone(), position.into(), options)
    }

    pub fn popup(&self, options: PopupOptions) -> PopupHandle {
        PopupHandle::create(self.clone(), options)
    }

    /// Creates a GeoJSON overlay, adding `data` right away when given.
    pub fn geo_json(&self, data: Option<&GeoJson>, options: GeoJsonOptions) -> GeoJsonHandle {
        GeoJsonHandle::create(self.clone(), data, options)
    }

    /// Snapshot of every call recorded so far
    pub fn calls(&self) -> Vec<Call> {
        self.inner.journal.borrow().clone()
    }

    pub fn count(&self, mut predicate: impl FnMut(&Call) -> bool) -> usize {
        self.inner.journal.borrow().iter().filter(|c| predicate(c)).count()
    }

    /// Calls that target `id`, in order
    pub fn calls_for(&self, id: HandleId) -> Vec<Call> {
        self.inner
            .journal
            .borrow()
            .iter()
            .filter(|call| call.targets(id))
            .cloned()
            .collect()
    }

    /// Journaled creations; counts restart after [`clear_journal`](Engine::clear_journal)
    pub fn created(&self, layer_type: LayerType) -> usize {
        self.count(|c| matches!(c, Call::Create { layer_type: t, .. } if *t == layer_type))
    }

    pub fn destroyed(&self, layer_type: LayerType) -> usize {
        self.count(|c| matches!(c, Call::Remove { layer_type: t, .. } if *t == layer_type))
    }

    /// Layers created but not yet removed, across all types. Unlike the
    /// journal counts this survives [`clear_journal`](Engine::clear_journal).
    pub fn live_layers(&self) -> usize {
        self.inner.live.get()
    }

    pub fn maps_created(&self) -> usize {
        self.count(|c| matches!(c, Call::CreateMap { .. }))
    }

    pub fn maps_removed(&self) -> usize {
        self.count(|c| matches!(c, Call::RemoveMap { .. }))
    }

    pub fn clear_journal(&self) {
        self.inner.journal.borrow_mut().clear();
    }

    pub(crate) fn next_id(&self) -> HandleId {
        let id = self.inner.next_id.get() + 1;
        self.inner.next_id.set(id);
        HandleId(id)
    }

    pub(crate) fn record(&self, call: Call) {
        log::trace!("engine: {:?}", call);
        match call {
            Call::Create { .. } => self.inner.live.set(self.inner.live.get() + 1),
            Call::Remove { .. } => self.inner.live.set(self.inner.live.get().saturating_sub(1)),
            _ => {}
        }
        self.inner.journal.borrow_mut().push(call);
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("handles", &self.inner.next_id.get())
            .field("calls", &self.inner.journal.borrow().len())
            .finish()
    }
}

impl Call {
    /// Whether this call operates on the handle `id`
    pub fn targets(&self, id: HandleId) -> bool {
        match self {
            Call::CreateMap { map, .. } | Call::SetView { map, .. } | Call::RemoveMap { map } => {
                *map == id
            }
            Call::BindPopup { marker, popup } | Call::UnbindPopup { marker, popup } => {
                *marker == id || *popup == id
            }
            Call::OpenOn { popup, .. } | Call::SetContent { popup } | Call::Close { popup } => {
                *popup == id
            }
            Call::Create { id: target, .. }
            | Call::AddTo { id: target, .. }
            | Call::Remove { id: target, .. }
            | Call::SetLatLng { id: target, .. }
            | Call::SetOpacity { id: target, .. }
            | Call::EnableDragging { id: target }
            | Call::DisableDragging { id: target }
            | Call::On { id: target, .. }
            | Call::Off { id: target, .. }
            | Call::ClearLayers { id: target }
            | Call::AddData { id: target, .. } => *target == id,
        }
    }
}
