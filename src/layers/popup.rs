use std::{cell::RefCell, rc::Rc};

use crate::{
    core::{
        engine::{Call, Engine, HandleId},
        geo::LatLng,
        map::MapHandle,
        options::PopupOptions,
    },
    input::events::Event,
    layers::base::{Layer, LayerState, LayerType},
    ui::dom::DomNode,
    MapError, Result,
};

struct PopupState {
    base: LayerState,
    options: PopupOptions,
    position: Option<LatLng>,
    /// Outer element, placed in the map surface while open
    container: DomNode,
    /// Holds whatever was passed to `set_content`
    content_wrapper: DomNode,
    content: Option<DomNode>,
    /// Marker this popup is bound to
    source: Option<HandleId>,
}

/// Popup, opened on a map at a position or bound to a marker
#[derive(Clone)]
pub struct PopupHandle {
    engine: Engine,
    inner: Rc<RefCell<PopupState>>,
}

impl PopupHandle {
    pub(crate) fn create(engine: Engine, options: PopupOptions) -> Self {
        let base = LayerState::new(&engine, LayerType::Popup);

        let container = DomNode::element("div");
        let class = match &options.class_name {
            Some(class_name) => format!("leaflet-popup {}", class_name),
            None => "leaflet-popup".to_string(),
        };
        container.set_attribute("class", class);
        let content_wrapper = DomNode::element("div");
        content_wrapper.set_attribute("class", "leaflet-popup-content");
        container.append_child(&content_wrapper);

        Self {
            engine,
            inner: Rc::new(RefCell::new(PopupState {
                base,
                options,
                position: None,
                container,
                content_wrapper,
                content: None,
                source: None,
            })),
        }
    }

    pub fn popup_options(&self) -> PopupOptions {
        self.inner.borrow().options.clone()
    }

    pub fn position(&self) -> Option<LatLng> {
        self.inner.borrow().position
    }

    pub fn set_lat_lng(&self, position: impl Into<LatLng>) -> &Self {
        let position = position.into();
        let id = {
            let mut state = self.inner.borrow_mut();
            state.position = Some(position);
            state.base.id
        };
        self.engine.record(Call::SetLatLng { id, position });
        self
    }

    /// Uses `node` as the popup body, replacing earlier content
    pub fn set_content(&self, node: &DomNode) -> &Self {
        let id = {
            let mut state = self.inner.borrow_mut();
            if let Some(previous) = state.content.take() {
                previous.detach();
            }
            state.content_wrapper.append_child(node);
            state.content = Some(node.clone());
            state.base.id
        };
        self.engine.record(Call::SetContent { popup: id });
        self
    }

    pub fn content(&self) -> Option<DomNode> {
        self.inner.borrow().content.clone()
    }

    /// Outer element of the popup
    pub fn container(&self) -> DomNode {
        self.inner.borrow().container.clone()
    }

    /// Marker the popup is bound to, if any
    pub fn source(&self) -> Option<HandleId> {
        self.inner.borrow().source
    }

    pub(crate) fn set_source(&self, source: Option<HandleId>) {
        self.inner.borrow_mut().source = source;
    }

    pub fn is_open(&self) -> bool {
        let state = self.inner.borrow();
        !state.base.removed
            && state
                .base
                .map
                .as_ref()
                .map(|map| !map.is_removed())
                .unwrap_or(false)
    }

    /// Opens the popup on `map` at its position.
    ///
    /// Other open popups with `auto_close` set are closed first when this
    /// popup has `auto_close` set too.
    pub fn open_on(&self, map: &MapHandle) -> Result<()> {
        let (id, auto_close, position) = {
            let state = self.inner.borrow();
            (state.base.id, state.options.auto_close, state.position)
        };
        if position.is_none() {
            return Err(MapError::Layer(format!(
                "popup {} has no position to open at",
                id
            )));
        }
        if auto_close {
            map.close_popups(|other| other.id() != id && other.popup_options().auto_close);
        }

        let container = {
            let mut state = self.inner.borrow_mut();
            state.base.attach(map)?;
            state.container.clone()
        };
        map.surface().append_child(&container);
        map.track_popup(self.clone());
        self.engine.record(Call::OpenOn {
            popup: id,
            map: map.id(),
        });
        map.emit(Event::new("popupopen", map.id()));
        Ok(())
    }

    /// Closes the popup if it is open
    pub fn close(&self) {
        let (id, map, container) = {
            let mut state = self.inner.borrow_mut();
            (state.base.id, state.base.detach(), state.container.clone())
        };
        if let Some(map) = map {
            container.detach();
            map.untrack_popup(id);
            self.engine.record(Call::Close { popup: id });
            map.emit(Event::new("popupclose", map.id()));
        }
    }
}

impl Layer for PopupHandle {
    fn id(&self) -> HandleId {
        self.inner.borrow().base.id
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Popup
    }

    /// Same as [`open_on`](PopupHandle::open_on)
    fn add_to(&self, map: &MapHandle) -> Result<()> {
        self.open_on(map)
    }

    fn remove(&self) {
        self.close();
        self.inner.borrow_mut().base.destroy(&self.engine);
    }

    fn is_removed(&self) -> bool {
        self.inner.borrow().base.removed
    }

    fn map(&self) -> Option<MapHandle> {
        self.inner.borrow().base.map.clone()
    }

    fn options(&self) -> serde_json::Value {
        serde_json::to_value(&self.inner.borrow().options).unwrap_or(serde_json::Value::Null)
    }
}

crate::impl_evented!(PopupHandle);
crate::impl_handle_identity!(PopupHandle);
