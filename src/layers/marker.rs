use std::{cell::RefCell, rc::Rc};

use crate::{
    core::{
        constants::DEFAULT_ICON,
        engine::{Call, Engine},
        geo::LatLng,
        options::{IconOptions, MarkerOptions},
    },
    input::events::{Event, Evented, Handler},
    layers::{
        base::{dispatch, Layer, LayerState, LayerType},
        popup::PopupHandle,
    },
    Result,
};

struct MarkerState {
    base: LayerState,
    position: LatLng,
    options: MarkerOptions,
    dragging: bool,
    popup: Option<PopupHandle>,
}

/// Point marker
#[derive(Clone)]
pub struct MarkerHandle {
    engine: Engine,
    inner: Rc<RefCell<MarkerState>>,
}

impl MarkerHandle {
    pub(crate) fn create(engine: Engine, position: LatLng, options: MarkerOptions) -> Self {
        let base = LayerState::new(&engine, LayerType::Marker);
        let dragging = options.draggable;
        Self {
            engine,
            inner: Rc::new(RefCell::new(MarkerState {
                base,
                position,
                options,
                dragging,
                popup: None,
            })),
        }
    }

    pub fn position(&self) -> LatLng {
        self.inner.borrow().position
    }

    /// Moves the marker and fires `move`
    pub fn set_lat_lng(&self, position: impl Into<LatLng>) {
        let position = position.into();
        let id = {
            let mut state = self.inner.borrow_mut();
            state.position = position;
            state.base.id
        };
        self.engine.record(Call::SetLatLng { id, position });
        self.emit(Event::new("move", id).with_lat_lng(position));
    }

    pub fn opacity(&self) -> f64 {
        self.inner.borrow().options.opacity.unwrap_or(1.0)
    }

    pub fn set_opacity(&self, opacity: f64) {
        let id = {
            let mut state = self.inner.borrow_mut();
            state.options.opacity = Some(opacity);
            state.base.id
        };
        self.engine.record(Call::SetOpacity { id, opacity });
    }

    pub fn alt(&self) -> String {
        self.inner.borrow().options.alt.clone()
    }

    /// Explicit icon, or the stock one
    pub fn icon(&self) -> IconOptions {
        self.inner
            .borrow()
            .options
            .icon
            .clone()
            .unwrap_or_else(|| DEFAULT_ICON.clone())
    }

    pub fn dragging_enabled(&self) -> bool {
        self.inner.borrow().dragging
    }

    pub fn enable_dragging(&self) {
        let id = {
            let mut state = self.inner.borrow_mut();
            state.dragging = true;
            state.base.id
        };
        self.engine.record(Call::EnableDragging { id });
    }

    pub fn disable_dragging(&self) {
        let id = {
            let mut state = self.inner.borrow_mut();
            state.dragging = false;
            state.base.id
        };
        self.engine.record(Call::DisableDragging { id });
    }

    /// Binds `popup`, replacing any popup bound before
    pub fn bind_popup(&self, popup: &PopupHandle) {
        if let Some(previous) = self.popup() {
            if previous == *popup {
                return;
            }
            self.unbind_popup();
        }
        let marker = {
            let mut state = self.inner.borrow_mut();
            state.popup = Some(popup.clone());
            state.base.id
        };
        popup.set_source(Some(marker));
        self.engine.record(Call::BindPopup {
            marker,
            popup: popup.id(),
        });
    }

    /// Unbinds the current popup, closing it if it is open
    pub fn unbind_popup(&self) {
        let (marker, popup) = {
            let mut state = self.inner.borrow_mut();
            (state.base.id, state.popup.take())
        };
        if let Some(popup) = popup {
            popup.close();
            popup.set_source(None);
            self.engine.record(Call::UnbindPopup {
                marker,
                popup: popup.id(),
            });
        }
    }

    pub fn popup(&self) -> Option<PopupHandle> {
        self.inner.borrow().popup.clone()
    }

    /// Opens the bound popup at the marker position
    pub fn open_popup(&self) -> Result<()> {
        let (popup, map, position) = {
            let state = self.inner.borrow();
            (state.popup.clone(), state.base.map.clone(), state.position)
        };
        match (popup, map) {
            (Some(popup), Some(map)) => {
                popup.set_lat_lng(position);
                popup.open_on(&map)
            }
            _ => Ok(()),
        }
    }

    /// Fires `event` at the marker's listeners.
    ///
    /// A `click` also opens the bound popup, as a user clicking the marker would.
    pub fn emit(&self, event: Event) {
        let handlers = self.inner.borrow().base.listeners.matching(&event.name);
        dispatch(handlers, &event);
        if event.name == "click" {
            if let Err(err) = self.open_popup() {
                log::warn!("marker {} could not open its popup: {}", event.target, err);
            }
        }
    }
}

impl Layer for MarkerHandle {
    crate::impl_layer_lifecycle!();

    fn options(&self) -> serde_json::Value {
        serde_json::to_value(&self.inner.borrow().options).unwrap_or(serde_json::Value::Null)
    }
}

impl Evented for MarkerHandle {
    fn on(&self, name: &str, handler: Handler) {
        self.inner.borrow_mut().base.on(&self.engine, name, handler);
    }

    fn off(&self, name: &str, handler: &Handler) {
        self.inner.borrow_mut().base.off(&self.engine, name, handler);
    }

    fn fire(&self, name: &str) {
        let event = {
            let state = self.inner.borrow();
            state.base.event(name).with_lat_lng(state.position)
        };
        self.emit(event);
    }
}

crate::impl_handle_identity!(MarkerHandle);
