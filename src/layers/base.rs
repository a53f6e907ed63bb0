use crate::{
    core::{
        engine::{Call, Engine, HandleId},
        map::MapHandle,
    },
    input::events::{Event, Handler, Listeners},
    MapError, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Tile,
    Vector,
    Marker,
    Popup,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Tile => write!(f, "tile"),
            LayerType::Vector => write!(f, "vector"),
            LayerType::Marker => write!(f, "marker"),
            LayerType::Popup => write!(f, "popup"),
        }
    }
}

/// Operations every layer handle supports
pub trait Layer {
    fn id(&self) -> HandleId;

    fn layer_type(&self) -> LayerType;

    /// Attaches the layer to `map`, moving it off any map it was on
    fn add_to(&self, map: &MapHandle) -> Result<()>;

    /// Detaches and destroys the layer. Later calls do nothing.
    fn remove(&self);

    fn is_removed(&self) -> bool;

    /// Map the layer is currently attached to
    fn map(&self) -> Option<MapHandle>;

    /// Effective options as JSON
    fn options(&self) -> serde_json::Value;
}

/// Bookkeeping shared by all layer handles
#[derive(Debug)]
pub(crate) struct LayerState {
    pub(crate) id: HandleId,
    pub(crate) layer_type: LayerType,
    pub(crate) z_index: i32,
    pub(crate) map: Option<MapHandle>,
    pub(crate) removed: bool,
    pub(crate) listeners: Listeners,
}

impl LayerState {
    /// Allocates an id and journals the creation
    pub(crate) fn new(engine: &Engine, layer_type: LayerType) -> Self {
        let id = engine.next_id();
        engine.record(Call::Create { id, layer_type });
        Self {
            id,
            layer_type,
            z_index: 0,
            map: None,
            removed: false,
            listeners: Listeners::default(),
        }
    }

    /// Registers with `map` without journaling; callers record the operation
    pub(crate) fn attach(&mut self, map: &MapHandle) -> Result<()> {
        if self.removed {
            log::warn!("{} layer {} was added after removal", self.layer_type, self.id);
            return Err(MapError::Layer(format!(
                "{} layer {} has been removed",
                self.layer_type, self.id
            )));
        }
        if map.is_removed() {
            return Err(MapError::Map(format!("map {} has been removed", map.id())));
        }
        self.detach();
        map.register_layer(self.id, self.layer_type, self.z_index);
        self.map = Some(map.clone());
        Ok(())
    }

    /// Unregisters from the current map, returning it
    pub(crate) fn detach(&mut self) -> Option<MapHandle> {
        let map = self.map.take()?;
        map.unregister_layer(self.id);
        Some(map)
    }

    /// Detaches and marks the layer destroyed. Returns `false` if it already was.
    pub(crate) fn destroy(&mut self, engine: &Engine) -> bool {
        if self.removed {
            log::trace!("{} layer {} already removed", self.layer_type, self.id);
            return false;
        }
        self.detach();
        self.removed = true;
        self.listeners.clear();
        engine.record(Call::Remove {
            id: self.id,
            layer_type: self.layer_type,
        });
        true
    }

    pub(crate) fn on(&mut self, engine: &Engine, name: &str, handler: Handler) {
        engine.record(Call::On {
            id: self.id,
            event: name.to_string(),
        });
        self.listeners.add(name, handler);
    }

    pub(crate) fn off(&mut self, engine: &Engine, name: &str, handler: &Handler) {
        if self.listeners.remove(name, handler) {
            engine.record(Call::Off {
                id: self.id,
                event: name.to_string(),
            });
        }
    }

    pub(crate) fn event(&self, name: &str) -> Event {
        Event::new(name, self.id)
    }
}

/// Runs `handlers` with `event`; no borrow of the emitting handle may be held
pub(crate) fn dispatch(handlers: Vec<Handler>, event: &Event) {
    for handler in handlers {
        handler(event);
    }
}
