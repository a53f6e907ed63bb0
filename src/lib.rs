//! # maplet-components
//!
//! Declarative map components on top of a Leaflet-style imperative engine.
//!
//! A tree of [`Node`]s (map container, tile layers, markers, popups, GeoJSON
//! overlays, event subscriptions) is rendered through a [`Root`]. Each
//! component owns one engine handle: it creates the handle on mount, patches
//! or recreates it when its props change, and removes it on unmount.
//!
//! ```no_run
//! use maplet_components::prelude::*;
//!
//! # fn main() -> maplet_components::Result<()> {
//! let engine = Engine::new();
//! let mut root = Root::new(engine.clone());
//!
//! root.render([MapContainer::new([51.505, -0.09], 13.0)
//!     .child(TileLayer::new("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png"))
//!     .child(Marker::new([51.505, -0.09]).child(Popup::new().child("Hello!")))
//!     .into()])?;
//!
//! root.unmount();
//! # Ok(())
//! # }
//! ```

pub mod components;
pub mod core;
pub mod data;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    callback::Callback,
    engine::{Call, Engine, HandleId},
    geo::{LatLng, LatLngBounds, TileCoord},
    map::MapHandle,
    options::OptionBag,
};

pub use layers::{
    base::{Layer, LayerType},
    marker::MarkerHandle,
    popup::PopupHandle,
    tile::TileLayerHandle,
    vector::{FeatureLayer, FeatureLayerKind, FeatureStyle, GeoJsonHandle, GeoJsonOptions, PathStyle},
};

pub use data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry};

pub use input::events::{Event, EventHandlers, Evented, Handler, Subscription};

pub use ui::dom::DomNode;

pub use components::{
    context::{use_map, use_map_context, use_map_events, use_marker, MapContext, Scope},
    tree::Root,
    Component, Element, GeoJsonOverlay, MapContainer, MapEvents, MapProvider, Marker, Node,
    Popup, TileLayer,
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// A hook or component needs a `MapContainer` ancestor and has none.
    #[error("{hook} must be used within a MapContainer")]
    ContextMissing { hook: &'static str },

    /// The container exists but has not published its map yet.
    #[error(
        "map instance is not available; make sure this is used within a MapContainer \
         and the map has been initialized"
    )]
    MapUnavailable,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Map error: {0}")]
    Map(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Error type alias for convenience
pub type Error = MapError;
