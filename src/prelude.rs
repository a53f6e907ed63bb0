//! Prelude module for common maplet-components types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use maplet_components::prelude::*;`

pub use crate::core::{
    callback::Callback,
    engine::{Call, Engine, HandleId},
    geo::{LatLng, LatLngBounds, TileCoord},
    map::MapHandle,
    options::{
        IconOptions, MapOptions, MarkerOptions, OptionBag, PopupOptions, TileLayerOptions,
    },
};

pub use crate::layers::{
    base::{Layer, LayerType},
    marker::MarkerHandle,
    popup::PopupHandle,
    tile::TileLayerHandle,
    vector::{
        FeatureLayer, FeatureLayerKind, FeatureStyle, FilterFn, GeoJsonHandle, GeoJsonOptions,
        OnEachFeatureFn, PathStyle, PointToLayerFn, StyleFn,
    },
};

pub use crate::data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry};

pub use crate::input::events::{Event, EventHandlers, Evented, Handler, Subscription};

pub use crate::ui::dom::DomNode;

pub use crate::components::{
    context::{use_map, use_map_context, use_map_events, use_marker, MapContext, Scope},
    tree::Root,
    Component, Element, GeoJsonOverlay, MapContainer, MapEvents, MapProvider, Marker, Node,
    Popup, TileLayer,
};

pub use crate::{Error as MapError, Result};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
