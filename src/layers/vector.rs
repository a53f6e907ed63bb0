//! GeoJSON-backed vector overlay.
//!
//! Each accepted feature becomes a [`FeatureLayer`]: points turn into
//! markers (or whatever `point_to_layer` builds), everything else into a
//! styled path.

use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::{
    core::{
        callback::Callback,
        engine::{Call, Engine},
        geo::{LatLng, LatLngBounds},
        options::OptionBag,
    },
    data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry},
    layers::base::{Layer, LayerState, LayerType},
};

/// Path styling, keyed like the usual vector path options
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
}

impl PathStyle {
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn fill_color(mut self, color: impl Into<String>) -> Self {
        self.fill_color = Some(color.into());
        self
    }

    pub fn fill_opacity(mut self, opacity: f64) -> Self {
        self.fill_opacity = Some(opacity);
        self
    }
}

pub type StyleFn = Callback<dyn Fn(&GeoJsonFeature) -> PathStyle>;
pub type OnEachFeatureFn = Callback<dyn Fn(&GeoJsonFeature, &mut FeatureLayer)>;
pub type PointToLayerFn = Callback<dyn Fn(&GeoJsonFeature, LatLng) -> FeatureLayerKind>;
pub type FilterFn = Callback<dyn Fn(&GeoJsonFeature) -> bool>;

impl Callback<dyn Fn(&GeoJsonFeature) -> PathStyle> {
    pub fn new(f: impl Fn(&GeoJsonFeature) -> PathStyle + 'static) -> Self {
        Self::from_rc(Rc::new(f))
    }
}

impl Callback<dyn Fn(&GeoJsonFeature, &mut FeatureLayer)> {
    pub fn new(f: impl Fn(&GeoJsonFeature, &mut FeatureLayer) + 'static) -> Self {
        Self::from_rc(Rc::new(f))
    }
}

impl Callback<dyn Fn(&GeoJsonFeature, LatLng) -> FeatureLayerKind> {
    pub fn new(f: impl Fn(&GeoJsonFeature, LatLng) -> FeatureLayerKind + 'static) -> Self {
        Self::from_rc(Rc::new(f))
    }
}

impl Callback<dyn Fn(&GeoJsonFeature) -> bool> {
    pub fn new(f: impl Fn(&GeoJsonFeature) -> bool + 'static) -> Self {
        Self::from_rc(Rc::new(f))
    }
}

/// A fixed style or one computed per feature
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureStyle {
    Fixed(PathStyle),
    PerFeature(StyleFn),
}

impl FeatureStyle {
    pub fn resolve(&self, feature: &GeoJsonFeature) -> PathStyle {
        match self {
            FeatureStyle::Fixed(style) => style.clone(),
            FeatureStyle::PerFeature(style_fn) => style_fn(feature),
        }
    }
}

impl From<PathStyle> for FeatureStyle {
    fn from(style: PathStyle) -> Self {
        FeatureStyle::Fixed(style)
    }
}

impl From<StyleFn> for FeatureStyle {
    fn from(style_fn: StyleFn) -> Self {
        FeatureStyle::PerFeature(style_fn)
    }
}

/// What a feature was turned into
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureLayerKind {
    Marker(LatLng),
    CircleMarker { center: LatLng, radius: f64 },
    Path(GeoJsonGeometry),
    Group(Vec<FeatureLayerKind>),
}

/// Sub-layer built for one feature
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayer {
    pub feature: GeoJsonFeature,
    pub kind: FeatureLayerKind,
    /// Resolved style; markers are not styled
    pub style: Option<PathStyle>,
    pub popup_content: Option<String>,
}

impl FeatureLayer {
    pub fn bind_popup(&mut self, content: impl Into<String>) {
        self.popup_content = Some(content.into());
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoJsonOptions {
    pub style: Option<FeatureStyle>,
    pub on_each_feature: Option<OnEachFeatureFn>,
    pub point_to_layer: Option<PointToLayerFn>,
    pub filter: Option<FilterFn>,
    pub extra: OptionBag,
}

impl GeoJsonOptions {
    pub const RESERVED: &'static [&'static str] =
        &["style", "onEachFeature", "pointToLayer", "filter"];

    fn point_layer(&self, feature: &GeoJsonFeature, position: LatLng) -> FeatureLayerKind {
        match &self.point_to_layer {
            Some(point_to_layer) => point_to_layer(feature, position),
            None => FeatureLayerKind::Marker(position),
        }
    }

    fn geometry_layer(&self, feature: &GeoJsonFeature, geometry: &GeoJsonGeometry) -> FeatureLayerKind {
        match geometry {
            GeoJsonGeometry::Point { coordinates } => {
                self.point_layer(feature, LatLng::from_geojson(*coordinates))
            }
            GeoJsonGeometry::MultiPoint { coordinates } => FeatureLayerKind::Group(
                coordinates
                    .iter()
                    .map(|c| self.point_layer(feature, LatLng::from_geojson(*c)))
                    .collect(),
            ),
            GeoJsonGeometry::GeometryCollection { geometries } => FeatureLayerKind::Group(
                geometries
                    .iter()
                    .map(|g| self.geometry_layer(feature, g))
                    .collect(),
            ),
            other => FeatureLayerKind::Path(other.clone()),
        }
    }

    /// Builds the sub-layer for `feature`, or `None` when it is filtered out
    /// or has no geometry
    fn feature_layer(&self, feature: &GeoJsonFeature) -> Option<FeatureLayer> {
        if let Some(filter) = &self.filter {
            if !filter(feature) {
                return None;
            }
        }
        let geometry = feature.geometry.as_ref()?;
        let kind = self.geometry_layer(feature, geometry);
        let style = match (&kind, &self.style) {
            (FeatureLayerKind::Marker(_), _) | (_, None) => None,
            (_, Some(style)) => Some(style.resolve(feature)),
        };

        let mut layer = FeatureLayer {
            feature: feature.clone(),
            kind,
            style,
            popup_content: None,
        };
        if let Some(on_each_feature) = &self.on_each_feature {
            on_each_feature(feature, &mut layer);
        }
        Some(layer)
    }
}

struct GeoJsonState {
    base: LayerState,
    options: GeoJsonOptions,
    layers: Vec<FeatureLayer>,
}

/// Vector overlay holding one sub-layer per GeoJSON feature
#[derive(Clone)]
pub struct GeoJsonHandle {
    engine: Engine,
    inner: Rc<RefCell<GeoJsonState>>,
}

impl GeoJsonHandle {
    pub(crate) fn create(engine: Engine, data: Option<&GeoJson>, options: GeoJsonOptions) -> Self {
        let base = LayerState::new(&engine, LayerType::Vector);
        let handle = Self {
            engine,
            inner: Rc::new(RefCell::new(GeoJsonState {
                base,
                options,
                layers: Vec::new(),
            })),
        };
        if let Some(data) = data {
            handle.add_data(data);
        }
        handle
    }

    /// Adds the features of `data`, returning how many were accepted
    pub fn add_data(&self, data: &GeoJson) -> usize {
        // Callbacks run without the state borrowed
        let options = self.inner.borrow().options.clone();
        let added: Vec<FeatureLayer> = data
            .features()
            .iter()
            .filter_map(|feature| options.feature_layer(feature))
            .collect();

        let count = added.len();
        let id = {
            let mut state = self.inner.borrow_mut();
            state.layers.extend(added);
            state.base.id
        };
        self.engine.record(Call::AddData {
            id,
            features: count,
        });
        count
    }

    /// Drops every sub-layer
    pub fn clear_layers(&self) {
        let id = {
            let mut state = self.inner.borrow_mut();
            state.layers.clear();
            state.base.id
        };
        self.engine.record(Call::ClearLayers { id });
    }

    pub fn layers(&self) -> Vec<FeatureLayer> {
        self.inner.borrow().layers.clone()
    }

    pub fn features(&self) -> Vec<GeoJsonFeature> {
        self.inner
            .borrow()
            .layers
            .iter()
            .map(|layer| layer.feature.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().layers.is_empty()
    }

    pub fn geo_json_options(&self) -> GeoJsonOptions {
        self.inner.borrow().options.clone()
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        let features = self.features();
        GeoJson::collection(features).bounds()
    }
}

impl Layer for GeoJsonHandle {
    crate::impl_layer_lifecycle!();

    fn options(&self) -> serde_json::Value {
        let state = self.inner.borrow();
        let mut options = state.options.extra.clone();
        if let Some(FeatureStyle::Fixed(style)) = &state.options.style {
            if let Ok(style) = serde_json::to_value(style) {
                options.insert("style".to_string(), style);
            }
        }
        serde_json::Value::Object(options)
    }
}

crate::impl_evented!(GeoJsonHandle);
crate::impl_handle_identity!(GeoJsonHandle);
