use crate::{
    components::{attach_layer, context::{use_map, Scope}},
    core::{
        map::MapHandle,
        options::{self, OptionBag},
    },
    data::geojson::GeoJson,
    layers::{
        base::Layer,
        vector::{FeatureStyle, FilterFn, GeoJsonHandle, GeoJsonOptions, OnEachFeatureFn, PointToLayerFn},
    },
    Result,
};

/// GeoJSON vector overlay.
///
/// Any prop change replaces the overlay. When `data` changes the new overlay
/// is also cleared and refilled in place, so it always shows exactly the
/// latest data.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoJsonOverlay {
    pub data: GeoJson,
    pub style: Option<FeatureStyle>,
    pub on_each_feature: Option<OnEachFeatureFn>,
    pub point_to_layer: Option<PointToLayerFn>,
    pub filter: Option<FilterFn>,
    /// Extra overlay options; the callback keys are ignored here
    pub options: OptionBag,
}

impl GeoJsonOverlay {
    pub fn new(data: impl Into<GeoJson>) -> Self {
        Self {
            data: data.into(),
            style: None,
            on_each_feature: None,
            point_to_layer: None,
            filter: None,
            options: OptionBag::new(),
        }
    }

    pub fn style(mut self, style: impl Into<FeatureStyle>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn on_each_feature(mut self, on_each_feature: OnEachFeatureFn) -> Self {
        self.on_each_feature = Some(on_each_feature);
        self
    }

    pub fn point_to_layer(mut self, point_to_layer: PointToLayerFn) -> Self {
        self.point_to_layer = Some(point_to_layer);
        self
    }

    pub fn filter(mut self, filter: FilterFn) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    fn overlay_options(&self) -> GeoJsonOptions {
        GeoJsonOptions {
            style: self.style.clone(),
            on_each_feature: self.on_each_feature.clone(),
            point_to_layer: self.point_to_layer.clone(),
            filter: self.filter.clone(),
            extra: options::without_reserved(&self.options, GeoJsonOptions::RESERVED),
        }
    }
}

pub(crate) struct GeoJsonInstance {
    props: GeoJsonOverlay,
    map: MapHandle,
    layer: Option<GeoJsonHandle>,
}

impl GeoJsonInstance {
    pub(crate) fn mount(props: GeoJsonOverlay, scope: &Scope) -> Result<Self> {
        let map = use_map(scope)?;
        let layer = Self::create(&props, &map)?;
        Ok(Self {
            props,
            map,
            layer: Some(layer),
        })
    }

    pub(crate) fn update(&mut self, props: GeoJsonOverlay, scope: &Scope) -> Result<()> {
        let map = use_map(scope)?;
        if props == self.props && map == self.map && self.layer.is_some() {
            return Ok(());
        }
        let data_changed = props.data != self.props.data;

        self.unmount();
        let layer = Self::create(&props, &map)?;
        if data_changed {
            layer.clear_layers();
            layer.add_data(&props.data);
        }
        self.layer = Some(layer);
        self.props = props;
        self.map = map;
        Ok(())
    }

    pub(crate) fn unmount(&mut self) {
        if let Some(layer) = self.layer.take() {
            log::debug!("removing GeoJSON layer {}", layer.id());
            layer.remove();
        }
    }

    fn create(props: &GeoJsonOverlay, map: &MapHandle) -> Result<GeoJsonHandle> {
        let layer = map
            .engine()
            .geo_json(Some(&props.data), props.overlay_options());
        attach_layer(layer, map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::geojson::GeoJsonFeature, layers::vector::PathStyle};

    #[test]
    fn test_overlay_options_drop_callback_keys() {
        let props = GeoJsonOverlay::new(GeoJsonFeature::point([-0.09, 51.505]))
            .style(PathStyle::default().color("blue"))
            .option("style", "red")
            .option("pane", "overlayPane");

        let options = props.overlay_options();
        assert_eq!(
            options.style,
            Some(FeatureStyle::Fixed(PathStyle::default().color("blue")))
        );
        assert_eq!(options.extra.len(), 1);
    }

    #[test]
    fn test_props_compare_callbacks_by_identity() {
        let filter = FilterFn::new(|_| true);
        let data = GeoJson::from(GeoJsonFeature::point([0.0, 0.0]));

        let a = GeoJsonOverlay::new(data.clone()).filter(filter.clone());
        let b = GeoJsonOverlay::new(data.clone()).filter(filter);
        let c = GeoJsonOverlay::new(data).filter(FilterFn::new(|_| true));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
