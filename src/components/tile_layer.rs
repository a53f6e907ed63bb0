use crate::{
    components::{attach_layer, context::{use_map, Scope}},
    core::{
        map::MapHandle,
        options::{self, OptionBag, TileLayerOptions},
    },
    layers::{base::Layer, tile::TileLayerHandle},
    Result,
};

/// Tile source overlay. Any prop change replaces the layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub url: String,
    pub attribution: Option<String>,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub opacity: Option<f64>,
    pub z_index: Option<i32>,
    /// Extra tile options, applied over the explicit fields
    pub options: OptionBag,
}

impl TileLayer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            attribution: None,
            min_zoom: None,
            max_zoom: None,
            opacity: None,
            z_index: None,
            options: OptionBag::new(),
        }
    }

    pub fn attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = Some(attribution.into());
        self
    }

    pub fn min_zoom(mut self, zoom: f64) -> Self {
        self.min_zoom = Some(zoom);
        self
    }

    pub fn max_zoom(mut self, zoom: f64) -> Self {
        self.max_zoom = Some(zoom);
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    fn layer_options(&self) -> Result<TileLayerOptions> {
        let base = TileLayerOptions {
            attribution: self.attribution.clone(),
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            opacity: self.opacity,
            z_index: self.z_index,
            ..Default::default()
        };
        options::merge(&base, &self.options, &[])
    }
}

pub(crate) struct TileLayerInstance {
    props: TileLayer,
    map: MapHandle,
    layer: Option<TileLayerHandle>,
}

impl TileLayerInstance {
    pub(crate) fn mount(props: TileLayer, scope: &Scope) -> Result<Self> {
        let map = use_map(scope)?;
        let layer = Self::create(&props, &map)?;
        Ok(Self {
            props,
            map,
            layer: Some(layer),
        })
    }

    pub(crate) fn update(&mut self, props: TileLayer, scope: &Scope) -> Result<()> {
        let map = use_map(scope)?;
        if props == self.props && map == self.map && self.layer.is_some() {
            return Ok(());
        }

        self.unmount();
        self.layer = Some(Self::create(&props, &map)?);
        self.props = props;
        self.map = map;
        Ok(())
    }

    pub(crate) fn unmount(&mut self) {
        if let Some(layer) = self.layer.take() {
            log::debug!("removing tile layer {}", layer.id());
            layer.remove();
        }
    }

    fn create(props: &TileLayer, map: &MapHandle) -> Result<TileLayerHandle> {
        let options = props.layer_options()?;
        let layer = map.engine().tile_layer(props.url.clone(), options);
        attach_layer(layer, map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_bag_overrides_props() {
        let props = TileLayer::new("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png")
            .attribution("&copy; OpenStreetMap contributors")
            .max_zoom(19.0)
            .option("maxZoom", 5)
            .option("subdomains", vec!["x", "y"]);

        let options = props.layer_options().unwrap();
        assert_eq!(options.max_zoom, Some(5.0));
        assert_eq!(
            options.attribution.as_deref(),
            Some("&copy; OpenStreetMap contributors")
        );
        assert_eq!(
            options.subdomains,
            Some(vec!["x".to_string(), "y".to_string()])
        );
    }
}
