use std::{cell::RefCell, rc::Rc};

use crate::{
    core::{
        constants::{
            DEFAULT_SUBDOMAINS, DEFAULT_TILE_MAX_ZOOM, DEFAULT_TILE_MIN_ZOOM, DEFAULT_TILE_Z_INDEX,
        },
        engine::Engine,
        geo::TileCoord,
        options::TileLayerOptions,
    },
    layers::base::{Layer, LayerState, LayerType},
};

struct TileLayerState {
    base: LayerState,
    url: String,
    options: TileLayerOptions,
}

/// Raster tile overlay built from a URL template
#[derive(Clone)]
pub struct TileLayerHandle {
    engine: Engine,
    inner: Rc<RefCell<TileLayerState>>,
}

impl TileLayerHandle {
    pub(crate) fn create(engine: Engine, url: String, options: TileLayerOptions) -> Self {
        let mut base = LayerState::new(&engine, LayerType::Tile);
        base.z_index = options.z_index.unwrap_or(DEFAULT_TILE_Z_INDEX);
        Self {
            engine,
            inner: Rc::new(RefCell::new(TileLayerState { base, url, options })),
        }
    }

    pub fn url(&self) -> String {
        self.inner.borrow().url.clone()
    }

    pub fn attribution(&self) -> Option<String> {
        self.inner.borrow().options.attribution.clone()
    }

    pub fn opacity(&self) -> f64 {
        self.inner.borrow().options.opacity.unwrap_or(1.0)
    }

    pub fn z_index(&self) -> i32 {
        self.inner.borrow().base.z_index
    }

    /// Zoom range tiles are requested for
    pub fn zoom_range(&self) -> (f64, f64) {
        let state = self.inner.borrow();
        (
            state.options.min_zoom.unwrap_or(DEFAULT_TILE_MIN_ZOOM),
            state.options.max_zoom.unwrap_or(DEFAULT_TILE_MAX_ZOOM),
        )
    }

    /// Fills the URL template for `coord`.
    ///
    /// `{s}` rotates through the subdomains, `{r}` is left empty (no retina
    /// tiles), and any other `{key}` is looked up in the option bag.
    pub fn tile_url(&self, coord: TileCoord) -> String {
        let state = self.inner.borrow();
        let subdomains: Vec<String> = match &state.options.subdomains {
            Some(subdomains) if !subdomains.is_empty() => subdomains.clone(),
            _ => DEFAULT_SUBDOMAINS.iter().map(|s| s.to_string()).collect(),
        };
        let index = (u64::from(coord.x) + u64::from(coord.y)) % subdomains.len() as u64;
        let subdomain = &subdomains[index as usize];

        let mut url = String::with_capacity(state.url.len());
        let mut rest = state.url.as_str();
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            url.push_str(&rest[..start]);
            let key = &rest[start + 1..start + len];
            match key {
                "s" => url.push_str(subdomain),
                "z" => url.push_str(&coord.z.to_string()),
                "x" => url.push_str(&coord.x.to_string()),
                "y" => url.push_str(&coord.y.to_string()),
                "r" => {}
                other => match state.options.extra.get(other) {
                    Some(serde_json::Value::String(value)) => url.push_str(value),
                    Some(value) => url.push_str(&value.to_string()),
                    None => url.push_str(&rest[start..=start + len]),
                },
            }
            rest = &rest[start + len + 1..];
        }
        url.push_str(rest);
        url
    }
}

impl Layer for TileLayerHandle {
    crate::impl_layer_lifecycle!();

    fn options(&self) -> serde_json::Value {
        serde_json::to_value(&self.inner.borrow().options).unwrap_or(serde_json::Value::Null)
    }
}

crate::impl_evented!(TileLayerHandle);
crate::impl_handle_identity!(TileLayerHandle);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{geo::LatLng, options::MapOptions};
    use crate::ui::dom::DomNode;

    const OSM: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}{r}.png";

    #[test]
    fn test_tile_url_template() {
        let engine = Engine::new();
        let layer = engine.tile_layer(OSM, TileLayerOptions::default());

        assert_eq!(
            layer.tile_url(TileCoord::new(4093, 2724, 13)),
            "https://b.tile.openstreetmap.org/13/4093/2724.png"
        );
        assert_eq!(
            layer.tile_url(TileCoord::new(0, 0, 0)),
            "https://a.tile.openstreetmap.org/0/0/0.png"
        );
    }

    #[test]
    fn test_tile_url_subdomain_at_max_coordinates() {
        let engine = Engine::new();
        let layer = engine.tile_layer(OSM, TileLayerOptions::default());

        // (2 * u32::MAX) % 3 == 0
        assert_eq!(
            layer.tile_url(TileCoord::new(u32::MAX, u32::MAX, 31)),
            format!("https://a.tile.openstreetmap.org/31/{0}/{0}.png", u32::MAX)
        );
    }

    #[test]
    fn test_tile_url_custom_keys() {
        let engine = Engine::new();
        let mut options = TileLayerOptions::default();
        options
            .extra
            .insert("accessToken".to_string(), serde_json::json!("abc"));
        let layer = engine.tile_layer("https://t/{z}/{x}/{y}?k={accessToken}&m={missing}", options);

        assert_eq!(
            layer.tile_url(TileCoord::new(1, 2, 3)),
            "https://t/3/1/2?k=abc&m={missing}"
        );
    }

    #[test]
    fn test_add_and_remove() {
        let engine = Engine::new();
        let map = engine
            .map(&DomNode::element("div"), MapOptions::new(LatLng::new(0.0, 0.0), 2.0))
            .unwrap();
        let layer = engine.tile_layer(OSM, TileLayerOptions::default());

        layer.add_to(&map).unwrap();
        assert!(map.has_layer(layer.id()));
        assert_eq!(layer.z_index(), 1);
        assert_eq!(layer.zoom_range(), (0.0, 18.0));

        layer.remove();
        layer.remove();
        assert!(!map.has_layer(layer.id()));
        assert!(layer.add_to(&map).is_err());
        assert_eq!(engine.destroyed(LayerType::Tile), 1);
    }
}
