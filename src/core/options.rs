//! Option structs accepted by the engine constructors.
//!
//! Every struct carries an `extra` bag for options this crate does not model.
//! Components build the typed part from their props and then [`merge`] the
//! caller's escape-hatch bag on top, the way a spread of extra options
//! follows the explicit ones.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    core::{
        constants::{DEFAULT_MARKER_ALT, DEFAULT_POPUP_MAX_WIDTH, DEFAULT_POPUP_MIN_WIDTH},
        geo::LatLng,
    },
    Result,
};

/// Free-form options, keyed by their camelCase names.
pub type OptionBag = serde_json::Map<String, serde_json::Value>;

/// Overlays `extra` onto the serialized form of `base` and reads the result
/// back. The bag wins over `base`, except for keys listed in `protected`.
///
/// Unknown keys survive in the target's flattened `extra` bag, known keys
/// replace the typed field. A value of the wrong type is an error.
pub fn merge<T>(base: &T, extra: &OptionBag, protected: &[&str]) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(base)?;

    if let serde_json::Value::Object(fields) = &mut value {
        fields.extend(without_reserved(extra, protected));
    }

    Ok(serde_json::from_value(value)?)
}

/// Copy of `extra` minus the `protected` keys, for options that are not
/// serde types.
pub fn without_reserved(extra: &OptionBag, protected: &[&str]) -> OptionBag {
    extra
        .iter()
        .filter(|(key, _)| {
            let reserved = protected.contains(&key.as_str());
            if reserved {
                log::warn!("ignoring reserved option `{}` from the option bag", key);
            }
            !reserved
        })
        .map(|(key, option)| (key.clone(), option.clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    pub scroll_wheel_zoom: bool,
    pub dragging: bool,
    pub double_click_zoom: bool,
    pub zoom_control: bool,
    #[serde(flatten)]
    pub extra: OptionBag,
}

impl MapOptions {
    /// Patched on the live map, so the option bag may not override them.
    pub const RESERVED: &'static [&'static str] = &["center", "zoom"];

    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            min_zoom: None,
            max_zoom: None,
            scroll_wheel_zoom: true,
            dragging: true,
            double_click_zoom: true,
            zoom_control: true,
            extra: OptionBag::new(),
        }
    }
}

impl Default for MapOptions {
    fn default() -> Self {
        Self::new(LatLng::default(), 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileLayerOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomains: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: OptionBag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconOptions {
    pub icon_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_retina_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_size: Option<(u32, u32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_anchor: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerOptions {
    pub draggable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconOptions>,
    #[serde(flatten)]
    pub extra: OptionBag,
}

impl MarkerOptions {
    /// Patched on the live marker, so the option bag may not override them.
    pub const RESERVED: &'static [&'static str] = &["draggable", "opacity"];
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self {
            draggable: false,
            opacity: None,
            alt: DEFAULT_MARKER_ALT.to_string(),
            icon: None,
            extra: OptionBag::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupOptions {
    pub max_width: f64,
    pub min_width: f64,
    pub auto_close: bool,
    pub close_on_click: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(flatten)]
    pub extra: OptionBag,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_POPUP_MAX_WIDTH,
            min_width: DEFAULT_POPUP_MIN_WIDTH,
            auto_close: true,
            close_on_click: true,
            class_name: None,
            extra: OptionBag::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: serde_json::Value) -> OptionBag {
        match value {
            serde_json::Value::Object(map) => map,
            _ => OptionBag::new(),
        }
    }

    #[test]
    fn test_merge_overrides_unreserved_fields() {
        let base = MapOptions::new(LatLng::new(51.505, -0.09), 13.0);
        let extra = bag(json!({ "dragging": false, "worldCopyJump": true }));

        let merged = merge(&base, &extra, MapOptions::RESERVED).unwrap();

        assert!(!merged.dragging);
        assert_eq!(merged.extra.get("worldCopyJump"), Some(&json!(true)));
        assert_eq!(merged.zoom, 13.0);
    }

    #[test]
    fn test_merge_keeps_reserved_fields() {
        let base = MarkerOptions {
            draggable: true,
            opacity: Some(0.8),
            ..Default::default()
        };
        let extra = bag(json!({ "draggable": false, "opacity": 0.1, "alt": "Pin" }));

        let merged = merge(&base, &extra, MarkerOptions::RESERVED).unwrap();

        assert!(merged.draggable);
        assert_eq!(merged.opacity, Some(0.8));
        assert_eq!(merged.alt, "Pin");
    }

    #[test]
    fn test_option_bag_wins_over_base() {
        let base = TileLayerOptions {
            attribution: Some("OSM".to_string()),
            max_zoom: Some(19.0),
            ..Default::default()
        };
        let extra = bag(json!({ "attribution": "other", "maxZoom": 3, "opacity": 0.5 }));

        let merged = merge(&base, &extra, &[]).unwrap();

        assert_eq!(merged.attribution.as_deref(), Some("other"));
        assert_eq!(merged.max_zoom, Some(3.0));
        assert_eq!(merged.opacity, Some(0.5));
    }

    #[test]
    fn test_merge_rejects_mistyped_option() {
        let extra = bag(json!({ "autoPan": true, "keepInView": "yes" }));
        let merged = merge(&PopupOptions::default(), &extra, &[]).unwrap();
        assert_eq!(merged.extra.len(), 2);

        let bad = bag(json!({ "zIndex": "top" }));
        assert!(merge(&TileLayerOptions::default(), &bad, &[]).is_err());
    }

    #[test]
    fn test_without_reserved_drops_protected_keys() {
        let extra = bag(json!({ "style": {}, "pane": "overlayPane" }));
        let kept = without_reserved(&extra, &["style"]);

        assert_eq!(kept.len(), 1);
        assert!(kept.contains_key("pane"));
    }

    #[test]
    fn test_popup_defaults() {
        let options = PopupOptions::default();
        assert_eq!(options.max_width, 300.0);
        assert_eq!(options.min_width, 50.0);
        assert!(options.auto_close);
        assert!(options.close_on_click);
    }
}
