//! Core constants derived from Leaflet defaults and common web-map conventions.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

use once_cell::sync::Lazy;

use crate::core::options::IconOptions;

/// Zoom range a tile layer covers when none is configured.
pub const DEFAULT_TILE_MIN_ZOOM: f64 = 0.0;
pub const DEFAULT_TILE_MAX_ZOOM: f64 = 18.0;

/// Stacking order given to tile layers without an explicit z-index.
pub const DEFAULT_TILE_Z_INDEX: i32 = 1;

/// Subdomains substituted for `{s}` in tile URL templates.
pub const DEFAULT_SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

/// Popup width limits in pixels.
pub const DEFAULT_POPUP_MAX_WIDTH: f64 = 300.0;
pub const DEFAULT_POPUP_MIN_WIDTH: f64 = 50.0;

/// Alt text given to markers that do not set one.
pub const DEFAULT_MARKER_ALT: &str = "Marker";

/// Marker icon default size (regular PNG).
pub const MARKER_ICON_SIZE: (u32, u32) = (25, 41);

/// Anchor inside the icon (hot-spot) in pixel coords.
pub const MARKER_ICON_ANCHOR: (u32, u32) = (12, 41);

const ICON_BASE_URL: &str = "https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/images";

/// Icon used by markers that do not bring their own.
///
/// Bundlers lose the relative image paths of the stock icon, so the default
/// points at the published CDN assets instead.
pub static DEFAULT_ICON: Lazy<IconOptions> = Lazy::new(|| IconOptions {
    icon_url: format!("{ICON_BASE_URL}/marker-icon.png"),
    icon_retina_url: Some(format!("{ICON_BASE_URL}/marker-icon-2x.png")),
    shadow_url: Some(format!("{ICON_BASE_URL}/marker-shadow.png")),
    icon_size: Some(MARKER_ICON_SIZE),
    icon_anchor: Some(MARKER_ICON_ANCHOR),
});
