use maplet_components::prelude::*;
use std::{cell::RefCell, rc::Rc};

const OSM_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Builds the demo tree for the given view
fn app(
    center: LatLng,
    zoom: f64,
    map: &Rc<RefCell<Option<MapHandle>>>,
    marker: &Rc<RefCell<Option<MarkerHandle>>>,
) -> Node {
    let map = map.clone();
    let marker = marker.clone();

    MapContainer::new(center, zoom)
        .style("height", "400px")
        .when_ready(move |handle| *map.borrow_mut() = Some(handle.clone()))
        .child(TileLayer::new(OSM_URL).attribution("&copy; OpenStreetMap contributors"))
        .child(
            Marker::new([51.505, -0.09])
                .event_handlers(EventHandlers::new().on("click", |event| {
                    println!("   🖱️ Marker clicked ({})", event.name);
                }))
                .child(
                    Popup::new()
                        .child("A pretty CSS popup.")
                        .child(Element::new("br"))
                        .child("Easily customizable."),
                )
                .child(Component::new("MarkerProbe", move |scope| {
                    *marker.borrow_mut() = use_marker(scope);
                    Ok(Vec::new())
                })),
        )
        .child(MapEvents::new(EventHandlers::new().on("moveend", |event| {
            println!("   🧭 View moved (zoom {:?})", event.zoom);
        })))
        .into()
}

/// Renders a map tree without any UI and prints what the engine was asked to do
fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("🗺️ Maplet Components Headless Example");
    println!("=====================================");

    let engine = Engine::new();
    let mut root = Root::new(engine.clone());
    let map = Rc::new(RefCell::new(None));
    let marker = Rc::new(RefCell::new(None));

    let london = LatLng::new(51.505, -0.09);
    root.render([app(london, 13.0, &map, &marker)])?;

    let map_handle = map
        .borrow()
        .clone()
        .ok_or_else(|| anyhow::anyhow!("map was not created"))?;
    println!("✅ Map created:");
    println!("   Center: {:.4}, {:.4}", map_handle.center().lat, map_handle.center().lng);
    println!("   Zoom: {}", map_handle.zoom());
    println!("   Layers: {}", map_handle.layer_count());

    println!("\n🎯 Clicking the marker:");
    let marker_handle = marker
        .borrow()
        .clone()
        .ok_or_else(|| anyhow::anyhow!("marker was not mounted"))?;
    marker_handle.fire("click");
    for popup in map_handle.open_popups() {
        if let Some(content) = popup.content() {
            println!("   💬 Popup open: {}", content.text_content());
        }
    }

    println!("\n🔍 Changing the view:");
    let locations = [
        ("Tower Bridge", LatLng::new(51.5055, -0.0754), 15.0),
        ("Greenwich", LatLng::new(51.4769, -0.0005), 14.0),
    ];
    for (name, location, zoom) in locations {
        root.render([app(location, zoom, &map, &marker)])?;
        println!(
            "   📍 {} - {:.4}, {:.4} at zoom {}",
            name, location.lat, location.lng, zoom
        );
    }

    println!("\n🧹 Unmounting:");
    root.unmount();
    for layer_type in [LayerType::Tile, LayerType::Marker, LayerType::Popup] {
        println!(
            "   {} layers: {} created, {} destroyed",
            layer_type,
            engine.created(layer_type),
            engine.destroyed(layer_type)
        );
    }
    println!(
        "   Maps: {} created, {} removed",
        engine.maps_created(),
        engine.maps_removed()
    );
    println!("   Journal entries: {}", engine.calls().len());

    println!("\n✅ Headless example completed successfully!");
    Ok(())
}
