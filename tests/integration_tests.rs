use maplet_components::prelude::*;
use std::{cell::RefCell, rc::Rc};

/// Scenario tests: whole trees rendered through a `Root`, checked against the
/// engine's call journal.
#[cfg(test)]
mod integration_tests {
    use super::*;

    const OSM_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    type Slot<T> = Rc<RefCell<Option<T>>>;

    fn slot<T>() -> Slot<T> {
        Rc::new(RefCell::new(None))
    }

    /// Component that records the marker it can see
    fn marker_probe(found: &Slot<MarkerHandle>) -> Component {
        let found = found.clone();
        Component::new("MarkerProbe", move |scope| {
            *found.borrow_mut() = use_marker(scope);
            Ok(Vec::new())
        })
    }

    fn london(map: &Slot<MapHandle>) -> MapContainer {
        let map = map.clone();
        MapContainer::new([51.505, -0.09], 13.0)
            .when_ready(move |handle| *map.borrow_mut() = Some(handle.clone()))
    }

    /// Container, tile layer and a marker with a nested popup
    #[test]
    fn test_london_scenario() {
        init_logging();
        println!("🧪 [TEST] Testing the London scenario");

        let engine = Engine::new();
        let mut root = Root::new(engine.clone());
        let map = slot();
        let marker = slot();

        root.render([london(&map)
            .child(TileLayer::new(OSM_URL).attribution("&copy; OpenStreetMap contributors"))
            .child(
                Marker::new([51.505, -0.09])
                    .child(Popup::new().child("Hello!"))
                    .child(marker_probe(&marker)),
            )
            .into()])
            .unwrap();

        let map = map.borrow().clone().unwrap();
        assert_eq!(engine.maps_created(), 1);
        assert_eq!(
            engine.calls()[0],
            Call::CreateMap {
                map: map.id(),
                center: LatLng::new(51.505, -0.09),
                zoom: 13.0,
            }
        );
        assert_eq!(engine.created(LayerType::Tile), 1);
        assert_eq!(engine.created(LayerType::Marker), 1);
        assert_eq!(map.count_layers(LayerType::Tile), 1);

        let marker = marker.borrow().clone().unwrap();
        assert_eq!(marker.position(), LatLng::new(51.505, -0.09));

        let popup = marker.popup().expect("popup bound to marker");
        assert_eq!(popup.content().unwrap().text_content(), "Hello!");
        assert!(!popup.is_open());
        assert_eq!(engine.count(|c| matches!(c, Call::OpenOn { .. })), 0);

        // Clicking the marker is what opens its popup
        marker.fire("click");
        assert!(popup.is_open());
        assert!(map.surface().text_content().contains("Hello!"));

        println!("✅ [TEST] London scenario test passed");
    }

    /// The map surface carries the default and user styles
    #[test]
    fn test_container_surface() {
        init_logging();
        println!("🧪 [TEST] Testing container surface attributes");

        let mut root = Root::new(Engine::new());
        root.render([MapContainer::new([0.0, 0.0], 2.0)
            .style("height", "400px")
            .class_name("my-map")
            .into()])
            .unwrap();

        let surface = root.document().query_class("my-map").unwrap();
        assert_eq!(
            surface.attribute("style").as_deref(),
            Some("height: 400px; width: 100%")
        );
        assert!(surface.attribute("data-map-id").is_some());

        root.render([MapContainer::new([0.0, 0.0], 2.0).into()]).unwrap();
        assert!(root.document().query_class("my-map").is_none());
        assert_eq!(root.document().child_count(), 1);

        println!("✅ [TEST] Container surface test passed");
    }

    /// Center and zoom changes move the existing map
    #[test]
    fn test_view_changes_reuse_map() {
        init_logging();
        println!("🧪 [TEST] Testing view updates");

        let engine = Engine::new();
        let mut root = Root::new(engine.clone());
        let map = slot();
        let moves = Rc::new(RefCell::new(Vec::new()));
        let seen = moves.clone();
        let handlers = EventHandlers::new().on("moveend", move |event| {
            seen.borrow_mut().push(event.lat_lng);
        });

        let render = |root: &mut Root, center: [f64; 2], zoom: f64, max_zoom: f64| {
            let map = map.clone();
            root.render([MapContainer::new(center, zoom)
                .max_zoom(max_zoom)
                .when_ready(move |handle| *map.borrow_mut() = Some(handle.clone()))
                .child(MapEvents::new(handlers.clone()))
                .into()])
        };

        render(&mut root, [51.505, -0.09], 13.0, 18.0).unwrap();
        assert_eq!(engine.count(|c| matches!(c, Call::SetView { .. })), 0);

        // Options other than the view do not recreate the map
        render(&mut root, [51.505, -0.09], 13.0, 10.0).unwrap();
        assert_eq!(engine.count(|c| matches!(c, Call::SetView { .. })), 0);

        render(&mut root, [48.8566, 2.3522], 12.0, 10.0).unwrap();
        let map = map.borrow().clone().unwrap();
        assert_eq!(engine.maps_created(), 1);
        assert_eq!(map.center(), LatLng::new(48.8566, 2.3522));
        assert_eq!(map.zoom(), 12.0);
        assert_eq!(*moves.borrow(), vec![Some(LatLng::new(48.8566, 2.3522))]);

        println!("✅ [TEST] View update test passed");
    }

    /// Draggable toggles map onto enable/disable calls in order
    #[test]
    fn test_draggable_toggles() {
        init_logging();
        println!("🧪 [TEST] Testing draggable toggles");

        let engine = Engine::new();
        let mut root = Root::new(engine.clone());
        let marker = slot();

        for draggable in [true, false, true] {
            root.render([MapContainer::new([51.505, -0.09], 13.0)
                .child(
                    Marker::new([51.505, -0.09])
                        .draggable(draggable)
                        .child(marker_probe(&marker)),
                )
                .into()])
                .unwrap();
        }

        let marker = marker.borrow().clone().unwrap();
        let id = marker.id();
        let calls = engine.calls_for(id);
        assert!(matches!(calls[0], Call::Create { .. }));

        let toggles: Vec<Call> = calls
            .into_iter()
            .filter(|c| matches!(c, Call::EnableDragging { .. } | Call::DisableDragging { .. }))
            .collect();
        assert_eq!(
            toggles,
            vec![Call::DisableDragging { id }, Call::EnableDragging { id }]
        );
        assert!(marker.dragging_enabled());
        assert_eq!(engine.created(LayerType::Marker), 1);

        println!("✅ [TEST] Draggable toggle test passed");
    }

    /// Position and opacity patch the marker in place
    #[test]
    fn test_marker_patches() {
        init_logging();
        println!("🧪 [TEST] Testing marker patches");

        let engine = Engine::new();
        let mut root = Root::new(engine.clone());
        let marker = slot();

        let render = |root: &mut Root, position: [f64; 2], opacity: Option<f64>| {
            let mut props = Marker::new(position).child(marker_probe(&marker));
            props.opacity = opacity;
            root.render([MapContainer::new([51.505, -0.09], 13.0).child(props).into()])
        };

        render(&mut root, [51.505, -0.09], None).unwrap();
        render(&mut root, [51.51, -0.1], None).unwrap();
        render(&mut root, [51.51, -0.1], Some(0.5)).unwrap();
        render(&mut root, [51.51, -0.1], None).unwrap();

        let marker = marker.borrow().clone().unwrap();
        assert_eq!(marker.position(), LatLng::new(51.51, -0.1));
        assert_eq!(marker.opacity(), 0.5);
        assert_eq!(engine.count(|c| matches!(c, Call::SetLatLng { .. })), 1);
        assert_eq!(engine.count(|c| matches!(c, Call::SetOpacity { .. })), 1);
        assert_eq!(engine.created(LayerType::Marker), 1);

        println!("✅ [TEST] Marker patch test passed");
    }

    /// Listeners are rebound only when a different handler set is passed
    #[test]
    fn test_marker_event_handlers() {
        init_logging();
        println!("🧪 [TEST] Testing marker event handlers");

        let engine = Engine::new();
        let mut root = Root::new(engine.clone());
        let marker = slot();
        let clicks = Rc::new(RefCell::new(0));
        let counter = clicks.clone();
        let handlers = EventHandlers::new().on("click", move |_| *counter.borrow_mut() += 1);

        let render = |root: &mut Root, handlers: EventHandlers| {
            root.render([MapContainer::new([51.505, -0.09], 13.0)
                .child(
                    Marker::new([51.505, -0.09])
                        .event_handlers(handlers)
                        .child(marker_probe(&marker)),
                )
                .into()])
        };

        render(&mut root, handlers.clone()).unwrap();
        render(&mut root, handlers.clone()).unwrap();
        assert_eq!(engine.count(|c| matches!(c, Call::On { .. })), 1);
        assert_eq!(engine.count(|c| matches!(c, Call::Off { .. })), 0);

        let marker = marker.borrow().clone().unwrap();
        marker.fire("click");
        assert_eq!(*clicks.borrow(), 1);

        render(&mut root, EventHandlers::new().on("dragend", |_| {})).unwrap();
        assert_eq!(engine.count(|c| matches!(c, Call::Off { .. })), 1);
        assert_eq!(engine.count(|c| matches!(c, Call::On { .. })), 2);

        marker.fire("click");
        assert_eq!(*clicks.borrow(), 1);

        println!("✅ [TEST] Marker event handler test passed");
    }

    /// A standalone popup opens at creation and reopens on a new position
    /// only while closed
    #[test]
    fn test_standalone_popup() {
        init_logging();
        println!("🧪 [TEST] Testing standalone popup");

        let engine = Engine::new();
        let mut root = Root::new(engine.clone());
        let map = slot();

        let render = |root: &mut Root, position: [f64; 2]| {
            root.render([london(&map)
                .child(Popup::new().position(position).child("Standalone"))
                .into()])
        };
        let opened = || engine.count(|c| matches!(c, Call::OpenOn { .. }));

        render(&mut root, [51.5, -0.09]).unwrap();
        assert_eq!(opened(), 1);
        render(&mut root, [51.5, -0.09]).unwrap();
        assert_eq!(opened(), 1);

        // Moving an open popup does not reopen it
        render(&mut root, [51.51, -0.09]).unwrap();
        assert_eq!(opened(), 1);

        let map = map.borrow().clone().unwrap();
        map.emit(Event::new("click", map.id()));
        assert!(map.open_popups().is_empty());

        render(&mut root, [51.52, -0.09]).unwrap();
        assert_eq!(opened(), 2);
        let popup = map.open_popups()[0].clone();
        assert_eq!(popup.position(), Some(LatLng::new(51.52, -0.09)));
        assert_eq!(popup.content().unwrap().text_content(), "Standalone");
        assert_eq!(engine.created(LayerType::Popup), 1);

        println!("✅ [TEST] Standalone popup test passed");
    }

    /// Popup children update in place inside the projection surface
    #[test]
    fn test_popup_content_updates_in_portal() {
        init_logging();
        println!("🧪 [TEST] Testing popup content updates");

        let engine = Engine::new();
        let mut root = Root::new(engine.clone());
        let marker = slot();

        for text in ["First", "Second"] {
            root.render([MapContainer::new([51.505, -0.09], 13.0)
                .child(
                    Marker::new([51.505, -0.09])
                        .child(marker_probe(&marker))
                        .child(Popup::new().child(Element::new("strong").child(text))),
                )
                .into()])
                .unwrap();
        }

        let marker = marker.borrow().clone().unwrap();
        let content = marker.popup().unwrap().content().unwrap();
        assert_eq!(content.text_content(), "Second");
        assert_eq!(engine.created(LayerType::Popup), 1);
        assert_eq!(engine.count(|c| matches!(c, Call::BindPopup { .. })), 1);

        // Popup content never lands in the main document
        assert!(!root.document().text_content().contains("Second"));

        println!("✅ [TEST] Popup content test passed");
    }

    /// A replaced child keeps its place among its siblings
    #[test]
    fn test_replaced_popup_child_keeps_order() {
        init_logging();
        println!("🧪 [TEST] Testing popup content order after replacement");

        let engine = Engine::new();
        let mut root = Root::new(engine.clone());
        let marker = slot();

        let first: Node = "A".into();
        let second: Node = Element::new("i").child("A").into();
        for content in [first, second] {
            root.render([MapContainer::new([51.505, -0.09], 13.0)
                .child(
                    Marker::new([51.505, -0.09])
                        .child(marker_probe(&marker))
                        .child(
                            Popup::new()
                                .child(content)
                                .child(Element::new("b").child("B")),
                        ),
                )
                .into()])
                .unwrap();
        }

        let marker = marker.borrow().clone().unwrap();
        let content = marker.popup().unwrap().content().unwrap();
        assert_eq!(content.text_content(), "AB");
        assert_eq!(content.children()[0].tag().as_deref(), Some("i"));
        assert_eq!(content.children()[1].tag().as_deref(), Some("b"));

        println!("✅ [TEST] Popup content order test passed");
    }

    /// A marker holds one popup, and the last one bound wins
    #[test]
    fn test_last_bound_popup_wins() {
        init_logging();
        println!("🧪 [TEST] Testing one popup per marker");

        let engine = Engine::new();
        let mut root = Root::new(engine.clone());
        let marker = slot();
        let unbinds = |engine: &Engine| engine.count(|c| matches!(c, Call::UnbindPopup { .. }));

        root.render([MapContainer::new([51.505, -0.09], 13.0)
            .child(
                Marker::new([51.505, -0.09])
                    .child(marker_probe(&marker))
                    .child(Popup::new().child("First"))
                    .child(Popup::new().child("Second")),
            )
            .into()])
            .unwrap();

        let marker = marker.borrow().clone().unwrap();
        let bound = marker.popup().unwrap();
        assert_eq!(bound.content().unwrap().text_content(), "Second");
        assert_eq!(engine.created(LayerType::Popup), 2);
        assert_eq!(unbinds(&engine), 1);

        // Dropping a popup child leaves the marker with the remaining one
        root.render([MapContainer::new([51.505, -0.09], 13.0)
            .child(
                Marker::new([51.505, -0.09])
                    .child(marker_probe(&slot()))
                    .child(Popup::new().child("Second")),
            )
            .into()])
            .unwrap();

        let rebound = marker.popup().expect("marker keeps a popup");
        assert_eq!(rebound.content().unwrap().text_content(), "Second");
        assert_eq!(rebound.source(), Some(marker.id()));
        assert_eq!(engine.destroyed(LayerType::Popup), 1);
        assert!(!rebound.is_removed());

        println!("✅ [TEST] One popup per marker test passed");
    }

    /// Unmounting a popup that lost its marker leaves the marker binding alone
    #[test]
    fn test_replaced_popup_does_not_unbind_marker() {
        init_logging();
        println!("🧪 [TEST] Testing popup unbind guard");

        let engine = Engine::new();
        let mut root = Root::new(engine.clone());
        let marker = slot();

        root.render([MapContainer::new([51.505, -0.09], 13.0)
            .child(
                Marker::new([51.505, -0.09])
                    .child(marker_probe(&marker))
                    .child(Popup::new().child("First"))
                    .child(Popup::new().child("Second")),
            )
            .into()])
            .unwrap();

        let marker = marker.borrow().clone().unwrap();
        let current = marker.popup().unwrap().id();
        engine.clear_journal();

        root.unmount();

        let unbound: Vec<HandleId> = engine
            .calls()
            .iter()
            .filter_map(|call| match call {
                Call::UnbindPopup { popup, .. } => Some(*popup),
                _ => None,
            })
            .collect();
        assert_eq!(unbound, vec![current]);
        assert_eq!(engine.destroyed(LayerType::Popup), 2);

        println!("✅ [TEST] Popup unbind guard test passed");
    }

    /// Changing GeoJSON data swaps the overlay for one with only the new features
    #[test]
    fn test_geojson_data_change() {
        init_logging();
        println!("🧪 [TEST] Testing GeoJSON data change");

        let engine = Engine::new();
        let mut root = Root::new(engine.clone());
        let map = slot();

        let first = GeoJson::collection(vec![
            GeoJsonFeature::point([-0.09, 51.505]).with_property("name", "London"),
            GeoJsonFeature::point([-0.1, 51.5]).with_property("name", "Westminster"),
        ]);
        let second: GeoJson = r#"{
            "type": "Feature",
            "properties": {"name": "Paris"},
            "geometry": {"type": "Point", "coordinates": [2.3522, 48.8566]}
        }"#
        .parse()
        .unwrap();

        let style = PathStyle::default().color("blue").weight(2.0);
        for data in [&first, &first, &second] {
            root.render([london(&map)
                .child(GeoJsonOverlay::new(data.clone()).style(style.clone()))
                .into()])
                .unwrap();
        }

        assert_eq!(engine.created(LayerType::Vector), 2);
        assert_eq!(engine.destroyed(LayerType::Vector), 1);

        let map = map.borrow().clone().unwrap();
        let live = map.layer_ids()[0];
        let calls = engine.calls_for(live);
        let tail = &calls[calls.len() - 2..];
        assert_eq!(
            tail,
            &[
                Call::ClearLayers { id: live },
                Call::AddData {
                    id: live,
                    features: 1
                }
            ]
        );
        assert_eq!(map.count_layers(LayerType::Vector), 1);

        println!("✅ [TEST] GeoJSON data change test passed");
    }

    /// GeoJSON callbacks shape the sub-layers
    #[test]
    fn test_geojson_callbacks() {
        init_logging();
        println!("🧪 [TEST] Testing GeoJSON callbacks");

        let engine = Engine::new();
        let mut root = Root::new(engine.clone());
        let names = Rc::new(RefCell::new(Vec::new()));
        let seen = names.clone();

        let data = GeoJson::collection(vec![
            GeoJsonFeature::point([-0.09, 51.505]).with_property("name", "London"),
            GeoJsonFeature::point([2.3522, 48.8566]).with_property("name", "Paris"),
        ]);
        root.render([MapContainer::new([51.505, -0.09], 5.0)
            .child(
                GeoJsonOverlay::new(data)
                    .filter(FilterFn::new(|feature| {
                        feature.property("name").and_then(|n| n.as_str()) == Some("London")
                    }))
                    .on_each_feature(OnEachFeatureFn::new(move |feature, layer| {
                        let name = feature.property("name").and_then(|n| n.as_str());
                        if let Some(name) = name {
                            seen.borrow_mut().push(name.to_string());
                            layer.bind_popup(name);
                        }
                    })),
            )
            .into()])
            .unwrap();

        assert_eq!(*names.borrow(), vec!["London".to_string()]);
        assert!(engine.calls().contains(&Call::AddData {
            id: engine
                .calls()
                .iter()
                .find_map(|c| match c {
                    Call::Create {
                        id,
                        layer_type: LayerType::Vector,
                    } => Some(*id),
                    _ => None,
                })
                .unwrap(),
            features: 1,
        }));

        println!("✅ [TEST] GeoJSON callback test passed");
    }

    /// Hooks fail outside a container
    #[test]
    fn test_context_missing() {
        init_logging();
        println!("🧪 [TEST] Testing use outside a container");

        let engine = Engine::new();
        let mut root = Root::new(engine.clone());

        let err = root.render([TileLayer::new(OSM_URL).into()]).unwrap_err();
        assert!(matches!(err, MapError::ContextMissing { hook: "use_map" }));
        assert_eq!(engine.created(LayerType::Tile), 0);

        let err = root
            .render([Component::new("NeedsMap", |scope| {
                use_map(scope)?;
                Ok(Vec::new())
            })
            .into()])
            .unwrap_err();
        assert_eq!(err.to_string(), "use_map must be used within a MapContainer");

        let err = root
            .render([MapProvider::new().child(Marker::new([0.0, 0.0])).into()])
            .unwrap_err();
        assert!(matches!(err, MapError::MapUnavailable));
        assert_eq!(engine.live_layers(), 0);

        println!("✅ [TEST] Context missing test passed");
    }

    /// A provider lets user code publish a map it built itself
    #[test]
    fn test_map_provider_publishes_external_map() {
        init_logging();
        println!("🧪 [TEST] Testing map provider");

        let engine = Engine::new();
        let mut root = Root::new(engine.clone());
        let external = engine
            .map(&DomNode::element("div"), MapOptions::new(LatLng::new(0.0, 0.0), 3.0))
            .unwrap();

        let publish = {
            let external = external.clone();
            Component::new("Publisher", move |scope| {
                let context = use_map_context(scope)?;
                if context.map().is_none() {
                    context.set_map(Some(external.clone()));
                }
                Ok(vec![TileLayer::new(OSM_URL).into()])
            })
        };

        root.render([MapProvider::new().child(publish).into()]).unwrap();
        assert_eq!(external.count_layers(LayerType::Tile), 1);

        root.unmount();
        assert_eq!(external.layer_count(), 0);
        assert!(!external.is_removed());

        println!("✅ [TEST] Map provider test passed");
    }
}
