//! Declarative components over the engine.
//!
//! A render produces a tree of [`Node`]s; [`Root`](tree::Root) mounts it,
//! diffs later renders against what is mounted and drives the engine
//! handles behind each component.

pub mod container;
pub mod context;
pub mod events;
pub mod geojson;
pub mod marker;
pub mod popup;
pub mod tile_layer;
pub mod tree;

use std::rc::Rc;

pub use container::{MapContainer, ReadyFn};
pub use context::{MapContext, MarkerContext, Scope};
pub use events::MapEvents;
pub use geojson::GeoJsonOverlay;
pub use marker::Marker;
pub use popup::Popup;
pub use tile_layer::TileLayer;

use crate::{
    core::{callback::Callback, map::MapHandle},
    layers::base::Layer,
    Result,
};

/// One element of a rendered tree
#[derive(Debug, Clone)]
pub enum Node {
    MapContainer(MapContainer),
    MapProvider(MapProvider),
    TileLayer(TileLayer),
    Marker(Marker),
    Popup(Popup),
    GeoJsonOverlay(GeoJsonOverlay),
    MapEvents(MapEvents),
    Element(Element),
    Text(String),
    Component(Component),
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(content.into())
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Node::MapContainer(_) => "MapContainer",
            Node::MapProvider(_) => "MapProvider",
            Node::TileLayer(_) => "TileLayer",
            Node::Marker(_) => "Marker",
            Node::Popup(_) => "Popup",
            Node::GeoJsonOverlay(_) => "GeoJsonOverlay",
            Node::MapEvents(_) => "MapEvents",
            Node::Element(_) => "Element",
            Node::Text(_) => "Text",
            Node::Component(_) => "Component",
        }
    }
}

macro_rules! impl_into_node {
    ($($props:ident),* $(,)?) => {
        $(
            impl From<$props> for Node {
                fn from(props: $props) -> Self {
                    Node::$props(props)
                }
            }
        )*
    };
}

impl_into_node!(
    MapContainer,
    MapProvider,
    TileLayer,
    Marker,
    Popup,
    GeoJsonOverlay,
    MapEvents,
    Element,
    Component,
);

impl From<&str> for Node {
    fn from(content: &str) -> Self {
        Node::Text(content.to_string())
    }
}

impl From<String> for Node {
    fn from(content: String) -> Self {
        Node::Text(content)
    }
}

/// Plain DOM element
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Render function of a [`Component`]
pub type RenderFn = Callback<dyn Fn(&Scope) -> Result<Vec<Node>>>;

impl Callback<dyn Fn(&Scope) -> Result<Vec<Node>>> {
    pub fn new(f: impl Fn(&Scope) -> Result<Vec<Node>> + 'static) -> Self {
        Self::from_rc(Rc::new(f))
    }
}

/// User component, rendered again on every render of its parent.
///
/// The render function receives the component's [`Scope`], which is where
/// hooks such as [`use_map`](context::use_map) read from. Components are
/// matched by name when diffing.
#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    pub render: RenderFn,
}

impl Component {
    pub fn new(
        name: impl Into<String>,
        render: impl Fn(&Scope) -> Result<Vec<Node>> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            render: RenderFn::new(render),
        }
    }
}

/// Opens an empty map context for its children without creating a map.
///
/// Descendants can publish a map they built themselves through
/// [`MapContext::set_map`].
#[derive(Debug, Clone, Default)]
pub struct MapProvider {
    pub children: Vec<Node>,
}

impl MapProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }
}

/// Adds `layer` to `map`, removing it again if that fails
pub(crate) fn attach_layer<L: Layer>(layer: L, map: &MapHandle) -> Result<L> {
    if let Err(err) = layer.add_to(map) {
        layer.remove();
        return Err(err);
    }
    log::debug!("{} layer {} added to map {}", layer.layer_type(), layer.id(), map.id());
    Ok(layer)
}
