//! Mounting, diffing and teardown of component trees.
//!
//! Children are matched by position: a node of the same kind at the same
//! index updates the mounted instance, anything else replaces it. After a
//! diff the children's DOM is put back in tree order, so a replacement lands
//! where the node it replaced was.
//! Teardown runs children first, last child first, so layers leave the map
//! before the map goes away and a popup lets go of its marker before the
//! marker is removed.

use std::collections::VecDeque;

use crate::{
    components::{
        container::ContainerInstance,
        context::{MapContext, Scope},
        events::MapEventsInstance,
        geojson::GeoJsonInstance,
        marker::MarkerInstance,
        popup::PopupInstance,
        tile_layer::TileLayerInstance,
        Component, Element, MapProvider, Node,
    },
    core::engine::Engine,
    layers::popup::PopupHandle,
    ui::dom::DomNode,
    Result,
};

pub(crate) enum Instance {
    Container(ContainerInstance),
    Provider(ProviderInstance),
    TileLayer(TileLayerInstance),
    Marker(MarkerInstance),
    Popup(PopupInstance),
    GeoJson(GeoJsonInstance),
    MapEvents(MapEventsInstance),
    Element(ElementInstance),
    Text(TextInstance),
    Component(ComponentInstance),
}

impl Instance {
    pub(crate) fn mount(node: Node, scope: &Scope) -> Result<Self> {
        log::trace!("mounting {}", node.kind());
        Ok(match node {
            Node::MapContainer(props) => Instance::Container(ContainerInstance::mount(props, scope)?),
            Node::MapProvider(props) => Instance::Provider(ProviderInstance::mount(props, scope)?),
            Node::TileLayer(props) => Instance::TileLayer(TileLayerInstance::mount(props, scope)?),
            Node::Marker(props) => Instance::Marker(MarkerInstance::mount(props, scope)?),
            Node::Popup(props) => Instance::Popup(PopupInstance::mount(props, scope)?),
            Node::GeoJsonOverlay(props) => Instance::GeoJson(GeoJsonInstance::mount(props, scope)?),
            Node::MapEvents(props) => Instance::MapEvents(MapEventsInstance::mount(props, scope)?),
            Node::Element(props) => Instance::Element(ElementInstance::mount(props, scope)?),
            Node::Text(content) => Instance::Text(TextInstance::mount(content, scope)),
            Node::Component(props) => Instance::Component(ComponentInstance::mount(props, scope)?),
        })
    }

    /// Whether `node` can be applied to this instance as an update
    fn accepts(&self, node: &Node) -> bool {
        match (self, node) {
            (Instance::Container(_), Node::MapContainer(_))
            | (Instance::Provider(_), Node::MapProvider(_))
            | (Instance::TileLayer(_), Node::TileLayer(_))
            | (Instance::Marker(_), Node::Marker(_))
            | (Instance::Popup(_), Node::Popup(_))
            | (Instance::GeoJson(_), Node::GeoJsonOverlay(_))
            | (Instance::MapEvents(_), Node::MapEvents(_))
            | (Instance::Text(_), Node::Text(_)) => true,
            (Instance::Element(instance), Node::Element(props)) => instance.tag == props.tag,
            (Instance::Component(instance), Node::Component(props)) => instance.name == props.name,
            _ => false,
        }
    }

    fn update(&mut self, node: Node, scope: &Scope) -> Result<()> {
        match (self, node) {
            (Instance::Container(instance), Node::MapContainer(props)) => instance.update(props, scope),
            (Instance::Provider(instance), Node::MapProvider(props)) => instance.update(props, scope),
            (Instance::TileLayer(instance), Node::TileLayer(props)) => instance.update(props, scope),
            (Instance::Marker(instance), Node::Marker(props)) => instance.update(props, scope),
            (Instance::Popup(instance), Node::Popup(props)) => instance.update(props, scope),
            (Instance::GeoJson(instance), Node::GeoJsonOverlay(props)) => instance.update(props, scope),
            (Instance::MapEvents(instance), Node::MapEvents(props)) => instance.update(props, scope),
            (Instance::Element(instance), Node::Element(props)) => instance.update(props, scope),
            (Instance::Text(instance), Node::Text(content)) => {
                instance.update(content);
                Ok(())
            }
            (Instance::Component(instance), Node::Component(props)) => instance.update(props, scope),
            (instance, node) => {
                // Kind changed: replace the instance
                let mut stale = std::mem::replace(instance, Instance::Text(TextInstance::detached()));
                stale.unmount();
                *instance = Instance::mount(node, scope)?;
                Ok(())
            }
        }
    }

    /// DOM nodes this instance places directly in its parent surface
    fn dom_nodes(&self) -> Vec<DomNode> {
        match self {
            Instance::Container(instance) => vec![instance.surface().clone()],
            Instance::Element(instance) => vec![instance.node.clone()],
            Instance::Text(instance) => vec![instance.node.clone()],
            Instance::Provider(instance) => instance.children.iter().flat_map(Instance::dom_nodes).collect(),
            Instance::Component(instance) => instance.children.iter().flat_map(Instance::dom_nodes).collect(),
            Instance::Marker(instance) => instance.children().iter().flat_map(Instance::dom_nodes).collect(),
            Instance::TileLayer(_) | Instance::Popup(_) | Instance::GeoJson(_) | Instance::MapEvents(_) => {
                Vec::new()
            }
        }
    }

    /// Popups in this subtree bound to the enclosing marker, in tree order
    pub(crate) fn bound_popups(&self) -> Vec<PopupHandle> {
        match self {
            Instance::Popup(instance) => instance.bound_popup().into_iter().collect(),
            Instance::Element(instance) => instance.children.iter().flat_map(Instance::bound_popups).collect(),
            Instance::Component(instance) => instance.children.iter().flat_map(Instance::bound_popups).collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn unmount(&mut self) {
        match self {
            Instance::Container(instance) => instance.unmount(),
            Instance::Provider(instance) => instance.unmount(),
            Instance::TileLayer(instance) => instance.unmount(),
            Instance::Marker(instance) => instance.unmount(),
            Instance::Popup(instance) => instance.unmount(),
            Instance::GeoJson(instance) => instance.unmount(),
            Instance::MapEvents(instance) => instance.unmount(),
            Instance::Element(instance) => instance.unmount(),
            Instance::Text(instance) => instance.unmount(),
            Instance::Component(instance) => instance.unmount(),
        }
    }
}

/// Mounts `nodes` in order. If one fails, the siblings mounted before it are
/// torn down again and the error is returned.
pub(crate) fn mount_children(nodes: Vec<Node>, scope: &Scope) -> Result<Vec<Instance>> {
    let mut children = Vec::with_capacity(nodes.len());
    for node in nodes {
        match Instance::mount(node, scope) {
            Ok(child) => children.push(child),
            Err(err) => {
                unmount_children(&mut children);
                return Err(err);
            }
        }
    }
    Ok(children)
}

/// Brings `children` in line with `nodes`.
///
/// On error, children not yet reached are unmounted; the ones already
/// reconciled stay mounted for the owner to tear down.
pub(crate) fn reconcile_children(
    children: &mut Vec<Instance>,
    nodes: Vec<Node>,
    scope: &Scope,
) -> Result<()> {
    let mut previous: VecDeque<Instance> = std::mem::take(children).into();

    for node in nodes {
        let step = match previous.pop_front() {
            Some(mut child) if child.accepts(&node) => {
                let updated = child.update(node, scope);
                children.push(child);
                updated
            }
            Some(mut stale) => {
                stale.unmount();
                Instance::mount(node, scope).map(|child| children.push(child))
            }
            None => Instance::mount(node, scope).map(|child| children.push(child)),
        };
        if let Err(err) = step {
            unmount_remaining(previous);
            return Err(err);
        }
    }

    unmount_remaining(previous);
    order_dom(children, scope.surface());
    Ok(())
}

/// Moves the children's DOM nodes under `surface` into tree order. The last
/// node stays put and every earlier one is placed right before its successor.
fn order_dom(children: &[Instance], surface: &DomNode) {
    let nodes: Vec<DomNode> = children.iter().flat_map(Instance::dom_nodes).collect();
    let mut anchor: Option<DomNode> = None;
    for node in nodes.into_iter().rev() {
        if let Some(next) = &anchor {
            if node.next_sibling().as_ref() != Some(next) {
                surface.insert_before(&node, next);
            }
        }
        anchor = Some(node);
    }
}

/// Unmounts every child, last first
pub(crate) fn unmount_children(children: &mut Vec<Instance>) {
    while let Some(mut child) = children.pop() {
        child.unmount();
    }
}

fn unmount_remaining(remaining: VecDeque<Instance>) {
    let mut remaining: Vec<Instance> = remaining.into();
    unmount_children(&mut remaining);
}

pub(crate) struct ProviderInstance {
    context: MapContext,
    children: Vec<Instance>,
}

impl ProviderInstance {
    fn mount(props: MapProvider, scope: &Scope) -> Result<Self> {
        let context = MapContext::new();
        let children = mount_children(props.children, &Self::child_scope(&context, scope))?;
        Ok(Self { context, children })
    }

    fn update(&mut self, props: MapProvider, scope: &Scope) -> Result<()> {
        let child_scope = Self::child_scope(&self.context, scope);
        reconcile_children(&mut self.children, props.children, &child_scope)
    }

    fn unmount(&mut self) {
        unmount_children(&mut self.children);
        self.context.set_map(None);
    }

    fn child_scope(context: &MapContext, scope: &Scope) -> Scope {
        scope.with_map(context.clone(), scope.surface().clone())
    }
}

pub(crate) struct ElementInstance {
    tag: String,
    node: DomNode,
    attributes: Vec<(String, String)>,
    children: Vec<Instance>,
}

impl ElementInstance {
    fn mount(props: Element, scope: &Scope) -> Result<Self> {
        let node = DomNode::element(props.tag.clone());
        for (name, value) in &props.attributes {
            node.set_attribute(name, value.clone());
        }
        scope.surface().append_child(&node);

        match mount_children(props.children, &scope.with_surface(node.clone())) {
            Ok(children) => Ok(Self {
                tag: props.tag,
                node,
                attributes: props.attributes,
                children,
            }),
            Err(err) => {
                node.detach();
                Err(err)
            }
        }
    }

    fn update(&mut self, props: Element, scope: &Scope) -> Result<()> {
        for (name, _) in &self.attributes {
            if !props.attributes.iter().any(|(n, _)| n == name) {
                self.node.remove_attribute(name);
            }
        }
        for (name, value) in &props.attributes {
            if self.node.attribute(name).as_ref() != Some(value) {
                self.node.set_attribute(name, value.clone());
            }
        }
        self.attributes = props.attributes;

        let child_scope = scope.with_surface(self.node.clone());
        reconcile_children(&mut self.children, props.children, &child_scope)
    }

    fn unmount(&mut self) {
        unmount_children(&mut self.children);
        self.node.detach();
    }
}

pub(crate) struct TextInstance {
    node: DomNode,
    content: String,
}

impl TextInstance {
    fn mount(content: String, scope: &Scope) -> Self {
        let node = DomNode::text(content.clone());
        scope.surface().append_child(&node);
        Self { node, content }
    }

    /// Placeholder that owns nothing
    fn detached() -> Self {
        Self {
            node: DomNode::text(""),
            content: String::new(),
        }
    }

    fn update(&mut self, content: String) {
        if content != self.content {
            self.node.set_text(content.clone());
            self.content = content;
        }
    }

    fn unmount(&mut self) {
        self.node.detach();
    }
}

pub(crate) struct ComponentInstance {
    name: String,
    children: Vec<Instance>,
}

impl ComponentInstance {
    fn mount(props: Component, scope: &Scope) -> Result<Self> {
        let nodes = (props.render)(scope)?;
        Ok(Self {
            name: props.name,
            children: mount_children(nodes, scope)?,
        })
    }

    fn update(&mut self, props: Component, scope: &Scope) -> Result<()> {
        let nodes = (props.render)(scope)?;
        reconcile_children(&mut self.children, nodes, scope)
    }

    fn unmount(&mut self) {
        unmount_children(&mut self.children);
    }
}

/// Owner of a mounted tree.
///
/// The first [`render`](Root::render) mounts, later ones diff against what
/// is mounted. Dropping the root unmounts everything.
pub struct Root {
    engine: Engine,
    document: DomNode,
    mounted: Vec<Instance>,
}

impl Root {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            document: DomNode::element("body"),
            mounted: Vec::new(),
        }
    }

    pub fn render(&mut self, nodes: impl IntoIterator<Item = Node>) -> Result<()> {
        let scope = Scope::new(self.engine.clone(), self.document.clone());
        let nodes: Vec<Node> = nodes.into_iter().collect();
        log::debug!("rendering {} top-level nodes", nodes.len());
        reconcile_children(&mut self.mounted, nodes, &scope)
    }

    /// Tears the whole tree down. Rendering again mounts from scratch.
    pub fn unmount(&mut self) {
        if !self.mounted.is_empty() {
            log::debug!("unmounting {} top-level nodes", self.mounted.len());
        }
        unmount_children(&mut self.mounted);
    }

    pub fn is_mounted(&self) -> bool {
        !self.mounted.is_empty()
    }

    /// Element the tree renders into
    pub fn document(&self) -> &DomNode {
        &self.document
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl Drop for Root {
    fn drop(&mut self) {
        self.unmount();
    }
}
