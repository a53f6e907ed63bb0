use std::rc::Rc;

use crate::{
    components::{
        context::{MapContext, Scope},
        tree::{mount_children, reconcile_children, unmount_children, Instance},
        Node,
    },
    core::{
        callback::Callback,
        geo::LatLng,
        map::MapHandle,
        options::{self, MapOptions, OptionBag},
    },
    ui::dom::DomNode,
    Result,
};

/// Called once with the new map, before any child mounts
pub type ReadyFn = Callback<dyn Fn(&MapHandle)>;

impl Callback<dyn Fn(&MapHandle)> {
    pub fn new(f: impl Fn(&MapHandle) + 'static) -> Self {
        Self::from_rc(Rc::new(f))
    }
}

const DEFAULT_STYLE: [(&str, &str); 2] = [("height", "100%"), ("width", "100%")];

/// Root of a map subtree: creates the map, publishes it to descendants and
/// removes it on unmount.
///
/// `center` and `zoom` are the initial view; changing them later moves the
/// existing map. Other options only apply when the map is created.
#[derive(Debug, Clone)]
pub struct MapContainer {
    pub center: LatLng,
    pub zoom: f64,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub scroll_wheel_zoom: bool,
    pub dragging: bool,
    pub double_click_zoom: bool,
    pub zoom_control: bool,
    /// CSS declarations layered over `height: 100%; width: 100%`
    pub style: Vec<(String, String)>,
    pub class_name: Option<String>,
    pub when_ready: Option<ReadyFn>,
    /// Extra map options; `center` and `zoom` are ignored here
    pub options: OptionBag,
    pub children: Vec<Node>,
}

impl MapContainer {
    pub fn new(center: impl Into<LatLng>, zoom: f64) -> Self {
        Self {
            center: center.into(),
            zoom,
            min_zoom: None,
            max_zoom: None,
            scroll_wheel_zoom: true,
            dragging: true,
            double_click_zoom: true,
            zoom_control: true,
            style: Vec::new(),
            class_name: None,
            when_ready: None,
            options: OptionBag::new(),
            children: Vec::new(),
        }
    }

    pub fn min_zoom(mut self, zoom: f64) -> Self {
        self.min_zoom = Some(zoom);
        self
    }

    pub fn max_zoom(mut self, zoom: f64) -> Self {
        self.max_zoom = Some(zoom);
        self
    }

    pub fn scroll_wheel_zoom(mut self, enabled: bool) -> Self {
        self.scroll_wheel_zoom = enabled;
        self
    }

    pub fn dragging(mut self, enabled: bool) -> Self {
        self.dragging = enabled;
        self
    }

    pub fn double_click_zoom(mut self, enabled: bool) -> Self {
        self.double_click_zoom = enabled;
        self
    }

    pub fn zoom_control(mut self, enabled: bool) -> Self {
        self.zoom_control = enabled;
        self
    }

    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.push((property.into(), value.into()));
        self
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn when_ready(mut self, f: impl Fn(&MapHandle) + 'static) -> Self {
        self.when_ready = Some(ReadyFn::new(f));
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.into(), value.into());
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

    fn map_options(&self) -> Result<MapOptions> {
        let base = MapOptions {
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            scroll_wheel_zoom: self.scroll_wheel_zoom,
            dragging: self.dragging,
            double_click_zoom: self.double_click_zoom,
            zoom_control: self.zoom_control,
            ..MapOptions::new(self.center, self.zoom)
        };
        options::merge(&base, &self.options, MapOptions::RESERVED)
    }

    /// Inline style with user declarations replacing the defaults in place
    fn style_attribute(&self) -> String {
        let mut declarations: Vec<(String, String)> = DEFAULT_STYLE
            .iter()
            .map(|(property, value)| (property.to_string(), value.to_string()))
            .collect();
        for (property, value) in &self.style {
            match declarations.iter_mut().find(|(p, _)| p == property) {
                Some(existing) => existing.1 = value.clone(),
                None => declarations.push((property.clone(), value.clone())),
            }
        }
        declarations
            .iter()
            .map(|(property, value)| format!("{}: {}", property, value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn apply_to(&self, surface: &DomNode) {
        surface.set_attribute("style", self.style_attribute());
        match &self.class_name {
            Some(class_name) => surface.set_attribute("class", class_name.clone()),
            None => surface.remove_attribute("class"),
        }
    }
}

pub(crate) struct ContainerInstance {
    surface: DomNode,
    context: MapContext,
    map: Option<MapHandle>,
    center: LatLng,
    zoom: f64,
    /// Children are only mounted once the map is published
    ready: bool,
    children: Vec<Instance>,
}

impl ContainerInstance {
    pub(crate) fn mount(props: MapContainer, scope: &Scope) -> Result<Self> {
        let surface = DomNode::element("div");
        props.apply_to(&surface);
        scope.surface().append_child(&surface);

        let created = props
            .map_options()
            .and_then(|options| scope.engine().map(&surface, options));
        let map = match created {
            Ok(map) => map,
            Err(err) => {
                surface.detach();
                return Err(err);
            }
        };
        log::debug!("created map {} at {:?} zoom {}", map.id(), props.center, props.zoom);

        let context = MapContext::new();
        context.set_map(Some(map.clone()));
        let mut instance = Self {
            surface,
            context,
            map: Some(map.clone()),
            center: props.center,
            zoom: props.zoom,
            ready: true,
            children: Vec::new(),
        };

        if let Some(when_ready) = &props.when_ready {
            when_ready(&map);
        }

        let child_scope = instance.child_scope(scope);
        match mount_children(props.children, &child_scope) {
            Ok(children) => {
                instance.children = children;
                Ok(instance)
            }
            Err(err) => {
                instance.unmount();
                Err(err)
            }
        }
    }

    pub(crate) fn update(&mut self, props: MapContainer, scope: &Scope) -> Result<()> {
        props.apply_to(&self.surface);

        if let Some(map) = &self.map {
            if props.center != self.center || props.zoom != self.zoom {
                map.set_view(props.center, props.zoom)?;
                self.center = props.center;
                self.zoom = props.zoom;
            }
        }

        if !self.ready {
            return Ok(());
        }
        let child_scope = self.child_scope(scope);
        reconcile_children(&mut self.children, props.children, &child_scope)
    }

    pub(crate) fn unmount(&mut self) {
        unmount_children(&mut self.children);
        if let Some(map) = self.map.take() {
            log::debug!("removing map {}", map.id());
            map.remove();
        }
        self.context.set_map(None);
        self.ready = false;
        self.surface.detach();
    }

    pub(crate) fn surface(&self) -> &DomNode {
        &self.surface
    }

    fn child_scope(&self, scope: &Scope) -> Scope {
        scope.with_map(self.context.clone(), self.surface.clone())
    }
}
