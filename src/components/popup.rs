use crate::{
    components::{
        context::{use_map, use_marker, Scope},
        tree::{mount_children, reconcile_children, unmount_children, Instance},
        Node,
    },
    core::{
        constants::{DEFAULT_POPUP_MAX_WIDTH, DEFAULT_POPUP_MIN_WIDTH},
        geo::LatLng,
        map::MapHandle,
        options::{self, OptionBag, PopupOptions},
    },
    layers::{base::Layer, marker::MarkerHandle, popup::PopupHandle},
    ui::dom::DomNode,
    Result,
};

/// Popup with arbitrary child content.
///
/// Inside a [`Marker`](super::Marker) it binds to that marker and opens when
/// the marker is clicked. Elsewhere it needs a `position` and opens there.
/// Children render into a surface owned by the popup, not into the
/// surrounding DOM.
#[derive(Debug, Clone)]
pub struct Popup {
    pub position: Option<LatLng>,
    pub max_width: f64,
    pub min_width: f64,
    pub auto_close: bool,
    pub close_on_click: bool,
    pub class_name: Option<String>,
    /// Extra popup options, applied over the explicit fields above
    pub options: OptionBag,
    pub children: Vec<Node>,
}

impl Default for Popup {
    fn default() -> Self {
        Self {
            position: None,
            max_width: DEFAULT_POPUP_MAX_WIDTH,
            min_width: DEFAULT_POPUP_MIN_WIDTH,
            auto_close: true,
            close_on_click: true,
            class_name: None,
            options: OptionBag::new(),
            children: Vec::new(),
        }
    }
}

impl Popup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, position: impl Into<LatLng>) -> Self {
        self.position = Some(position.into());
        self
    }

    pub fn max_width(mut self, width: f64) -> Self {
        self.max_width = width;
        self
    }

    pub fn min_width(mut self, width: f64) -> Self {
        self.min_width = width;
        self
    }

    pub fn auto_close(mut self, auto_close: bool) -> Self {
        self.auto_close = auto_close;
        self
    }

    pub fn close_on_click(mut self, close_on_click: bool) -> Self {
        self.close_on_click = close_on_click;
        self
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
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

    fn popup_options(&self) -> Result<PopupOptions> {
        let base = PopupOptions {
            max_width: self.max_width,
            min_width: self.min_width,
            auto_close: self.auto_close,
            close_on_click: self.close_on_click,
            class_name: self.class_name.clone(),
            extra: OptionBag::new(),
        };
        options::merge(&base, &self.options, &[])
    }
}

pub(crate) struct PopupInstance {
    map: MapHandle,
    marker: Option<MarkerHandle>,
    popup: Option<PopupHandle>,
    /// Projection surface handed to the popup as its content
    surface: DomNode,
    position: Option<LatLng>,
    children: Vec<Instance>,
}

impl PopupInstance {
    pub(crate) fn mount(props: Popup, scope: &Scope) -> Result<Self> {
        let map = use_map(scope)?;
        let marker = use_marker(scope);
        let options = props.popup_options()?;

        let surface = DomNode::element("div");
        let popup = map.engine().popup(options);
        popup.set_content(&surface);
        log::debug!("created popup {}", popup.id());

        let mut instance = Self {
            map: map.clone(),
            marker: marker.clone(),
            popup: Some(popup.clone()),
            surface,
            position: props.position,
            children: Vec::new(),
        };

        let opened = match (&marker, props.position) {
            (Some(marker), _) => {
                marker.bind_popup(&popup);
                Ok(())
            }
            (None, Some(position)) => popup.set_lat_lng(position).open_on(&map),
            (None, None) => Ok(()),
        };
        if let Err(err) = opened {
            instance.unmount();
            return Err(err);
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

    pub(crate) fn update(&mut self, props: Popup, scope: &Scope) -> Result<()> {
        let map = use_map(scope)?;
        let marker = use_marker(scope);
        let popup = match &self.popup {
            Some(popup) if map == self.map && marker == self.marker => popup.clone(),
            _ => {
                self.unmount();
                *self = Self::mount(props, scope)?;
                return Ok(());
            }
        };

        if self.marker.is_none() && props.position != self.position {
            if let Some(position) = props.position {
                popup.set_lat_lng(position);
                if !popup.is_open() {
                    popup.open_on(&map)?;
                }
            }
            self.position = props.position;
        }

        let child_scope = self.child_scope(scope);
        reconcile_children(&mut self.children, props.children, &child_scope)
    }

    pub(crate) fn unmount(&mut self) {
        unmount_children(&mut self.children);
        let Some(popup) = self.popup.take() else {
            return;
        };
        if let Some(marker) = &self.marker {
            // A later popup may have taken the marker over already
            if marker.popup().as_ref() == Some(&popup) {
                marker.unbind_popup();
            }
        }
        log::debug!("removing popup {}", popup.id());
        popup.remove();
        self.surface.detach();
    }

    /// The popup handle while it belongs to a marker
    pub(crate) fn bound_popup(&self) -> Option<PopupHandle> {
        self.marker.as_ref().and(self.popup.clone())
    }

    /// Children render into the projection surface
    fn child_scope(&self, scope: &Scope) -> Scope {
        scope.with_surface(self.surface.clone())
    }
}
