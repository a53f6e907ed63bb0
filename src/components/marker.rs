use crate::{
    components::{
        attach_layer,
        context::{use_map, MarkerContext, Scope},
        tree::{mount_children, reconcile_children, unmount_children, Instance},
        Node,
    },
    core::{
        constants::DEFAULT_MARKER_ALT,
        geo::LatLng,
        map::MapHandle,
        options::{self, MarkerOptions, OptionBag},
    },
    input::events::{EventHandlers, Subscription},
    layers::{base::Layer, marker::MarkerHandle},
    Result,
};

/// Point marker. Position, dragging, opacity and listeners are patched on
/// the existing marker; a nested [`Popup`](super::Popup) binds to it.
#[derive(Debug, Clone)]
pub struct Marker {
    pub position: LatLng,
    pub draggable: bool,
    pub opacity: Option<f64>,
    pub alt: Option<String>,
    /// Rebound whenever a different handler set is passed
    pub event_handlers: Option<EventHandlers>,
    /// Extra marker options, applied over `alt`. `draggable` and `opacity`
    /// are ignored here.
    pub options: OptionBag,
    pub children: Vec<Node>,
}

impl Marker {
    pub fn new(position: impl Into<LatLng>) -> Self {
        Self {
            position: position.into(),
            draggable: false,
            opacity: None,
            alt: None,
            event_handlers: None,
            options: OptionBag::new(),
            children: Vec::new(),
        }
    }

    pub fn draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn event_handlers(mut self, handlers: EventHandlers) -> Self {
        self.event_handlers = Some(handlers);
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

    fn marker_options(&self) -> Result<MarkerOptions> {
        let base = MarkerOptions {
            draggable: self.draggable,
            opacity: self.opacity,
            alt: self
                .alt
                .clone()
                .unwrap_or_else(|| DEFAULT_MARKER_ALT.to_string()),
            ..Default::default()
        };
        options::merge(&base, &self.options, MarkerOptions::RESERVED)
    }
}

pub(crate) struct MarkerInstance {
    map: MapHandle,
    marker: Option<MarkerHandle>,
    context: MarkerContext,
    position: LatLng,
    draggable: bool,
    opacity: Option<f64>,
    subscription: Option<Subscription<MarkerHandle>>,
    children: Vec<Instance>,
}

impl MarkerInstance {
    pub(crate) fn mount(props: Marker, scope: &Scope) -> Result<Self> {
        let map = use_map(scope)?;
        let options = props.marker_options()?;
        let marker = attach_layer(map.engine().marker(props.position, options), &map)?;

        let context = MarkerContext::new();
        context.set(Some(marker.clone()));
        let subscription = props
            .event_handlers
            .map(|handlers| Subscription::attach(marker.clone(), handlers));

        let mut instance = Self {
            map,
            marker: Some(marker),
            context,
            position: props.position,
            draggable: props.draggable,
            opacity: props.opacity,
            subscription,
            children: Vec::new(),
        };

        let child_scope = scope.with_marker(instance.context.clone());
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

    pub(crate) fn update(&mut self, props: Marker, scope: &Scope) -> Result<()> {
        let map = use_map(scope)?;
        let marker = match &self.marker {
            Some(marker) if map == self.map => marker.clone(),
            _ => {
                self.unmount();
                *self = Self::mount(props, scope)?;
                return Ok(());
            }
        };

        if props.position != self.position {
            marker.set_lat_lng(props.position);
            self.position = props.position;
        }

        if props.draggable != self.draggable {
            if props.draggable {
                marker.enable_dragging();
            } else {
                marker.disable_dragging();
            }
            self.draggable = props.draggable;
        }

        if props.opacity != self.opacity {
            if let Some(opacity) = props.opacity {
                marker.set_opacity(opacity);
            }
            self.opacity = props.opacity;
        }

        let current = self.subscription.as_ref().map(|s| s.handlers().clone());
        if props.event_handlers != current {
            // Old listeners come off before the new set goes on
            self.subscription = None;
            self.subscription = props
                .event_handlers
                .map(|handlers| Subscription::attach(marker.clone(), handlers));
        }

        let child_scope = scope.with_marker(self.context.clone());
        reconcile_children(&mut self.children, props.children, &child_scope)?;

        // The bound popup went away; the last remaining one takes over
        if marker.popup().is_none() {
            let remaining = self.children.iter().flat_map(Instance::bound_popups).last();
            if let Some(popup) = remaining {
                marker.bind_popup(&popup);
            }
        }
        Ok(())
    }

    pub(crate) fn children(&self) -> &[Instance] {
        &self.children
    }

    pub(crate) fn unmount(&mut self) {
        unmount_children(&mut self.children);
        self.subscription = None;
        if let Some(marker) = self.marker.take() {
            log::debug!("removing marker {}", marker.id());
            marker.remove();
        }
        self.context.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_options_default_alt() {
        let options = Marker::new([51.505, -0.09]).marker_options().unwrap();
        assert_eq!(options.alt, "Marker");

        let options = Marker::new([51.505, -0.09])
            .opacity(0.5)
            .alt("Pin")
            .option("alt", "Custom")
            .option("opacity", 0.1)
            .option("riseOnHover", true)
            .marker_options()
            .unwrap();

        assert_eq!(options.alt, "Custom");
        assert_eq!(options.opacity, Some(0.5));
        assert!(options.extra.contains_key("riseOnHover"));
    }
}
