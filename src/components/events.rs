use crate::{
    components::context::{use_map, use_map_events, Scope},
    core::map::MapHandle,
    input::events::{EventHandlers, Subscription},
    Result,
};

/// Declarative form of [`use_map_events`]: keeps `handlers` attached to the
/// enclosing map while mounted.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEvents {
    pub handlers: EventHandlers,
}

impl MapEvents {
    pub fn new(handlers: EventHandlers) -> Self {
        Self { handlers }
    }
}

pub(crate) struct MapEventsInstance {
    map: MapHandle,
    subscription: Option<Subscription<MapHandle>>,
}

impl MapEventsInstance {
    pub(crate) fn mount(props: MapEvents, scope: &Scope) -> Result<Self> {
        let subscription = use_map_events(scope, props.handlers)?;
        Ok(Self {
            map: subscription.target().clone(),
            subscription: Some(subscription),
        })
    }

    pub(crate) fn update(&mut self, props: MapEvents, scope: &Scope) -> Result<()> {
        let map = use_map(scope)?;
        let unchanged = self
            .subscription
            .as_ref()
            .map(|s| map == self.map && *s.handlers() == props.handlers)
            .unwrap_or(false);
        if unchanged {
            return Ok(());
        }

        self.unmount();
        let subscription = use_map_events(scope, props.handlers)?;
        self.map = map;
        self.subscription = Some(subscription);
        Ok(())
    }

    pub(crate) fn unmount(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.detach();
        }
    }
}
