pub mod events;

pub use events::{Event, EventHandlers, Evented, Handler, Subscription};
