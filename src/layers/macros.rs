//! Macros to reduce boilerplate in layer handle implementations
//!
//! Layer handles share one shape: an `engine` field and an
//! `inner: Rc<RefCell<State>>` whose state has a `base: LayerState` field.

/// Implements the lifecycle half of [`Layer`](crate::layers::base::Layer):
/// `id`, `layer_type`, `add_to`, `remove`, `is_removed` and `map`.
///
/// Usage:
/// ```ignore
/// impl Layer for MyHandle {
///     impl_layer_lifecycle!();
///     fn options(&self) -> serde_json::Value { ... }
/// }
/// ```
#[macro_export]
macro_rules! impl_layer_lifecycle {
    () => {
        fn id(&self) -> $crate::core::engine::HandleId {
            self.inner.borrow().base.id
        }

        fn layer_type(&self) -> $crate::layers::base::LayerType {
            self.inner.borrow().base.layer_type
        }

        fn add_to(&self, map: &$crate::core::map::MapHandle) -> $crate::Result<()> {
            let id = {
                let mut state = self.inner.borrow_mut();
                state.base.attach(map)?;
                state.base.id
            };
            self.engine.record($crate::core::engine::Call::AddTo { id, map: map.id() });
            Ok(())
        }

        fn remove(&self) {
            self.inner.borrow_mut().base.destroy(&self.engine);
        }

        fn is_removed(&self) -> bool {
            self.inner.borrow().base.removed
        }

        fn map(&self) -> Option<$crate::core::map::MapHandle> {
            self.inner.borrow().base.map.clone()
        }
    };
}

/// Implements [`Evented`](crate::input::events::Evented) on top of the
/// listeners kept in `base`.
#[macro_export]
macro_rules! impl_evented {
    ($handle:ty) => {
        impl $crate::input::events::Evented for $handle {
            fn on(&self, name: &str, handler: $crate::input::events::Handler) {
                self.inner.borrow_mut().base.on(&self.engine, name, handler);
            }

            fn off(&self, name: &str, handler: &$crate::input::events::Handler) {
                self.inner.borrow_mut().base.off(&self.engine, name, handler);
            }

            fn fire(&self, name: &str) {
                let (handlers, event) = {
                    let state = self.inner.borrow();
                    (state.base.listeners.matching(name), state.base.event(name))
                };
                $crate::layers::base::dispatch(handlers, &event);
            }
        }
    };
}

/// Identity comparison and `Debug` for a layer handle
#[macro_export]
macro_rules! impl_handle_identity {
    ($handle:ty) => {
        impl PartialEq for $handle {
            fn eq(&self, other: &Self) -> bool {
                std::rc::Rc::ptr_eq(&self.inner, &other.inner)
            }
        }

        impl std::fmt::Debug for $handle {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let state = self.inner.borrow();
                f.debug_struct(stringify!($handle))
                    .field("id", &state.base.id)
                    .field("removed", &state.base.removed)
                    .finish()
            }
        }
    };
}
