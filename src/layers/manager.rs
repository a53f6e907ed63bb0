use fxhash::FxHashSet;

use crate::{core::engine::HandleId, layers::base::LayerType};

#[derive(Debug, Clone, Copy, PartialEq)]
struct LayerEntry {
    id: HandleId,
    layer_type: LayerType,
    z_index: i32,
}

/// Tracks the layers attached to a map, kept in stacking order
#[derive(Debug, Default)]
pub struct LayerManager {
    /// Sorted by z-index; equal z-indices keep insertion order
    render_order: Vec<LayerEntry>,
    attached: FxHashSet<HandleId>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer, replacing any previous registration of the same id
    pub fn add_layer(&mut self, id: HandleId, layer_type: LayerType, z_index: i32) {
        self.remove_layer(id);

        // Insert in sorted order by z-index
        let insert_pos = self
            .render_order
            .iter()
            .position(|entry| entry.z_index > z_index)
            .unwrap_or(self.render_order.len());

        self.render_order.insert(
            insert_pos,
            LayerEntry {
                id,
                layer_type,
                z_index,
            },
        );
        self.attached.insert(id);
    }

    pub fn remove_layer(&mut self, id: HandleId) -> bool {
        if !self.attached.remove(&id) {
            return false;
        }
        self.render_order.retain(|entry| entry.id != id);
        true
    }

    pub fn contains(&self, id: HandleId) -> bool {
        self.attached.contains(&id)
    }

    /// Layer ids in render order
    pub fn list_layers(&self) -> Vec<HandleId> {
        self.render_order.iter().map(|entry| entry.id).collect()
    }

    pub fn count_of(&self, layer_type: LayerType) -> usize {
        self.render_order
            .iter()
            .filter(|entry| entry.layer_type == layer_type)
            .count()
    }

    pub fn clear(&mut self) {
        self.render_order.clear();
        self.attached.clear();
    }

    /// Gets the number of layers
    pub fn len(&self) -> usize {
        self.render_order.len()
    }

    /// Checks if the manager is empty
    pub fn is_empty(&self) -> bool {
        self.render_order.is_empty()
    }
}
