use std::collections::HashMap;

use crate::foundation::core::{Affine3A, DataId};
use crate::foundation::error::{MedflowError, MedflowResult};
use crate::foundation::math::compose;

/// Spatial node attached to one data object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneNode {
    pub owner: DataId,
    pub local: Affine3A,
    /// Plain back-reference; the parent does not own its children.
    pub parent: Option<DataId>,
}

impl SceneNode {
    fn root(owner: DataId) -> Self {
        Self {
            owner,
            local: Affine3A::IDENTITY,
            parent: None,
        }
    }
}

/// Forest of transforms keyed by data object.
///
/// Roots compose with an implicit identity. Parent links never form a cycle.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: HashMap<DataId, SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, data: DataId) -> bool {
        self.nodes.contains_key(&data)
    }

    /// Node for `data`, created as an identity root on first reference.
    pub fn get_data_node(&mut self, data: DataId) -> &SceneNode {
        self.nodes.entry(data).or_insert_with(|| SceneNode::root(data))
    }

    pub fn node(&self, data: DataId) -> Option<&SceneNode> {
        self.nodes.get(&data)
    }

    pub fn set_local_transform(&mut self, data: DataId, local: Affine3A) {
        self.nodes
            .entry(data)
            .or_insert_with(|| SceneNode::root(data))
            .local = local;
    }

    /// Attach `child` under `parent`, or detach it with `None`.
    pub fn set_parent(&mut self, child: DataId, parent: Option<DataId>) -> MedflowResult<()> {
        if let Some(p) = parent {
            if p == child {
                return Err(MedflowError::config(format!(
                    "{child} cannot be its own scene parent"
                )));
            }
            if self.ancestors(p).any(|a| a == child) {
                return Err(MedflowError::config(format!(
                    "parenting {child} under {p} would create a cycle"
                )));
            }
            self.get_data_node(p);
        }
        self.nodes
            .entry(child)
            .or_insert_with(|| SceneNode::root(child))
            .parent = parent;
        Ok(())
    }

    /// `data` followed by its ancestors, leaf to root.
    fn ancestors(&self, data: DataId) -> impl Iterator<Item = DataId> + '_ {
        std::iter::successors(Some(data), |d| self.nodes.get(d).and_then(|n| n.parent))
    }

    /// World transform: `root.local * ... * leaf.local`. Unknown data yields identity.
    pub fn linear_transformation(&self, data: DataId) -> Affine3A {
        self.ancestors(data)
            .filter_map(|d| self.nodes.get(&d))
            .fold(Affine3A::IDENTITY, |acc, n| compose(n.local, acc))
    }

    /// Drop the node for `data`; its children become roots.
    pub fn remove(&mut self, data: DataId) -> Option<SceneNode> {
        let removed = self.nodes.remove(&data)?;
        for n in self.nodes.values_mut() {
            if n.parent == Some(data) {
                n.parent = None;
            }
        }
        Some(removed)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
