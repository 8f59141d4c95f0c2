// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rig capability contract and the rig hierarchy.
//!
//! Every rig taking part in a pass implements [`SkinRig`]. The trait's hooks
//! have no-op or pass-through defaults, so a rig only overrides the
//! capabilities it actually provides. Rigs live in a [`RigTree`] with explicit
//! parent links; wherever a hook must run on a rig *and its ancestors*, the
//! generator walks [`RigTree::ancestors`] in a fixed order.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::armature::{BoneId, BoneStore, LayerMask, WidgetShape};
use crate::error::RigError;
use crate::lazy::{BoneRef, Scene};
use crate::math::Quat;
use crate::node::{ControlBoneNode, ControlNet, NodeBuilder, NodeId};
use crate::parent::{ParentArena, ParentId, ParentScope};
use crate::stage::Stage;

/// A handle to a rig in a [`RigTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RigId(pub(crate) u32);

impl RigId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for RigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RigId({})", self.0)
    }
}

/// Capabilities a rig offers to the control-node engine.
pub trait SkinRig {
    /// Display name used in errors and traces.
    fn name(&self) -> &str;

    /// The metarig bone the rig was instantiated from.
    fn base_bone(&self) -> BoneId;

    /// Rank among rigs sharing controls; a node never merges into a rig of
    /// lower priority.
    fn chain_priority(&self) -> i32 {
        0
    }

    /// Whether the rig may own [`ControlBoneNode`]s. Rigs that only look up
    /// existing controls return `false`.
    fn is_chain_rig(&self) -> bool {
        true
    }

    /// Creates this rig's control and query nodes.
    fn init_control_nodes(&mut self, nodes: &mut NodeBuilder<'_>) {
        _ = nodes;
    }

    /// Rotation the rig wants for one of its nodes; the cluster averages
    /// these across mirror siblings.
    ///
    /// Defaults to the rest rotation of the node's ORG bone.
    fn get_final_control_node_rotation(&self, node: &ControlBoneNode, store: &BoneStore) -> Quat {
        store.matrix(node.org()).to_rotation()
    }

    /// Builds the parent mechanism for a node owned by this rig.
    fn build_own_control_node_parent(&self, scope: &mut ParentScope<'_>) -> ParentId {
        scope.next_parent()
    }

    /// Builds a parent on behalf of the child rig `requester`.
    ///
    /// Defaults to the bone above the requester's base bone.
    fn build_control_node_parent(&self, scope: &mut ParentScope<'_>, requester: RigId) -> ParentId {
        scope.default_parent(requester)
    }

    /// Wraps or replaces a parent built for a node of this rig or a
    /// descendant. Runs outermost ancestor first.
    fn extend_control_node_parent(&self, parent: ParentId, scope: &mut ParentScope<'_>) -> ParentId {
        _ = scope;
        parent
    }

    /// Like [`extend_control_node_parent`](Self::extend_control_node_parent),
    /// but runs innermost rig first, after every regular extension.
    fn extend_control_node_parent_post(
        &self,
        parent: ParentId,
        scope: &mut ParentScope<'_>,
    ) -> ParentId {
        _ = scope;
        parent
    }

    /// Adds mechanism to a finished master control. Runs outermost ancestor
    /// first.
    ///
    /// # Errors
    ///
    /// Implementations report broken configuration as [`RigError`].
    fn extend_control_node_rig(&self, node: NodeId, ctx: &mut RigContext<'_>) -> Result<(), RigError> {
        _ = (node, ctx);
        Ok(())
    }

    /// Visibility layers for the control of one of this rig's nodes.
    fn get_control_node_layers(&self, node: &ControlBoneNode) -> Option<LayerMask> {
        _ = node;
        None
    }

    /// Assigns a widget for a node with a custom icon.
    fn make_control_node_widget(&self, node: &ControlBoneNode, bone: BoneId, store: &mut BoneStore) {
        _ = node;
        store.set_widget(bone, WidgetShape::Circle);
    }

    /// The rig's own work for `stage`, run before any node of the stage.
    ///
    /// # Errors
    ///
    /// Implementations report broken configuration as [`RigError`].
    fn run_stage(&mut self, stage: Stage, ctx: &mut RigContext<'_>) -> Result<(), RigError> {
        _ = (stage, ctx);
        Ok(())
    }
}

/// Rigs of one pass with their parent links.
#[derive(Default)]
pub struct RigTree {
    rigs: Vec<Box<dyn SkinRig>>,
    parent: Vec<Option<RigId>>,
}

impl fmt::Debug for RigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rigs.iter().map(|rig| rig.name()))
            .finish()
    }
}

impl RigTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rig under `parent` (or as a top-level rig).
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a rig of this tree.
    pub fn add(&mut self, rig: Box<dyn SkinRig>, parent: Option<RigId>) -> RigId {
        if let Some(parent) = parent {
            self.validate(parent);
        }
        let id = RigId(u32::try_from(self.rigs.len()).unwrap_or(u32::MAX));
        self.rigs.push(rig);
        self.parent.push(parent);
        id
    }

    /// Returns a rig.
    #[must_use]
    pub fn get(&self, id: RigId) -> &dyn SkinRig {
        self.validate(id);
        &*self.rigs[id.0 as usize]
    }

    /// Returns a rig mutably.
    pub fn get_mut(&mut self, id: RigId) -> &mut dyn SkinRig {
        self.validate(id);
        &mut *self.rigs[id.0 as usize]
    }

    /// Returns the parent rig, if any.
    #[must_use]
    pub fn parent(&self, id: RigId) -> Option<RigId> {
        self.validate(id);
        self.parent[id.0 as usize]
    }

    /// Returns `id` followed by its ancestors, innermost first.
    #[must_use]
    pub fn ancestors(&self, id: RigId) -> Vec<RigId> {
        let mut out = Vec::new();
        let mut current = Some(id);
        while let Some(rig) = current {
            out.push(rig);
            current = self.parent(rig);
        }
        out
    }

    /// Iterates every rig in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = RigId> + use<> {
        (0..u32::try_from(self.rigs.len()).unwrap_or(u32::MAX)).map(RigId)
    }

    /// Number of rigs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rigs.len()
    }

    /// Whether the tree has no rigs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rigs.is_empty()
    }

    fn validate(&self, id: RigId) {
        assert!(
            (id.0 as usize) < self.rigs.len(),
            "unknown RigId: {id:?} (len {})",
            self.rigs.len()
        );
    }
}

/// Access to the armature and the resolved control net for rig hooks that
/// run after bones exist.
#[derive(Debug)]
pub struct RigContext<'a> {
    pub(crate) store: &'a mut BoneStore,
    pub(crate) net: &'a ControlNet,
    pub(crate) parents: &'a ParentArena,
    pub(crate) no_auto_parent: &'a mut Vec<BoneId>,
}

impl RigContext<'_> {
    /// The armature.
    #[must_use]
    pub fn store(&self) -> &BoneStore {
        self.store
    }

    /// The armature, mutably.
    pub fn store_mut(&mut self) -> &mut BoneStore {
        self.store
    }

    /// The control net.
    #[must_use]
    pub fn net(&self) -> &ControlNet {
        self.net
    }

    /// A read-only view for resolving references.
    #[must_use]
    pub fn scene(&self) -> Scene<'_> {
        Scene {
            store: self.store,
            net: self.net,
            parents: self.parents,
        }
    }

    /// Resolves a bone reference.
    ///
    /// # Errors
    ///
    /// See [`Scene::resolve`].
    pub fn resolve(&self, bone: &BoneRef) -> Result<BoneId, RigError> {
        self.scene().resolve(bone)
    }

    /// Keeps `bone` out of the final root auto-parenting step.
    pub fn disable_auto_parent(&mut self, bone: BoneId) {
        if !self.no_auto_parent.contains(&bone) {
            self.no_auto_parent.push(bone);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec;

    use super::*;

    struct Plain(&'static str);

    impl SkinRig for Plain {
        fn name(&self) -> &str {
            self.0
        }

        fn base_bone(&self) -> BoneId {
            BoneId(0)
        }
    }

    #[test]
    fn ancestors_are_innermost_first() {
        let mut tree = RigTree::new();
        let face = tree.add(Box::new(Plain("face")), None);
        let mouth = tree.add(Box::new(Plain("mouth")), Some(face));
        let lip = tree.add(Box::new(Plain("lip")), Some(mouth));
        let other = tree.add(Box::new(Plain("ear")), None);

        assert_eq!(tree.ancestors(lip), vec![lip, mouth, face]);
        assert_eq!(tree.ancestors(other), vec![other]);
        assert_eq!(tree.get(mouth).name(), "mouth");
        assert_eq!(tree.ids().count(), 4);
    }

    #[test]
    fn trait_defaults() {
        let rig = Plain("x");
        assert_eq!(rig.chain_priority(), 0);
        assert!(rig.is_chain_rig());
    }

    #[test]
    #[should_panic(expected = "unknown RigId")]
    fn unknown_parent_panics() {
        let mut tree = RigTree::new();
        let _ = tree.add(Box::new(Plain("x")), Some(RigId(3)));
    }
}
