// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Control nodes and the control net.
//!
//! Rigs request user-facing controls by adding [`ControlBoneNode`]s through a
//! [`NodeBuilder`], and look up existing controls with
//! [`ControlQueryNode`]s. Nodes at the same point are grouped into merge
//! clusters; each cluster elects one *master* whose bone represents every
//! member. The [`ControlNet`] owns all nodes of a pass and answers cluster
//! queries after merging.

mod control;
mod merge;
mod query;

pub use control::ControlBoneNode;
pub use query::ControlQueryNode;

pub(crate) use control::MasterState;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::armature::{BoneId, BoneStore};
use crate::math::Vec3;
use crate::rig::RigId;

/// A handle to a node in a [`ControlNet`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Merge priority of a control. Nodes merge toward higher layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum ControlLayer {
    /// A plain control with no mechanism.
    #[default]
    Free = 0,
    /// A pivot in the middle of a chain.
    MiddlePivot = 10,
    /// A tweak control layered on top of other mechanism.
    Tweak = 20,
}

impl ControlLayer {
    /// The numeric layer value.
    #[must_use]
    pub const fn value(self) -> i32 {
        self as i32
    }
}

/// Widget class requested for a control; the highest wins in a cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlIcon {
    /// Sphere.
    #[default]
    Tweak = 0,
    /// Cube.
    MiddlePivot = 1,
    /// Cube.
    Free = 2,
    /// Chosen by the owning rig.
    Custom = 3,
}

/// Position of a node in its rig's chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChainEnd {
    /// First node of the chain.
    Start = -1,
    /// Any inner node.
    #[default]
    Middle = 0,
    /// Last node of the chain.
    End = 1,
}

/// Parameters of a new [`ControlBoneNode`].
#[derive(Clone, Debug, PartialEq)]
pub struct ControlNodeSpec {
    pub(crate) org: BoneId,
    pub(crate) name: String,
    pub(crate) point: Option<Vec3>,
    pub(crate) size: Option<f64>,
    pub(crate) layer: ControlLayer,
    pub(crate) icon: ControlIcon,
    pub(crate) chain_end: ChainEnd,
    pub(crate) needs_parent: bool,
    pub(crate) needs_reparent: bool,
    pub(crate) allow_scale: bool,
    pub(crate) hide_control: bool,
    pub(crate) index: Option<u32>,
}

impl ControlNodeSpec {
    /// A control named `name` at the head of `org`, sized like `org`.
    #[must_use]
    pub fn new(org: BoneId, name: impl Into<String>) -> Self {
        Self {
            org,
            name: name.into(),
            point: None,
            size: None,
            layer: ControlLayer::Free,
            icon: ControlIcon::Tweak,
            chain_end: ChainEnd::Middle,
            needs_parent: false,
            needs_reparent: false,
            allow_scale: false,
            hide_control: false,
            index: None,
        }
    }

    /// Places the control at `point` instead of the org head.
    #[must_use]
    pub fn point(mut self, point: Vec3) -> Self {
        self.point = Some(point);
        self
    }

    /// Overrides the control size.
    #[must_use]
    pub fn size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the merge layer.
    #[must_use]
    pub fn layer(mut self, layer: ControlLayer) -> Self {
        self.layer = layer;
        self
    }

    /// Sets the widget class.
    #[must_use]
    pub fn icon(mut self, icon: ControlIcon) -> Self {
        self.icon = icon;
        self
    }

    /// Sets the chain position.
    #[must_use]
    pub fn chain_end(mut self, chain_end: ChainEnd) -> Self {
        self.chain_end = chain_end;
        self
    }

    /// Builds this node's own parent even if it does not become master.
    #[must_use]
    pub fn needs_parent(mut self) -> Self {
        self.needs_parent = true;
        self
    }

    /// Requests a conversion bone if the cluster's parent differs from this
    /// node's own.
    #[must_use]
    pub fn needs_reparent(mut self) -> Self {
        self.needs_reparent = true;
        self
    }

    /// Leaves the control's scale channels unlocked.
    #[must_use]
    pub fn allow_scale(mut self) -> Self {
        self.allow_scale = true;
        self
    }

    /// Generates the control as a hidden `MCH-` bone.
    #[must_use]
    pub fn hide_control(mut self) -> Self {
        self.hide_control = true;
        self
    }

    /// Index of the node in its rig's chain.
    #[must_use]
    pub fn index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }
}

/// Parameters of a new [`ControlQueryNode`].
#[derive(Clone, Debug, PartialEq)]
pub struct QueryNodeSpec {
    pub(crate) org: BoneId,
    pub(crate) name: Option<String>,
    pub(crate) point: Option<Vec3>,
    pub(crate) find_highest_layer: bool,
    pub(crate) needs_reparent: bool,
}

impl QueryNodeSpec {
    /// A query at the head of `org`.
    #[must_use]
    pub fn new(org: BoneId) -> Self {
        Self {
            org,
            name: None,
            point: None,
            find_highest_layer: false,
            needs_reparent: false,
        }
    }

    /// Names the query; defaults to the org bone name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Queries at `point` instead of the org head.
    #[must_use]
    pub fn point(mut self, point: Vec3) -> Self {
        self.point = Some(point);
        self
    }

    /// Prefers the cluster with the highest layer instead of the lowest.
    #[must_use]
    pub fn find_highest_layer(mut self) -> Self {
        self.find_highest_layer = true;
        self
    }

    /// Requests a conversion bone in the querying rig's parent space.
    #[must_use]
    pub fn needs_reparent(mut self) -> Self {
        self.needs_reparent = true;
        self
    }
}

/// A node of the control net.
#[derive(Clone, Debug)]
pub enum NetNode {
    /// A control request.
    Control(ControlBoneNode),
    /// A lookup of an existing control.
    Query(ControlQueryNode),
}

/// Every node of one generation pass.
#[derive(Clone, Debug, Default)]
pub struct ControlNet {
    nodes: Vec<NetNode>,
}

impl ControlNet {
    /// Creates an empty net.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: NetNode) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    pub(crate) fn add_control(
        &mut self,
        rig: RigId,
        chain_priority: i32,
        spec: ControlNodeSpec,
        store: &BoneStore,
    ) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        let node = ControlBoneNode::new(id, rig, chain_priority, spec, store);
        self.push(NetNode::Control(node))
    }

    pub(crate) fn add_query(&mut self, rig: RigId, spec: QueryNodeSpec, store: &BoneStore) -> NodeId {
        self.push(NetNode::Query(ControlQueryNode::new(rig, spec, store)))
    }

    /// Returns a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a node of this net.
    #[must_use]
    pub fn get(&self, id: NodeId) -> &NetNode {
        assert!(
            (id.0 as usize) < self.nodes.len(),
            "unknown NodeId: {id:?} (len {})",
            self.nodes.len()
        );
        &self.nodes[id.0 as usize]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut NetNode {
        assert!(
            (id.0 as usize) < self.nodes.len(),
            "unknown NodeId: {id:?} (len {})",
            self.nodes.len()
        );
        &mut self.nodes[id.0 as usize]
    }

    /// Returns a control node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is a query node.
    #[must_use]
    pub fn control(&self, id: NodeId) -> &ControlBoneNode {
        match self.get(id) {
            NetNode::Control(node) => node,
            NetNode::Query(_) => panic!("{id:?} is a query node"),
        }
    }

    pub(crate) fn control_mut(&mut self, id: NodeId) -> &mut ControlBoneNode {
        match self.get_mut(id) {
            NetNode::Control(node) => node,
            NetNode::Query(_) => panic!("{id:?} is a query node"),
        }
    }

    /// Returns a query node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is a control node.
    #[must_use]
    pub fn query(&self, id: NodeId) -> &ControlQueryNode {
        match self.get(id) {
            NetNode::Query(node) => node,
            NetNode::Control(_) => panic!("{id:?} is a control node"),
        }
    }

    pub(crate) fn query_mut(&mut self, id: NodeId) -> &mut ControlQueryNode {
        match self.get_mut(id) {
            NetNode::Query(node) => node,
            NetNode::Control(_) => panic!("{id:?} is a control node"),
        }
    }

    /// Whether `id` is a control node.
    #[must_use]
    pub fn is_control(&self, id: NodeId) -> bool {
        matches!(self.get(id), NetNode::Control(_))
    }

    /// The rig that created the node.
    #[must_use]
    pub fn rig(&self, id: NodeId) -> RigId {
        match self.get(id) {
            NetNode::Control(node) => node.rig,
            NetNode::Query(node) => node.rig,
        }
    }

    /// The org bone the node was created from.
    #[must_use]
    pub fn org(&self, id: NodeId) -> BoneId {
        match self.get(id) {
            NetNode::Control(node) => node.org,
            NetNode::Query(node) => node.org,
        }
    }

    /// The node's own name.
    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        match self.get(id) {
            NetNode::Control(node) => &node.name,
            NetNode::Query(node) => &node.name,
        }
    }

    /// The node's own point.
    #[must_use]
    pub fn point(&self, id: NodeId) -> Vec3 {
        match self.get(id) {
            NetNode::Control(node) => node.point,
            NetNode::Query(node) => node.point,
        }
    }

    /// The master of the node's cluster; `None` for a query that matched no
    /// control.
    #[must_use]
    pub fn master_of(&self, id: NodeId) -> Option<NodeId> {
        match self.get(id) {
            NetNode::Control(node) => Some(node.master),
            NetNode::Query(node) => node.master,
        }
    }

    /// Whether `id` is the master of its cluster.
    #[must_use]
    pub fn is_master(&self, id: NodeId) -> bool {
        match self.get(id) {
            NetNode::Control(node) => node.master == id,
            NetNode::Query(_) => false,
        }
    }

    /// Every control node of `id`'s cluster, master first.
    #[must_use]
    pub fn siblings(&self, id: NodeId) -> &[NodeId] {
        match self.master_of(id) {
            Some(master) => &self.control(master).siblings,
            None => &[],
        }
    }

    /// The control bone of `id`'s cluster, once generated.
    #[must_use]
    pub fn control_bone(&self, id: NodeId) -> Option<BoneId> {
        let master = self.master_of(id)?;
        self.control(master).state.as_ref()?.control_bone
    }

    /// The bone following `id`'s own parent, once generated.
    ///
    /// This is the control itself when the cluster uses the node's parent
    /// directly, and a conversion bone otherwise.
    #[must_use]
    pub fn reparent_bone(&self, id: NodeId) -> Option<BoneId> {
        let master = self.master_of(id)?;
        let own = match self.get(id) {
            NetNode::Control(node) => node.node_parent,
            NetNode::Query(node) => node.node_parent,
        }?;
        self.control(master).state.as_ref()?.reparent_bone(own)
    }

    /// The bone a dependent rig should use for `id`.
    ///
    /// Queries that requested a reparent get their conversion bone, every
    /// other node the control bone.
    #[must_use]
    pub fn output_bone(&self, id: NodeId) -> Option<BoneId> {
        match self.get(id) {
            NetNode::Query(node) if node.needs_reparent => self.reparent_bone(id),
            _ => self.control_bone(id),
        }
    }

    /// Iterates every node in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..u32::try_from(self.nodes.len()).unwrap_or(u32::MAX)).map(NodeId)
    }

    /// Iterates the masters of every cluster in creation order.
    pub fn masters(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids().filter(|id| self.is_master(*id))
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the net has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Node factory handed to [`SkinRig::init_control_nodes`].
///
/// [`SkinRig::init_control_nodes`]: crate::rig::SkinRig::init_control_nodes
#[derive(Debug)]
pub struct NodeBuilder<'a> {
    pub(crate) rig: RigId,
    pub(crate) chain_priority: i32,
    pub(crate) chain_rig: bool,
    pub(crate) net: &'a mut ControlNet,
    pub(crate) store: &'a BoneStore,
}

impl NodeBuilder<'_> {
    /// The rig the nodes are created for.
    #[must_use]
    pub fn rig(&self) -> RigId {
        self.rig
    }

    /// The armature, for looking up org bones.
    #[must_use]
    pub fn store(&self) -> &BoneStore {
        self.store
    }

    /// Adds a control node.
    ///
    /// # Panics
    ///
    /// Panics if the rig is not a chain rig.
    pub fn add_control(&mut self, spec: ControlNodeSpec) -> NodeId {
        assert!(
            self.chain_rig,
            "control node `{}` needs a chain rig, {:?} is not one",
            spec.name, self.rig
        );
        self.net
            .add_control(self.rig, self.chain_priority, spec, self.store)
    }

    /// Adds a query node.
    pub fn add_query(&mut self, spec: QueryNodeSpec) -> NodeId {
        self.net.add_query(self.rig, spec, self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Transform3d;

    fn store_with_org() -> (BoneStore, BoneId) {
        let mut store = BoneStore::new();
        let org = store.add_bone(
            "ORG-lip.L",
            Transform3d::from_translation(Vec3::new(1.0, 0.0, 0.0)),
            0.5,
        );
        (store, org)
    }

    #[test]
    fn control_defaults_come_from_the_org_bone() {
        let (store, org) = store_with_org();
        let mut net = ControlNet::new();
        let mut builder = NodeBuilder {
            rig: RigId(0),
            chain_priority: 0,
            chain_rig: true,
            net: &mut net,
            store: &store,
        };
        let id = builder.add_control(ControlNodeSpec::new(org, "lip.L").layer(ControlLayer::Tweak));

        let node = net.control(id);
        assert_eq!(node.point(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(node.size(), 0.5);
        assert_eq!(node.layer(), ControlLayer::Tweak);
        assert!(net.is_master(id));
        assert_eq!(net.control_bone(id), None);
    }

    #[test]
    fn queries_default_to_the_org_name() {
        let (store, org) = store_with_org();
        let mut net = ControlNet::new();
        let id = net.add_query(RigId(0), QueryNodeSpec::new(org), &store);
        assert_eq!(net.name(id), "ORG-lip.L");
        assert!(!net.is_control(id));
        assert_eq!(net.master_of(id), None);
        assert!(net.siblings(id).is_empty());
    }

    #[test]
    #[should_panic(expected = "needs a chain rig")]
    fn controls_need_a_chain_rig() {
        let (store, org) = store_with_org();
        let mut net = ControlNet::new();
        let mut builder = NodeBuilder {
            rig: RigId(0),
            chain_priority: 0,
            chain_rig: false,
            net: &mut net,
            store: &store,
        };
        let _ = builder.add_control(ControlNodeSpec::new(org, "lip.L"));
    }

    #[test]
    fn layers_are_ordered() {
        assert!(ControlLayer::Free < ControlLayer::MiddlePivot);
        assert_eq!(ControlLayer::Tweak.value(), 20);
        assert!(ControlIcon::Custom > ControlIcon::Free);
    }
}
