// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Query nodes: lookups of controls other rigs created.

use alloc::string::String;

use crate::armature::{BoneId, BoneStore};
use crate::generator::Pass;
use crate::math::Vec3;
use crate::parent::ParentId;
use crate::rig::RigId;

use super::{ControlBoneNode, NodeId, QueryNodeSpec};

/// A lookup of the control at a point.
///
/// A query never anchors a cluster and contributes no geometry. It attaches
/// to the best-ranked control at its point and reports that cluster's bone.
#[derive(Clone, Debug)]
pub struct ControlQueryNode {
    pub(crate) rig: RigId,
    pub(crate) org: BoneId,
    pub(crate) name: String,
    pub(crate) point: Vec3,
    pub(crate) find_highest_layer: bool,
    pub(crate) needs_reparent: bool,
    pub(crate) master: Option<NodeId>,
    pub(crate) node_parent: Option<ParentId>,
}

impl ControlQueryNode {
    pub(crate) fn new(rig: RigId, spec: QueryNodeSpec, store: &BoneStore) -> Self {
        Self {
            rig,
            org: spec.org,
            name: spec
                .name
                .unwrap_or_else(|| String::from(store.name(spec.org))),
            point: spec.point.unwrap_or_else(|| store.head(spec.org)),
            find_highest_layer: spec.find_highest_layer,
            needs_reparent: spec.needs_reparent,
            master: None,
            node_parent: None,
        }
    }

    /// The rig that created the query.
    #[must_use]
    pub fn rig(&self) -> RigId {
        self.rig
    }

    /// Where the query looks.
    #[must_use]
    pub fn point(&self) -> Vec3 {
        self.point
    }

    /// The master of the matched cluster, if any control was found.
    #[must_use]
    pub fn master(&self) -> Option<NodeId> {
        self.master
    }

    /// A query can join any cluster.
    #[must_use]
    pub fn can_merge_into(&self, other: &ControlBoneNode) -> bool {
        _ = other;
        true
    }

    /// Preference for `other`: its layer, negated unless the highest layer
    /// was requested.
    #[must_use]
    pub fn merge_priority(&self, other: &ControlBoneNode) -> i32 {
        if self.find_highest_layer {
            other.layer.value()
        } else {
            -other.layer.value()
        }
    }
}

impl Pass<'_, '_> {
    /// Builds the reparent a query asked for.
    pub(crate) fn initialize_query(&mut self, id: NodeId) {
        let query = self.net.query(id);
        let Some(master) = query.master else {
            return;
        };
        if !query.needs_reparent {
            return;
        }
        let parent = self.build_parent_for_node(master, id, true);
        self.net.query_mut(id).node_parent = Some(parent);
        self.request_reparent(id, parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Transform3d;
    use crate::node::{ControlLayer, ControlNet, ControlNodeSpec};

    #[test]
    fn priority_follows_the_requested_direction() {
        let mut store = BoneStore::new();
        let org = store.add_bone("ORG-nose", Transform3d::from_translation(Vec3::ZERO), 1.0);
        let mut net = ControlNet::new();
        let free = net.add_control(RigId(0), 0, ControlNodeSpec::new(org, "nose"), &store);
        let tweak = net.add_control(
            RigId(0),
            0,
            ControlNodeSpec::new(org, "nose_tweak").layer(ControlLayer::Tweak),
            &store,
        );

        let lowest = ControlQueryNode::new(RigId(1), QueryNodeSpec::new(org), &store);
        let highest = ControlQueryNode::new(
            RigId(1),
            QueryNodeSpec::new(org).find_highest_layer(),
            &store,
        );
        let (free, tweak) = (net.control(free), net.control(tweak));

        assert!(lowest.merge_priority(free) > lowest.merge_priority(tweak));
        assert!(highest.merge_priority(tweak) > highest.merge_priority(free));
        assert!(lowest.can_merge_into(tweak));
        assert_eq!(lowest.point(), Vec3::ZERO);
    }
}
