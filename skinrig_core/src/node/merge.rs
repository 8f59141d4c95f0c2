// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clustering of control nodes that share a point.
//!
//! Nodes within `merge_epsilon` of each other form a group. Inside a group,
//! nodes nothing can absorb upward are master candidates; candidates that can
//! merge into each other share one cluster, whose master is elected with
//! [`ControlBoneNode::is_better_cluster`]. Every other node joins the master
//! it ranks highest by [`ControlBoneNode::merge_priority`]. Queries then
//! attach to the control they rank highest at their point.

use alloc::vec;
use alloc::vec::Vec;

use crate::generator::Pass;
use crate::rig::RigTree;
use crate::trace::ClusterEvent;

use super::{ControlNet, MasterState, NodeId};

impl Pass<'_, '_> {
    /// Runs the clustering pass and finishes every node's merge state.
    pub(crate) fn merge_nodes(&mut self) {
        let epsilon = self.options.merge_epsilon;
        let (controls, queries): (Vec<NodeId>, Vec<NodeId>) =
            self.net.ids().partition(|id| self.net.is_control(*id));

        let mut groups: Vec<Vec<NodeId>> = Vec::new();
        for &id in &controls {
            let point = self.net.point(id);
            match groups
                .iter_mut()
                .find(|group| self.net.point(group[0]).distance(point) <= epsilon)
            {
                Some(group) => group.push(id),
                None => groups.push(vec![id]),
            }
        }

        for group in &groups {
            let assignment = elect(self.net, self.rigs, group);
            for &(node, master) in &assignment {
                self.net.control_mut(node).master = master;
            }
            for &(node, master) in &assignment {
                if node != master {
                    continue;
                }
                let mut siblings = vec![master];
                siblings.extend(
                    group
                        .iter()
                        .copied()
                        .filter(|n| *n != master && self.net.control(*n).master == master),
                );
                let node = self.net.control_mut(master);
                node.siblings = siblings;
                node.state = Some(MasterState::default());
            }
        }

        for &query in &queries {
            let master = match_query(self.net, &controls, query, epsilon)
                .map(|id| self.net.control(id).master);
            self.net.query_mut(query).master = master;
        }

        for &id in &controls {
            self.net.find_mirror_siblings(id);
        }

        self.summary.control_nodes += count(controls.len());
        self.summary.query_nodes += count(queries.len());
        for master in controls.iter().copied().filter(|id| self.net.is_master(*id)) {
            let node = self.net.control(master);
            self.summary.clusters += 1;
            self.tracer.cluster(&ClusterEvent {
                master,
                name: &node.name,
                members: count(node.siblings.len()),
                mirrors: count(node.mirror.len()),
            });
        }
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Assigns every node of a point group to its master.
fn elect(net: &ControlNet, rigs: &RigTree, group: &[NodeId]) -> Vec<(NodeId, NodeId)> {
    let node = |id: NodeId| net.control(id);
    let strictly_into =
        |a: NodeId, b: NodeId| node(a).can_merge_into(node(b)) && !node(b).can_merge_into(node(a));
    let mutual =
        |a: NodeId, b: NodeId| node(a).can_merge_into(node(b)) && node(b).can_merge_into(node(a));

    let candidates: Vec<NodeId> = group
        .iter()
        .copied()
        .filter(|&n| !group.iter().any(|&m| m != n && strictly_into(n, m)))
        .collect();

    let mut clusters: Vec<Vec<NodeId>> = Vec::new();
    for candidate in candidates {
        match clusters
            .iter_mut()
            .find(|cluster| cluster.iter().all(|&other| mutual(candidate, other)))
        {
            Some(cluster) => cluster.push(candidate),
            None => clusters.push(vec![candidate]),
        }
    }

    let mut masters = Vec::new();
    let mut assignment = Vec::new();
    for cluster in &clusters {
        let mut master = cluster[0];
        for &contender in &cluster[1..] {
            if node(contender).is_better_cluster(node(master), rigs) {
                master = contender;
            }
        }
        masters.push(master);
        assignment.extend(cluster.iter().map(|&member| (member, master)));
    }

    for &n in group {
        if assignment.iter().any(|(member, _)| *member == n) {
            continue;
        }
        let mut best: Option<NodeId> = None;
        for &m in &masters {
            if !node(n).can_merge_into(node(m)) {
                continue;
            }
            best = Some(match best {
                None => m,
                Some(b) => {
                    let (pm, pb) = (node(n).merge_priority(node(m)), node(n).merge_priority(node(b)));
                    if pm > pb || (pm == pb && node(m).is_better_cluster(node(b), rigs)) {
                        m
                    } else {
                        b
                    }
                }
            });
        }
        match best {
            Some(master) => assignment.push((n, master)),
            None => {
                masters.push(n);
                assignment.push((n, n));
            }
        }
    }
    assignment
}

/// The control a query ranks highest at its point; earlier nodes win ties.
fn match_query(net: &ControlNet, controls: &[NodeId], query: NodeId, epsilon: f64) -> Option<NodeId> {
    let q = net.query(query);
    let mut best: Option<(i32, NodeId)> = None;
    for &id in controls {
        let control = net.control(id);
        if control.point.distance(q.point) > epsilon || !q.can_merge_into(control) {
            continue;
        }
        let priority = q.merge_priority(control);
        if best.is_none_or(|(b, _)| priority > b) {
            best = Some((priority, id));
        }
    }
    best.map(|(_, id)| id)
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use super::*;
    use crate::armature::{BoneId, BoneStore};
    use crate::math::{Transform3d, Vec3};
    use crate::node::{ControlLayer, ControlNodeSpec, QueryNodeSpec};
    use crate::rig::{RigId, SkinRig};

    struct Plain;

    impl SkinRig for Plain {
        fn name(&self) -> &str {
            "plain"
        }

        fn base_bone(&self) -> BoneId {
            BoneId(0)
        }
    }

    fn setup() -> (BoneStore, BoneId, RigTree, RigId) {
        let mut store = BoneStore::new();
        let org = store.add_bone("ORG-lip", Transform3d::from_translation(Vec3::ZERO), 1.0);
        let mut rigs = RigTree::new();
        let rig = rigs.add(Box::new(Plain), None);
        (store, org, rigs, rig)
    }

    #[test]
    fn nodes_merge_into_the_highest_layer() {
        let (store, org, rigs, rig) = setup();
        let mut net = ControlNet::new();
        let a = net.add_control(rig, 0, ControlNodeSpec::new(org, "a"), &store);
        let b = net.add_control(rig, 0, ControlNodeSpec::new(org, "b"), &store);
        let t = net.add_control(
            rig,
            0,
            ControlNodeSpec::new(org, "t").layer(ControlLayer::Tweak),
            &store,
        );
        let far = net.add_control(
            rig,
            0,
            ControlNodeSpec::new(org, "far").point(Vec3::new(0.0, 1.0, 0.0)),
            &store,
        );

        let mut assignment = elect(&net, &rigs, &[a, b, t]);
        assignment.sort();
        assert_eq!(assignment, vec![(a, t), (b, t), (t, t)]);
        assert_eq!(elect(&net, &rigs, &[far]), vec![(far, far)]);
    }

    #[test]
    fn equal_layers_form_one_cluster() {
        let (store, org, rigs, rig) = setup();
        let mut net = ControlNet::new();
        let mid = net.add_control(rig, 0, ControlNodeSpec::new(org, "lip"), &store);
        let side = net.add_control(rig, 0, ControlNodeSpec::new(org, "lip.L"), &store);

        let assignment = elect(&net, &rigs, &[mid, side]);
        assert_eq!(assignment, vec![(mid, side), (side, side)]);
    }

    #[test]
    fn queries_pick_by_layer() {
        let (store, org, _, rig) = setup();
        let mut net = ControlNet::new();
        let free = net.add_control(rig, 0, ControlNodeSpec::new(org, "a"), &store);
        let tweak = net.add_control(
            rig,
            0,
            ControlNodeSpec::new(org, "t").layer(ControlLayer::Tweak),
            &store,
        );
        let low = net.add_query(rig, QueryNodeSpec::new(org), &store);
        let high = net.add_query(rig, QueryNodeSpec::new(org).find_highest_layer(), &store);
        let miss = net.add_query(
            rig,
            QueryNodeSpec::new(org).point(Vec3::new(5.0, 0.0, 0.0)),
            &store,
        );

        let controls = [free, tweak];
        assert_eq!(match_query(&net, &controls, low, 1e-5), Some(free));
        assert_eq!(match_query(&net, &controls, high, 1e-5), Some(tweak));
        assert_eq!(match_query(&net, &controls, miss, 1e-5), None);
    }
}
