// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Control bone nodes and the per-cluster build they drive.

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Reverse;

use crate::armature::{
    BoneId, BoneStore, Constraint, ConstraintKind, InheritScale, Space, WidgetShape,
};
use crate::error::RigError;
use crate::generator::Pass;
use crate::math::{Quat, Transform3d, Vec3};
use crate::naming::{NameSides, NameSubtype, Side, SideZ, change_name_side, make_derived_name, name_sides};
use crate::parent::{ParentId, ParentScope, ParentType};
use crate::rig::{RigId, RigTree};
use crate::trace::{BoneEvent, BoneRole, InternEvent};

use super::{ChainEnd, ControlIcon, ControlLayer, ControlNet, ControlNodeSpec, NodeId};

/// A request for a user-facing control bone.
///
/// After merging, the master of a cluster owns the generated bones; every
/// other member only contributes its geometry, parent and flags.
#[derive(Clone, Debug)]
pub struct ControlBoneNode {
    pub(crate) id: NodeId,
    pub(crate) rig: RigId,
    pub(crate) chain_priority: i32,
    pub(crate) org: BoneId,
    pub(crate) name: String,
    pub(crate) name_split: NameSides,
    pub(crate) point: Vec3,
    pub(crate) size: f64,
    pub(crate) layer: ControlLayer,
    pub(crate) icon: ControlIcon,
    pub(crate) chain_end: ChainEnd,
    pub(crate) needs_parent: bool,
    pub(crate) needs_reparent: bool,
    pub(crate) allow_scale: bool,
    pub(crate) hide_control: bool,
    pub(crate) index: Option<u32>,

    // -- Merge results --
    pub(crate) master: NodeId,
    pub(crate) siblings: Vec<NodeId>,
    pub(crate) mirror: Vec<(NameSides, NodeId)>,
    pub(crate) sides_x: Vec<Side>,
    pub(crate) sides_z: Vec<SideZ>,
    pub(crate) name_merged: String,

    // -- Build state --
    pub(crate) rotation: Option<Quat>,
    pub(crate) matrix: Transform3d,
    pub(crate) node_parent: Option<ParentId>,
    pub(crate) state: Option<MasterState>,
}

/// Cluster-wide state kept on the master.
#[derive(Clone, Debug, Default)]
pub(crate) struct MasterState {
    pub(crate) parent_cache: Vec<ParentId>,
    pub(crate) parent_names: Vec<(ParentId, String)>,
    pub(crate) reparent_requests: Vec<ParentId>,
    pub(crate) used_parents: Vec<ParentId>,
    pub(crate) node_parent_list: Vec<ParentId>,
    pub(crate) use_mix_parent: bool,
    pub(crate) has_weak_parent: bool,
    pub(crate) use_weak_parent: bool,
    pub(crate) control_bone: Option<BoneId>,
    pub(crate) mix_parent_bone: Option<BoneId>,
    pub(crate) weak_parent_bone: Option<BoneId>,
    pub(crate) reparent_bones: Vec<(ParentId, BoneId)>,
}

impl MasterState {
    pub(crate) fn reparent_bone(&self, parent: ParentId) -> Option<BoneId> {
        self.reparent_bones
            .iter()
            .find(|(p, _)| *p == parent)
            .map(|(_, bone)| *bone)
    }

    fn parent_name(&self, parent: ParentId) -> &str {
        self.parent_names
            .iter()
            .find(|(p, _)| *p == parent)
            .map(|(_, name)| name.as_str())
            .unwrap_or_else(|| panic!("{parent:?} was not interned by this cluster"))
    }
}

impl ControlBoneNode {
    pub(crate) fn new(
        id: NodeId,
        rig: RigId,
        chain_priority: i32,
        spec: ControlNodeSpec,
        store: &BoneStore,
    ) -> Self {
        let point = spec.point.unwrap_or_else(|| store.head(spec.org));
        let size = spec.size.unwrap_or_else(|| store.length(spec.org));
        let name_split = name_sides(&spec.name);
        Self {
            id,
            rig,
            chain_priority,
            org: spec.org,
            name_merged: spec.name.clone(),
            name: spec.name,
            name_split,
            point,
            size,
            layer: spec.layer,
            icon: spec.icon,
            chain_end: spec.chain_end,
            needs_parent: spec.needs_parent,
            needs_reparent: spec.needs_reparent,
            allow_scale: spec.allow_scale,
            hide_control: spec.hide_control,
            index: spec.index,
            master: id,
            siblings: Vec::new(),
            mirror: Vec::new(),
            sides_x: Vec::new(),
            sides_z: Vec::new(),
            rotation: None,
            matrix: Transform3d::from_translation(point),
            node_parent: None,
            state: None,
        }
    }

    /// The node's handle.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The rig that created the node.
    #[must_use]
    pub fn rig(&self) -> RigId {
        self.rig
    }

    /// The org bone the node was created from.
    #[must_use]
    pub fn org(&self) -> BoneId {
        self.org
    }

    /// The requested name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The requested name split into base and sides.
    #[must_use]
    pub fn name_sides(&self) -> &NameSides {
        &self.name_split
    }

    /// The name with sides shared by mirror siblings collapsed to middle.
    #[must_use]
    pub fn merged_name(&self) -> &str {
        &self.name_merged
    }

    /// Where the control sits.
    #[must_use]
    pub fn point(&self) -> Vec3 {
        self.point
    }

    /// Control length; the cluster consensus on the master after
    /// initialization.
    #[must_use]
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Merge layer.
    #[must_use]
    pub fn layer(&self) -> ControlLayer {
        self.layer
    }

    /// Widget class.
    #[must_use]
    pub fn icon(&self) -> ControlIcon {
        self.icon
    }

    /// Chain position.
    #[must_use]
    pub fn chain_end(&self) -> ChainEnd {
        self.chain_end
    }

    /// Index in the owning rig's chain.
    #[must_use]
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// Whether the node asked for unlocked scale.
    #[must_use]
    pub fn allows_scale(&self) -> bool {
        self.allow_scale
    }

    /// The master of the node's cluster.
    #[must_use]
    pub fn master(&self) -> NodeId {
        self.master
    }

    /// Whether this node is its cluster's master.
    #[must_use]
    pub fn is_master(&self) -> bool {
        self.master == self.id
    }

    /// Cluster members sharing this node's base name, itself included.
    pub fn mirror_siblings(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.mirror.iter().map(|(_, id)| *id)
    }

    /// Consensus rest matrix; meaningful on the master after initialization.
    #[must_use]
    pub fn matrix(&self) -> Transform3d {
        self.matrix
    }

    /// The parent generator built for this node, if any.
    #[must_use]
    pub fn node_parent(&self) -> Option<ParentId> {
        self.node_parent
    }

    /// Whether this node may be absorbed by `other`'s cluster.
    ///
    /// Merging only flows toward rigs of equal or higher chain priority and,
    /// within equal priority, toward equal or higher layers.
    #[must_use]
    pub fn can_merge_into(&self, other: &Self) -> bool {
        let dprio = self.chain_priority - other.chain_priority;
        dprio <= 0 && (self.layer <= other.layer || dprio < 0)
    }

    /// Preference for merging into `other`; higher is better.
    ///
    /// The closest layer wins, and merging downward is heavily penalized.
    #[must_use]
    pub fn merge_priority(&self, other: &Self) -> i32 {
        let distance = (self.layer.value() - other.layer.value()).abs();
        if self.layer <= other.layer {
            -distance
        } else {
            -distance - 100
        }
    }

    /// Whether this node makes a better master than `other`.
    ///
    /// A node whose rig sits strictly deeper below the same ancestors wins;
    /// otherwise a node on a side wins over one closer to the middle.
    #[must_use]
    pub fn is_better_cluster(&self, other: &Self, rigs: &RigTree) -> bool {
        let mine = parent_rigs_root_first(rigs, self.rig);
        let theirs = parent_rigs_root_first(rigs, other.rig);

        if mine.len() > theirs.len() && mine.starts_with(&theirs) {
            return true;
        }
        if theirs.len() > mine.len() && theirs.starts_with(&mine) {
            return false;
        }

        let (x_mine, z_mine) = (
            self.name_split.side.magnitude(),
            self.name_split.side_z.magnitude(),
        );
        let (x_other, z_other) = (
            other.name_split.side.magnitude(),
            other.name_split.side_z.magnitude(),
        );

        if (x_mine < x_other && z_mine <= z_other) || (x_mine <= x_other && z_mine < z_other) {
            return false;
        }
        (x_mine > x_other && z_mine >= z_other) || (x_mine >= x_other && z_mine > z_other)
    }

    /// The mirror sibling across both axes, else across X, else across Z.
    #[must_use]
    pub fn best_mirror(&self) -> Option<NodeId> {
        let NameSides { side, side_z, .. } = self.name_split;
        [
            (side.flip(), side_z.flip()),
            (side.flip(), side_z),
            (side, side_z.flip()),
        ]
        .into_iter()
        .find_map(|(x, z)| {
            let key = self.name_split.with_sides(x, z);
            self.mirror
                .iter()
                .find(|(k, id)| *k == key && *id != self.id)
                .map(|(_, id)| *id)
        })
    }
}

fn parent_rigs_root_first(rigs: &RigTree, rig: RigId) -> Vec<RigId> {
    let mut list = match rigs.parent(rig) {
        Some(parent) => rigs.ancestors(parent),
        None => Vec::new(),
    };
    list.reverse();
    list
}

impl ControlNet {
    /// Groups mirror siblings and derives the merged name.
    ///
    /// # Panics
    ///
    /// Panics if two members of one cluster share a name.
    pub(crate) fn find_mirror_siblings(&mut self, id: NodeId) {
        let base = self.control(id).name_split.base.clone();
        let mut mirror: Vec<(NameSides, NodeId)> = Vec::new();
        let mut sides_x = Vec::new();
        let mut sides_z = Vec::new();

        for &sibling in self.siblings(id) {
            let node = self.control(sibling);
            if node.name_split.base != base {
                continue;
            }
            assert!(
                !mirror.iter().any(|(key, _)| *key == node.name_split),
                "duplicate control name `{}` in one merge cluster",
                node.name
            );
            mirror.push((node.name_split.clone(), sibling));
            if !sides_x.contains(&node.name_split.side) {
                sides_x.push(node.name_split.side);
            }
            if !sides_z.contains(&node.name_split.side_z) {
                sides_z.push(node.name_split.side_z);
            }
        }

        let node = self.control_mut(id);
        let side = if sides_x.len() > 1 {
            Side::Middle
        } else {
            node.name_split.side
        };
        let side_z = if sides_z.len() > 1 {
            SideZ::Middle
        } else {
            node.name_split.side_z
        };
        node.name_merged = change_name_side(&node.name, side, side_z);
        node.mirror = mirror;
        node.sides_x = sides_x;
        node.sides_z = sides_z;
    }

    /// The node whose merged name the control bone takes.
    ///
    /// Chain ends have poor names, so an end borrows the name of a sibling
    /// that starts (or else continues) a chain on at least the same sides.
    #[must_use]
    pub fn find_master_name_node(&self, id: NodeId) -> NodeId {
        let node = self.control(id);
        if node.chain_end != ChainEnd::End {
            return id;
        }
        let covering: Vec<&ControlBoneNode> = self
            .siblings(id)
            .iter()
            .map(|s| self.control(*s))
            .filter(|s| {
                node.sides_x.iter().all(|x| s.sides_x.contains(x))
                    && node.sides_z.iter().all(|z| s.sides_z.contains(z))
            })
            .collect();
        let pick = |end| {
            covering
                .iter()
                .filter(|s| s.chain_end == end)
                .min_by(|a, b| {
                    (Reverse(a.chain_priority), &a.name_merged)
                        .cmp(&(Reverse(b.chain_priority), &b.name_merged))
                })
                .map(|s| s.id)
        };
        pick(ChainEnd::Start)
            .or_else(|| pick(ChainEnd::Middle))
            .unwrap_or(id)
    }

    fn state(&self, master: NodeId) -> &MasterState {
        self.control(master)
            .state
            .as_ref()
            .unwrap_or_else(|| panic!("{master:?} is not a merged master"))
    }

    fn state_mut(&mut self, master: NodeId) -> &mut MasterState {
        self.control_mut(master)
            .state
            .as_mut()
            .unwrap_or_else(|| panic!("{master:?} is not a merged master"))
    }
}

// ---------------------------------------------------------------------------
// Staged build
// ---------------------------------------------------------------------------

impl Pass<'_, '_> {
    /// Copies the node's org bone into a new bone at the cluster transform.
    ///
    /// With an `orientation`, the bone takes that rotation at the master's
    /// point instead of the consensus matrix.
    pub(crate) fn make_node_bone(
        &mut self,
        node: NodeId,
        name: &str,
        scale: f64,
        orientation: Option<Quat>,
        role: BoneRole,
    ) -> BoneId {
        let master = self
            .net
            .master_of(node)
            .unwrap_or_else(|| panic!("bone for unmatched {node:?}"));
        let master_node = self.net.control(master);
        let matrix = match orientation {
            Some(rotation) => Transform3d::from_rotation_translation(rotation, master_node.point),
            None => master_node.matrix,
        };
        let length = master_node.size * scale;

        let bone = self.store.copy_bone(self.net.org(node), name);
        self.store.set_matrix(bone, matrix);
        self.store.set_length(bone, length);

        self.summary.bones_created += 1;
        self.tracer.bone(&BoneEvent {
            bone,
            name: self.store.name(bone),
            role,
        });
        bone
    }

    fn node_rotation(&mut self, id: NodeId) -> Quat {
        let node = self.net.control(id);
        if let Some(rotation) = node.rotation {
            return rotation;
        }
        let rotation = self
            .rigs
            .get(node.rig)
            .get_final_control_node_rotation(node, self.store);
        self.net.control_mut(id).rotation = Some(rotation);
        rotation
    }

    /// Builds, interns and freezes the parent of `node` on `master`'s
    /// cluster.
    pub(crate) fn build_parent_for_node(
        &mut self,
        master: NodeId,
        node: NodeId,
        use_parent: bool,
    ) -> ParentId {
        let rigs = self.rigs;
        let rig = self.net.rig(node);
        let ancestors = rigs.ancestors(rig);

        let mut scope = ParentScope {
            rigs,
            parents: &mut *self.parents,
            net: &*self.net,
            store: &*self.store,
            node,
            rig,
        };
        let mut result = rigs.get(rig).build_own_control_node_parent(&mut scope);
        for &outer in ancestors.iter().rev() {
            scope.rig = outer;
            result = rigs.get(outer).extend_control_node_parent(result, &mut scope);
        }
        for &inner in &ancestors {
            scope.rig = inner;
            result = rigs
                .get(inner)
                .extend_control_node_parent_post(result, &mut scope);
        }

        let result = self.intern_parent(master, node, result);
        self.parents.freeze(result);
        if use_parent {
            self.register_use_parent(master, result);
        }
        result
    }

    fn intern_parent(&mut self, master: NodeId, node: NodeId, parent: ParentId) -> ParentId {
        let state = self.net.state(master);
        if state.parent_names.iter().any(|(p, _)| *p == parent) {
            return parent;
        }
        let previous = state
            .parent_cache
            .iter()
            .copied()
            .find(|prev| self.parents.equal(*prev, parent, self.net));
        if let Some(previous) = previous {
            self.parents.freeze(previous);
            self.summary.parents_reused += 1;
            self.tracer.intern(&InternEvent {
                parent: previous,
                node,
                reused: true,
            });
            return previous;
        }

        let name = String::from(self.net.name(node));
        let state = self.net.state_mut(master);
        state.parent_cache.push(parent);
        state.parent_names.push((parent, name));
        self.summary.parents_interned += 1;
        self.tracer.intern(&InternEvent {
            parent,
            node,
            reused: false,
        });

        if let Some(wrapped) = self.parents.wrapped(parent) {
            let wrapped = self.intern_parent(master, node, wrapped);
            self.parents.set_wrapped(parent, wrapped);
        }
        parent
    }

    fn build_parent(&mut self, node: NodeId) -> ParentId {
        if let Some(parent) = self.net.control(node).node_parent {
            return parent;
        }
        let master = self.net.control(node).master;
        let parent = self.build_parent_for_node(master, node, false);
        self.net.control_mut(node).node_parent = Some(parent);
        parent
    }

    fn register_use_parent(&mut self, master: NodeId, parent: ParentId) {
        self.parents.freeze(parent);
        let used = &mut self.net.state_mut(master).used_parents;
        if !used.contains(&parent) {
            used.push(parent);
        }
    }

    /// Asks `node`'s cluster for a bone following `parent`.
    pub(crate) fn request_reparent(&mut self, node: NodeId, parent: ParentId) {
        let master = self
            .net
            .master_of(node)
            .unwrap_or_else(|| panic!("reparent request from unmatched {node:?}"));
        let state = self.net.state(master);
        if state
            .reparent_requests
            .iter()
            .any(|r| self.parents.equal(*r, parent, self.net))
        {
            return;
        }
        let master_parent = self
            .net
            .control(master)
            .node_parent
            .unwrap_or_else(|| panic!("reparent request before {master:?} initialized"));
        if state.use_mix_parent || !self.parents.equal(parent, master_parent, self.net) {
            self.register_use_parent(master, master_parent);
        }
        self.register_use_parent(master, parent);
        self.net
            .state_mut(master)
            .reparent_requests
            .push(parent);
    }

    /// Computes the cluster consensus and builds parents.
    pub(crate) fn initialize_control(&mut self, id: NodeId) {
        if self.net.is_master(id) {
            self.initialize_master(id);
        }

        let node = self.net.control(id);
        if node.needs_parent || node.needs_reparent {
            let needs_reparent = node.needs_reparent;
            let parent = self.build_parent(id);
            if needs_reparent {
                self.request_reparent(id, parent);
            }
        }
    }

    fn initialize_master(&mut self, id: NodeId) {
        let master = self.net.control(id);
        let mirror: Vec<NodeId> = master.mirror_siblings().collect();

        let best = master
            .siblings
            .iter()
            .map(|s| self.net.control(*s))
            .min_by_key(|s| Reverse(s.icon))
            .map_or(id, |s| s.id);
        let best_sizes: Vec<f64> = self
            .net
            .control(best)
            .mirror_siblings()
            .map(|s| self.net.control(s).size)
            .collect();
        let size = best_sizes.iter().sum::<f64>() / best_sizes.len() as f64;

        let mut rotation = Quat::ZERO;
        for &sibling in &mirror {
            rotation = rotation + self.node_rotation(sibling);
        }
        let rotation = rotation.normalized();

        let master = self.net.control_mut(id);
        master.size = size;
        master.rotation = Some(rotation);
        master.matrix = Transform3d::from_rotation_translation(rotation, master.point);

        let parents: Vec<ParentId> = mirror.iter().map(|s| self.build_parent(*s)).collect();
        let node_parent = self
            .net
            .control(id)
            .node_parent
            .unwrap_or_else(|| panic!("{id:?} is missing from its own mirror set"));

        let use_mix_parent = !parents
            .iter()
            .all(|p| self.parents.equal(*p, node_parent, self.net));
        let has_weak_parent = self.parents.kind(node_parent) == ParentType::WeakLayer;
        let list: Vec<ParentId> = if use_mix_parent {
            parents.iter().map(|p| self.parents.strip_weak(*p)).collect()
        } else {
            alloc::vec![self.parents.strip_weak(node_parent)]
        };

        let state = self.net.state_mut(id);
        state.use_mix_parent = use_mix_parent;
        state.has_weak_parent = has_weak_parent;
        state.node_parent_list.clone_from(&list);
        for parent in list {
            self.register_use_parent(id, parent);
        }
    }

    /// Enables every parent the master uses.
    pub(crate) fn prepare_control(&mut self, id: NodeId) {
        if !self.net.is_master(id) {
            return;
        }
        let used = core::mem::take(&mut self.net.state_mut(id).used_parents);
        for parent in used {
            for (into, absorbed) in self.parents.enable(parent) {
                self.summary.collapses += 1;
                self.tracer
                    .collapse(&crate::trace::CollapseEvent { into, absorbed });
            }
        }
    }

    /// Creates the control, mix, reparent and weak-parent bones.
    pub(crate) fn generate_control(&mut self, id: NodeId) {
        if !self.net.is_master(id) {
            return;
        }
        let control = self.make_master_bone(id);
        let control_name = String::from(self.store.name(control));
        let node_parent = self.net.control(id).node_parent;

        let state = self.net.state_mut(id);
        state.control_bone = Some(control);
        state.reparent_bones.clear();
        let use_mix_parent = state.use_mix_parent;
        let has_weak_parent = state.has_weak_parent;
        let requests = state.reparent_requests.clone();

        if use_mix_parent {
            let name = make_derived_name(&control_name, NameSubtype::Mch, "_mix_parent");
            let mix = self.make_node_bone(id, &name, 0.5, None, BoneRole::MixParent);
            self.net.state_mut(id).mix_parent_bone = Some(mix);
        } else if let Some(parent) = node_parent {
            self.net
                .state_mut(id)
                .reparent_bones
                .push((parent, control));
        }

        let mut use_weak_parent = false;
        for parent in requests {
            let state = self.net.state(id);
            if state.reparent_bone(parent).is_some() {
                continue;
            }
            let name = make_derived_name(state.parent_name(parent), NameSubtype::Mch, "_reparent");
            let bone = self.make_node_bone(id, &name, 1.0 / 3.0, None, BoneRole::Reparent);
            self.net
                .state_mut(id)
                .reparent_bones
                .push((parent, bone));
            use_weak_parent = has_weak_parent;
        }

        if use_weak_parent {
            let name = make_derived_name(&control_name, NameSubtype::Mch, "_weak_parent");
            let weak = self.make_node_bone(id, &name, 1.0, None, BoneRole::WeakParent);
            self.net.state_mut(id).weak_parent_bone = Some(weak);
        }
        self.net.state_mut(id).use_weak_parent = use_weak_parent;
    }

    fn make_master_bone(&mut self, id: NodeId) -> BoneId {
        let choice = self.net.find_master_name_node(id);
        let mut name = self.net.control(choice).name_merged.clone();
        if self.net.control(id).hide_control {
            name = make_derived_name(&name, NameSubtype::Mch, "");
        }
        self.make_node_bone(choice, &name, 1.0, None, BoneRole::Control)
    }

    /// Parents the control and its helper bones.
    pub(crate) fn parent_control(&mut self, id: NodeId) -> Result<(), RigError> {
        if !self.net.is_master(id) {
            return Ok(());
        }
        let state = self.net.state(id);
        let control = state
            .control_bone
            .unwrap_or_else(|| panic!("{id:?} parented before generation"));

        if let Some(mix) = state.mix_parent_bone {
            self.store
                .set_parent(control, Some(mix), Some(InheritScale::Average));
            self.disable_auto_parent(mix);
        } else {
            let target = self.output_bone(state.node_parent_list[0])?;
            self.store
                .set_parent(control, Some(target), Some(InheritScale::Average));
        }

        let state = self.net.state(id);
        if let Some(weak) = state.weak_parent_bone {
            let node_parent = self.net.control(id).node_parent;
            if let Some(node_parent) = node_parent {
                let target = self.output_bone(node_parent)?;
                let mode = self.parents.inherit_scale_mode(node_parent);
                self.store.set_parent(weak, Some(target), Some(mode));
            }
        }

        let state = self.net.state(id);
        let reparents: Vec<(ParentId, BoneId)> = state
            .reparent_requests
            .iter()
            .filter_map(|p| state.reparent_bone(*p).map(|b| (*p, b)))
            .filter(|(_, bone)| *bone != control)
            .collect();
        for (parent, bone) in reparents {
            let target = self.output_bone(parent)?;
            self.store
                .set_parent(bone, Some(target), Some(InheritScale::Average));
        }
        Ok(())
    }

    /// Locks scale and assigns visibility layers.
    ///
    /// The master replaces the control's layers and every other member adds
    /// to them, so masters must run first.
    pub(crate) fn configure_control(&mut self, id: NodeId) {
        let Some(control) = self.net.control_bone(id) else {
            return;
        };
        let is_master = self.net.is_master(id);
        if is_master {
            let allow_scale = self
                .net
                .siblings(id)
                .iter()
                .any(|s| self.net.control(*s).allow_scale);
            if !allow_scale {
                self.store.lock_scale(control, true);
            }
        }

        let node = self.net.control(id);
        if let Some(layers) = self.rigs.get(node.rig).get_control_node_layers(node) {
            self.store.set_layers(control, layers, !is_master);
        }
    }

    /// Adds the mix blend, rig extensions and reparent copies.
    pub(crate) fn rig_control(&mut self, id: NodeId) -> Result<(), RigError> {
        if !self.net.is_master(id) {
            return Ok(());
        }
        let state = self.net.state(id);
        let control = state
            .control_bone
            .unwrap_or_else(|| panic!("{id:?} rigged before generation"));

        if let Some(mix) = state.mix_parent_bone {
            let list = state.node_parent_list.clone();
            assert!(!list.is_empty(), "mix parent of {id:?} has no targets");
            let weight = 1.0 / list.len() as f64;
            let mut targets = Vec::with_capacity(list.len());
            for parent in list {
                targets.push((self.output_bone(parent)?, weight));
            }
            self.store.add_constraint(
                mix,
                Constraint::new(ConstraintKind::Armature {
                    targets,
                    preserve_volume: true,
                }),
            );
        }

        let rigs = self.rigs;
        let ancestors = rigs.ancestors(self.net.control(id).rig);
        for &rig in ancestors.iter().rev() {
            let mut ctx = self.rig_context();
            rigs.get(rig).extend_control_node_rig(id, &mut ctx)?;
        }

        let state = self.net.state(id);
        let mut source = control;
        if let Some(weak) = state.weak_parent_bone {
            source = weak;
            self.store.add_constraint(
                weak,
                Constraint::new(ConstraintKind::CopyTransforms {
                    target: control,
                    space: Space::Local,
                }),
            );
            self.store.set_widget_transform(control, weak);
        }

        let state = self.net.state(id);
        let reparents: Vec<BoneId> = state
            .reparent_requests
            .iter()
            .filter_map(|p| state.reparent_bone(*p))
            .filter(|bone| *bone != control)
            .collect();
        for bone in reparents {
            self.store.add_constraint(
                bone,
                Constraint::new(ConstraintKind::CopyTransforms {
                    target: source,
                    space: Space::World,
                }),
            );
        }
        Ok(())
    }

    /// Assigns the control widget.
    ///
    /// The sibling with the highest layer decides (ties go to the higher
    /// icon): tweak icons get a sphere, pivots and free controls a cube,
    /// custom icons are drawn by the owning rig.
    pub(crate) fn widget_control(&mut self, id: NodeId) {
        if !self.net.is_master(id) {
            return;
        }
        let Some(control) = self.net.control_bone(id) else {
            return;
        };
        let best = self
            .net
            .siblings(id)
            .iter()
            .map(|s| self.net.control(*s))
            .min_by_key(|s| Reverse((s.layer, s.icon)))
            .unwrap_or_else(|| self.net.control(id));
        match best.icon {
            ControlIcon::Tweak => self.store.set_widget(control, WidgetShape::Sphere),
            ControlIcon::MiddlePivot | ControlIcon::Free => {
                self.store.set_widget(control, WidgetShape::Cube);
            }
            ControlIcon::Custom => {
                self.rigs
                    .get(best.rig)
                    .make_control_node_widget(best, control, self.store);
            }
        }
    }
}
