// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parent generators: composable descriptions of how a control's transform
//! derives from other bones.
//!
//! Generators live in a [`ParentArena`] and are addressed by [`ParentId`].
//! Rigs build them through a [`ParentScope`] while control nodes initialize;
//! the owning cluster then *interns* each result so that structurally equal
//! requests share one generator and one set of mechanism bones.
//!
//! # Variants
//!
//! - **Org** wraps a fixed bone and is always frozen.
//! - **Armature** creates one mechanism bone parented to (or blended
//!   between) target bones.
//! - **Layer** / **Weak layer** are transparent wrappers around another
//!   generator. [`ParentArena::strip_weak`] unwraps weak layers.
//! - **Offset** accumulates local-location copies, location drivers and
//!   distance limits on top of the generator it wraps. See [`OffsetParent`].
//!
//! # Enabling
//!
//! Only generators a master actually uses take part in bone generation.
//! [`ParentArena::enable`] collapses unfrozen inner offsets into their
//! wrapper, records wrapped→wrapper dependencies on the
//! [`ENABLED`](crate::dirty::ENABLED) channel and marks the generator; once
//! every master has enabled its parents the channel is drained into the
//! innermost-first list the late stages iterate.

mod driver;
mod offset;
mod stages;
mod template;

pub use driver::{CompiledDriver, DriverTerm, ExpressionError, compile_driver};
pub use offset::{CopyLocal, Influence, LocationDrivers, OffsetParent, OffsetVariable};
pub use template::{Template, TemplateError};

use alloc::vec::Vec;
use core::fmt;

use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::armature::{BoneId, BoneStore, InheritScale};
use crate::dirty;
use crate::error::RigError;
use crate::lazy::{BoneRef, Deferred, Scene};
use crate::math::Quat;
use crate::node::{ControlNet, NodeId};
use crate::rig::{RigId, RigTree};

/// A handle to a generator in a [`ParentArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParentId(pub(crate) u32);

impl ParentId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ParentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParentId({})", self.0)
    }
}

/// The variant of a generator, without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParentType {
    /// Fixed bone.
    Org,
    /// Armature mechanism bone.
    Armature,
    /// Transparent wrapper.
    Layer,
    /// Transparent wrapper that consumers may strip.
    WeakLayer,
    /// Accumulating local offset.
    Offset,
}

impl ParentType {
    /// The `snake_case` name of the variant.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Org => "org",
            Self::Armature => "armature",
            Self::Layer => "layer",
            Self::WeakLayer => "weak_layer",
            Self::Offset => "offset",
        }
    }
}

/// One target of an [`ArmatureParent`].
#[derive(Clone, Debug, PartialEq)]
pub struct ArmatureTarget {
    /// Bone to follow.
    pub bone: BoneRef,
    /// Blend weight; targets without one share the remainder equally.
    pub weight: Option<f64>,
}

impl From<BoneRef> for ArmatureTarget {
    fn from(bone: BoneRef) -> Self {
        Self { bone, weight: None }
    }
}

impl From<BoneId> for ArmatureTarget {
    fn from(bone: BoneId) -> Self {
        BoneRef::Bone(bone).into()
    }
}

/// Payload of an armature generator.
#[derive(Clone, Debug, PartialEq)]
pub struct ArmatureParent {
    /// Bones the mechanism bone follows.
    pub targets: Vec<ArmatureTarget>,
    /// Rest orientation of the mechanism bone; the control's by default.
    pub orientation: Option<Deferred<Quat>>,
    /// Bone whose scale is copied on top of the parenting.
    pub copy_scale: Option<BoneRef>,
    /// Bone whose rotation is copied on top of the parenting.
    pub copy_rotation: Option<BoneRef>,
}

impl ArmatureParent {
    /// An armature parent over `targets`.
    #[must_use]
    pub fn new(targets: impl IntoIterator<Item = ArmatureTarget>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            orientation: None,
            copy_scale: None,
            copy_rotation: None,
        }
    }

    /// Sets the mechanism bone orientation.
    #[must_use]
    pub fn with_orientation(mut self, orientation: impl Into<Deferred<Quat>>) -> Self {
        self.orientation = Some(orientation.into());
        self
    }

    /// Copies scale from `bone`.
    #[must_use]
    pub fn with_copy_scale(mut self, bone: impl Into<BoneRef>) -> Self {
        self.copy_scale = Some(bone.into());
        self
    }

    /// Copies rotation from `bone`.
    #[must_use]
    pub fn with_copy_rotation(mut self, bone: impl Into<BoneRef>) -> Self {
        self.copy_rotation = Some(bone.into());
        self
    }

    fn has_copy(&self) -> bool {
        self.copy_scale.is_some() || self.copy_rotation.is_some()
    }
}

/// Payload of a layer generator.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerParent {
    /// The wrapped generator.
    pub wrapped: ParentId,
    /// Whether consumers may strip this layer.
    pub weak: bool,
    /// Replaces the wrapped output bone when set.
    pub output: Option<BoneRef>,
    /// Scale inheritance used when a weak-parent bone is parented here.
    pub inherit_scale: InheritScale,
}

/// The variant-specific part of a [`ParentGenerator`].
#[derive(Clone, Debug)]
pub enum ParentKind {
    /// A fixed bone.
    Org(BoneRef),
    /// An armature mechanism bone.
    Armature(ArmatureParent),
    /// A transparent wrapper.
    Layer(LayerParent),
    /// An accumulating offset.
    Offset(OffsetParent),
}

impl ParentKind {
    /// The variant tag.
    #[must_use]
    pub fn kind(&self) -> ParentType {
        match self {
            Self::Org(_) => ParentType::Org,
            Self::Armature(_) => ParentType::Armature,
            Self::Layer(layer) if layer.weak => ParentType::WeakLayer,
            Self::Layer(_) => ParentType::Layer,
            Self::Offset(_) => ParentType::Offset,
        }
    }

    fn wrapped(&self) -> Option<ParentId> {
        match self {
            Self::Layer(layer) => Some(layer.wrapped),
            Self::Offset(offset) => Some(offset.wrapped),
            Self::Org(_) | Self::Armature(_) => None,
        }
    }

    fn set_wrapped(&mut self, id: ParentId) {
        match self {
            Self::Layer(layer) => layer.wrapped = id,
            Self::Offset(offset) => offset.wrapped = id,
            Self::Org(_) | Self::Armature(_) => {
                unreachable!("only wrapping generators have a wrapped parent")
            }
        }
    }
}

/// A parent generator and its generation state.
#[derive(Clone, Debug)]
pub struct ParentGenerator {
    pub(crate) rig: Option<RigId>,
    pub(crate) node: Option<NodeId>,
    pub(crate) frozen: bool,
    pub(crate) kind: ParentKind,
    pub(crate) bones: Vec<BoneId>,
    pub(crate) reuse: bool,
}

impl ParentGenerator {
    /// The payload.
    #[must_use]
    pub fn kind(&self) -> &ParentKind {
        &self.kind
    }

    /// The rig that built the generator; `None` for org parents.
    #[must_use]
    pub fn rig(&self) -> Option<RigId> {
        self.rig
    }

    /// The node the generator was built for; `None` for org parents.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Whether the generator may no longer absorb or be absorbed.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Mechanism bones generated (or reused) for this generator.
    #[must_use]
    pub fn bones(&self) -> &[BoneId] {
        &self.bones
    }

    /// Whether an offset generator reused its wrapped parent's bone.
    #[must_use]
    pub fn is_reusing(&self) -> bool {
        self.reuse
    }
}

/// Arena of every generator built during a pass.
#[derive(Debug)]
pub struct ParentArena {
    gens: Vec<ParentGenerator>,
    dirty: DirtyTracker<u32>,
    enabled: Vec<ParentId>,
}

impl Default for ParentArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ParentArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gens: Vec::new(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            enabled: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, rig: Option<RigId>, node: Option<NodeId>, kind: ParentKind) -> ParentId {
        if let Some(wrapped) = kind.wrapped() {
            self.validate(wrapped);
        }
        let frozen = match &kind {
            ParentKind::Org(_) => true,
            ParentKind::Armature(arm) => arm.has_copy(),
            ParentKind::Layer(_) | ParentKind::Offset(_) => false,
        };
        let id = ParentId(u32::try_from(self.gens.len()).unwrap_or(u32::MAX));
        self.gens.push(ParentGenerator {
            rig,
            node,
            frozen,
            kind,
            bones: Vec::new(),
            reuse: false,
        });
        id
    }

    /// Returns a generator.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a generator of this arena.
    #[must_use]
    pub fn get(&self, id: ParentId) -> &ParentGenerator {
        self.validate(id);
        &self.gens[id.0 as usize]
    }

    pub(crate) fn get_mut(&mut self, id: ParentId) -> &mut ParentGenerator {
        self.validate(id);
        &mut self.gens[id.0 as usize]
    }

    /// Number of generators, including ones discarded by interning.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gens.len()
    }

    /// Whether no generator was built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gens.is_empty()
    }

    /// The variant tag of a generator.
    #[must_use]
    pub fn kind(&self, id: ParentId) -> ParentType {
        self.get(id).kind.kind()
    }

    /// The generator wrapped by a layer or offset.
    #[must_use]
    pub fn wrapped(&self, id: ParentId) -> Option<ParentId> {
        self.get(id).kind.wrapped()
    }

    pub(crate) fn set_wrapped(&mut self, id: ParentId, wrapped: ParentId) {
        self.validate(wrapped);
        self.get_mut(id).kind.set_wrapped(wrapped);
    }

    /// Marks a generator as frozen.
    pub fn freeze(&mut self, id: ParentId) {
        self.get_mut(id).frozen = true;
    }

    /// Unwraps any chain of weak layers.
    #[must_use]
    pub fn strip_weak(&self, mut id: ParentId) -> ParentId {
        while let ParentKind::Layer(LayerParent {
            weak: true,
            wrapped,
            ..
        }) = &self.get(id).kind
        {
            id = *wrapped;
        }
        id
    }

    /// Number of generators below `id` in its wrapper chain.
    #[must_use]
    pub fn depth(&self, mut id: ParentId) -> u32 {
        let mut depth = 0;
        while let Some(wrapped) = self.wrapped(id) {
            depth += 1;
            id = wrapped;
        }
        depth
    }

    /// Scale inheritance for a bone parented directly to this generator's
    /// output.
    #[must_use]
    pub fn inherit_scale_mode(&self, id: ParentId) -> InheritScale {
        match &self.get(id).kind {
            ParentKind::Layer(layer) => layer.inherit_scale,
            _ => InheritScale::Full,
        }
    }

    /// Structural equality, as used by interning.
    ///
    /// Org parents compare their bone. Armature parents also require their
    /// nodes to sit at the same point. Wrappers compare the wrapped
    /// generators recursively; offsets compare their accumulated contents
    /// independent of insertion order.
    #[must_use]
    pub fn equal(&self, a: ParentId, b: ParentId, net: &ControlNet) -> bool {
        if a == b {
            return true;
        }
        let (ga, gb) = (self.get(a), self.get(b));
        match (&ga.kind, &gb.kind) {
            (ParentKind::Org(x), ParentKind::Org(y)) => x == y,
            (ParentKind::Armature(x), ParentKind::Armature(y)) => {
                let same_point = match (ga.node, gb.node) {
                    (Some(na), Some(nb)) => net.point(na) == net.point(nb),
                    _ => ga.node == gb.node,
                };
                same_point && x == y
            }
            (ParentKind::Layer(x), ParentKind::Layer(y)) => {
                x.weak == y.weak
                    && x.output == y.output
                    && x.inherit_scale == y.inherit_scale
                    && ga.rig == gb.rig
                    && self.equal(x.wrapped, y.wrapped, net)
            }
            (ParentKind::Offset(x), ParentKind::Offset(y)) => {
                x.same_contents(y) && self.equal(x.wrapped, y.wrapped, net)
            }
            _ => false,
        }
    }

    /// Enables `id` and everything it wraps.
    ///
    /// Unfrozen offsets directly below an offset are absorbed into it first.
    /// Returns the `(into, absorbed)` pairs of every such collapse.
    pub fn enable(&mut self, id: ParentId) -> Vec<(ParentId, ParentId)> {
        let mut collapses = Vec::new();
        let mut current = id;
        loop {
            self.collapse_offsets(current, &mut collapses);
            let Some(wrapped) = self.wrapped(current) else {
                break;
            };
            let _ = self
                .dirty
                .add_dependency(wrapped.0, current.0, dirty::ENABLED);
            current = wrapped;
        }
        self.dirty.mark_with(id.0, dirty::ENABLED, &EagerPolicy);
        collapses
    }

    fn collapse_offsets(&mut self, id: ParentId, collapses: &mut Vec<(ParentId, ParentId)>) {
        if !matches!(self.get(id).kind, ParentKind::Offset(_)) {
            return;
        }
        loop {
            let Some(inner) = self.wrapped(id) else {
                return;
            };
            let inner_gen = self.get(inner);
            let ParentKind::Offset(inner_offset) = &inner_gen.kind else {
                return;
            };
            if inner_gen.frozen {
                return;
            }
            let inner_offset = inner_offset.clone();
            if let ParentKind::Offset(outer) = &mut self.get_mut(id).kind {
                outer.prepend_contents(&inner_offset);
                outer.wrapped = inner_offset.wrapped;
            }
            collapses.push((id, inner));
        }
    }

    /// Drains the enabled set into an innermost-first list and returns it.
    ///
    /// Org parents have nothing to generate and are left out.
    pub(crate) fn drain_enabled(&mut self) -> &[ParentId] {
        let drained: Vec<u32> = self
            .dirty
            .drain(dirty::ENABLED)
            .affected()
            .deterministic()
            .run()
            .collect();
        let mut enabled: Vec<ParentId> = drained
            .into_iter()
            .map(ParentId)
            .filter(|id| self.kind(*id) != ParentType::Org)
            .collect();
        enabled.sort_by_key(|id| (self.depth(*id), *id));
        self.enabled = enabled;
        &self.enabled
    }

    /// Generators taking part in bone generation, innermost first.
    #[must_use]
    pub fn enabled(&self) -> &[ParentId] {
        &self.enabled
    }

    /// Resolves the bone a child of this generator should be parented to.
    ///
    /// # Errors
    ///
    /// Propagates resolution errors of referenced bones.
    ///
    /// # Panics
    ///
    /// Panics if an armature generator is asked before generating its bone.
    pub fn output_bone(&self, id: ParentId, scene: &Scene<'_>) -> Result<BoneId, RigError> {
        let generator = self.get(id);
        match &generator.kind {
            ParentKind::Org(bone) => scene.resolve(bone),
            ParentKind::Armature(_) => Ok(*generator
                .bones
                .first()
                .unwrap_or_else(|| panic!("output of {id:?} resolved before generation"))),
            ParentKind::Layer(layer) => match &layer.output {
                Some(bone) => scene.resolve(bone),
                None => self.output_bone(layer.wrapped, scene),
            },
            ParentKind::Offset(offset) => match generator.bones.last() {
                Some(bone) => Ok(*bone),
                None => self.output_bone(offset.wrapped, scene),
            },
        }
    }

    fn validate(&self, id: ParentId) {
        assert!(
            (id.0 as usize) < self.gens.len(),
            "unknown ParentId: {id:?} (len {})",
            self.gens.len()
        );
    }
}

/// Building context handed to rig parent hooks.
///
/// A scope is tied to one node and to the rig whose hook is currently
/// running; generators it creates are attributed to that rig.
#[derive(Debug)]
pub struct ParentScope<'a> {
    pub(crate) rigs: &'a RigTree,
    pub(crate) parents: &'a mut ParentArena,
    pub(crate) net: &'a ControlNet,
    pub(crate) store: &'a BoneStore,
    pub(crate) node: NodeId,
    pub(crate) rig: RigId,
}

impl ParentScope<'_> {
    /// The node the parent is built for.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The rig whose hook is running.
    #[must_use]
    pub fn rig(&self) -> RigId {
        self.rig
    }

    /// The control net.
    #[must_use]
    pub fn net(&self) -> &ControlNet {
        self.net
    }

    /// The armature.
    #[must_use]
    pub fn store(&self) -> &BoneStore {
        self.store
    }

    /// Generators built so far.
    #[must_use]
    pub fn arena(&self) -> &ParentArena {
        self.parents
    }

    /// Asks the parent of the running rig to build a parent on its behalf.
    ///
    /// Top-level rigs fall back to [`default_parent`](Self::default_parent).
    pub fn next_parent(&mut self) -> ParentId {
        let current = self.rig;
        let rigs = self.rigs;
        let result = match rigs.parent(current) {
            Some(parent) => {
                self.rig = parent;
                rigs.get(parent).build_control_node_parent(self, current)
            }
            None => self.default_parent(current),
        };
        self.rig = current;
        result
    }

    /// An org parent on the bone above `rig`'s base bone (the armature root
    /// when there is none).
    pub fn default_parent(&mut self, rig: RigId) -> ParentId {
        let base = self.rigs.get(rig).base_bone();
        let bone = self.store.parent(base).unwrap_or(self.store.root());
        self.org(bone)
    }

    /// An org parent on `bone`.
    pub fn org(&mut self, bone: impl Into<BoneRef>) -> ParentId {
        self.parents.add(None, None, ParentKind::Org(bone.into()))
    }

    /// An armature parent.
    pub fn armature(&mut self, armature: ArmatureParent) -> ParentId {
        self.parents.add(
            Some(self.rig),
            Some(self.node),
            ParentKind::Armature(armature),
        )
    }

    /// A transparent layer over `wrapped`, optionally with its own output.
    pub fn layer(&mut self, wrapped: ParentId, output: Option<BoneRef>) -> ParentId {
        self.add_layer(wrapped, output, false, InheritScale::Full)
    }

    /// A weak layer over `wrapped`; bones parented across it inherit the
    /// average scale.
    pub fn weak_layer(&mut self, wrapped: ParentId, output: Option<BoneRef>) -> ParentId {
        self.add_layer(wrapped, output, true, InheritScale::Average)
    }

    fn add_layer(
        &mut self,
        wrapped: ParentId,
        output: Option<BoneRef>,
        weak: bool,
        inherit_scale: InheritScale,
    ) -> ParentId {
        self.parents.add(
            Some(self.rig),
            Some(self.node),
            ParentKind::Layer(LayerParent {
                wrapped,
                weak,
                output,
                inherit_scale,
            }),
        )
    }

    /// An empty offset over `wrapped`.
    pub fn offset(&mut self, wrapped: ParentId) -> ParentId {
        self.parents.add(
            Some(self.rig),
            Some(self.node),
            ParentKind::Offset(OffsetParent::new(wrapped)),
        )
    }

    /// Wraps `parent` in an offset unless it already is an unfrozen one, and
    /// returns the offset.
    pub fn ensure_offset(&mut self, parent: ParentId) -> ParentId {
        let generator = self.parents.get(parent);
        if matches!(generator.kind, ParentKind::Offset(_)) && !generator.frozen {
            parent
        } else {
            self.offset(parent)
        }
    }

    /// The contents of an offset generator.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not an offset or is already frozen.
    pub fn offset_mut(&mut self, id: ParentId) -> &mut OffsetParent {
        let generator = self.parents.get_mut(id);
        assert!(!generator.frozen, "{id:?} is frozen");
        match &mut generator.kind {
            ParentKind::Offset(offset) => offset,
            other => panic!("{id:?} is not an offset but {}", other.kind().name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::armature::{BoneStore, LimitDistance};
    use crate::math::{Transform3d, Vec3};
    use crate::node::{ControlNet, QueryNodeSpec};

    fn arena_with_org() -> (ParentArena, ParentId, ParentId) {
        let mut arena = ParentArena::new();
        let a = arena.add(None, None, ParentKind::Org(BoneRef::Bone(BoneId(1))));
        let b = arena.add(None, None, ParentKind::Org(BoneRef::Bone(BoneId(1))));
        (arena, a, b)
    }

    fn offset(arena: &mut ParentArena, wrapped: ParentId) -> ParentId {
        arena.add(Some(RigId(0)), None, ParentKind::Offset(OffsetParent::new(wrapped)))
    }

    fn offset_contents(arena: &mut ParentArena, id: ParentId) -> &mut OffsetParent {
        match &mut arena.get_mut(id).kind {
            ParentKind::Offset(offset) => offset,
            _ => panic!("not an offset"),
        }
    }

    #[test]
    fn org_parents_are_frozen_and_compare_by_bone() {
        let (mut arena, a, b) = arena_with_org();
        let c = arena.add(None, None, ParentKind::Org(BoneRef::Named("jaw".into())));
        let net = ControlNet::new();
        assert!(arena.get(a).is_frozen());
        assert!(arena.equal(a, b, &net));
        assert!(!arena.equal(a, c, &net));
    }

    #[test]
    fn weak_layers_strip_to_the_real_parent() {
        let (mut arena, org, _) = arena_with_org();
        let weak_over = |wrapped| {
            ParentKind::Layer(LayerParent {
                wrapped,
                weak: true,
                output: None,
                inherit_scale: InheritScale::Average,
            })
        };
        let weak = arena.add(Some(RigId(0)), None, weak_over(org));
        let weaker = arena.add(Some(RigId(0)), None, weak_over(weak));
        assert_eq!(arena.strip_weak(weaker), org);
        assert_eq!(arena.kind(weaker), ParentType::WeakLayer);
        assert_eq!(arena.inherit_scale_mode(weaker), InheritScale::Average);
        assert_eq!(arena.depth(weaker), 2);
    }

    #[test]
    fn offsets_compare_structurally() {
        let (mut arena, a, b) = arena_with_org();
        let net = ControlNet::new();
        let x = offset(&mut arena, a);
        let y = offset(&mut arena, b);
        assert!(arena.equal(x, y, &net));

        offset_contents(&mut arena, x).add_limit_distance(BoneId(2), LimitDistance::INSIDE);
        assert!(!arena.equal(x, y, &net));
        offset_contents(&mut arena, y).add_limit_distance(BoneId(2), LimitDistance::INSIDE);
        assert!(arena.equal(x, y, &net));
    }

    #[test]
    fn enabling_collapses_unfrozen_inner_offsets() {
        let (mut arena, org, _) = arena_with_org();
        let inner = offset(&mut arena, org);
        offset_contents(&mut arena, inner).add_copy_local_location(BoneId(3), Influence::Value(0.5));
        let outer = offset(&mut arena, inner);
        offset_contents(&mut arena, outer).add_copy_local_location(BoneId(3), Influence::Value(0.25));

        let collapses = arena.enable(outer);
        assert_eq!(collapses, vec![(outer, inner)]);
        assert_eq!(arena.wrapped(outer), Some(org));
        let ParentKind::Offset(contents) = arena.get(outer).kind() else {
            panic!("not an offset");
        };
        assert_eq!(contents.copy_local().len(), 1);
        assert_eq!(contents.copy_local()[0].1.influence, 0.75);

        assert_eq!(arena.drain_enabled(), &[outer]);
    }

    #[test]
    fn frozen_inner_offsets_are_kept() {
        let (mut arena, org, _) = arena_with_org();
        let inner = offset(&mut arena, org);
        arena.freeze(inner);
        let outer = offset(&mut arena, inner);

        assert!(arena.enable(outer).is_empty());
        assert_eq!(arena.drain_enabled(), &[inner, outer]);
    }

    #[test]
    fn armature_equality_needs_matching_points() {
        let mut store = BoneStore::new();
        let org = store.add_bone("ORG-lip", Transform3d::from_translation(Vec3::ZERO), 1.0);
        let mut net = ControlNet::new();
        let a_node = net.add_query(RigId(0), QueryNodeSpec::new(org).point(Vec3::ZERO), &store);
        let b_node = net.add_query(
            RigId(0),
            QueryNodeSpec::new(org).point(Vec3::new(0.0, 0.0, 1.0)),
            &store,
        );

        let mut arena = ParentArena::new();
        let spec = ArmatureParent::new([ArmatureTarget::from(org)]);
        let a = arena.add(Some(RigId(0)), Some(a_node), ParentKind::Armature(spec.clone()));
        let b = arena.add(Some(RigId(0)), Some(a_node), ParentKind::Armature(spec.clone()));
        let c = arena.add(Some(RigId(0)), Some(b_node), ParentKind::Armature(spec.clone()));
        assert!(arena.equal(a, b, &net));
        assert!(!arena.equal(a, c, &net));
        assert!(!arena.get(a).is_frozen());

        let frozen = arena.add(
            Some(RigId(0)),
            Some(a_node),
            ParentKind::Armature(spec.with_copy_scale(org)),
        );
        assert!(arena.get(frozen).is_frozen());
    }

    #[test]
    #[should_panic(expected = "unknown ParentId")]
    fn stale_wrapped_panics() {
        let mut arena = ParentArena::new();
        let _ = offset(&mut arena, ParentId(4));
    }
}
