// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for a generation pass.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`RigGenerator`](crate::generator::RigGenerator) calls as it merges
//! nodes, interns parents, and creates bones. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).

use crate::armature::BoneId;
use crate::node::NodeId;
use crate::parent::{ParentId, ParentType};
use crate::stage::Stage;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a bone was created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoneRole {
    /// The user-facing bone of a merge cluster.
    Control,
    /// Blend bone between several sibling parents.
    MixParent,
    /// Conversion bone expressing the control in another parent's space.
    Reparent,
    /// Bone keeping the transform from before a weak parent layer.
    WeakParent,
    /// Mechanism bone of an armature parent.
    ArmatureParent,
    /// Mechanism bone of an offset parent.
    Offset,
}

impl BoneRole {
    /// The `snake_case` name of the role.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::MixParent => "mix_parent",
            Self::Reparent => "reparent",
            Self::WeakParent => "weak_parent",
            Self::ArmatureParent => "armature_parent",
            Self::Offset => "offset",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning or end of a stage.
#[derive(Clone, Copy, Debug)]
pub struct StageEvent {
    /// Which stage.
    pub stage: Stage,
}

/// Emitted once per merge cluster after the clustering pass.
#[derive(Clone, Copy, Debug)]
pub struct ClusterEvent<'a> {
    /// The elected master.
    pub master: NodeId,
    /// The master's original name.
    pub name: &'a str,
    /// Number of control nodes in the cluster, master included.
    pub members: u32,
    /// Number of mirror siblings of the master, itself included.
    pub mirrors: u32,
}

/// Emitted when a freshly built parent generator is interned.
#[derive(Clone, Copy, Debug)]
pub struct InternEvent {
    /// The surviving generator.
    pub parent: ParentId,
    /// The node the parent was built for.
    pub node: NodeId,
    /// Whether an equal generator already existed in the cluster cache.
    pub reused: bool,
}

/// Emitted for every generator that takes part in bone generation.
#[derive(Clone, Copy, Debug)]
pub struct EnableEvent {
    /// The enabled generator.
    pub parent: ParentId,
    /// Its variant.
    pub kind: ParentType,
    /// Number of generators it wraps.
    pub depth: u32,
}

/// Emitted when an offset generator absorbs the offset it wraps.
#[derive(Clone, Copy, Debug)]
pub struct CollapseEvent {
    /// The outer generator, which keeps the merged contents.
    pub into: ParentId,
    /// The inner generator, no longer used.
    pub absorbed: ParentId,
}

/// Emitted for every generated bone.
#[derive(Clone, Copy, Debug)]
pub struct BoneEvent<'a> {
    /// The new bone.
    pub bone: BoneId,
    /// Its final, unique name.
    pub name: &'a str,
    /// Why it was created.
    pub role: BoneRole,
}

/// Emitted when an offset generator reuses its parent's bone in place.
#[derive(Clone, Copy, Debug)]
pub struct ReuseEvent {
    /// The offset generator.
    pub parent: ParentId,
    /// The reused bone.
    pub bone: BoneId,
}

/// Totals for a finished generation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Control nodes created by rigs.
    pub control_nodes: u32,
    /// Query nodes created by rigs.
    pub query_nodes: u32,
    /// Merge clusters (one per master).
    pub clusters: u32,
    /// Distinct parent generators kept after interning.
    pub parents_interned: u32,
    /// Parent requests answered by an existing equal generator.
    pub parents_reused: u32,
    /// Generators enabled for bone generation.
    pub parents_enabled: u32,
    /// Offset generators absorbed into their wrappers.
    pub collapses: u32,
    /// Bones created during the pass.
    pub bones_created: u32,
    /// Bones reused in place by offset generators.
    pub bones_reused: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a generation pass.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the beginning of a stage.
    fn on_stage_begin(&mut self, e: &StageEvent) {
        _ = e;
    }

    /// Called at the end of a stage.
    fn on_stage_end(&mut self, e: &StageEvent) {
        _ = e;
    }

    /// Called once per merge cluster.
    fn on_cluster(&mut self, e: &ClusterEvent<'_>) {
        _ = e;
    }

    /// Called when a parent generator is interned.
    fn on_intern(&mut self, e: &InternEvent) {
        _ = e;
    }

    /// Called when a parent generator is enabled.
    fn on_enable(&mut self, e: &EnableEvent) {
        _ = e;
    }

    /// Called when offset generators collapse.
    fn on_collapse(&mut self, e: &CollapseEvent) {
        _ = e;
    }

    /// Called when a bone is created.
    fn on_bone(&mut self, e: &BoneEvent<'_>) {
        _ = e;
    }

    /// Called when a bone is reused in place.
    fn on_reuse(&mut self, e: &ReuseEvent) {
        _ = e;
    }

    /// Called with the pass totals.
    fn on_summary(&mut self, s: &GenerationSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $event:expr) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($event);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $event;
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a stage-begin [`StageEvent`].
    #[inline]
    pub fn stage_begin(&mut self, e: &StageEvent) {
        dispatch!(self, on_stage_begin, e);
    }

    /// Emits a stage-end [`StageEvent`].
    #[inline]
    pub fn stage_end(&mut self, e: &StageEvent) {
        dispatch!(self, on_stage_end, e);
    }

    /// Emits a [`ClusterEvent`].
    #[inline]
    pub fn cluster(&mut self, e: &ClusterEvent<'_>) {
        dispatch!(self, on_cluster, e);
    }

    /// Emits an [`InternEvent`].
    #[inline]
    pub fn intern(&mut self, e: &InternEvent) {
        dispatch!(self, on_intern, e);
    }

    /// Emits an [`EnableEvent`].
    #[inline]
    pub fn enable(&mut self, e: &EnableEvent) {
        dispatch!(self, on_enable, e);
    }

    /// Emits a [`CollapseEvent`].
    #[inline]
    pub fn collapse(&mut self, e: &CollapseEvent) {
        dispatch!(self, on_collapse, e);
    }

    /// Emits a [`BoneEvent`].
    #[inline]
    pub fn bone(&mut self, e: &BoneEvent<'_>) {
        dispatch!(self, on_bone, e);
    }

    /// Emits a [`ReuseEvent`].
    #[inline]
    pub fn reuse(&mut self, e: &ReuseEvent) {
        dispatch!(self, on_reuse, e);
    }

    /// Emits a [`GenerationSummary`].
    #[inline]
    pub fn summary(&mut self, s: &GenerationSummary) {
        dispatch!(self, on_summary, s);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_stage_begin(&StageEvent {
            stage: Stage::Initialize,
        });
        sink.on_summary(&GenerationSummary::default());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.stage_begin(&StageEvent {
            stage: Stage::RigBones,
        });
        tracer.bone(&BoneEvent {
            bone: BoneId(1),
            name: "lip.L",
            role: BoneRole::Control,
        });
    }

    #[test]
    fn role_names() {
        assert_eq!(BoneRole::MixParent.name(), "mix_parent");
        assert_eq!(BoneRole::ArmatureParent.name(), "armature_parent");
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            stages: Vec<Stage>,
        }
        impl TraceSink for RecordingSink {
            fn on_stage_end(&mut self, e: &StageEvent) {
                self.stages.push(e.stage);
            }
        }

        let mut sink = RecordingSink { stages: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.stage_end(&StageEvent {
            stage: Stage::ParentBones,
        });
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.stages, &[Stage::ParentBones]);
    }
}
