// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Control-node merging and parent mechanisms for procedural skin rigs.
//!
//! `skinrig_core` lets many independent rigs ask for controls at points on a
//! surface and turns those requests into one consistent armature. Controls
//! requested at the same point merge into a single bone; the parent each
//! requester wanted is built as a composable *parent generator* and shared
//! between requesters when structurally equal. It is `no_std` compatible
//! (with `alloc`) and keeps bones, nodes and generators in arenas with index
//! handles.
//!
//! # Architecture
//!
//! A pass runs the rigs of a [`RigTree`](rig::RigTree) through fixed stages:
//!
//! ```text
//!   SkinRig::init_control_nodes ──► ControlNet
//!                                       │ merge by point
//!                                       ▼
//!   masters ──► ParentScope hooks ──► ParentArena (interned, frozen)
//!                                       │ enable (ENABLED channel)
//!                                       ▼
//!   generate ─► parent ─► configure ─► rig ─► widgets ──► BoneStore
//!                                                            │
//!                                                            ▼
//!                                                      Host::apply()
//! ```
//!
//! **[`armature`]**: Struct-of-arrays bone store with constraints, drivers
//! and widgets. The generator only ever writes here.
//!
//! **[`node`]**: Control and query nodes, clustering by point, mirror
//! grouping and the per-cluster build of control, mix, reparent and weak
//! parent bones.
//!
//! **[`parent`]**: Org, armature, layer and offset parent generators,
//! structural interning, offset collapsing and driver expression merging.
//!
//! **[`rig`]**: The [`SkinRig`](rig::SkinRig) capability trait and the rig
//! tree.
//!
//! **[`generator`]**: [`RigGenerator`](generator::RigGenerator), which runs
//! the stages.
//!
//! **[`lazy`]**: Late-bound bone references and deferred values.
//!
//! **[`naming`]**: Side-aware bone name parsing and derivation.
//!
//! **[`dirty`]**: Dirty-tracking channel used to enable generators through
//! wrapper chains.
//!
//! **[`host`]**: The [`Host`](host::Host) trait integrations implement to
//! write the result into a real scene.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types
//! with a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod armature;
pub mod dirty;
pub mod error;
pub mod generator;
pub mod host;
pub mod lazy;
pub mod math;
pub mod naming;
pub mod node;
pub mod options;
pub mod parent;
pub mod rig;
pub mod stage;
pub mod trace;
