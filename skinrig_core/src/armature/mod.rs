// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory armature model.
//!
//! The generator never talks to the host application directly. Every bone it
//! creates, every parent link, constraint, driver and widget lands in a
//! [`BoneStore`], which a [`Host`](crate::host::Host) later applies to the
//! real scene. Each bone has:
//!
//! - An identity ([`BoneId`]) and a unique name.
//! - Topology: parent, first-child, and sibling links forming an ordered
//!   tree, plus the [`InheritScale`] mode of the parent link.
//! - A rest pose: [`matrix`](BoneStore::matrix) and
//!   [`length`](BoneStore::length). The head is the matrix translation and
//!   the tail lies along the local Y axis.
//! - Pose settings: scale lock, visibility [`LayerMask`], a [`Constraint`]
//!   stack, [`Driver`]s, and an optional [`WidgetShape`].
//!
//! Bones are stored in struct-of-arrays layout with index-based handles.

mod id;
mod mechanism;
mod store;
mod traverse;

pub use id::{BoneId, INVALID, LayerMask};
pub use mechanism::{
    Constraint, ConstraintKind, DistanceMode, Driver, DriverChannel, DriverVariable,
    InheritScale, LimitDistance, Space, TransformChannel, TransformSpace, WidgetShape,
};
pub use store::{BoneStore, ROOT_NAME};
pub use traverse::{Ancestors, Children};
