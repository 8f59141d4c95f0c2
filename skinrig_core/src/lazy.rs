// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred values and late-bound bone references.
//!
//! Rigs describe mechanisms during initialization, long before the bones
//! those mechanisms point at exist. A [`BoneRef`] names a bone by *how to find
//! it* (a node's control bone, a parent generator's output) and is resolved
//! against a [`Scene`] at the point of use. A [`Deferred`] wraps any other
//! value that can only be computed later.
//!
//! Resolution is never cached: each stage forces its references again, so a
//! reference always reflects the latest state of the generator.

use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;

use crate::armature::{BoneId, BoneStore};
use crate::error::RigError;
use crate::node::{ControlNet, NodeId};
use crate::parent::{ParentArena, ParentId};

/// Read-only view of everything a reference can resolve against.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    /// Generated and pre-existing bones.
    pub store: &'a BoneStore,
    /// Control nodes and their clusters.
    pub net: &'a ControlNet,
    /// Parent generators.
    pub parents: &'a ParentArena,
}

impl Scene<'_> {
    /// Resolves `bone` to a concrete bone.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::UnknownBone`] if a [`BoneRef::Named`] bone does not
    /// exist.
    ///
    /// # Panics
    ///
    /// Panics if the reference points at a bone that has not been generated
    /// yet.
    pub fn resolve(&self, bone: &BoneRef) -> Result<BoneId, RigError> {
        match bone {
            BoneRef::Bone(id) => Ok(*id),
            BoneRef::Named(name) => self
                .store
                .find(name)
                .ok_or_else(|| RigError::UnknownBone { name: name.clone() }),
            BoneRef::Control(node) => Ok(self
                .net
                .control_bone(*node)
                .unwrap_or_else(|| panic!("control bone of {node:?} resolved before generation"))),
            BoneRef::Reparent(node) => Ok(self
                .net
                .reparent_bone(*node)
                .unwrap_or_else(|| panic!("reparent bone of {node:?} resolved before generation"))),
            BoneRef::Output(parent) => self.parents.output_bone(*parent, self),
        }
    }
}

/// A bone that may not exist yet.
///
/// Equality is structural: two references are equal when they describe the
/// same lookup, which is what parent interning compares.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoneRef {
    /// An existing bone.
    Bone(BoneId),
    /// A bone looked up by name at resolution time.
    Named(String),
    /// The control bone of a node's cluster.
    Control(NodeId),
    /// The reparent bone generated for a node's own parent.
    Reparent(NodeId),
    /// The output bone of a parent generator.
    Output(ParentId),
}

impl From<BoneId> for BoneRef {
    fn from(id: BoneId) -> Self {
        Self::Bone(id)
    }
}

/// A value computed on demand from the scene.
pub enum Deferred<T> {
    /// Already known.
    Ready(T),
    /// Computed each time it is forced.
    Lazy(Rc<dyn Fn(&Scene<'_>) -> T>),
}

impl<T: Clone> Deferred<T> {
    /// Wraps a callback.
    pub fn lazy(f: impl Fn(&Scene<'_>) -> T + 'static) -> Self {
        Self::Lazy(Rc::new(f))
    }

    /// Produces the value.
    #[must_use]
    pub fn force(&self, scene: &Scene<'_>) -> T {
        match self {
            Self::Ready(value) => value.clone(),
            Self::Lazy(f) => f(scene),
        }
    }
}

impl<T: Clone> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Ready(value) => Self::Ready(value.clone()),
            Self::Lazy(f) => Self::Lazy(Rc::clone(f)),
        }
    }
}

/// Ready values compare by value, callbacks by identity.
impl<T: PartialEq> PartialEq for Deferred<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Ready(a), Self::Ready(b)) => a == b,
            (Self::Lazy(a), Self::Lazy(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl<T> From<T> for Deferred<T> {
    fn from(value: T) -> Self {
        Self::Ready(value)
    }
}
