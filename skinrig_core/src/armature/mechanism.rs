// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Constraint, driver and widget descriptions attached to bones.

use alloc::string::String;
use alloc::vec::Vec;

use super::id::BoneId;

/// How a child bone inherits scale from its parent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InheritScale {
    /// Inherit the full parent scale.
    #[default]
    Full,
    /// Inherit scale but remove shear.
    FixShear,
    /// Inherit the average of the parent's axis scales.
    Average,
    /// Ignore parent scale.
    None,
}

/// Coordinate space of a constraint target or owner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Space {
    /// Armature object space.
    #[default]
    World,
    /// Bone local space.
    Local,
    /// Target local space rotated into the owner's rest orientation.
    LocalOwnerOrient,
    /// Owner local space.
    OwnerLocal,
}

/// Which side of the limit sphere a [`LimitDistance`] keeps the owner on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DistanceMode {
    /// Stay within the sphere.
    #[default]
    Inside,
    /// Stay outside the sphere.
    Outside,
    /// Stay on the surface.
    OnSurface,
}

/// Parameters of a limit-distance constraint.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LimitDistance {
    /// Sphere radius; zero means "rest distance".
    pub distance: f64,
    /// Clamping mode.
    pub mode: DistanceMode,
    /// Constraint influence.
    pub influence: f64,
}

impl LimitDistance {
    /// Rest-distance clamp inside the sphere at full influence.
    pub const INSIDE: Self = Self {
        distance: 0.0,
        mode: DistanceMode::Inside,
        influence: 1.0,
    };
}

/// The kind-specific part of a [`Constraint`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintKind {
    /// Multi-target weighted blend.
    Armature {
        /// Target bones and their weights.
        targets: Vec<(BoneId, f64)>,
        /// Use dual-quaternion volume preservation.
        preserve_volume: bool,
    },
    /// Rotation clamp with all limits at zero range.
    LimitRotation,
    /// Copies the target's rotation.
    CopyRotation {
        /// Source bone.
        target: BoneId,
    },
    /// Copies the target's scale.
    CopyScale {
        /// Source bone.
        target: BoneId,
    },
    /// Copies the target's location.
    CopyLocation {
        /// Source bone.
        target: BoneId,
        /// Add to the owner's location instead of replacing it.
        use_offset: bool,
        /// Space the target location is read in.
        target_space: Space,
        /// Space the owner location is written in.
        owner_space: Space,
    },
    /// Copies the complete target transform.
    CopyTransforms {
        /// Source bone.
        target: BoneId,
        /// Space for both target and owner.
        space: Space,
    },
    /// Keeps the owner at a distance from the target.
    LimitDistance {
        /// Sphere center bone.
        target: BoneId,
        /// Clamp parameters.
        params: LimitDistance,
    },
}

/// A constraint on a pose bone.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    /// What the constraint does.
    pub kind: ConstraintKind,
    /// Blend factor in `0..=1`.
    pub influence: f64,
}

impl Constraint {
    /// A constraint at full influence.
    #[must_use]
    pub fn new(kind: ConstraintKind) -> Self {
        Self {
            kind,
            influence: 1.0,
        }
    }

    /// The same constraint with a different influence.
    #[must_use]
    pub fn with_influence(mut self, influence: f64) -> Self {
        self.influence = influence;
        self
    }

    /// The primary target bone, if the kind has exactly one.
    #[must_use]
    pub fn target(&self) -> Option<BoneId> {
        match &self.kind {
            ConstraintKind::CopyRotation { target }
            | ConstraintKind::CopyScale { target }
            | ConstraintKind::CopyLocation { target, .. }
            | ConstraintKind::CopyTransforms { target, .. }
            | ConstraintKind::LimitDistance { target, .. } => Some(*target),
            ConstraintKind::Armature { .. } | ConstraintKind::LimitRotation => None,
        }
    }
}

/// The animated property a [`Driver`] writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriverChannel {
    /// Influence of the constraint at this index on the same bone.
    ConstraintInfluence(usize),
    /// One axis (0..3) of the bone's location.
    Location(usize),
}

/// A transform channel read by a [`DriverVariable::Transform`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransformChannel {
    /// X location.
    LocX,
    /// Y location.
    LocY,
    /// Z location.
    LocZ,
    /// X Euler rotation.
    RotX,
    /// Y Euler rotation.
    RotY,
    /// Z Euler rotation.
    RotZ,
    /// X scale.
    ScaleX,
    /// Y scale.
    ScaleY,
    /// Z scale.
    ScaleZ,
    /// Average scale.
    ScaleAvg,
}

/// Space a transform channel variable is evaluated in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransformSpace {
    /// Armature object space.
    World,
    /// Parent-relative transform space.
    Transform,
    /// Bone local space.
    #[default]
    Local,
}

/// A driver variable descriptor.
///
/// The bone type is generic so that descriptors can be written against
/// not-yet-generated bones and resolved once names exist.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DriverVariable<B = BoneId> {
    /// A custom property on a pose bone.
    Property {
        /// Bone owning the property.
        bone: B,
        /// Property name.
        name: String,
    },
    /// A transform channel of a pose bone.
    Transform {
        /// Bone to read.
        bone: B,
        /// Channel to read.
        channel: TransformChannel,
        /// Evaluation space.
        space: TransformSpace,
    },
}

impl<B> DriverVariable<B> {
    /// Maps the bone reference through the fallible `f`.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` fails with.
    pub fn try_map_bone<C, E>(
        &self,
        f: impl FnOnce(&B) -> Result<C, E>,
    ) -> Result<DriverVariable<C>, E> {
        Ok(match self {
            Self::Property { bone, name } => DriverVariable::Property {
                bone: f(bone)?,
                name: name.clone(),
            },
            Self::Transform {
                bone,
                channel,
                space,
            } => DriverVariable::Transform {
                bone: f(bone)?,
                channel: *channel,
                space: *space,
            },
        })
    }
}

/// A scripted-expression driver.
#[derive(Clone, Debug, PartialEq)]
pub struct Driver {
    /// Driven property.
    pub channel: DriverChannel,
    /// Python-style expression over the variable names.
    pub expression: String,
    /// Named variables, in declaration order.
    pub variables: Vec<(String, DriverVariable)>,
}

/// Display shape assigned to a control bone.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WidgetShape {
    /// Flat circle.
    Circle,
    /// Three-ring sphere.
    Sphere,
    /// Wire cube.
    Cube,
    /// A named custom widget object.
    Custom(String),
}
