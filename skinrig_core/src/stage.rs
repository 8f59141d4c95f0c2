// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generation stages.

use core::fmt;

/// One step of the staged build, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Rigs create control nodes, nodes merge, masters build parents.
    Initialize,
    /// Requested parent mechanisms are enabled.
    PrepareBones,
    /// Bones are created.
    GenerateBones,
    /// Parent links are set.
    ParentBones,
    /// Locks and layers are applied.
    ConfigureBones,
    /// Constraints and drivers are attached.
    RigBones,
    /// Display widgets are assigned.
    GenerateWidgets,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Self; 7] = [
        Self::Initialize,
        Self::PrepareBones,
        Self::GenerateBones,
        Self::ParentBones,
        Self::ConfigureBones,
        Self::RigBones,
        Self::GenerateWidgets,
    ];

    /// The `snake_case` name of the stage.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::PrepareBones => "prepare_bones",
            Self::GenerateBones => "generate_bones",
            Self::ParentBones => "parent_bones",
            Self::ConfigureBones => "configure_bones",
            Self::RigBones => "rig_bones",
            Self::GenerateWidgets => "generate_widgets",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
