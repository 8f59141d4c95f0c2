// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract for writing a generated armature into a host application.
//!
//! The engine never touches the host scene. A pass fills a
//! [`BoneStore`]; an integration crate then implements [`Host`] to create
//! the bones, parent links, constraints, drivers and widgets in the real
//! armature.
//!
//! # Pass pseudocode
//!
//! ```rust,ignore
//! fn rebuild(metarig: BoneStore, rigs: RigTree, host: &mut impl Host) -> Result<(), RigError> {
//!     let mut generator = RigGenerator::new(metarig, rigs, GenerationOptions::STANDARD);
//!
//!     // Run every stage; rigs add nodes and parents during initialize.
//!     let summary = generator.run(&mut Tracer::none())?;
//!
//!     // Apply: copy the store into the host armature.
//!     host.apply(generator.store(), &summary);
//!     Ok(())
//! }
//! ```

use crate::armature::BoneStore;
use crate::trace::GenerationSummary;

/// Writes a finished [`BoneStore`] into a host armature.
pub trait Host {
    /// Applies every bone of `store`, with the totals of the pass that
    /// produced it.
    fn apply(&mut self, store: &BoneStore, summary: &GenerationSummary);
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use super::*;
    use crate::math::{Transform3d, Vec3};

    #[derive(Default)]
    struct Names(Vec<String>);

    impl Host for Names {
        fn apply(&mut self, store: &BoneStore, summary: &GenerationSummary) {
            _ = summary;
            self.0 = store.bones().map(|b| String::from(store.name(b))).collect();
        }
    }

    #[test]
    fn hosts_see_every_bone() {
        let mut store = BoneStore::new();
        let _ = store.add_bone("ORG-nose", Transform3d::from_translation(Vec3::ZERO), 1.0);
        let mut host = Names::default();
        host.apply(&store, &GenerationSummary::default());
        assert_eq!(host.0.len(), 2);
        assert_eq!(host.0[1], "ORG-nose");
    }
}
