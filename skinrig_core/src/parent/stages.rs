// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bone generation, parenting and rigging of enabled parent generators.
//!
//! The generator runs these hooks for [`ParentArena::enabled`] in order, so a
//! wrapped generator always has its bones before its wrapper asks for them.
//! Org and layer generators own no bones and are skipped.
//!
//! [`ParentArena::enabled`]: super::ParentArena::enabled

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::armature::{
    BoneId, Constraint, ConstraintKind, Driver, DriverChannel, InheritScale, Space,
};
use crate::error::RigError;
use crate::generator::Pass;
use crate::naming::{NameSubtype, make_derived_name};
use crate::node::NodeId;
use crate::trace::{BoneRole, ReuseEvent};

use super::driver::{DriverTerm, compile_driver};
use super::{ArmatureParent, OffsetParent, OffsetVariable, ParentId, ParentKind};

impl Pass<'_, '_> {
    /// Creates the mechanism bones of an enabled generator.
    pub(crate) fn generate_parent(&mut self, id: ParentId) -> Result<(), RigError> {
        match self.parents.get(id).kind.clone() {
            ParentKind::Armature(arm) => {
                self.generate_armature(id, &arm);
                Ok(())
            }
            ParentKind::Offset(offset) => self.generate_offset(id, &offset),
            ParentKind::Org(_) | ParentKind::Layer(_) => Ok(()),
        }
    }

    /// Links the mechanism bones of an enabled generator to their parents.
    pub(crate) fn parent_parent(&mut self, id: ParentId) -> Result<(), RigError> {
        match self.parents.get(id).kind.clone() {
            ParentKind::Armature(arm) => self.parent_armature(id, &arm),
            ParentKind::Offset(offset) => self.parent_offset(id, &offset),
            ParentKind::Org(_) | ParentKind::Layer(_) => Ok(()),
        }
    }

    /// Adds the constraints and drivers of an enabled generator.
    pub(crate) fn rig_parent(&mut self, id: ParentId) -> Result<(), RigError> {
        match self.parents.get(id).kind.clone() {
            ParentKind::Armature(arm) => self.rig_armature(id, &arm),
            ParentKind::Offset(offset) => self.rig_offset(id, &offset),
            ParentKind::Org(_) | ParentKind::Layer(_) => Ok(()),
        }
    }

    fn parent_node(&self, id: ParentId) -> NodeId {
        self.parents
            .get(id)
            .node
            .unwrap_or_else(|| panic!("{id:?} was built without a node"))
    }

    fn mechanism_name(&self, id: ParentId, suffix: &str) -> String {
        let node = self.parent_node(id);
        make_derived_name(self.net.name(node), NameSubtype::Mch, suffix)
    }

    // -- Armature --

    fn generate_armature(&mut self, id: ParentId, arm: &ArmatureParent) {
        let node = self.parent_node(id);
        let name = self.mechanism_name(id, "_arm");
        let orientation = arm
            .orientation
            .as_ref()
            .map(|orientation| orientation.force(&self.scene()));
        let bone = self.make_node_bone(node, &name, 0.25, orientation, BoneRole::ArmatureParent);
        self.disable_auto_parent(bone);

        let generator = self.parents.get_mut(id);
        generator.bones.clear();
        generator.bones.push(bone);
    }

    fn parent_armature(&mut self, id: ParentId, arm: &ArmatureParent) -> Result<(), RigError> {
        assert!(!arm.targets.is_empty(), "armature parent {id:?} has no targets");
        let [target] = arm.targets.as_slice() else {
            return Ok(());
        };
        let bone = self.armature_bone(id);
        let target = self.scene().resolve(&target.bone)?;
        let mode = if arm.copy_scale.is_some() {
            InheritScale::None
        } else {
            InheritScale::FixShear
        };
        self.store.set_parent(bone, Some(target), Some(mode));
        Ok(())
    }

    fn rig_armature(&mut self, id: ParentId, arm: &ArmatureParent) -> Result<(), RigError> {
        let bone = self.armature_bone(id);

        if arm.targets.len() > 1 {
            let fixed: f64 = arm.targets.iter().filter_map(|t| t.weight).sum();
            let shared = arm.targets.iter().filter(|t| t.weight.is_none()).count();
            let remainder = if shared > 0 {
                (1.0 - fixed).max(0.0) / shared as f64
            } else {
                0.0
            };

            let scene = self.scene();
            let mut targets = Vec::with_capacity(arm.targets.len());
            for target in &arm.targets {
                targets.push((scene.resolve(&target.bone)?, target.weight.unwrap_or(remainder)));
            }
            self.store.add_constraint(
                bone,
                Constraint::new(ConstraintKind::Armature {
                    targets,
                    preserve_volume: true,
                }),
            );
            self.store
                .add_constraint(bone, Constraint::new(ConstraintKind::LimitRotation));
        }

        if let Some(source) = &arm.copy_rotation {
            let target = self.scene().resolve(source)?;
            self.store
                .add_constraint(bone, Constraint::new(ConstraintKind::CopyRotation { target }));
        }
        if let Some(source) = &arm.copy_scale {
            let target = self.scene().resolve(source)?;
            self.store
                .add_constraint(bone, Constraint::new(ConstraintKind::CopyScale { target }));
        }
        Ok(())
    }

    fn armature_bone(&self, id: ParentId) -> BoneId {
        *self
            .parents
            .get(id)
            .bones
            .first()
            .unwrap_or_else(|| panic!("armature parent {id:?} has no bone"))
    }

    // -- Offset --

    fn generate_offset(&mut self, id: ParentId, offset: &OffsetParent) -> Result<(), RigError> {
        let generator = self.parents.get_mut(id);
        generator.bones.clear();
        generator.reuse = false;
        if offset.is_empty() {
            return Ok(());
        }

        let node = self.parent_node(id);
        let name = self.mechanism_name(id, "_poffset");
        let orientations: Vec<_> = offset.location_drivers().map(|(q, _)| q).collect();

        let mut bones = Vec::with_capacity(orientations.len().max(1));
        if orientations.is_empty() {
            let wrapped = offset.wrapped;
            if !self.parents.get(wrapped).frozen {
                let bone = self.output_bone(wrapped)?;
                let gap = self.store.head(bone).distance(self.net.point(node));
                if gap < self.options.reuse_epsilon {
                    let generator = self.parents.get_mut(id);
                    generator.reuse = true;
                    generator.bones.push(bone);
                    self.summary.bones_reused += 1;
                    self.tracer.reuse(&ReuseEvent { parent: id, bone });
                    return Ok(());
                }
            }
            bones.push(self.make_node_bone(node, &name, 0.25, None, BoneRole::Offset));
        } else {
            for orientation in orientations {
                bones.push(self.make_node_bone(node, &name, 0.25, Some(orientation), BoneRole::Offset));
            }
        }
        self.parents.get_mut(id).bones = bones;
        Ok(())
    }

    fn parent_offset(&mut self, id: ParentId, offset: &OffsetParent) -> Result<(), RigError> {
        let generator = self.parents.get(id);
        let Some(&first) = generator.bones.first() else {
            return Ok(());
        };
        let reuse = generator.reuse;
        let bones = generator.bones.clone();

        if !reuse {
            let target = self.output_bone(offset.wrapped)?;
            self.store.set_parent(first, Some(target), None);
        }
        self.store.parent_bone_chain(&bones);
        Ok(())
    }

    fn rig_offset(&mut self, id: ParentId, offset: &OffsetParent) -> Result<(), RigError> {
        let bones = self.parents.get(id).bones.clone();
        let (Some(&first), Some(&last)) = (bones.first(), bones.last()) else {
            return Ok(());
        };

        for (target, entry) in offset.copy_local() {
            let scene = self.scene();
            let target = scene.resolve(target)?;
            let influence = entry.influence
                + entry
                    .deferred
                    .iter()
                    .map(|value| value.force(&scene))
                    .sum::<f64>();

            let index = self.store.add_constraint(
                first,
                Constraint::new(ConstraintKind::CopyLocation {
                    target,
                    use_offset: true,
                    target_space: Space::LocalOwnerOrient,
                    owner_space: Space::Local,
                })
                .with_influence(influence),
            );

            if !entry.expressions.is_empty() {
                let mut terms = entry.expressions.clone();
                if influence > 0.0 {
                    terms.push(DriverTerm::constant(format!("{influence}")));
                }
                let driver =
                    self.make_driver(id, DriverChannel::ConstraintInfluence(index), &terms)?;
                self.store.add_driver(first, driver);
            }
        }

        for (&bone, (_, drivers)) in bones.iter().zip(offset.location_drivers()) {
            for (axis, terms) in drivers.iter().enumerate() {
                if terms.is_empty() {
                    continue;
                }
                let driver = self.make_driver(id, DriverChannel::Location(axis), terms)?;
                self.store.add_driver(bone, driver);
            }
        }

        for (target, params) in offset.limit_distance() {
            let target = self.scene().resolve(target)?;
            self.store.add_constraint(
                last,
                Constraint::new(ConstraintKind::LimitDistance {
                    target,
                    params: *params,
                })
                .with_influence(params.influence),
            );
        }
        Ok(())
    }

    /// Merges `terms` into one driver with resolved variable bones.
    fn make_driver(
        &self,
        id: ParentId,
        channel: DriverChannel,
        terms: &[DriverTerm<OffsetVariable>],
    ) -> Result<Driver, RigError> {
        let compiled = compile_driver(terms).map_err(|err| RigError::InvalidDriverExpression {
            rig: self
                .parents
                .get(id)
                .rig
                .map_or_else(String::new, |rig| String::from(self.rigs.get(rig).name())),
            expression: err.expression,
            source: err.source,
        })?;

        let scene = self.scene();
        let mut variables = Vec::with_capacity(compiled.variables.len());
        for (name, variable) in compiled.variables {
            variables.push((name, variable.try_map_bone(|bone| scene.resolve(bone))?));
        }
        Ok(Driver {
            channel,
            expression: compiled.expression,
            variables,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::ToString;
    use alloc::vec;

    use crate::armature::{
        BoneId, BoneStore, ConstraintKind, DriverChannel, DriverVariable, LimitDistance, Space,
        TransformChannel, TransformSpace,
    };
    use crate::error::RigError;
    use crate::generator::RigGenerator;
    use crate::lazy::BoneRef;
    use crate::math::{Quat, Transform3d, Vec3};
    use crate::node::{ControlNodeSpec, NodeBuilder, NodeId};
    use crate::options::GenerationOptions;
    use crate::parent::{
        ArmatureParent, ArmatureTarget, DriverTerm, Influence, ParentId, ParentScope, ParentType,
    };
    use crate::rig::{RigTree, SkinRig};
    use crate::trace::Tracer;

    type Build = fn(&mut ParentScope<'_>, &Bones) -> ParentId;

    #[derive(Clone, Copy)]
    struct Bones {
        lip: BoneId,
        jaw: BoneId,
        nose: BoneId,
    }

    struct Lip {
        bones: Bones,
        build: Build,
    }

    impl SkinRig for Lip {
        fn name(&self) -> &str {
            "lip"
        }

        fn base_bone(&self) -> BoneId {
            self.bones.lip
        }

        fn init_control_nodes(&mut self, nodes: &mut NodeBuilder<'_>) {
            let _ = nodes.add_control(ControlNodeSpec::new(self.bones.lip, "lip"));
        }

        fn build_own_control_node_parent(&self, scope: &mut ParentScope<'_>) -> ParentId {
            (self.build)(scope, &self.bones)
        }
    }

    fn generate(build: Build) -> (RigGenerator, Bones, Result<(), RigError>) {
        let mut store = BoneStore::new();
        let at = |x: f64| Transform3d::from_translation(Vec3::new(x, 0.0, 0.0));
        let bones = Bones {
            lip: store.add_bone("ORG-lip", at(0.0), 1.0),
            jaw: store.add_bone("ORG-jaw", at(2.0), 1.0),
            nose: store.add_bone("ORG-nose", at(3.0), 1.0),
        };
        let mut rigs = RigTree::new();
        let _ = rigs.add(Box::new(Lip { bones, build }), None);
        let mut generator = RigGenerator::new(store, rigs, GenerationOptions::DETACHED);
        let result = generator.run(&mut Tracer::none()).map(|_| ());
        (generator, bones, result)
    }

    fn control(generator: &RigGenerator) -> BoneId {
        generator
            .net()
            .control_bone(NodeId(0))
            .expect("control bone")
    }

    fn offset_over_org(scope: &mut ParentScope<'_>, bones: &Bones) -> ParentId {
        let parent = scope.next_parent();
        let offset = scope.ensure_offset(parent);
        scope
            .offset_mut(offset)
            .add_copy_local_location(bones.jaw, 0.5);
        offset
    }

    #[test]
    fn offset_over_a_fixed_bone_makes_its_own_bone() {
        let (generator, bones, result) = generate(offset_over_org);
        result.unwrap();
        let store = generator.store();

        let mch = store.parent(control(&generator)).unwrap();
        assert_eq!(store.name(mch), "MCH-lip_poffset");
        assert_eq!(store.parent(mch), Some(store.root()));
        let constraint = &store.constraints(mch)[0];
        assert_eq!(constraint.influence, 0.5);
        assert_eq!(
            constraint.kind,
            ConstraintKind::CopyLocation {
                target: bones.jaw,
                use_offset: true,
                target_space: Space::LocalOwnerOrient,
                owner_space: Space::Local,
            }
        );
    }

    fn offset_over_armature(scope: &mut ParentScope<'_>, bones: &Bones) -> ParentId {
        let arm = scope.armature(ArmatureParent::new([ArmatureTarget::from(bones.nose)]));
        let offset = scope.offset(arm);
        let contents = scope.offset_mut(offset);
        contents.add_copy_local_location(bones.jaw, 1.0);
        contents.add_limit_distance(bones.nose, LimitDistance::INSIDE);
        offset
    }

    #[test]
    fn offset_piggybacks_on_an_unfrozen_armature_bone() {
        let (generator, bones, result) = generate(offset_over_armature);
        result.unwrap();
        let store = generator.store();

        let arm = store.parent(control(&generator)).unwrap();
        assert_eq!(store.name(arm), "MCH-lip_arm");
        assert!(store.find("MCH-lip_poffset").is_none());
        assert_eq!(store.parent(arm), Some(bones.nose));
        assert_eq!(store.inherit_scale(arm), crate::armature::InheritScale::FixShear);

        let kinds: Vec<_> = store.constraints(arm).iter().map(|c| &c.kind).collect();
        assert!(matches!(kinds[0], ConstraintKind::CopyLocation { target, .. } if *target == bones.jaw));
        assert!(matches!(kinds[1], ConstraintKind::LimitDistance { target, .. } if *target == bones.nose));

        let offset = generator
            .parents()
            .enabled()
            .iter()
            .copied()
            .find(|p| generator.parents().kind(*p) == ParentType::Offset)
            .unwrap();
        assert!(generator.parents().get(offset).is_reusing());
    }

    fn blended_armature(scope: &mut ParentScope<'_>, bones: &Bones) -> ParentId {
        scope.armature(
            ArmatureParent::new([
                ArmatureTarget {
                    bone: bones.jaw.into(),
                    weight: Some(0.25),
                },
                ArmatureTarget::from(bones.nose),
            ])
            .with_copy_scale(bones.jaw),
        )
    }

    #[test]
    fn blended_armature_splits_the_remaining_weight() {
        let (generator, bones, result) = generate(blended_armature);
        result.unwrap();
        let store = generator.store();

        let arm = store.parent(control(&generator)).unwrap();
        assert_eq!(store.parent(arm), None);
        let kinds: Vec<_> = store.constraints(arm).iter().map(|c| c.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                ConstraintKind::Armature {
                    targets: vec![(bones.jaw, 0.25), (bones.nose, 0.75)],
                    preserve_volume: true,
                },
                ConstraintKind::LimitRotation,
                ConstraintKind::CopyScale { target: bones.jaw },
            ]
        );
    }

    fn driven_offset(scope: &mut ParentScope<'_>, bones: &Bones) -> ParentId {
        let parent = scope.next_parent();
        let offset = scope.ensure_offset(parent);
        let jaw = DriverVariable::Transform {
            bone: BoneRef::Bone(bones.jaw),
            channel: TransformChannel::RotX,
            space: TransformSpace::Local,
        };
        let term = |expression: &str| DriverTerm {
            expression: expression.to_string(),
            variables: vec![("jaw".to_string(), jaw.clone())],
        };
        let contents = scope.offset_mut(offset);
        contents.add_copy_local_location(bones.nose, 0.5);
        contents.add_copy_local_location(bones.nose, Influence::Expression(term("$jaw*2")));
        let tilted = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), 0.5);
        contents.add_location_driver(Quat::IDENTITY, 1, term("$jaw"));
        contents.add_location_driver(tilted, 2, term("-$jaw"));
        offset
    }

    #[test]
    fn drivers_merge_and_orientations_chain() {
        let (generator, bones, result) = generate(driven_offset);
        result.unwrap();
        let store = generator.store();

        let second = store.parent(control(&generator)).unwrap();
        let first = store.parent(second).unwrap();
        assert_eq!(store.parent(first), Some(store.root()));

        let influence = &store.drivers(first)[0];
        assert_eq!(influence.channel, DriverChannel::ConstraintInfluence(0));
        assert_eq!(influence.expression, "(jaw*2)+(0.5)");
        assert_eq!(influence.variables.len(), 1);

        assert_eq!(store.drivers(first)[1].channel, DriverChannel::Location(1));
        assert_eq!(store.drivers(second)[0].channel, DriverChannel::Location(2));
        assert_eq!(store.drivers(second)[0].expression, "-jaw");
        assert_eq!(
            store.drivers(second)[0].variables[0].1,
            DriverVariable::Transform {
                bone: bones.jaw,
                channel: TransformChannel::RotX,
                space: TransformSpace::Local,
            }
        );
    }

    fn broken_offset(scope: &mut ParentScope<'_>, bones: &Bones) -> ParentId {
        let parent = scope.next_parent();
        let offset = scope.ensure_offset(parent);
        scope.offset_mut(offset).add_location_driver(
            Quat::IDENTITY,
            0,
            DriverTerm::constant("$missing".to_string()),
        );
        let _ = bones;
        offset
    }

    #[test]
    fn undeclared_variables_name_the_rig() {
        let (_, _, result) = generate(broken_offset);
        let Err(RigError::InvalidDriverExpression { rig, expression, .. }) = result else {
            panic!("expected an expression error, got {result:?}");
        };
        assert_eq!(rig, "lip");
        assert_eq!(expression, "$missing");
    }
}
