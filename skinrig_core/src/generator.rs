// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The staged generation pass.
//!
//! [`RigGenerator`] owns everything one pass touches: the armature, the rig
//! tree, the control net and the parent arena. [`RigGenerator::run`] walks
//! [`Stage::ALL`] in order. Every stage first runs each rig's own
//! [`SkinRig::run_stage`](crate::rig::SkinRig::run_stage), then the node
//! work of the stage, then the work of enabled parent generators (innermost
//! first).
//!
//! | Stage              | Nodes                                  | Parents        |
//! |--------------------|----------------------------------------|----------------|
//! | `initialize`       | create, merge, build and intern parents |                |
//! | `prepare_bones`    | enable used parents                    | drain enabled  |
//! | `generate_bones`   | control and helper bones               | mechanism bones |
//! | `parent_bones`     | parent links                           | parent links   |
//! | `configure_bones`  | scale locks and layers, masters first  |                |
//! | `rig_bones`        | mix blend, rig extensions, reparents   | constraints, drivers |
//! | `generate_widgets` | widgets                                |                |
//!
//! Generated bones left without a parent are attached to the armature root
//! after the last stage, unless they opted out through
//! `disable_auto_parent` or the options turn auto-parenting off.

use alloc::vec::Vec;

use crate::armature::{BoneId, BoneStore};
use crate::error::RigError;
use crate::lazy::Scene;
use crate::node::{ControlNet, NodeBuilder, NodeId};
use crate::options::GenerationOptions;
use crate::parent::{ParentArena, ParentId};
use crate::rig::{RigContext, RigTree};
use crate::stage::Stage;
use crate::trace::{EnableEvent, GenerationSummary, StageEvent, Tracer};

/// Drives rigs, control nodes and parent generators through every stage.
#[derive(Debug)]
pub struct RigGenerator {
    rigs: RigTree,
    net: ControlNet,
    parents: ParentArena,
    store: BoneStore,
    options: GenerationOptions,
    no_auto_parent: Vec<BoneId>,
}

impl RigGenerator {
    /// Prepares a pass over `store` with the rigs of `rigs`.
    #[must_use]
    pub fn new(store: BoneStore, rigs: RigTree, options: GenerationOptions) -> Self {
        Self {
            rigs,
            net: ControlNet::new(),
            parents: ParentArena::new(),
            store,
            options,
            no_auto_parent: Vec::new(),
        }
    }

    /// Runs every stage and returns the pass totals.
    ///
    /// # Errors
    ///
    /// Returns the first [`RigError`] raised by a rig hook or by resolving a
    /// mechanism. Bones created before the error stay in the store.
    pub fn run(&mut self, tracer: &mut Tracer<'_>) -> Result<GenerationSummary, RigError> {
        let first_generated = self.store.len();
        let mut summary = GenerationSummary::default();

        for stage in Stage::ALL {
            tracer.stage_begin(&StageEvent { stage });
            self.run_rigs(stage)?;
            if stage == Stage::Initialize {
                self.init_control_nodes();
            }

            let mut pass = Pass {
                rigs: &self.rigs,
                net: &mut self.net,
                parents: &mut self.parents,
                store: &mut self.store,
                no_auto_parent: &mut self.no_auto_parent,
                options: self.options,
                tracer: &mut *tracer,
                summary: &mut summary,
            };
            pass.run_stage(stage)?;
            tracer.stage_end(&StageEvent { stage });
        }

        if self.options.auto_parent_to_root {
            self.auto_parent(first_generated);
        }
        tracer.summary(&summary);
        Ok(summary)
    }

    fn run_rigs(&mut self, stage: Stage) -> Result<(), RigError> {
        for id in self.rigs.ids() {
            let mut ctx = RigContext {
                store: &mut self.store,
                net: &self.net,
                parents: &self.parents,
                no_auto_parent: &mut self.no_auto_parent,
            };
            self.rigs.get_mut(id).run_stage(stage, &mut ctx)?;
        }
        Ok(())
    }

    fn init_control_nodes(&mut self) {
        for id in self.rigs.ids() {
            let rig = self.rigs.get_mut(id);
            let mut builder = NodeBuilder {
                rig: id,
                chain_priority: rig.chain_priority(),
                chain_rig: rig.is_chain_rig(),
                net: &mut self.net,
                store: &self.store,
            };
            rig.init_control_nodes(&mut builder);
        }
    }

    fn auto_parent(&mut self, first_generated: usize) {
        let root = self.store.root();
        let orphans: Vec<BoneId> = self
            .store
            .bones()
            .skip(first_generated)
            .filter(|bone| self.store.parent(*bone).is_none())
            .filter(|bone| !self.no_auto_parent.contains(bone))
            .collect();
        for bone in orphans {
            self.store.set_parent(bone, Some(root), None);
        }
    }

    /// The armature.
    #[must_use]
    pub fn store(&self) -> &BoneStore {
        &self.store
    }

    /// Consumes the generator and returns the armature.
    #[must_use]
    pub fn into_store(self) -> BoneStore {
        self.store
    }

    /// The control net.
    #[must_use]
    pub fn net(&self) -> &ControlNet {
        &self.net
    }

    /// The parent generators.
    #[must_use]
    pub fn parents(&self) -> &ParentArena {
        &self.parents
    }

    /// The rigs.
    #[must_use]
    pub fn rigs(&self) -> &RigTree {
        &self.rigs
    }

    /// The options the pass runs with.
    #[must_use]
    pub fn options(&self) -> GenerationOptions {
        self.options
    }
}

/// Borrowed state of one stage.
///
/// Node and parent hooks are implemented on `Pass` next to the types they
/// work on.
pub(crate) struct Pass<'a, 't> {
    pub(crate) rigs: &'a RigTree,
    pub(crate) net: &'a mut ControlNet,
    pub(crate) parents: &'a mut ParentArena,
    pub(crate) store: &'a mut BoneStore,
    pub(crate) no_auto_parent: &'a mut Vec<BoneId>,
    pub(crate) options: GenerationOptions,
    pub(crate) tracer: &'a mut Tracer<'t>,
    pub(crate) summary: &'a mut GenerationSummary,
}

impl Pass<'_, '_> {
    fn run_stage(&mut self, stage: Stage) -> Result<(), RigError> {
        let (controls, queries): (Vec<NodeId>, Vec<NodeId>) =
            self.net.ids().partition(|id| self.net.is_control(*id));

        match stage {
            Stage::Initialize => {
                self.merge_nodes();
                let (masters, others): (Vec<NodeId>, Vec<NodeId>) =
                    controls.iter().partition(|id| self.net.is_master(**id));
                for id in masters.into_iter().chain(others) {
                    self.initialize_control(id);
                }
                for id in queries {
                    self.initialize_query(id);
                }
            }
            Stage::PrepareBones => {
                for &id in &controls {
                    self.prepare_control(id);
                }
                let enabled = self.parents.drain_enabled().to_vec();
                for parent in enabled {
                    self.summary.parents_enabled += 1;
                    self.tracer.enable(&EnableEvent {
                        parent,
                        kind: self.parents.kind(parent),
                        depth: self.parents.depth(parent),
                    });
                }
            }
            Stage::GenerateBones => {
                for &id in &controls {
                    self.generate_control(id);
                }
                for parent in self.enabled() {
                    self.generate_parent(parent)?;
                }
            }
            Stage::ParentBones => {
                for &id in &controls {
                    self.parent_control(id)?;
                }
                for parent in self.enabled() {
                    self.parent_parent(parent)?;
                }
            }
            Stage::ConfigureBones => {
                let (masters, others): (Vec<NodeId>, Vec<NodeId>) =
                    controls.iter().partition(|id| self.net.is_master(**id));
                for id in masters.into_iter().chain(others) {
                    self.configure_control(id);
                }
            }
            Stage::RigBones => {
                for &id in &controls {
                    self.rig_control(id)?;
                }
                for parent in self.enabled() {
                    self.rig_parent(parent)?;
                }
            }
            Stage::GenerateWidgets => {
                for &id in &controls {
                    self.widget_control(id);
                }
            }
        }
        Ok(())
    }

    fn enabled(&self) -> Vec<ParentId> {
        self.parents.enabled().to_vec()
    }

    pub(crate) fn scene(&self) -> Scene<'_> {
        Scene {
            store: &*self.store,
            net: &*self.net,
            parents: &*self.parents,
        }
    }

    /// The bone children of `parent` attach to.
    pub(crate) fn output_bone(&self, parent: ParentId) -> Result<BoneId, RigError> {
        self.parents.output_bone(parent, &self.scene())
    }

    pub(crate) fn disable_auto_parent(&mut self, bone: BoneId) {
        if !self.no_auto_parent.contains(&bone) {
            self.no_auto_parent.push(bone);
        }
    }

    pub(crate) fn rig_context(&mut self) -> RigContext<'_> {
        RigContext {
            store: &mut *self.store,
            net: &*self.net,
            parents: &*self.parents,
            no_auto_parent: &mut *self.no_auto_parent,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::format;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;
    use core::f64::consts::FRAC_1_SQRT_2;

    use super::*;
    use crate::armature::{ConstraintKind, InheritScale, LayerMask, Space, WidgetShape};
    use crate::math::{Quat, Transform3d, Vec3};
    use crate::node::{ControlBoneNode, ControlIcon, ControlLayer, ControlNodeSpec, QueryNodeSpec};
    use crate::parent::ParentScope;
    use crate::rig::{RigId, SkinRig};

    struct Fixed {
        name: &'static str,
        base: BoneId,
        controls: Vec<ControlNodeSpec>,
        queries: Vec<QueryNodeSpec>,
        weak_parent: bool,
        layers: Option<LayerMask>,
        rig_log: Option<Rc<RefCell<Vec<&'static str>>>>,
    }

    impl Fixed {
        fn new(name: &'static str, base: BoneId) -> Self {
            Self {
                name,
                base,
                controls: Vec::new(),
                queries: Vec::new(),
                weak_parent: false,
                layers: None,
                rig_log: None,
            }
        }
    }

    impl SkinRig for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn base_bone(&self) -> BoneId {
            self.base
        }

        fn init_control_nodes(&mut self, nodes: &mut NodeBuilder<'_>) {
            for spec in self.controls.drain(..) {
                let _ = nodes.add_control(spec);
            }
            for spec in self.queries.drain(..) {
                let _ = nodes.add_query(spec);
            }
        }

        fn build_own_control_node_parent(&self, scope: &mut ParentScope<'_>) -> ParentId {
            let parent = scope.next_parent();
            if self.weak_parent {
                scope.weak_layer(parent, None)
            } else {
                parent
            }
        }

        fn extend_control_node_rig(
            &self,
            node: NodeId,
            ctx: &mut RigContext<'_>,
        ) -> Result<(), RigError> {
            _ = (node, ctx);
            if let Some(log) = &self.rig_log {
                log.borrow_mut().push(self.name);
            }
            Ok(())
        }

        fn get_control_node_layers(&self, node: &ControlBoneNode) -> Option<LayerMask> {
            _ = node;
            self.layers
        }

        fn make_control_node_widget(
            &self,
            node: &ControlBoneNode,
            bone: BoneId,
            store: &mut BoneStore,
        ) {
            store.set_widget(bone, WidgetShape::Custom(format!("WGT-{}", node.name())));
        }
    }

    fn run(
        store: BoneStore,
        rigs: Vec<(Fixed, Option<RigId>)>,
    ) -> (RigGenerator, GenerationSummary) {
        let mut tree = RigTree::new();
        for (rig, parent) in rigs {
            let _ = tree.add(Box::new(rig), parent);
        }
        let mut generator = RigGenerator::new(store, tree, GenerationOptions::STANDARD);
        let summary = generator.run(&mut Tracer::none()).unwrap();
        (generator, summary)
    }

    fn at(x: f64) -> Transform3d {
        Transform3d::from_translation(Vec3::new(x, 0.0, 0.0))
    }

    #[test]
    fn tweak_layer_picks_the_widget() {
        let mut store = BoneStore::new();
        let lip = store.add_bone("ORG-lip", at(0.0), 1.0);
        let mut rig = Fixed::new("lip", lip);
        rig.controls = vec![
            ControlNodeSpec::new(lip, "lip").icon(ControlIcon::Free),
            ControlNodeSpec::new(lip, "lip_end").icon(ControlIcon::Free),
            ControlNodeSpec::new(lip, "lip_tweak").layer(ControlLayer::Tweak),
        ];
        let mut rigs = RigTree::new();
        let _ = rigs.add(Box::new(rig), None);

        let mut generator = RigGenerator::new(store, rigs, GenerationOptions::STANDARD);
        let summary = generator.run(&mut Tracer::none()).unwrap();

        assert_eq!(summary.control_nodes, 3);
        assert_eq!(summary.clusters, 1);
        let control = generator.net().control_bone(NodeId(0)).unwrap();
        assert_eq!(generator.store().name(control), "lip_tweak");
        assert_eq!(generator.store().widget(control), Some(&WidgetShape::Sphere));
        assert!(generator.store().is_scale_locked(control));
        assert_eq!(generator.store().parent(control), Some(generator.store().root()));
    }

    /// A lip rig with one control and a jaw rig querying it, where the jaw
    /// rig's base bone sits under `jaw_parent`.
    fn reparent_pass(jaw_parent: Option<&str>) -> (RigGenerator, GenerationSummary) {
        let mut store = BoneStore::new();
        let lip = store.add_bone("ORG-lip", at(0.0), 1.0);
        let jaw = store.add_bone("ORG-jaw", at(1.0), 1.0);
        if let Some(name) = jaw_parent {
            let above = store.add_bone(name, at(2.0), 1.0);
            store.set_parent(jaw, Some(above), None);
        }

        let mut lip_rig = Fixed::new("lip", lip);
        lip_rig.controls.push(ControlNodeSpec::new(lip, "lip"));
        let mut jaw_rig = Fixed::new("jaw", jaw);
        jaw_rig
            .queries
            .push(QueryNodeSpec::new(lip).needs_reparent());

        let mut rigs = RigTree::new();
        let _ = rigs.add(Box::new(lip_rig), None);
        let _ = rigs.add(Box::new(jaw_rig), None);

        let mut generator = RigGenerator::new(store, rigs, GenerationOptions::STANDARD);
        let summary = generator.run(&mut Tracer::none()).unwrap();
        (generator, summary)
    }

    #[test]
    fn reparent_to_an_equal_parent_adds_no_bone() {
        let (generator, summary) = reparent_pass(None);
        let net = generator.net();

        assert_eq!(summary.bones_created, 1);
        assert_eq!(summary.parents_reused, 1);
        assert_eq!(net.output_bone(NodeId(1)), net.control_bone(NodeId(0)));
    }

    #[test]
    fn reparent_to_another_parent_adds_one_bone() {
        let (generator, summary) = reparent_pass(Some("ORG-head"));
        let store = generator.store();
        let net = generator.net();

        assert_eq!(summary.bones_created, 2);
        let control = net.control_bone(NodeId(0)).unwrap();
        let reparent = net.output_bone(NodeId(1)).unwrap();
        assert_ne!(reparent, control);
        assert_eq!(store.name(reparent), "MCH-lip_reparent");
        assert_eq!(store.parent(reparent), store.find("ORG-head"));
        assert_eq!(
            store.constraints(reparent)[0].kind,
            ConstraintKind::CopyTransforms {
                target: control,
                space: Space::World,
            }
        );
    }

    #[test]
    fn unmatched_queries_are_ignored() {
        let mut store = BoneStore::new();
        let nose = store.add_bone("ORG-nose", at(4.0), 1.0);
        let mut rig = Fixed::new("nose", nose);
        rig.queries
            .push(QueryNodeSpec::new(nose).needs_reparent());
        let mut rigs = RigTree::new();
        let _ = rigs.add(Box::new(rig), None);

        let mut generator = RigGenerator::new(store, rigs, GenerationOptions::DETACHED);
        let summary = generator.run(&mut Tracer::none()).unwrap();
        assert_eq!(summary.query_nodes, 1);
        assert_eq!(summary.bones_created, 0);
        assert_eq!(generator.net().output_bone(NodeId(0)), None);
    }

    #[test]
    fn detached_passes_leave_orphans_alone() {
        let mut store = BoneStore::new();
        let lip = store.add_bone("ORG-lip", at(0.0), 1.0);
        let mut rig = Fixed::new("lip", lip);
        rig.controls.push(ControlNodeSpec::new(lip, "lip"));
        let mut rigs = RigTree::new();
        let _ = rigs.add(Box::new(rig), None);

        let mut generator = RigGenerator::new(store, rigs, GenerationOptions::DETACHED);
        let _ = generator.run(&mut Tracer::none()).unwrap();
        let control = generator.net().control_bone(NodeId(0)).unwrap();
        assert_eq!(generator.store().parent(control), Some(generator.store().root()));
        assert_eq!(generator.into_store().len(), 3);
    }

    #[test]
    fn unequal_mirror_parents_blend_through_a_mix_bone() {
        let mut store = BoneStore::new();
        let head = store.add_bone("ORG-head", at(2.0), 1.0);
        let left = store.add_bone("ORG-lip.L", at(0.0), 1.0);
        let right = store.add_bone("ORG-lip.R", at(0.0), 1.0);
        store.set_parent(left, Some(head), None);
        let root = store.root();

        let mut left_rig = Fixed::new("lip.L", left);
        left_rig.controls.push(ControlNodeSpec::new(left, "lip.L"));
        let mut right_rig = Fixed::new("lip.R", right);
        right_rig.controls.push(ControlNodeSpec::new(right, "lip.R"));

        let (generator, summary) = run(store, vec![(left_rig, None), (right_rig, None)]);
        let store = generator.store();
        assert_eq!(summary.clusters, 1);

        let control = generator.net().control_bone(NodeId(0)).unwrap();
        assert_eq!(store.name(control), "lip");
        let mix = store.find("MCH-lip_mix_parent").unwrap();
        assert_eq!(store.length(mix), 0.5);
        assert_eq!(store.parent(control), Some(mix));
        assert_eq!(store.inherit_scale(control), InheritScale::Average);
        assert_eq!(store.parent(mix), None);
        assert_eq!(
            store.constraints(mix)[0].kind,
            ConstraintKind::Armature {
                targets: vec![(head, 0.5), (root, 0.5)],
                preserve_volume: true,
            }
        );
    }

    #[test]
    fn weak_parents_keep_a_full_size_widget_bone() {
        let mut store = BoneStore::new();
        let lip = store.add_bone("ORG-lip", at(0.0), 1.0);
        let head = store.add_bone("ORG-head", at(2.0), 1.0);
        let jaw = store.add_bone("ORG-jaw", at(1.0), 1.0);
        store.set_parent(jaw, Some(head), None);

        let mut lip_rig = Fixed::new("lip", lip);
        lip_rig.weak_parent = true;
        lip_rig.controls.push(ControlNodeSpec::new(lip, "lip"));
        let mut jaw_rig = Fixed::new("jaw", jaw);
        jaw_rig.queries.push(QueryNodeSpec::new(lip).needs_reparent());

        let (generator, summary) = run(store, vec![(lip_rig, None), (jaw_rig, None)]);
        let store = generator.store();
        assert_eq!(summary.bones_created, 3);

        let control = generator.net().control_bone(NodeId(0)).unwrap();
        let weak = store.find("MCH-lip_weak_parent").unwrap();
        assert_eq!(store.length(weak), store.length(control));
        assert_eq!(store.parent(weak), Some(store.root()));
        assert_eq!(store.inherit_scale(weak), InheritScale::Average);
        assert_eq!(
            store.constraints(weak)[0].kind,
            ConstraintKind::CopyTransforms {
                target: control,
                space: Space::Local,
            }
        );
        assert_eq!(store.widget_transform(control), Some(weak));

        let reparent = generator.net().output_bone(NodeId(1)).unwrap();
        assert_eq!(store.parent(reparent), Some(head));
        assert_eq!(
            store.constraints(reparent)[0].kind,
            ConstraintKind::CopyTransforms {
                target: weak,
                space: Space::World,
            }
        );
    }

    #[test]
    fn rig_extensions_run_outermost_first() {
        let mut store = BoneStore::new();
        let lip = store.add_bone("ORG-lip", at(0.0), 1.0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let logged = |name| {
            let mut rig = Fixed::new(name, lip);
            rig.rig_log = Some(Rc::clone(&log));
            rig
        };
        let face = logged("face");
        let mouth = logged("mouth");
        let mut lip_rig = logged("lip");
        lip_rig.controls.push(ControlNodeSpec::new(lip, "lip"));

        let _ = run(
            store,
            vec![
                (face, None),
                (mouth, Some(RigId(0))),
                (lip_rig, Some(RigId(1))),
            ],
        );
        assert_eq!(*log.borrow(), vec!["face", "mouth", "lip"]);
    }

    #[test]
    fn allow_scale_on_any_member_unlocks_the_control() {
        let mut store = BoneStore::new();
        let lip = store.add_bone("ORG-lip", at(0.0), 1.0);
        let mut rig = Fixed::new("lip", lip);
        rig.controls = vec![
            ControlNodeSpec::new(lip, "lip"),
            ControlNodeSpec::new(lip, "lip_end").allow_scale(),
        ];

        let (generator, _) = run(store, vec![(rig, None)]);
        let control = generator.net().control_bone(NodeId(0)).unwrap();
        assert!(!generator.store().is_scale_locked(control));
    }

    #[test]
    fn master_layers_replace_and_member_layers_add() {
        let mut store = BoneStore::new();
        let lip = store.add_bone("ORG-lip", at(0.0), 1.0);
        store.set_layers(lip, LayerMask::layer(7), false);

        // The deeper lip rig wins the cluster although its node comes second.
        let mut mouth = Fixed::new("mouth", lip);
        mouth.layers = Some(LayerMask::layer(3));
        mouth.controls.push(ControlNodeSpec::new(lip, "corner"));
        let mut lip_rig = Fixed::new("lip", lip);
        lip_rig.layers = Some(LayerMask::layer(1));
        lip_rig.controls.push(ControlNodeSpec::new(lip, "lip"));

        let (generator, _) = run(store, vec![(mouth, None), (lip_rig, Some(RigId(0)))]);
        assert!(generator.net().is_master(NodeId(1)));
        let control = generator.net().control_bone(NodeId(0)).unwrap();
        assert_eq!(generator.store().name(control), "lip");
        assert_eq!(
            generator.store().layers(control),
            LayerMask::layer(1).union(LayerMask::layer(3))
        );
    }

    #[test]
    fn custom_icons_ask_the_rig_for_a_widget() {
        let mut store = BoneStore::new();
        let lip = store.add_bone("ORG-lip", at(0.0), 1.0);
        let mut rig = Fixed::new("lip", lip);
        rig.controls
            .push(ControlNodeSpec::new(lip, "lip").icon(ControlIcon::Custom));

        let (generator, _) = run(store, vec![(rig, None)]);
        let control = generator.net().control_bone(NodeId(0)).unwrap();
        assert_eq!(
            generator.store().widget(control),
            Some(&WidgetShape::Custom("WGT-lip".into()))
        );
    }

    #[test]
    fn consensus_averages_size_and_rotation_over_mirrors() {
        let quarter_z = Quat::new(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);
        let half_x = Quat::new(0.0, 1.0, 0.0, 0.0);
        let turned = |rotation| Transform3d::from_rotation_translation(rotation, Vec3::ZERO);

        let mut store = BoneStore::new();
        let left = store.add_bone("ORG-lip.L", turned(quarter_z), 1.0);
        let right = store.add_bone("ORG-lip.R", Transform3d::IDENTITY, 3.0);
        let chin = store.add_bone("ORG-chin", turned(half_x), 10.0);

        let mut rig = Fixed::new("lip", left);
        rig.controls = vec![
            ControlNodeSpec::new(left, "lip.L").icon(ControlIcon::Free),
            ControlNodeSpec::new(right, "lip.R").icon(ControlIcon::Free),
            ControlNodeSpec::new(chin, "chin"),
        ];

        let (generator, _) = run(store, vec![(rig, None)]);
        let master = generator.net().control(NodeId(0));
        assert!(master.is_master());
        assert_eq!(master.size(), 2.0);

        let control = generator.net().control_bone(NodeId(0)).unwrap();
        assert_eq!(generator.store().length(control), 2.0);
        // Halfway between identity and a quarter turn around Z.
        let expected = Quat::new(0.923_879_532_511_286_7, 0.0, 0.0, 0.382_683_432_365_089_8);
        let rotation = generator.store().matrix(control).to_rotation();
        assert!((rotation.dot(expected).abs() - 1.0).abs() < 1e-9);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn bone_events_are_reported() {
        use crate::trace::{BoneEvent, BoneRole, TraceSink};

        #[derive(Default)]
        struct Roles(Vec<BoneRole>);

        impl TraceSink for Roles {
            fn on_bone(&mut self, e: &BoneEvent<'_>) {
                self.0.push(e.role);
            }
        }

        let mut store = BoneStore::new();
        let lip = store.add_bone("ORG-lip", at(0.0), 1.0);
        let mut rig = Fixed::new("lip", lip);
        rig.controls.push(ControlNodeSpec::new(lip, "lip"));
        let mut rigs = RigTree::new();
        let _ = rigs.add(Box::new(rig), None);

        let mut sink = Roles::default();
        let mut generator = RigGenerator::new(store, rigs, GenerationOptions::STANDARD);
        let _ = generator.run(&mut Tracer::new(&mut sink)).unwrap();
        assert_eq!(sink.0, vec![BoneRole::Control]);
    }
}
