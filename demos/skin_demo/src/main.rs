// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generates a mirrored lip rig and prints the resulting armature.
//!
//! Four lip chains (top/bottom, left/right) share their middle and corner
//! controls. A mouth rig above them makes the bottom lip follow the jaw
//! through an offset parent, so each corner blends between the face and the
//! jaw through a mix-parent bone. Events go to a
//! [`PrettyPrintSink`](skinrig_debug::pretty::PrettyPrintSink) on stdout and
//! to `skin_trace.json`.

use std::fs::File;
use std::io::BufWriter;

use skinrig_core::armature::{BoneId, BoneStore};
use skinrig_core::generator::RigGenerator;
use skinrig_core::host::Host;
use skinrig_core::math::{Transform3d, Vec3};
use skinrig_core::naming::{SideZ, name_sides};
use skinrig_core::node::{ChainEnd, ControlLayer, ControlNodeSpec, NodeBuilder, QueryNodeSpec};
use skinrig_core::options::GenerationOptions;
use skinrig_core::parent::{ParentId, ParentScope};
use skinrig_core::rig::{RigTree, SkinRig};
use skinrig_core::trace::{
    BoneEvent, ClusterEvent, CollapseEvent, EnableEvent, GenerationSummary, InternEvent,
    ReuseEvent, StageEvent, TraceSink, Tracer,
};

use skinrig_debug::json::JsonLogSink;
use skinrig_debug::pretty::PrettyPrintSink;

/// Half the mouth width.
const CORNER_X: f64 = 0.25;
/// Vertical offset of the lip middles from the mouth line.
const LIP_Z: f64 = 0.05;

/// Owns the jaw offset of every bottom-lip control below it.
struct Mouth {
    face: BoneId,
    jaw: BoneId,
}

impl SkinRig for Mouth {
    fn name(&self) -> &str {
        "mouth"
    }

    fn base_bone(&self) -> BoneId {
        self.face
    }

    fn is_chain_rig(&self) -> bool {
        false
    }

    fn extend_control_node_parent(&self, parent: ParentId, scope: &mut ParentScope<'_>) -> ParentId {
        let name = scope.net().name(scope.node());
        if name_sides(name).side_z != SideZ::Bottom {
            return parent;
        }
        let offset = scope.ensure_offset(parent);
        scope
            .offset_mut(offset)
            .add_copy_local_location(self.jaw, 1.0);
        offset
    }
}

/// One half of one lip: a middle control and a corner control.
struct LipChain {
    name: &'static str,
    org: BoneId,
    corner: Vec3,
}

impl SkinRig for LipChain {
    fn name(&self) -> &str {
        self.name
    }

    fn base_bone(&self) -> BoneId {
        self.org
    }

    fn chain_priority(&self) -> i32 {
        1
    }

    fn init_control_nodes(&mut self, nodes: &mut NodeBuilder<'_>) {
        let _ = nodes.add_control(
            ControlNodeSpec::new(self.org, self.name)
                .chain_end(ChainEnd::Start)
                .layer(ControlLayer::MiddlePivot),
        );
        let _ = nodes.add_control(
            ControlNodeSpec::new(self.org, format!("lip_end{}", &self.name[3..]))
                .point(self.corner)
                .chain_end(ChainEnd::End)
                .needs_reparent(),
        );
    }
}

/// Looks up the bottom-lip middle control in jaw space.
struct JawTracker {
    jaw: BoneId,
    lip: BoneId,
}

impl SkinRig for JawTracker {
    fn name(&self) -> &str {
        "jaw_tracker"
    }

    fn base_bone(&self) -> BoneId {
        self.jaw
    }

    fn is_chain_rig(&self) -> bool {
        false
    }

    fn init_control_nodes(&mut self, nodes: &mut NodeBuilder<'_>) {
        let _ = nodes.add_query(
            QueryNodeSpec::new(self.lip)
                .name("lip_jaw_tracker.B")
                .find_highest_layer(),
        );
    }
}

/// Forwards every event to two sinks.
struct Tee<'a> {
    first: &'a mut dyn TraceSink,
    second: &'a mut dyn TraceSink,
}

impl TraceSink for Tee<'_> {
    fn on_stage_begin(&mut self, e: &StageEvent) {
        self.first.on_stage_begin(e);
        self.second.on_stage_begin(e);
    }

    fn on_stage_end(&mut self, e: &StageEvent) {
        self.first.on_stage_end(e);
        self.second.on_stage_end(e);
    }

    fn on_cluster(&mut self, e: &ClusterEvent<'_>) {
        self.first.on_cluster(e);
        self.second.on_cluster(e);
    }

    fn on_intern(&mut self, e: &InternEvent) {
        self.first.on_intern(e);
        self.second.on_intern(e);
    }

    fn on_enable(&mut self, e: &EnableEvent) {
        self.first.on_enable(e);
        self.second.on_enable(e);
    }

    fn on_collapse(&mut self, e: &CollapseEvent) {
        self.first.on_collapse(e);
        self.second.on_collapse(e);
    }

    fn on_bone(&mut self, e: &BoneEvent<'_>) {
        self.first.on_bone(e);
        self.second.on_bone(e);
    }

    fn on_reuse(&mut self, e: &ReuseEvent) {
        self.first.on_reuse(e);
        self.second.on_reuse(e);
    }

    fn on_summary(&mut self, s: &GenerationSummary) {
        self.first.on_summary(s);
        self.second.on_summary(s);
    }
}

/// Prints the armature instead of writing it into a scene.
struct PrintHost;

impl Host for PrintHost {
    fn apply(&mut self, store: &BoneStore, summary: &GenerationSummary) {
        println!("-- armature ({} bones created) --", summary.bones_created);
        for bone in store.bones() {
            let parent = store.parent(bone).map_or("-", |p| store.name(p));
            let head = store.head(bone);
            println!(
                "{:<24} parent={:<24} head=({:.2}, {:.2}, {:.2}) constraints={} drivers={}",
                store.name(bone),
                parent,
                head.x,
                head.y,
                head.z,
                store.constraints(bone).len(),
                store.drivers(bone).len(),
            );
        }
    }
}

fn at(x: f64, z: f64) -> Transform3d {
    Transform3d::from_translation(Vec3::new(x, 0.0, z))
}

fn main() {
    // -- metarig -----------------------------------------------------------
    let mut store = BoneStore::new();
    let face = store.add_bone("ORG-face", at(0.0, 0.5), 0.5);
    let jaw = store.add_bone("ORG-jaw", at(0.0, 0.2), 0.3);
    store.set_parent(face, Some(store.root()), None);
    store.set_parent(jaw, Some(face), None);

    // -- rigs --------------------------------------------------------------
    let mut rigs = RigTree::new();
    let mouth = rigs.add(Box::new(Mouth { face, jaw }), None);
    let mut bottom_middle = None;
    for (name, z, x) in [
        ("lip.T.L", LIP_Z, CORNER_X),
        ("lip.T.R", LIP_Z, -CORNER_X),
        ("lip.B.L", -LIP_Z, CORNER_X),
        ("lip.B.R", -LIP_Z, -CORNER_X),
    ] {
        let org = store.add_bone(&format!("ORG-{name}"), at(0.0, z), 0.1);
        store.set_parent(org, Some(face), None);
        if name == "lip.B.L" {
            bottom_middle = Some(org);
        }
        let chain = LipChain {
            name,
            org,
            corner: Vec3::new(x, 0.0, 0.0),
        };
        let _ = rigs.add(Box::new(chain), Some(mouth));
    }
    if let Some(lip) = bottom_middle {
        let _ = rigs.add(Box::new(JawTracker { jaw, lip }), None);
    }

    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut json = JsonLogSink::new();

    // -- generate ----------------------------------------------------------
    let mut generator = RigGenerator::new(store, rigs, GenerationOptions::STANDARD);
    let result = {
        let mut tee = Tee {
            first: &mut pretty,
            second: &mut json,
        };
        generator.run(&mut Tracer::new(&mut tee))
    };
    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("generation failed: {err}");
            std::process::exit(1);
        }
    };

    PrintHost.apply(generator.store(), &summary);

    // -- export ------------------------------------------------------------
    let path = "skin_trace.json";
    let file = File::create(path).expect("failed to create trace file");
    let mut writer = BufWriter::new(file);
    json.write(&mut writer).expect("failed to write trace");
    println!("wrote {} events to {path}", json.events().len());
}
