// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON event log.
//!
//! [`JsonLogSink`] keeps every event of a pass as a JSON object tagged with
//! its position in the pass and the stage it happened in. [`JsonLogSink::write`]
//! emits the collected events as one JSON array.

use std::io::{self, Write};

use serde_json::{Value, json};

use skinrig_core::stage::Stage;
use skinrig_core::trace::{
    BoneEvent, ClusterEvent, CollapseEvent, EnableEvent, GenerationSummary, InternEvent,
    ReuseEvent, StageEvent, TraceSink,
};

/// Collects trace events as JSON objects.
#[derive(Debug, Default)]
pub struct JsonLogSink {
    events: Vec<Value>,
    stage: Option<Stage>,
}

impl JsonLogSink {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events collected so far.
    #[must_use]
    pub fn events(&self) -> &[Value] {
        &self.events
    }

    /// Writes the collected events as a pretty-printed JSON array.
    ///
    /// # Errors
    ///
    /// Returns any error of the underlying writer.
    pub fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, &self.events)?;
        writeln!(writer)
    }

    fn push(&mut self, name: &str, args: Value) {
        self.events.push(json!({
            "seq": self.events.len(),
            "stage": self.stage.map(Stage::name),
            "name": name,
            "args": args,
        }));
    }
}

impl TraceSink for JsonLogSink {
    fn on_stage_begin(&mut self, e: &StageEvent) {
        self.stage = Some(e.stage);
        self.push("StageBegin", json!({}));
    }

    fn on_stage_end(&mut self, e: &StageEvent) {
        self.push("StageEnd", json!({}));
        if self.stage == Some(e.stage) {
            self.stage = None;
        }
    }

    fn on_cluster(&mut self, e: &ClusterEvent<'_>) {
        self.push(
            "Cluster",
            json!({
                "master": e.master.index(),
                "name": e.name,
                "members": e.members,
                "mirrors": e.mirrors,
            }),
        );
    }

    fn on_intern(&mut self, e: &InternEvent) {
        self.push(
            "Intern",
            json!({
                "parent": e.parent.index(),
                "node": e.node.index(),
                "reused": e.reused,
            }),
        );
    }

    fn on_enable(&mut self, e: &EnableEvent) {
        self.push(
            "Enable",
            json!({
                "parent": e.parent.index(),
                "kind": e.kind.name(),
                "depth": e.depth,
            }),
        );
    }

    fn on_collapse(&mut self, e: &CollapseEvent) {
        self.push(
            "Collapse",
            json!({
                "into": e.into.index(),
                "absorbed": e.absorbed.index(),
            }),
        );
    }

    fn on_bone(&mut self, e: &BoneEvent<'_>) {
        self.push(
            "Bone",
            json!({
                "bone": e.bone.index(),
                "name": e.name,
                "role": e.role.name(),
            }),
        );
    }

    fn on_reuse(&mut self, e: &ReuseEvent) {
        self.push(
            "Reuse",
            json!({
                "parent": e.parent.index(),
                "bone": e.bone.index(),
            }),
        );
    }

    fn on_summary(&mut self, s: &GenerationSummary) {
        self.push(
            "Summary",
            json!({
                "control_nodes": s.control_nodes,
                "query_nodes": s.query_nodes,
                "clusters": s.clusters,
                "parents_interned": s.parents_interned,
                "parents_reused": s.parents_reused,
                "parents_enabled": s.parents_enabled,
                "collapses": s.collapses,
                "bones_created": s.bones_created,
                "bones_reused": s.bones_reused,
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_carry_the_current_stage() {
        let mut sink = JsonLogSink::new();
        sink.on_stage_begin(&StageEvent {
            stage: Stage::Initialize,
        });
        sink.on_summary(&GenerationSummary {
            clusters: 3,
            ..GenerationSummary::default()
        });
        sink.on_stage_end(&StageEvent {
            stage: Stage::Initialize,
        });

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1]["name"], "Summary");
        assert_eq!(events[1]["stage"], "initialize");
        assert_eq!(events[1]["args"]["clusters"], 3);
        assert_eq!(events[2]["seq"], 2);
    }

    #[test]
    fn write_produces_a_json_array() {
        let mut sink = JsonLogSink::new();
        sink.on_stage_begin(&StageEvent {
            stage: Stage::RigBones,
        });
        let mut out = Vec::new();
        sink.write(&mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(1));
        assert_eq!(parsed[0]["stage"], "rig_bones");
    }
}
