// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use skinrig_core::trace::{
    BoneEvent, ClusterEvent, CollapseEvent, EnableEvent, GenerationSummary, InternEvent,
    ReuseEvent, StageEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_stage_begin(&mut self, e: &StageEvent) {
        let _ = writeln!(self.writer, "[stage:begin] {}", e.stage);
    }

    fn on_stage_end(&mut self, e: &StageEvent) {
        let _ = writeln!(self.writer, "[stage:end] {}", e.stage);
    }

    fn on_cluster(&mut self, e: &ClusterEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[cluster] master={} name={} members={} mirrors={}",
            e.master.index(),
            e.name,
            e.members,
            e.mirrors,
        );
    }

    fn on_intern(&mut self, e: &InternEvent) {
        let outcome = if e.reused { "reused" } else { "new" };
        let _ = writeln!(
            self.writer,
            "[intern] parent={} node={} {outcome}",
            e.parent.index(),
            e.node.index(),
        );
    }

    fn on_enable(&mut self, e: &EnableEvent) {
        let _ = writeln!(
            self.writer,
            "[enable] parent={} kind={} depth={}",
            e.parent.index(),
            e.kind.name(),
            e.depth,
        );
    }

    fn on_collapse(&mut self, e: &CollapseEvent) {
        let _ = writeln!(
            self.writer,
            "[collapse] parent={} absorbed={}",
            e.into.index(),
            e.absorbed.index(),
        );
    }

    fn on_bone(&mut self, e: &BoneEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[bone] {} id={} role={}",
            e.name,
            e.bone.index(),
            e.role.name(),
        );
    }

    fn on_reuse(&mut self, e: &ReuseEvent) {
        let _ = writeln!(
            self.writer,
            "[reuse] parent={} bone={}",
            e.parent.index(),
            e.bone.index(),
        );
    }

    fn on_summary(&mut self, s: &GenerationSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] nodes={}+{}q clusters={} parents={} reused={} enabled={} \
             collapses={} bones={} reused_bones={}",
            s.control_nodes,
            s.query_nodes,
            s.clusters,
            s.parents_interned,
            s.parents_reused,
            s.parents_enabled,
            s.collapses,
            s.bones_created,
            s.bones_reused,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skinrig_core::stage::Stage;

    #[test]
    fn pretty_print_stage() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_stage_begin(&StageEvent {
            stage: Stage::GenerateBones,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[stage:begin]"), "got: {output}");
        assert!(output.contains("generate_bones"), "got: {output}");
    }

    #[test]
    fn pretty_print_summary() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_summary(&GenerationSummary {
            clusters: 2,
            bones_created: 5,
            ..GenerationSummary::default()
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("clusters=2"), "got: {output}");
        assert!(output.contains("bones=5"), "got: {output}");
    }
}
