// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and JSON event logs for skinrig generation passes.
//!
//! This crate provides [`TraceSink`](skinrig_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`json::JsonLogSink`]: collects events as JSON objects and writes them
//!   as one array.

pub mod json;
pub mod pretty;
