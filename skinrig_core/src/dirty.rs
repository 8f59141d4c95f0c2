// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Parent generators use [`understory_dirty`] to propagate *enabling*
//! through wrapper chains. A wrapping generator (layer, offset) depends on
//! nothing, but the generator it wraps depends on it: enabling the wrapper
//! must enable everything below it.
//!
//! # Propagation semantics
//!
//! [`ENABLED`] is marked with [`EagerPolicy`](understory_dirty::EagerPolicy)
//! and has a dependency edge from each wrapped generator to its wrapper, so
//! marking the outermost generator marks the whole chain.
//!
//! # Consumption
//!
//! After the prepare stage the
//! [`ParentArena`](crate::parent::ParentArena) drains the channel once. The
//! drained set, ordered innermost first, is the list of generators that take
//! part in the remaining stages.

use understory_dirty::Channel;

/// Parent generator requested by a control node, directly or through a
/// wrapper.
pub const ENABLED: Channel = Channel::new(0);
