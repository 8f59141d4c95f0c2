// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays bone storage with naming, hierarchy, and rigging data.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::math::{Transform3d, Vec3};

use super::id::{BoneId, INVALID, LayerMask};
use super::mechanism::{Constraint, Driver, InheritScale, WidgetShape};
use super::traverse::{Ancestors, Children};

/// Name of the bone every [`BoneStore`] starts with.
pub const ROOT_NAME: &str = "root";

/// Struct-of-arrays storage for all bones of one armature.
///
/// Bones are addressed by [`BoneId`] handles and never removed. Names are
/// unique; [`add_bone`](Self::add_bone) appends a `.NNN` counter on clashes
/// the same way the host application does.
#[derive(Debug)]
pub struct BoneStore {
    // -- Identity --
    pub(crate) names: Vec<String>,
    pub(crate) by_name: BTreeMap<String, u32>,

    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) inherit_scale: Vec<InheritScale>,

    // -- Rest pose --
    pub(crate) matrix: Vec<Transform3d>,
    pub(crate) length: Vec<f64>,

    // -- Pose settings --
    pub(crate) lock_scale: Vec<bool>,
    pub(crate) layers: Vec<LayerMask>,
    pub(crate) constraints: Vec<Vec<Constraint>>,
    pub(crate) drivers: Vec<Vec<Driver>>,
    pub(crate) widget: Vec<Option<WidgetShape>>,
    pub(crate) widget_transform: Vec<u32>,

    pub(crate) len: u32,
}

impl Default for BoneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BoneStore {
    /// Creates a store holding only the [`ROOT_NAME`] bone at the origin.
    #[must_use]
    pub fn new() -> Self {
        let mut store = Self {
            names: Vec::new(),
            by_name: BTreeMap::new(),
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            inherit_scale: Vec::new(),
            matrix: Vec::new(),
            length: Vec::new(),
            lock_scale: Vec::new(),
            layers: Vec::new(),
            constraints: Vec::new(),
            drivers: Vec::new(),
            widget: Vec::new(),
            widget_transform: Vec::new(),
            len: 0,
        };
        store.add_bone(ROOT_NAME, Transform3d::IDENTITY, 1.0);
        store
    }

    // -- Allocation API --

    /// Returns the root bone.
    #[inline]
    #[must_use]
    pub const fn root(&self) -> BoneId {
        BoneId(0)
    }

    /// Creates a new unparented bone and returns its handle.
    ///
    /// If `name` is taken, the first free `name.NNN` variant is used instead.
    pub fn add_bone(&mut self, name: &str, matrix: Transform3d, length: f64) -> BoneId {
        let name = self.unique_name(name);
        let idx = self.len;
        self.len += 1;

        self.by_name.insert(name.clone(), idx);
        self.names.push(name);
        self.parent.push(INVALID);
        self.first_child.push(INVALID);
        self.next_sibling.push(INVALID);
        self.prev_sibling.push(INVALID);
        self.inherit_scale.push(InheritScale::Full);
        self.matrix.push(matrix);
        self.length.push(length);
        self.lock_scale.push(false);
        self.layers.push(LayerMask::NONE);
        self.constraints.push(Vec::new());
        self.drivers.push(Vec::new());
        self.widget.push(None);
        self.widget_transform.push(INVALID);

        BoneId(idx)
    }

    /// Copies the rest pose and layers of `src` into a new unparented bone.
    ///
    /// # Panics
    ///
    /// Panics if `src` is not a bone of this store.
    pub fn copy_bone(&mut self, src: BoneId, name: &str) -> BoneId {
        self.validate(src);
        let matrix = self.matrix[src.0 as usize];
        let length = self.length[src.0 as usize];
        let layers = self.layers[src.0 as usize];
        let id = self.add_bone(name, matrix, length);
        self.layers[id.0 as usize] = layers;
        id
    }

    /// Looks a bone up by exact name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.by_name.get(name).map(|&idx| BoneId(idx))
    }

    /// Number of bones, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false; the root bone exists from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates every bone in creation order.
    pub fn bones(&self) -> impl Iterator<Item = BoneId> + '_ {
        (0..self.len).map(BoneId)
    }

    // -- Topology API --

    /// Sets or clears the parent of `child`.
    ///
    /// The child is appended as the last child of its new parent. When
    /// `inherit_scale` is `Some`, the scale inheritance mode is updated too.
    ///
    /// # Panics
    ///
    /// Panics if a handle is not a bone of this store or if the new parent is
    /// `child` itself or one of its descendants.
    pub fn set_parent(
        &mut self,
        child: BoneId,
        parent: Option<BoneId>,
        inherit_scale: Option<InheritScale>,
    ) {
        self.validate(child);
        let c = child.0;

        if let Some(parent) = parent {
            self.validate(parent);
            assert!(
                !self.ancestors(parent).any(|b| b == child),
                "bone parent cycle: {} under {}",
                self.names[c as usize],
                self.names[parent.0 as usize]
            );
        }

        if self.parent[c as usize] != INVALID {
            self.unlink_from_parent(c);
        }

        if let Some(parent) = parent {
            let p = parent.0;
            self.parent[c as usize] = p;
            if self.first_child[p as usize] == INVALID {
                self.first_child[p as usize] = c;
            } else {
                // Walk to last child.
                let mut last = self.first_child[p as usize];
                while self.next_sibling[last as usize] != INVALID {
                    last = self.next_sibling[last as usize];
                }
                self.next_sibling[last as usize] = c;
                self.prev_sibling[c as usize] = last;
            }
        }

        if let Some(mode) = inherit_scale {
            self.inherit_scale[c as usize] = mode;
        }
    }

    /// Parents every bone of `chain` to the one before it.
    pub fn parent_bone_chain(&mut self, chain: &[BoneId]) {
        for pair in chain.windows(2) {
            self.set_parent(pair[1], Some(pair[0]), None);
        }
    }

    /// Returns the parent of a bone, if any.
    #[must_use]
    pub fn parent(&self, id: BoneId) -> Option<BoneId> {
        self.validate(id);
        let p = self.parent[id.0 as usize];
        (p != INVALID).then_some(BoneId(p))
    }

    /// Returns an iterator over the direct children of a bone.
    #[must_use]
    pub fn children(&self, id: BoneId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.0 as usize])
    }

    /// Returns an iterator over `id` and all of its ancestors.
    #[must_use]
    pub fn ancestors(&self, id: BoneId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors::new(self, id.0)
    }

    // -- Property getters --

    /// Returns the unique name of a bone.
    #[must_use]
    pub fn name(&self, id: BoneId) -> &str {
        self.validate(id);
        &self.names[id.0 as usize]
    }

    /// Returns the rest matrix of a bone.
    #[must_use]
    pub fn matrix(&self, id: BoneId) -> Transform3d {
        self.validate(id);
        self.matrix[id.0 as usize]
    }

    /// Returns the rest length of a bone.
    #[must_use]
    pub fn length(&self, id: BoneId) -> f64 {
        self.validate(id);
        self.length[id.0 as usize]
    }

    /// Returns the head (rest position) of a bone.
    #[must_use]
    pub fn head(&self, id: BoneId) -> Vec3 {
        self.matrix(id).translation()
    }

    /// Returns the tail of a bone: the head moved along the local Y axis.
    #[must_use]
    pub fn tail(&self, id: BoneId) -> Vec3 {
        let matrix = self.matrix(id);
        matrix.translation() + matrix.axis(1) * self.length[id.0 as usize]
    }

    /// Returns the scale inheritance mode of a bone.
    #[must_use]
    pub fn inherit_scale(&self, id: BoneId) -> InheritScale {
        self.validate(id);
        self.inherit_scale[id.0 as usize]
    }

    /// Returns whether all scale channels of a bone are locked.
    #[must_use]
    pub fn is_scale_locked(&self, id: BoneId) -> bool {
        self.validate(id);
        self.lock_scale[id.0 as usize]
    }

    /// Returns the visibility layers of a bone.
    #[must_use]
    pub fn layers(&self, id: BoneId) -> LayerMask {
        self.validate(id);
        self.layers[id.0 as usize]
    }

    /// Returns the constraint stack of a bone.
    #[must_use]
    pub fn constraints(&self, id: BoneId) -> &[Constraint] {
        self.validate(id);
        &self.constraints[id.0 as usize]
    }

    /// Returns the drivers of a bone.
    #[must_use]
    pub fn drivers(&self, id: BoneId) -> &[Driver] {
        self.validate(id);
        &self.drivers[id.0 as usize]
    }

    /// Returns the display widget of a bone.
    #[must_use]
    pub fn widget(&self, id: BoneId) -> Option<&WidgetShape> {
        self.validate(id);
        self.widget[id.0 as usize].as_ref()
    }

    /// Returns the bone whose transform is used to draw this bone's widget.
    #[must_use]
    pub fn widget_transform(&self, id: BoneId) -> Option<BoneId> {
        self.validate(id);
        let t = self.widget_transform[id.0 as usize];
        (t != INVALID).then_some(BoneId(t))
    }

    // -- Mutation API --

    /// Sets the rest matrix of a bone.
    pub fn set_matrix(&mut self, id: BoneId, matrix: Transform3d) {
        self.validate(id);
        self.matrix[id.0 as usize] = matrix;
    }

    /// Sets the rest length of a bone.
    pub fn set_length(&mut self, id: BoneId, length: f64) {
        self.validate(id);
        self.length[id.0 as usize] = length;
    }

    /// Locks or unlocks all scale channels.
    pub fn lock_scale(&mut self, id: BoneId, locked: bool) {
        self.validate(id);
        self.lock_scale[id.0 as usize] = locked;
    }

    /// Assigns visibility layers, either replacing or adding to the current
    /// set.
    pub fn set_layers(&mut self, id: BoneId, layers: LayerMask, combine: bool) {
        self.validate(id);
        let slot = &mut self.layers[id.0 as usize];
        *slot = if combine { slot.union(layers) } else { layers };
    }

    /// Appends a constraint and returns its index in the stack.
    pub fn add_constraint(&mut self, id: BoneId, constraint: Constraint) -> usize {
        self.validate(id);
        let stack = &mut self.constraints[id.0 as usize];
        stack.push(constraint);
        stack.len() - 1
    }

    /// Attaches a driver.
    ///
    /// # Panics
    ///
    /// Panics if the driver targets a constraint index that does not exist.
    pub fn add_driver(&mut self, id: BoneId, driver: Driver) {
        self.validate(id);
        if let super::DriverChannel::ConstraintInfluence(index) = driver.channel {
            assert!(
                index < self.constraints[id.0 as usize].len(),
                "driver on missing constraint {index} of {}",
                self.names[id.0 as usize]
            );
        }
        self.drivers[id.0 as usize].push(driver);
    }

    /// Sets the display widget.
    pub fn set_widget(&mut self, id: BoneId, shape: WidgetShape) {
        self.validate(id);
        self.widget[id.0 as usize] = Some(shape);
    }

    /// Draws the widget of `id` at the transform of `source`.
    pub fn set_widget_transform(&mut self, id: BoneId, source: BoneId) {
        self.validate(id);
        self.validate(source);
        self.widget_transform[id.0 as usize] = source.0;
    }

    // -- Internal helpers --

    /// Panics if the handle does not belong to this store.
    fn validate(&self, id: BoneId) {
        assert!(
            id.0 < self.len,
            "unknown BoneId: {id:?} (len {})",
            self.len
        );
    }

    fn unique_name(&self, name: &str) -> String {
        if !self.by_name.contains_key(name) {
            return String::from(name);
        }
        let base = match name.rsplit_once('.') {
            Some((head, digits))
                if !head.is_empty()
                    && !digits.is_empty()
                    && digits.bytes().all(|b| b.is_ascii_digit()) =>
            {
                head
            }
            _ => name,
        };
        let mut counter = 1_u32;
        loop {
            let candidate = format!("{base}.{counter:03}");
            if !self.by_name.contains_key(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Removes `idx` from its parent's child list.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}
