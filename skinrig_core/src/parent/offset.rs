// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contents of an offset parent generator.
//!
//! An offset accumulates requests from any number of rigs, keyed by target:
//! local-location copies per target bone, location drivers per rest
//! orientation and axis, and distance limits. Requests on the same key merge
//! into one constraint or driver when the offset is rigged.

use alloc::vec;
use alloc::vec::Vec;

use crate::armature::{DriverVariable, LimitDistance};
use crate::lazy::{BoneRef, Deferred};
use crate::math::Quat;

use super::ParentId;
use super::driver::DriverTerm;

/// Driver variable descriptor naming a possibly not yet generated bone.
pub type OffsetVariable = DriverVariable<BoneRef>;

/// Per-axis location driver terms for one orientation.
pub type LocationDrivers = [Vec<DriverTerm<OffsetVariable>>; 3];

/// Influence of one local-location copy request.
#[derive(Clone, Debug, PartialEq)]
pub enum Influence {
    /// A fixed amount.
    Value(f64),
    /// A driven amount.
    Expression(DriverTerm<OffsetVariable>),
    /// An amount only known once bones exist.
    Deferred(Deferred<f64>),
}

impl From<f64> for Influence {
    fn from(value: f64) -> Self {
        Self::Value(value)
    }
}

/// Accumulated local-location copies from one target bone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CopyLocal {
    /// Sum of fixed influences.
    pub influence: f64,
    /// Driven influence terms, summed into one driver.
    pub expressions: Vec<DriverTerm<OffsetVariable>>,
    /// Influences forced when the constraint is created.
    pub deferred: Vec<Deferred<f64>>,
}

impl CopyLocal {
    fn merge_before(&mut self, other: &Self) {
        self.influence += other.influence;
        self.expressions.splice(0..0, other.expressions.iter().cloned());
        self.deferred.splice(0..0, other.deferred.iter().cloned());
    }

    fn same_as(&self, other: &Self) -> bool {
        self.influence == other.influence
            && same_multiset(&self.expressions, &other.expressions)
            && same_multiset(&self.deferred, &other.deferred)
    }
}

/// Requests accumulated by an offset generator.
#[derive(Clone, Debug)]
pub struct OffsetParent {
    pub(crate) wrapped: ParentId,
    copy_local: Vec<(BoneRef, CopyLocal)>,
    add_local: Vec<([i64; 4], Quat, LocationDrivers)>,
    limit_distance: Vec<(BoneRef, LimitDistance)>,
}

impl OffsetParent {
    pub(crate) fn new(wrapped: ParentId) -> Self {
        Self {
            wrapped,
            copy_local: Vec::new(),
            add_local: Vec::new(),
            limit_distance: Vec::new(),
        }
    }

    /// The generator the offset is applied on top of.
    #[must_use]
    pub fn wrapped(&self) -> ParentId {
        self.wrapped
    }

    /// Whether nothing was requested, in which case no bone is made.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.copy_local.is_empty() && self.add_local.is_empty() && self.limit_distance.is_empty()
    }

    /// Adds the local location of `target` to the control.
    ///
    /// Requests on the same target share one constraint whose influence is
    /// the total of all requests.
    pub fn add_copy_local_location(
        &mut self,
        target: impl Into<BoneRef>,
        influence: impl Into<Influence>,
    ) {
        let target = target.into();
        let index = match self.copy_local.iter().position(|(t, _)| *t == target) {
            Some(index) => index,
            None => {
                self.copy_local.push((target, CopyLocal::default()));
                self.copy_local.len() - 1
            }
        };
        let entry = &mut self.copy_local[index].1;
        match influence.into() {
            Influence::Value(value) => entry.influence += value,
            Influence::Expression(term) => entry.expressions.push(term),
            Influence::Deferred(value) => entry.deferred.push(value),
        }
    }

    /// Drives one location axis of a mechanism bone with rest `orientation`.
    ///
    /// Orientations equal to four decimal places share a bone.
    ///
    /// # Panics
    ///
    /// Panics if `axis` is not 0, 1 or 2.
    pub fn add_location_driver(
        &mut self,
        orientation: Quat,
        axis: usize,
        term: DriverTerm<OffsetVariable>,
    ) {
        assert!(axis < 3, "location axis out of range: {axis}");
        let key = orientation.orientation_key();
        let index = match self.add_local.iter().position(|(k, ..)| *k == key) {
            Some(index) => index,
            None => {
                self.add_local
                    .push((key, orientation, [Vec::new(), Vec::new(), Vec::new()]));
                self.add_local.len() - 1
            }
        };
        self.add_local[index].2[axis].push(term);
    }

    /// Keeps the control within `params` of `target`.
    pub fn add_limit_distance(&mut self, target: impl Into<BoneRef>, params: LimitDistance) {
        self.limit_distance.push((target.into(), params));
    }

    /// Local-location copies per target, in first-request order.
    #[must_use]
    pub fn copy_local(&self) -> &[(BoneRef, CopyLocal)] {
        &self.copy_local
    }

    /// Location drivers per rest orientation, in first-request order.
    pub fn location_drivers(&self) -> impl Iterator<Item = (Quat, &LocationDrivers)> + '_ {
        self.add_local.iter().map(|(_, q, drivers)| (*q, drivers))
    }

    /// Distance limits in request order.
    #[must_use]
    pub fn limit_distance(&self) -> &[(BoneRef, LimitDistance)] {
        &self.limit_distance
    }

    /// Merges `other` into `self` as if its requests had been made first.
    pub(crate) fn prepend_contents(&mut self, other: &Self) {
        for (target, entry) in &other.copy_local {
            match self.copy_local.iter_mut().find(|(t, _)| t == target) {
                Some((_, mine)) => mine.merge_before(entry),
                None => self.copy_local.push((target.clone(), entry.clone())),
            }
        }

        for (key, orientation, drivers) in &other.add_local {
            match self.add_local.iter_mut().find(|(k, ..)| k == key) {
                Some((.., mine)) => {
                    for (axis, terms) in mine.iter_mut().enumerate() {
                        terms.splice(0..0, drivers[axis].iter().cloned());
                    }
                }
                None => self.add_local.push((*key, *orientation, drivers.clone())),
            }
        }

        self.limit_distance
            .splice(0..0, other.limit_distance.iter().cloned());
    }

    /// Order-insensitive comparison of the accumulated requests.
    pub(crate) fn same_contents(&self, other: &Self) -> bool {
        let copy_local = self.copy_local.len() == other.copy_local.len()
            && self.copy_local.iter().all(|(target, entry)| {
                other
                    .copy_local
                    .iter()
                    .any(|(t, e)| t == target && entry.same_as(e))
            });
        let add_local = self.add_local.len() == other.add_local.len()
            && self.add_local.iter().all(|(key, _, drivers)| {
                other.add_local.iter().any(|(k, _, d)| {
                    k == key && (0..3).all(|axis| same_multiset(&drivers[axis], &d[axis]))
                })
            });
        copy_local && add_local && same_multiset(&self.limit_distance, &other.limit_distance)
    }
}

fn same_multiset<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|item| {
        let found = (0..b.len()).find(|&i| !used[i] && b[i] == *item);
        if let Some(i) = found {
            used[i] = true;
        }
        found.is_some()
    })
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::*;
    use crate::armature::{BoneId, TransformChannel, TransformSpace};
    use crate::math::Vec3;

    fn var(bone: u32) -> OffsetVariable {
        DriverVariable::Transform {
            bone: BoneRef::Bone(BoneId(bone)),
            channel: TransformChannel::LocY,
            space: TransformSpace::Local,
        }
    }

    fn term(expression: &str, bone: u32) -> DriverTerm<OffsetVariable> {
        DriverTerm {
            expression: expression.to_string(),
            variables: vec![("v".to_string(), var(bone))],
        }
    }

    #[test]
    fn copy_local_requests_commute() {
        let mut ab = OffsetParent::new(ParentId(0));
        ab.add_copy_local_location(BoneId(4), 0.25);
        ab.add_copy_local_location(BoneId(4), Influence::Expression(term("$v*2", 7)));
        ab.add_copy_local_location(BoneId(4), 0.5);

        let mut ba = OffsetParent::new(ParentId(0));
        ba.add_copy_local_location(BoneId(4), 0.5);
        ba.add_copy_local_location(BoneId(4), Influence::Expression(term("$v*2", 7)));
        ba.add_copy_local_location(BoneId(4), 0.25);

        assert!(ab.same_contents(&ba));
        assert_eq!(ab.copy_local().len(), 1);
        assert_eq!(ab.copy_local()[0].1.influence, 0.75);
    }

    #[test]
    fn location_drivers_group_by_rounded_orientation() {
        let mut offset = OffsetParent::new(ParentId(0));
        let q = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), 0.5);
        let nudged = Quat::new(q.w + 1e-7, q.x, q.y, q.z);
        offset.add_location_driver(q, 0, term("$v", 1));
        offset.add_location_driver(nudged, 2, term("-$v", 1));
        offset.add_location_driver(Quat::IDENTITY, 1, term("$v", 2));

        let groups: Vec<_> = offset.location_drivers().collect();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1[0].len(), 1);
        assert!(groups[0].1[1].is_empty());
        assert_eq!(groups[0].1[2].len(), 1);
    }

    #[test]
    fn prepended_contents_come_first() {
        let mut outer = OffsetParent::new(ParentId(1));
        outer.add_copy_local_location(BoneId(4), Influence::Expression(term("$v", 8)));
        outer.add_limit_distance(BoneId(9), LimitDistance::INSIDE);

        let mut inner = OffsetParent::new(ParentId(0));
        inner.add_copy_local_location(BoneId(4), Influence::Expression(term("$v", 7)));
        inner.add_copy_local_location(BoneId(5), 1.0);
        inner.add_limit_distance(BoneId(3), LimitDistance::INSIDE);

        outer.prepend_contents(&inner);

        let targets: Vec<_> = outer.copy_local().iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(targets, vec![BoneRef::Bone(BoneId(4)), BoneRef::Bone(BoneId(5))]);
        assert_eq!(outer.copy_local()[0].1.expressions[0], term("$v", 7));
        assert_eq!(outer.limit_distance()[0].0, BoneRef::Bone(BoneId(3)));
    }

    #[test]
    fn different_targets_are_not_the_same() {
        let mut a = OffsetParent::new(ParentId(0));
        a.add_copy_local_location(BoneId(4), 1.0);
        let mut b = OffsetParent::new(ParentId(0));
        b.add_copy_local_location(BoneId(5), 1.0);
        assert!(!a.same_contents(&b));
        assert!(!a.is_empty());
        assert!(OffsetParent::new(ParentId(0)).is_empty());
    }

    #[test]
    #[should_panic(expected = "location axis out of range")]
    fn bad_axis_panics() {
        OffsetParent::new(ParentId(0)).add_location_driver(Quat::IDENTITY, 3, term("$v", 1));
    }
}
