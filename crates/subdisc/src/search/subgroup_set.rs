//! Bounded, deduplicated, quality-ordered result collection.

use fixedbitset::FixedBitSet;
use std::collections::HashSet;

use crate::subgroup::Subgroup;

/// The best subgroups found so far.
///
/// Subgroups are kept in descending quality order, equal qualities in
/// insertion order. No two members share a member set. When full, the
/// lowest-quality subgroup is evicted; among equally low ones the most
/// recently inserted goes first.
#[derive(Debug, Clone)]
pub struct SubgroupSet {
    subgroups: Vec<Subgroup>,
    members: HashSet<FixedBitSet>,
    capacity: usize,
    ids_assigned: bool,
}

impl SubgroupSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            subgroups: Vec::new(),
            members: HashSet::new(),
            capacity: capacity.max(1),
            ids_assigned: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.subgroups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subgroups.is_empty()
    }

    /// Insert a subgroup. Returns whether it is in the set afterwards.
    ///
    /// NaN qualities are refused. A subgroup whose member set is already
    /// present replaces the existing one only with a strictly higher quality.
    pub fn add(&mut self, subgroup: Subgroup) -> bool {
        let quality = subgroup.quality();
        if quality.is_nan() {
            return false;
        }

        if self.members.contains(subgroup.members()) {
            let Some(position) = self
                .subgroups
                .iter()
                .position(|s| s.members() == subgroup.members())
            else {
                return false;
            };
            if quality <= self.subgroups[position].quality() {
                return false;
            }
            self.subgroups.remove(position);
        } else {
            self.members.insert(subgroup.members().clone());
        }

        let position = self.subgroups.partition_point(|s| s.quality() >= quality);
        self.subgroups.insert(position, subgroup);
        self.invalidate_ids();

        if self.subgroups.len() > self.capacity {
            if let Some(evicted) = self.subgroups.pop() {
                self.members.remove(evicted.members());
            }
            return position < self.subgroups.len();
        }
        true
    }

    /// Quality of the best subgroup.
    pub fn best_score(&self) -> Option<f64> {
        self.subgroups.first().map(Subgroup::quality)
    }

    /// Mean quality of the best `k` subgroups, if there are at least `k`.
    pub fn top_k_average(&self, k: usize) -> Option<f64> {
        if k == 0 || self.subgroups.len() < k {
            return None;
        }
        Some(self.subgroups[..k].iter().map(Subgroup::quality).sum::<f64>() / k as f64)
    }

    /// Number subgroups 1..=len in quality order.
    pub fn set_ids(&mut self) {
        for (i, subgroup) in self.subgroups.iter_mut().enumerate() {
            subgroup.set_id(i + 1);
        }
        self.ids_assigned = true;
    }

    pub fn ids_assigned(&self) -> bool {
        self.ids_assigned
    }

    fn invalidate_ids(&mut self) {
        if self.ids_assigned {
            self.subgroups.iter_mut().for_each(Subgroup::clear_id);
            self.ids_assigned = false;
        }
    }

    pub fn get(&self, index: usize) -> Option<&Subgroup> {
        self.subgroups.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Subgroup> {
        self.subgroups.iter()
    }

    /// Mutable access for attaching p-values and models.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Subgroup> {
        self.subgroups.iter_mut()
    }

    pub fn into_vec(self) -> Vec<Subgroup> {
        self.subgroups
    }
}

impl<'a> IntoIterator for &'a SubgroupSet {
    type Item = &'a Subgroup;
    type IntoIter = std::slice::Iter<'a, Subgroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.subgroups.iter()
    }
}

impl IntoIterator for SubgroupSet {
    type Item = Subgroup;
    type IntoIter = std::vec::IntoIter<Subgroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.subgroups.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionList;
    use pretty_assertions::assert_eq;

    fn subgroup(rows: &[usize], quality: f64) -> Subgroup {
        let mut members = FixedBitSet::with_capacity(8);
        for &row in rows {
            members.insert(row);
        }
        Subgroup::new(ConditionList::new(), members).with_quality(quality)
    }

    fn qualities(set: &SubgroupSet) -> Vec<f64> {
        set.iter().map(Subgroup::quality).collect()
    }

    #[test]
    fn test_ordered_and_bounded() {
        let mut set = SubgroupSet::new(3);
        assert!(set.add(subgroup(&[0], 0.2)));
        assert!(set.add(subgroup(&[1], 0.9)));
        assert!(set.add(subgroup(&[2], 0.5)));
        assert!(set.add(subgroup(&[3], 0.7)));
        assert!(!set.add(subgroup(&[4], 0.1)));

        assert_eq!(set.len(), 3);
        assert_eq!(qualities(&set), vec![0.9, 0.7, 0.5]);
        assert_eq!(set.best_score(), Some(0.9));
    }

    #[test]
    fn test_eviction_prefers_latest_among_equal_lowest() {
        let mut set = SubgroupSet::new(2);
        set.add(subgroup(&[0], 0.5));
        set.add(subgroup(&[1], 0.5));
        assert!(!set.add(subgroup(&[2], 0.5)));
        let first: Vec<usize> = set.iter().map(|s| s.members().ones().next().unwrap()).collect();
        assert_eq!(first, vec![0, 1]);
    }

    #[test]
    fn test_duplicate_members_keep_best_or_first() {
        let mut set = SubgroupSet::new(10);
        assert!(set.add(subgroup(&[1, 2], 0.4)));
        assert!(!set.add(subgroup(&[1, 2], 0.4)));
        assert!(!set.add(subgroup(&[1, 2], 0.3)));
        assert_eq!(set.len(), 1);

        assert!(set.add(subgroup(&[1, 2], 0.8)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.best_score(), Some(0.8));
    }

    #[test]
    fn test_nan_is_refused() {
        let mut set = SubgroupSet::new(10);
        assert!(!set.add(subgroup(&[1], f64::NAN)));
        assert!(set.is_empty());
        assert_eq!(set.best_score(), None);
    }

    #[test]
    fn test_ids_follow_quality_and_reset_on_mutation() {
        let mut set = SubgroupSet::new(10);
        set.add(subgroup(&[0], 0.1));
        set.add(subgroup(&[1], 0.3));
        set.set_ids();
        let ids: Vec<Option<usize>> = set.iter().map(Subgroup::id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);

        set.add(subgroup(&[2], 0.2));
        assert!(!set.ids_assigned());
        assert!(set.iter().all(|s| s.id().is_none()));
    }

    #[test]
    fn test_top_k_average() {
        let mut set = SubgroupSet::new(10);
        for (row, quality) in [0.4, 0.2, 0.6].into_iter().enumerate() {
            set.add(subgroup(&[row], quality));
        }
        assert!((set.top_k_average(2).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(set.top_k_average(4), None);
    }
}
