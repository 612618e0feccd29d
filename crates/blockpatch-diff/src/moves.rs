//! Move detection by per-parent longest common subsequence.
//!
//! Within one parent, the ids that keep their relative order between the
//! two snapshots form an LCS. Every other id that lands in that parent in
//! the new snapshot needs an explicit move: its position cannot be inferred
//! from neighbours that stayed put. Which of several equal-length LCS
//! candidates is chosen decides *which* ids are flagged, never *how many*.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use blockpatch_types::FlatBlock;
use tracing::warn;

/// Sibling anchors of a block in one snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Anchors {
    pub after_id: Option<String>,
    pub before_id: Option<String>,
}

/// Id and parent-group lookup over one flat snapshot.
///
/// Built fresh for every diff; groups are sorted by `order`.
#[derive(Debug, Default)]
pub struct FlatIndex<'a> {
    by_id: HashMap<&'a str, &'a FlatBlock>,
    groups: BTreeMap<&'a str, Vec<&'a FlatBlock>>,
    positions: HashMap<&'a str, usize>,
}

impl<'a> FlatIndex<'a> {
    pub fn new(blocks: &'a [FlatBlock]) -> Self {
        let mut by_id = HashMap::with_capacity(blocks.len());
        let mut groups: BTreeMap<&'a str, Vec<&'a FlatBlock>> = BTreeMap::new();
        for block in blocks {
            by_id.insert(block.id.as_str(), block);
            groups.entry(block.parent_id.as_str()).or_default().push(block);
        }

        let mut positions = HashMap::with_capacity(blocks.len());
        for siblings in groups.values_mut() {
            siblings.sort_by_key(|b| b.order);
            for (pos, block) in siblings.iter().enumerate() {
                positions.insert(block.id.as_str(), pos);
            }
        }

        Self {
            by_id,
            groups,
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&'a FlatBlock> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Children of `parent_id` sorted by order (empty id = top level).
    pub fn siblings(&self, parent_id: &str) -> &[&'a FlatBlock] {
        self.groups.get(parent_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every parent id that has at least one child.
    pub fn parents(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.groups.keys().copied()
    }

    /// Size of the largest sibling group.
    pub fn largest_group(&self) -> usize {
        self.groups.values().map(Vec::len).max().unwrap_or(0)
    }

    /// The previous and next sibling of `block` in this snapshot.
    pub fn anchors(&self, block: &FlatBlock) -> Anchors {
        let siblings = self.siblings(&block.parent_id);
        let Some(&pos) = self.positions.get(block.id.as_str()) else {
            return Anchors::default();
        };
        Anchors {
            after_id: pos
                .checked_sub(1)
                .and_then(|p| siblings.get(p))
                .map(|b| b.id.clone()),
            before_id: siblings.get(pos + 1).map(|b| b.id.clone()),
        }
    }
}

/// Longest common subsequence of `a` and `b`.
///
/// Standard O(n*m) table. The backtrack prefers stepping back in `a` when
/// both directions keep the same length.
pub fn lcs<T: PartialEq + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let (n, m) = (a.len(), b.len());
    let width = m + 1;
    let mut dp = vec![0usize; (n + 1) * width];

    for i in 1..=n {
        for j in 1..=m {
            dp[i * width + j] = if a[i - 1] == b[j - 1] {
                dp[(i - 1) * width + (j - 1)] + 1
            } else {
                dp[(i - 1) * width + j].max(dp[i * width + (j - 1)])
            };
        }
    }

    let mut seq = Vec::with_capacity(dp[n * width + m]);
    let (mut i, mut j) = (n, m);
    while i > 0 && j > 0 {
        if a[i - 1] == b[j - 1] {
            seq.push(a[i - 1].clone());
            i -= 1;
            j -= 1;
        } else if dp[(i - 1) * width + j] >= dp[i * width + (j - 1)] {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    seq.reverse();
    seq
}

/// Outcome of move detection over a pair of snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveReport<'a> {
    /// Ids that need an explicit move.
    pub moved: HashSet<&'a str>,
    /// Parent groups compared.
    pub groups_examined: usize,
    /// Largest filtered sequence fed to the LCS.
    pub largest_group: usize,
}

/// Per-parent LCS move detector.
#[derive(Clone, Copy, Debug)]
pub struct MoveDetector {
    large_group_threshold: usize,
}

impl Default for MoveDetector {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

impl MoveDetector {
    /// A detector that warns when a filtered sibling group exceeds
    /// `large_group_threshold` ids on either side.
    pub fn new(large_group_threshold: usize) -> Self {
        Self {
            large_group_threshold,
        }
    }

    pub fn detect<'a>(&self, old: &FlatIndex<'a>, new: &FlatIndex<'a>) -> MoveReport<'a> {
        let parents: BTreeSet<&str> = old.parents().chain(new.parents()).collect();
        let mut report = MoveReport::default();

        for parent in parents {
            // Ids present in both snapshots, wherever they sit. A block
            // re-parented into this group is then absent from the old
            // sequence, falls outside the LCS, and is flagged.
            let old_ids: Vec<&'a str> = old
                .siblings(parent)
                .iter()
                .map(|b| b.id.as_str())
                .filter(|id| new.contains(id))
                .collect();
            let new_ids: Vec<&'a str> = new
                .siblings(parent)
                .iter()
                .map(|b| b.id.as_str())
                .filter(|id| old.contains(id))
                .collect();

            report.groups_examined += 1;
            let size = old_ids.len().max(new_ids.len());
            report.largest_group = report.largest_group.max(size);
            if size > self.large_group_threshold {
                warn!(
                    parent = %parent,
                    old = old_ids.len(),
                    new = new_ids.len(),
                    "large sibling group, move detection is quadratic in its size"
                );
            }

            let keep: HashSet<&str> = lcs(&old_ids, &new_ids).into_iter().collect();
            report
                .moved
                .extend(new_ids.into_iter().filter(|id| !keep.contains(id)));
        }

        report
    }
}

/// Ids that need an explicit move to turn `old` into `new`.
pub fn detect_moves(old: &[FlatBlock], new: &[FlatBlock]) -> HashSet<String> {
    let old_index = FlatIndex::new(old);
    let new_index = FlatIndex::new(new);
    MoveDetector::default()
        .detect(&old_index, &new_index)
        .moved
        .into_iter()
        .map(str::to_string)
        .collect()
}
