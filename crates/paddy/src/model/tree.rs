//! CART regression tree: SoA storage, traversal and the depth-first grower.
//!
//! This module provides:
//! - [`RegressionTree`]: immutable SoA tree storage for traversal
//! - [`TreeParams`]: growth limits for a single tree
//! - [`grow_tree`]: variance-reduction grower used by the forest
//!
//! # Splits
//!
//! A split node sends a sample left when `value <= threshold`. `NaN` values
//! follow the node's default direction, which is learned when the node saw
//! missing values during growth and otherwise points at the larger child.
//!
//! # Importance
//!
//! Each split records its weighted impurity decrease
//! `n * var - n_left * var_left - n_right * var_right`; summing these per
//! feature and normalising gives the mean-decrease-in-impurity importance.

use ndarray::{ArrayView1, ArrayView2};
use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Index of a node in a tree's arrays. The root is node 0.
pub type NodeId = u32;

/// Nodes whose impurity is at or below this are pure and never split.
const IMPURITY_EPSILON: f64 = f64::EPSILON;

// ============================================================================
// RegressionTree
// ============================================================================

/// Regression tree in structure-of-arrays layout.
///
/// Leaf nodes carry the mean target of their training samples; split nodes
/// carry feature, threshold and children. Every node keeps its sample count and
/// impurity so importance can be recomputed after the fact.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    split_feature: Vec<u32>,
    threshold: Vec<f64>,
    left: Vec<NodeId>,
    right: Vec<NodeId>,
    default_left: Vec<bool>,
    is_leaf: Vec<bool>,
    value: Vec<f64>,
    n_samples: Vec<u32>,
    impurity: Vec<f64>,
    n_features: usize,
}

impl RegressionTree {
    fn with_capacity(n_features: usize, capacity: usize) -> Self {
        Self {
            split_feature: Vec::with_capacity(capacity),
            threshold: Vec::with_capacity(capacity),
            left: Vec::with_capacity(capacity),
            right: Vec::with_capacity(capacity),
            default_left: Vec::with_capacity(capacity),
            is_leaf: Vec::with_capacity(capacity),
            value: Vec::with_capacity(capacity),
            n_samples: Vec::with_capacity(capacity),
            impurity: Vec::with_capacity(capacity),
            n_features,
        }
    }

    /// Append a leaf and return its id.
    fn push_leaf(&mut self, stats: NodeStats) -> NodeId {
        let id = self.is_leaf.len() as NodeId;
        self.split_feature.push(0);
        self.threshold.push(0.0);
        self.left.push(0);
        self.right.push(0);
        self.default_left.push(true);
        self.is_leaf.push(true);
        self.value.push(stats.mean);
        self.n_samples.push(stats.n as u32);
        self.impurity.push(stats.impurity);
        id
    }

    /// Turn leaf `node` into a split node with the given children.
    fn set_split(&mut self, node: NodeId, split: &SplitCandidate, left: NodeId, right: NodeId) {
        let i = node as usize;
        self.split_feature[i] = split.feature as u32;
        self.threshold[i] = split.threshold;
        self.default_left[i] = split.default_left;
        self.left[i] = left;
        self.right[i] = right;
        self.is_leaf[i] = false;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    /// Number of features the tree was grown on.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    #[inline]
    pub fn split_index(&self, node: NodeId) -> u32 {
        self.split_feature[node as usize]
    }

    #[inline]
    pub fn split_threshold(&self, node: NodeId) -> f64 {
        self.threshold[node as usize]
    }

    #[inline]
    pub fn left_child(&self, node: NodeId) -> NodeId {
        self.left[node as usize]
    }

    #[inline]
    pub fn right_child(&self, node: NodeId) -> NodeId {
        self.right[node as usize]
    }

    #[inline]
    pub fn default_left(&self, node: NodeId) -> bool {
        self.default_left[node as usize]
    }

    /// Mean training target at `node`.
    #[inline]
    pub fn node_value(&self, node: NodeId) -> f64 {
        self.value[node as usize]
    }

    /// Training samples (bootstrap duplicates included) that reached `node`.
    #[inline]
    pub fn node_samples(&self, node: NodeId) -> u32 {
        self.n_samples[node as usize]
    }

    /// Target variance of the training samples at `node`.
    #[inline]
    pub fn node_impurity(&self, node: NodeId) -> f64 {
        self.impurity[node as usize]
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.is_leaf.iter().filter(|&&l| l).count()
    }

    /// Depth of the deepest leaf (a lone root has depth 0).
    pub fn depth(&self) -> u32 {
        let mut max_depth = 0;
        let mut stack = vec![(0 as NodeId, 0u32)];
        while let Some((node, depth)) = stack.pop() {
            if self.is_leaf(node) {
                max_depth = max_depth.max(depth);
            } else {
                stack.push((self.left_child(node), depth + 1));
                stack.push((self.right_child(node), depth + 1));
            }
        }
        max_depth
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Walk from the root to the leaf reached by `sample`.
    #[inline]
    pub fn traverse_to_leaf(&self, sample: ArrayView1<f64>) -> NodeId {
        let mut node: NodeId = 0;
        while !self.is_leaf(node) {
            let fvalue = sample[self.split_index(node) as usize];
            let go_left = if fvalue.is_nan() {
                self.default_left(node)
            } else {
                fvalue <= self.split_threshold(node)
            };
            node = if go_left {
                self.left_child(node)
            } else {
                self.right_child(node)
            };
        }
        node
    }

    /// Predict a single sample.
    #[inline]
    pub fn predict_row(&self, sample: ArrayView1<f64>) -> f64 {
        self.node_value(self.traverse_to_leaf(sample))
    }

    // =========================================================================
    // Importance
    // =========================================================================

    /// Impurity-decrease importance per feature, normalised to sum to 1.
    ///
    /// All zeros when the tree has no split.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut importances = vec![0.0; self.n_features];
        for node in 0..self.n_nodes() as NodeId {
            if self.is_leaf(node) {
                continue;
            }
            let (l, r) = (self.left_child(node), self.right_child(node));
            let decrease = self.node_samples(node) as f64 * self.node_impurity(node)
                - self.node_samples(l) as f64 * self.node_impurity(l)
                - self.node_samples(r) as f64 * self.node_impurity(r);
            importances[self.split_index(node) as usize] += decrease.max(0.0);
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }
        importances
    }
}

// ============================================================================
// Growth
// ============================================================================

/// Growth limits for one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    /// Nodes at this depth become leaves.
    pub max_depth: u32,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Candidate features drawn per split (at most `n_features`).
    pub max_features: usize,
}

/// Target statistics of the samples at a node.
#[derive(Debug, Clone, Copy)]
struct NodeStats {
    n: usize,
    mean: f64,
    impurity: f64,
}

impl NodeStats {
    fn compute(y: ArrayView1<f64>, rows: &[usize]) -> Self {
        let n = rows.len();
        let mean = rows.iter().map(|&r| y[r]).sum::<f64>() / n as f64;
        let impurity = rows.iter().map(|&r| (y[r] - mean).powi(2)).sum::<f64>() / n as f64;
        Self { n, mean, impurity }
    }
}

/// Best split found for a node.
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    default_left: bool,
    /// `sum_l² / n_l + sum_r² / n_r`; larger means lower child squared error.
    proxy: f64,
}

impl SplitCandidate {
    #[inline]
    fn goes_left(&self, value: f64) -> bool {
        if value.is_nan() {
            self.default_left
        } else {
            value <= self.threshold
        }
    }
}

/// Pending node on the growth stack: `positions[start..end]` are its rows.
struct GrowTask {
    node: NodeId,
    start: usize,
    end: usize,
    depth: u32,
}

/// Grow a tree on `samples` (row indices into `x`/`y`, duplicates allowed).
///
/// `samples` must be non-empty. The rng drives the per-split feature order, so
/// the same rng state always grows the same tree.
pub fn grow_tree(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    samples: &[usize],
    params: &TreeParams,
    rng: &mut Xoshiro256PlusPlus,
) -> RegressionTree {
    debug_assert!(!samples.is_empty(), "cannot grow a tree on zero samples");
    let n_features = x.ncols();
    let mut tree = RegressionTree::with_capacity(n_features, 2usize.pow(params.max_depth.min(10) + 1));
    let mut positions = samples.to_vec();
    let mut features: Vec<usize> = (0..n_features).collect();
    let mut scratch: Vec<(f64, f64)> = Vec::with_capacity(samples.len());

    let root = tree.push_leaf(NodeStats::compute(y, &positions));
    let mut stack = vec![GrowTask {
        node: root,
        start: 0,
        end: positions.len(),
        depth: 0,
    }];

    while let Some(task) = stack.pop() {
        let n = task.end - task.start;
        let impurity = tree.node_impurity(task.node);
        if task.depth >= params.max_depth
            || n < params.min_samples_split
            || n < 2 * params.min_samples_leaf
            || impurity <= IMPURITY_EPSILON
        {
            continue;
        }

        let rows = &mut positions[task.start..task.end];
        features.shuffle(rng);
        let candidates = &features[..params.max_features.clamp(1, n_features.max(1)).min(n_features)];
        // candidates is empty only when the matrix has no columns

        let Some(split) = find_best_split(x, y, rows, candidates, params.min_samples_leaf, &mut scratch)
        else {
            continue;
        };

        let n_left = partition(rows, |r| split.goes_left(x[[r, split.feature]]));
        let mid = task.start + n_left;

        let left = tree.push_leaf(NodeStats::compute(y, &positions[task.start..mid]));
        let right = tree.push_leaf(NodeStats::compute(y, &positions[mid..task.end]));
        tree.set_split(task.node, &split, left, right);

        stack.push(GrowTask {
            node: right,
            start: mid,
            end: task.end,
            depth: task.depth + 1,
        });
        stack.push(GrowTask {
            node: left,
            start: task.start,
            end: mid,
            depth: task.depth + 1,
        });
    }

    tree
}

/// Reorder `rows` so rows satisfying `go_left` come first; returns their count.
fn partition(rows: &mut [usize], go_left: impl Fn(usize) -> bool) -> usize {
    let mut next = 0;
    for i in 0..rows.len() {
        if go_left(rows[i]) {
            rows.swap(next, i);
            next += 1;
        }
    }
    next
}

/// Exhaustive threshold search over `features` for the rows of one node.
///
/// Only thresholds between distinct observed values are considered, and both
/// children must keep at least `min_leaf` samples. Missing values are tried on
/// both sides. Ties keep the first candidate found.
fn find_best_split(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    rows: &[usize],
    features: &[usize],
    min_leaf: usize,
    scratch: &mut Vec<(f64, f64)>,
) -> Option<SplitCandidate> {
    let n = rows.len();
    let mut best: Option<SplitCandidate> = None;

    for &feature in features {
        scratch.clear();
        let (mut miss_n, mut miss_sum) = (0usize, 0.0f64);
        for &r in rows {
            let v = x[[r, feature]];
            if v.is_nan() {
                miss_n += 1;
                miss_sum += y[r];
            } else {
                scratch.push((v, y[r]));
            }
        }
        if scratch.len() < 2 {
            continue;
        }
        scratch.sort_by(|a, b| a.0.total_cmp(&b.0));
        if scratch[0].0 == scratch[scratch.len() - 1].0 {
            continue;
        }

        let total_sum: f64 = scratch.iter().map(|&(_, t)| t).sum::<f64>() + miss_sum;
        let (mut left_n, mut left_sum) = (0usize, 0.0f64);

        for p in 0..scratch.len() - 1 {
            left_n += 1;
            left_sum += scratch[p].1;
            let (lo, hi) = (scratch[p].0, scratch[p + 1].0);
            if lo == hi {
                continue;
            }

            let sides: &[bool] = if miss_n > 0 { &[true, false] } else { &[false] };
            for &missing_left in sides {
                let (ln, ls) = if missing_left {
                    (left_n + miss_n, left_sum + miss_sum)
                } else {
                    (left_n, left_sum)
                };
                let rn = n - ln;
                if ln < min_leaf || rn < min_leaf {
                    continue;
                }
                let rs = total_sum - ls;
                let proxy = ls * ls / ln as f64 + rs * rs / rn as f64;

                if best.map_or(true, |b| proxy > b.proxy) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi || !threshold.is_finite() {
                        threshold = lo;
                    }
                    let default_left = if miss_n > 0 { missing_left } else { ln >= rn };
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        default_left,
                        proxy,
                    });
                }
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1, Array2};
    use rand::SeedableRng;

    fn params(max_depth: u32) -> TreeParams {
        TreeParams {
            max_depth,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: usize::MAX,
        }
    }

    fn rng() -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(0)
    }

    #[test]
    fn single_split_on_step_function() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![1.0, 1.0, 5.0, 5.0];
        let tree = grow_tree(x.view(), y.view(), &[0, 1, 2, 3], &params(5), &mut rng());

        assert_eq!(tree.n_nodes(), 3);
        assert!(!tree.is_leaf(0));
        assert_eq!(tree.split_index(0), 0);
        assert_abs_diff_eq!(tree.split_threshold(0), 2.5);
        assert_abs_diff_eq!(tree.predict_row(array![0.0].view()), 1.0);
        assert_abs_diff_eq!(tree.predict_row(array![10.0].view()), 5.0);
    }

    #[test]
    fn respects_max_depth() {
        let x = Array2::from_shape_fn((64, 1), |(i, _)| i as f64);
        let y = x.column(0).mapv(|v| v * v);
        let rows: Vec<usize> = (0..64).collect();
        let tree = grow_tree(x.view(), y.view(), &rows, &params(3), &mut rng());
        assert_eq!(tree.depth(), 3);
        assert!(tree.n_leaves() <= 8);
    }

    #[test]
    fn respects_min_samples_leaf() {
        let x = Array2::from_shape_fn((10, 1), |(i, _)| i as f64);
        let y = x.column(0).to_owned();
        let rows: Vec<usize> = (0..10).collect();
        let p = TreeParams {
            min_samples_leaf: 3,
            ..params(10)
        };
        let tree = grow_tree(x.view(), y.view(), &rows, &p, &mut rng());
        for node in 0..tree.n_nodes() as NodeId {
            if tree.is_leaf(node) {
                assert!(tree.node_samples(node) >= 3);
            }
        }
    }

    #[test]
    fn constant_target_stays_a_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![2.0, 2.0, 2.0];
        let tree = grow_tree(x.view(), y.view(), &[0, 1, 2], &params(5), &mut rng());
        assert_eq!(tree.n_nodes(), 1);
        assert!(tree.feature_importances().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn constant_features_cannot_split() {
        let x = array![[1.0, 7.0], [1.0, 7.0], [1.0, 7.0]];
        let y = array![1.0, 2.0, 3.0];
        let tree = grow_tree(x.view(), y.view(), &[0, 1, 2], &params(5), &mut rng());
        assert_eq!(tree.n_nodes(), 1);
        assert_abs_diff_eq!(tree.predict_row(array![1.0, 7.0].view()), 2.0);
    }

    #[test]
    fn importance_goes_to_informative_feature() {
        // Feature 1 is noise-free signal, feature 0 is constant.
        let x = Array2::from_shape_fn((20, 2), |(i, j)| if j == 0 { 3.0 } else { i as f64 });
        let y = Array1::from_shape_fn(20, |i| if i < 10 { 0.0 } else { 1.0 });
        let rows: Vec<usize> = (0..20).collect();
        let tree = grow_tree(x.view(), y.view(), &rows, &params(5), &mut rng());
        let imp = tree.feature_importances();
        assert_abs_diff_eq!(imp[0], 0.0);
        assert_abs_diff_eq!(imp[1], 1.0);
    }

    #[test]
    fn missing_values_follow_learned_direction() {
        let x = array![[1.0], [2.0], [f64::NAN], [10.0], [11.0], [f64::NAN]];
        let y = array![0.0, 0.0, 9.0, 9.0, 9.0, 9.0];
        let rows: Vec<usize> = (0..6).collect();
        let tree = grow_tree(x.view(), y.view(), &rows, &params(1), &mut rng());
        assert!(!tree.default_left(0));
        assert_abs_diff_eq!(tree.predict_row(array![f64::NAN].view()), 9.0);
        assert_abs_diff_eq!(tree.predict_row(array![1.5].view()), 0.0);
    }

    #[test]
    fn bootstrap_duplicates_count_as_samples() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 3.0];
        let tree = grow_tree(x.view(), y.view(), &[0, 0, 0, 1], &params(0), &mut rng());
        assert_eq!(tree.node_samples(0), 4);
        assert_abs_diff_eq!(tree.node_value(0), 1.5);
    }

    #[test]
    fn partition_moves_matches_first() {
        let mut rows = vec![5, 2, 8, 1, 9];
        let n = partition(&mut rows, |r| r < 5);
        assert_eq!(n, 2);
        let mut left = rows[..n].to_vec();
        left.sort_unstable();
        assert_eq!(left, vec![1, 2]);
    }
}
