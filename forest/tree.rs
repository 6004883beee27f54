use ndarray::prelude::*;
use rand_xoshiro::Xoshiro256Plus;

/// A `Tree` is stored as a `Vec` of nodes. Each branch holds the indexes of its two children in the `Vec`; index 0 is the root.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Tree {
	pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Node {
	Branch(BranchNode),
	Leaf(LeafNode),
}

/// Examples whose feature value is less than or equal to `split_value` are routed to the left child, all others to the right.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BranchNode {
	pub feature_index: usize,
	pub split_value: f32,
	pub left_child_index: usize,
	pub right_child_index: usize,
}

/// A leaf's value is the mean label of the training examples that reached it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LeafNode {
	pub value: f32,
}

impl Tree {
	pub fn predict_row(&self, row: ArrayView1<f32>) -> f32 {
		let mut node_index = 0;
		loop {
			match &self.nodes[node_index] {
				Node::Leaf(leaf) => return leaf.value,
				Node::Branch(branch) => {
					node_index = if row[branch.feature_index] <= branch.split_value {
						branch.left_child_index
					} else {
						branch.right_child_index
					};
				}
			}
		}
	}
}

pub(crate) struct TrainTreeOptions {
	pub max_features: usize,
	pub min_samples_leaf: usize,
}

/// Train a single tree on the given resampled rows. The rows slice is reordered in place as nodes partition it.
pub(crate) fn train_tree(
	features: ArrayView2<f32>,
	labels: ArrayView1<f32>,
	rows: &mut [usize],
	options: &TrainTreeOptions,
	rng: &mut Xoshiro256Plus,
) -> Tree {
	let mut nodes = Vec::new();
	train_node(&mut nodes, features, labels, rows, options, rng);
	Tree { nodes }
}

fn train_node(
	nodes: &mut Vec<Node>,
	features: ArrayView2<f32>,
	labels: ArrayView1<f32>,
	rows: &mut [usize],
	options: &TrainTreeOptions,
	rng: &mut Xoshiro256Plus,
) -> usize {
	let node_index = nodes.len();
	nodes.push(Node::Leaf(LeafNode { value: 0.0 }));
	match choose_best_split(features, labels, rows, options, rng) {
		Some(split) => {
			let split_point = partition_rows(rows, |row| {
				features[(row, split.feature_index)] <= split.split_value
			});
			let (left_rows, right_rows) = rows.split_at_mut(split_point);
			let left_child_index = train_node(nodes, features, labels, left_rows, options, rng);
			let right_child_index = train_node(nodes, features, labels, right_rows, options, rng);
			nodes[node_index] = Node::Branch(BranchNode {
				feature_index: split.feature_index,
				split_value: split.split_value,
				left_child_index,
				right_child_index,
			});
		}
		None => {
			let sum: f64 = rows.iter().map(|row| labels[*row] as f64).sum();
			nodes[node_index] = Node::Leaf(LeafNode {
				value: (sum / rows.len() as f64) as f32,
			});
		}
	}
	node_index
}

struct BestSplit {
	feature_index: usize,
	split_value: f32,
}

/// Find the split with the greatest variance reduction over a random sample of `max_features` candidate features. Returns `None` if the node is pure or no split satisfies `min_samples_leaf`.
fn choose_best_split(
	features: ArrayView2<f32>,
	labels: ArrayView1<f32>,
	rows: &[usize],
	options: &TrainTreeOptions,
	rng: &mut Xoshiro256Plus,
) -> Option<BestSplit> {
	let n = rows.len();
	if n < 2 * options.min_samples_leaf || n < 2 {
		return None;
	}
	let first_label = labels[rows[0]];
	if rows.iter().all(|row| labels[*row] == first_label) {
		return None;
	}
	let sum: f64 = rows.iter().map(|row| labels[*row] as f64).sum();
	// Maximizing left_sum^2 / n_left + right_sum^2 / n_right is equivalent to maximizing the variance reduction; the parent term sum^2 / n is constant across splits.
	let baseline_score = sum * sum / n as f64;
	let n_features = features.ncols();
	let n_candidates = options.max_features.min(n_features);
	let candidates = rand::seq::index::sample(rng, n_features, n_candidates);
	let mut best: Option<(f64, BestSplit)> = None;
	let mut pairs: Vec<(f32, f32)> = Vec::with_capacity(n);
	for feature_index in candidates.iter() {
		pairs.clear();
		pairs.extend(
			rows.iter()
				.map(|row| (features[(*row, feature_index)], labels[*row])),
		);
		pairs.sort_unstable_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
		let mut left_sum = 0.0f64;
		for i in 0..n - 1 {
			left_sum += pairs[i].1 as f64;
			let n_left = i + 1;
			let n_right = n - n_left;
			if n_left < options.min_samples_leaf {
				continue;
			}
			if n_right < options.min_samples_leaf {
				break;
			}
			// No split point exists between equal feature values.
			if pairs[i].0 == pairs[i + 1].0 {
				continue;
			}
			let right_sum = sum - left_sum;
			let score =
				left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
			if score <= baseline_score {
				continue;
			}
			if best
				.as_ref()
				.map(|(best_score, _)| score > *best_score)
				.unwrap_or(true)
			{
				best = Some((
					score,
					BestSplit {
						feature_index,
						split_value: (pairs[i].0 + pairs[i + 1].0) / 2.0,
					},
				));
			}
		}
	}
	best.map(|(_, split)| split)
}

/// Reorder `rows` so that rows satisfying the predicate come first, returning the boundary index.
fn partition_rows(rows: &mut [usize], predicate: impl Fn(usize) -> bool) -> usize {
	let mut split_point = 0;
	for index in 0..rows.len() {
		if predicate(rows[index]) {
			rows.swap(split_point, index);
			split_point += 1;
		}
	}
	split_point
}

#[cfg(test)]
mod test {
	use super::*;
	use rand::SeedableRng;

	#[test]
	fn test_partition_rows() {
		let mut rows = vec![5, 2, 7, 1, 8];
		let split_point = partition_rows(&mut rows, |row| row < 5);
		assert_eq!(split_point, 2);
		let (left, right) = rows.split_at(split_point);
		assert!(left.iter().all(|row| *row < 5));
		assert!(right.iter().all(|row| *row >= 5));
	}

	#[test]
	fn test_train_tree_splits_on_signal() {
		// Feature 0 separates the labels exactly, feature 1 is constant.
		let features = ndarray::arr2(&[
			[0.0, 1.0],
			[0.1, 1.0],
			[0.2, 1.0],
			[0.8, 1.0],
			[0.9, 1.0],
			[1.0, 1.0],
		]);
		let labels = ndarray::arr1(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
		let mut rows: Vec<usize> = (0..6).collect();
		let mut rng = Xoshiro256Plus::seed_from_u64(0);
		let tree = train_tree(
			features.view(),
			labels.view(),
			&mut rows,
			&TrainTreeOptions {
				max_features: 2,
				min_samples_leaf: 1,
			},
			&mut rng,
		);
		for (row, label) in labels.iter().enumerate() {
			assert_eq!(tree.predict_row(features.row(row)), *label);
		}
	}

	#[test]
	fn test_pure_node_is_a_leaf() {
		let features = ndarray::arr2(&[[0.0], [1.0], [2.0]]);
		let labels = ndarray::arr1(&[1.0, 1.0, 1.0]);
		let mut rows: Vec<usize> = (0..3).collect();
		let mut rng = Xoshiro256Plus::seed_from_u64(0);
		let tree = train_tree(
			features.view(),
			labels.view(),
			&mut rows,
			&TrainTreeOptions {
				max_features: 1,
				min_samples_leaf: 1,
			},
			&mut rng,
		);
		assert_eq!(tree.nodes.len(), 1);
		assert_eq!(tree.predict_row(features.row(0)), 1.0);
	}
}
