//! Exact path-dependent TreeSHAP.
//!
//! Polynomial-time Shapley values for tree ensembles (Lundberg et al., 2018,
//! Algorithm 2). Absent features follow both branches weighted by the training
//! cover, so `expected_value()` is the cover-weighted mean output and the
//! attributions add up to `predict(x) - expected_value()` exactly.

use super::tree::{Node, Tree, TreeEnsemble};
use crate::ports::AttributionExplainer;
use crate::HgbError;

#[derive(Debug, Clone, Copy)]
struct PathElement {
    /// `None` for the root sentinel
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

/// TreeSHAP explainer bound to one ensemble.
pub struct TreeShapExplainer<'a> {
    ensemble: &'a TreeEnsemble,
}

impl<'a> TreeShapExplainer<'a> {
    #[must_use]
    pub fn new(ensemble: &'a TreeEnsemble) -> Self {
        Self { ensemble }
    }

    /// Shapley values of one tree, accumulated into `phi`.
    fn tree_shap(tree: &Tree, x: &[f64], phi: &mut [f64]) {
        recurse(tree, x, phi, 0, &[], 1.0, 1.0, None);
    }
}

impl AttributionExplainer for TreeShapExplainer<'_> {
    fn expected_value(&self) -> f64 {
        self.ensemble.expected_value()
    }

    fn attributions(&self, features: &[f64]) -> Result<Vec<f64>, HgbError> {
        if features.len() != self.ensemble.num_features {
            return Err(HgbError::Explainer(format!(
                "expected {} features, got {}",
                self.ensemble.num_features,
                features.len()
            )));
        }

        let mut phi = vec![0.0; features.len()];
        for tree in &self.ensemble.trees {
            Self::tree_shap(tree, features, &mut phi);
        }
        Ok(phi)
    }
}

#[allow(clippy::too_many_arguments)]
fn recurse(
    tree: &Tree,
    x: &[f64],
    phi: &mut [f64],
    node: usize,
    parent_path: &[PathElement],
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let mut path = parent_path.to_vec();
    extend_path(&mut path, zero_fraction, one_fraction, feature);

    match tree.nodes[node] {
        Node::Leaf { value, .. } => {
            for i in 1..path.len() {
                let weight = unwound_path_sum(&path, i);
                let element = path[i];
                if let Some(f) = element.feature {
                    phi[f] += weight * (element.one_fraction - element.zero_fraction) * value;
                }
            }
        }
        Node::Split {
            feature: split,
            threshold,
            left,
            right,
            cover,
        } => {
            let (hot, cold) = if x[split] < threshold {
                (left, right)
            } else {
                (right, left)
            };
            let hot_zero = tree.nodes[hot].cover() / cover;
            let cold_zero = tree.nodes[cold].cover() / cover;

            // A feature seen higher up is unwound and re-applied here
            let mut incoming_zero = 1.0;
            let mut incoming_one = 1.0;
            if let Some(k) = path.iter().position(|e| e.feature == Some(split)) {
                incoming_zero = path[k].zero_fraction;
                incoming_one = path[k].one_fraction;
                path = unwind_path(&path, k);
            }

            recurse(
                tree,
                x,
                phi,
                hot,
                &path,
                hot_zero * incoming_zero,
                incoming_one,
                Some(split),
            );
            recurse(
                tree,
                x,
                phi,
                cold,
                &path,
                cold_zero * incoming_zero,
                0.0,
                Some(split),
            );
        }
    }
}

fn extend_path(
    path: &mut Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });

    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / denom;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / denom;
    }
}

/// Path with element `index` removed, weights restored as if it was never added.
fn unwind_path(path: &[PathElement], index: usize) -> Vec<PathElement> {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let denom = (depth + 1) as f64;

    let mut out = path[..depth].to_vec();
    let mut next = path[depth].weight;
    for j in (0..depth).rev() {
        if one != 0.0 {
            let tmp = out[j].weight;
            out[j].weight = next * denom / ((j + 1) as f64 * one);
            next = tmp - out[j].weight * zero * (depth - j) as f64 / denom;
        } else {
            out[j].weight = out[j].weight * denom / (zero * (depth - j) as f64);
        }
    }

    for j in index..depth {
        out[j].feature = path[j + 1].feature;
        out[j].zero_fraction = path[j + 1].zero_fraction;
        out[j].one_fraction = path[j + 1].one_fraction;
    }
    out
}

/// Total permutation weight of the path if element `index` were unwound.
fn unwound_path_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let mut next = path[depth].weight;
    let mut total = 0.0;

    if one != 0.0 {
        for i in (0..depth).rev() {
            let tmp = next / ((i + 1) as f64 * one);
            total += tmp;
            next = path[i].weight - tmp * zero * (depth - i) as f64;
        }
    } else {
        for i in (0..depth).rev() {
            total += path[i].weight / (zero * (depth - i) as f64);
        }
    }

    total * (depth + 1) as f64
}
