//! Gradient-boosted regression trees.
//!
//! Node layout follows an XGBoost JSON dump flattened per tree: node 0 is the
//! root, a split sends `x[feature] < threshold` to `left` and everything else to
//! `right`, and every node records its training `cover` (hessian sum, which is
//! the sample count for squared error).

use serde::{Deserialize, Serialize};

/// Relative tolerance for `cover(left) + cover(right) == cover(parent)`.
const COVER_TOLERANCE: f64 = 1e-6;

/// One tree node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        cover: f64,
    },
    Leaf {
        value: f64,
        cover: f64,
    },
}

impl Node {
    #[must_use]
    pub fn cover(&self) -> f64 {
        match *self {
            Self::Split { cover, .. } | Self::Leaf { cover, .. } => cover,
        }
    }
}

/// A single regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Structural validation.
    ///
    /// Checks that children come after their parent, every node is reached exactly
    /// once from the root, features are in range, numbers are finite, covers are
    /// positive and child covers add up to the parent cover.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }

        let len = self.nodes.len();
        let mut parents = vec![0usize; len];

        for (index, node) in self.nodes.iter().enumerate() {
            let cover = node.cover();
            if !cover.is_finite() || cover <= 0.0 {
                return Err(format!("node {index}: cover must be positive, got {cover}"));
            }

            match *node {
                Node::Leaf { value, .. } => {
                    if !value.is_finite() {
                        return Err(format!("node {index}: leaf value is not finite"));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if feature >= n_features {
                        return Err(format!(
                            "node {index}: feature {feature} out of range (n_features={n_features})"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {index}: threshold is not finite"));
                    }
                    for child in [left, right] {
                        if child >= len || child <= index {
                            return Err(format!("node {index}: invalid child index {child}"));
                        }
                        parents[child] += 1;
                    }
                    if left == right {
                        return Err(format!("node {index}: both children are node {left}"));
                    }

                    let children = self.nodes[left].cover() + self.nodes[right].cover();
                    if (children - cover).abs() > COVER_TOLERANCE * cover {
                        return Err(format!(
                            "node {index}: child covers sum to {children}, parent cover is {cover}"
                        ));
                    }
                }
            }
        }

        if parents[0] != 0 {
            return Err("root node has a parent".into());
        }
        if let Some(orphan) = parents.iter().skip(1).position(|&count| count != 1) {
            return Err(format!(
                "node {} is referenced {} times (expected exactly once)",
                orphan + 1,
                parents[orphan + 1]
            ));
        }

        Ok(())
    }

    /// Leaf value reached by `x`.
    ///
    /// Assumes a validated tree and `x.len() >= n_features`.
    #[must_use]
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf { value, .. } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    index = if x[feature] < threshold { left } else { right };
                }
            }
        }
    }

    /// Cover-weighted mean leaf value.
    #[must_use]
    pub fn expected_value(&self) -> f64 {
        let root_cover = self.nodes[0].cover();
        self.nodes
            .iter()
            .filter_map(|node| match *node {
                Node::Leaf { value, cover } => Some(value * cover / root_cover),
                Node::Split { .. } => None,
            })
            .sum()
    }
}

/// Additive ensemble of regression trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    /// Training column labels, in input order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,

    /// Number of input features
    pub num_features: usize,

    /// Global bias added to every prediction
    pub base_score: f64,

    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    /// # Errors
    /// Returns a description of the first structural problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_features == 0 {
            return Err("num_features must be positive".into());
        }
        if !self.base_score.is_finite() {
            return Err("base_score is not finite".into());
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.num_features {
                return Err(format!(
                    "feature_names has {} entries, num_features is {}",
                    names.len(),
                    self.num_features
                ));
            }
        }
        if self.trees.is_empty() {
            return Err("ensemble has no trees".into());
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(self.num_features)
                .map_err(|e| format!("tree {index}: {e}"))?;
        }
        Ok(())
    }

    #[must_use]
    pub fn predict(&self, x: &[f64]) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.predict(x)).sum::<f64>()
    }

    /// Mean output over the training distribution described by the covers.
    #[must_use]
    pub fn expected_value(&self) -> f64 {
        self.base_score + self.trees.iter().map(Tree::expected_value).sum::<f64>()
    }
}
