use serde::{Deserialize, Serialize};

/// Node of a regression tree stored as a flat array.
///
/// Children always live at a higher index than their parent, which keeps traversal acyclic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Go to `left` when `row[feature] <= threshold`, otherwise to `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

impl Node {
    pub fn split(feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Node::Split {
            feature,
            threshold,
            left,
            right,
        }
    }

    pub fn leaf(value: f64) -> Self {
        Node::Leaf { value }
    }
}

/// Regression tree, node `0` is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Check the structural invariants that [Tree::evaluate] relies on.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let len = self.nodes.len();
        for (index, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(format!(
                            "node {index} splits on feature {feature}, model has {n_features}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {index} has a non-finite threshold"));
                    }
                    for child in [left, right] {
                        if child <= index || child >= len {
                            return Err(format!(
                                "node {index} points to invalid child {child} (tree has {len} nodes)"
                            ));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {index} has a non-finite value"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk the tree for one row and return the leaf value.
    ///
    /// The tree must have passed [Tree::validate] for the width of `row`.
    pub fn evaluate(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[feature] <= threshold { left } else { right };
                }
                Node::Leaf { value } => return value,
            }
        }
    }
}
