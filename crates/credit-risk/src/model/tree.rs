use crate::applicant::FEATURE_COUNT;
use serde::Deserialize;

/// Largest category code XGBoost can represent exactly in a float feature.
const MAX_CATEGORY: f32 = 16_777_216.0;

/// Per-node flag, written as `0`/`1` by current XGBoost and as booleans by older builds.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub(crate) enum NodeFlag {
    Bool(bool),
    Int(i64),
}

impl NodeFlag {
    fn is_set(self) -> bool {
        match self {
            NodeFlag::Bool(value) => value,
            NodeFlag::Int(value) => value != 0,
        }
    }
}

/// Tree as stored in the JSON artifact: parallel per-node arrays.
#[derive(Debug, Deserialize)]
pub(crate) struct RawTree {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<Option<f64>>,
    default_left: Vec<NodeFlag>,
    #[serde(default)]
    split_type: Vec<u8>,
    #[serde(default)]
    categories: Vec<i64>,
    #[serde(default)]
    categories_nodes: Vec<i64>,
    #[serde(default)]
    categories_segments: Vec<u64>,
    #[serde(default)]
    categories_sizes: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f32,
    },
    Numeric {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
        default_left: bool,
    },
    Categorical {
        feature: usize,
        /// Sorted codes routed to the right child.
        categories: Vec<u32>,
        left: usize,
        right: usize,
        default_left: bool,
    },
}

/// A validated regression tree.
///
/// Every child index is strictly greater than its parent's, so traversal from the
/// root always terminates at a leaf without bounds checks failing.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub(crate) fn from_raw(raw: RawTree) -> Result<Self, String> {
        let count = raw.left_children.len();
        if count == 0 {
            return Err("tree has no nodes".to_string());
        }
        let lengths = [
            ("right_children", raw.right_children.len()),
            ("split_indices", raw.split_indices.len()),
            ("split_conditions", raw.split_conditions.len()),
            ("default_left", raw.default_left.len()),
        ];
        for (name, len) in lengths {
            if len != count {
                return Err(format!("{name} has {len} entries, expected {count}"));
            }
        }
        if !raw.split_type.is_empty() && raw.split_type.len() != count {
            return Err(format!(
                "split_type has {} entries, expected {count}",
                raw.split_type.len()
            ));
        }

        let mut nodes = Vec::with_capacity(count);
        for index in 0..count {
            nodes.push(raw.node(index, count)?);
        }

        Ok(Self { nodes })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn categorical_splits(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Categorical { .. }))
            .count()
    }

    /// Walk from the root to a leaf. NaN features take the node's default branch.
    pub fn leaf_value(&self, features: &[f32; FEATURE_COUNT]) -> f32 {
        let mut index = 0;
        loop {
            index = match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Numeric {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let value = features[*feature];
                    if value.is_nan() {
                        if *default_left {
                            *left
                        } else {
                            *right
                        }
                    } else if value < *threshold {
                        *left
                    } else {
                        *right
                    }
                }
                Node::Categorical {
                    feature,
                    categories,
                    left,
                    right,
                    default_left,
                } => {
                    let value = features[*feature];
                    if value.is_nan() {
                        if *default_left {
                            *left
                        } else {
                            *right
                        }
                    } else if in_category_set(categories, value) {
                        *right
                    } else {
                        *left
                    }
                }
            };
        }
    }
}

fn in_category_set(categories: &[u32], value: f32) -> bool {
    if !(0.0..MAX_CATEGORY).contains(&value) {
        return false;
    }
    categories.binary_search(&(value as u32)).is_ok()
}

impl RawTree {
    fn node(&self, index: usize, count: usize) -> Result<Node, String> {
        let left = self.left_children[index];
        if left == -1 {
            let value = self.split_conditions[index]
                .filter(|value| value.is_finite())
                .ok_or_else(|| format!("leaf {index} has no finite value"))?;
            return Ok(Node::Leaf {
                value: value as f32,
            });
        }

        let left = child(index, left, count)?;
        let right = child(index, self.right_children[index], count)?;
        let feature = usize::try_from(self.split_indices[index])
            .ok()
            .filter(|feature| *feature < FEATURE_COUNT)
            .ok_or_else(|| {
                format!(
                    "node {index} splits on feature {}, model input has {FEATURE_COUNT}",
                    self.split_indices[index]
                )
            })?;
        let default_left = self.default_left[index].is_set();

        if self.split_type.get(index).copied() == Some(1) {
            return Ok(Node::Categorical {
                feature,
                categories: self.categories_for(index)?,
                left,
                right,
                default_left,
            });
        }

        let threshold = self.split_conditions[index]
            .filter(|value| !value.is_nan())
            .ok_or_else(|| format!("node {index} has no split threshold"))?;
        Ok(Node::Numeric {
            feature,
            threshold: threshold as f32,
            left,
            right,
            default_left,
        })
    }

    fn categories_for(&self, index: usize) -> Result<Vec<u32>, String> {
        let position = self
            .categories_nodes
            .iter()
            .position(|node| *node == index as i64)
            .ok_or_else(|| format!("categorical node {index} has no category set"))?;
        let segment = self.categories_segments.get(position).copied();
        let size = self.categories_sizes.get(position).copied();
        let (Some(segment), Some(size)) = (segment, size) else {
            return Err(format!("categorical node {index} has no segment"));
        };

        let start = segment as usize;
        let end = start.saturating_add(size as usize);
        let codes = self
            .categories
            .get(start..end)
            .ok_or_else(|| format!("categorical node {index} segment {start}..{end} out of range"))?;

        let mut categories = codes
            .iter()
            .map(|code| {
                u32::try_from(*code)
                    .map_err(|_| format!("categorical node {index} lists invalid code {code}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        categories.sort_unstable();
        categories.dedup();
        Ok(categories)
    }
}

fn child(parent: usize, raw: i64, count: usize) -> Result<usize, String> {
    usize::try_from(raw)
        .ok()
        .filter(|child| *child > parent && *child < count)
        .ok_or_else(|| format!("node {parent} has invalid child index {raw}"))
}
