//! Bounding volume hierarchy construction over triangle primitives.
//!
//! Builds a flat, GPU-friendly node array by recursively partitioning the
//! scene's triangle summaries in place. Split planes are chosen with a
//! surface-area-heuristic proxy; a node is split only when the best
//! candidate is strictly cheaper than leaving it a leaf. The render-triangle
//! array is permuted in lockstep with the summaries so that every node's
//! primitive range indexes both arrays identically.

use glam::Vec3A;
use log::{debug, info};
use thiserror::Error;

use crate::aabb::Aabb;
use crate::triangle::{Triangle, TriangleBounds};

/// Maximum node depth, counted from 1 at the root.
///
/// Guards against pathological recursion on coincident geometry; reaching it
/// produces a possibly-large leaf, not an error.
pub const MAX_DEPTH: usize = 32;

/// Number of equally spaced candidate split positions tested per axis.
pub const SPLIT_TESTS_PER_AXIS: usize = 10;

/// Reasons a build refuses to run.
///
/// Construction never fails under valid geometric input; these are
/// precondition violations reported before recursion begins.
#[derive(Debug, Error)]
pub enum BvhError {
    /// The caller supplied zero triangles.
    #[error("cannot build a hierarchy over zero triangles")]
    EmptyScene,

    /// A triangle summary carries NaN or infinite coordinates.
    #[error("triangle summary {index} contains a non-finite coordinate")]
    NonFiniteTriangle {
        /// Position of the offending summary in the input array.
        index: usize,
    },

    /// The summary and render-triangle arrays differ in length.
    #[error("summary array has {summaries} entries but triangle array has {triangles}")]
    LengthMismatch {
        /// Length of the summary array.
        summaries: usize,
        /// Length of the render-triangle array.
        triangles: usize,
    },
}

/// Hierarchy node referencing a contiguous triangle range.
///
/// A node is a leaf iff `child_index == -1`. Internal nodes own two
/// consecutively stored children at `child_index` and `child_index + 1`;
/// their `triangle_count` is stale and must be ignored by consumers.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    /// Bounding volume of every triangle in the node's range, expanded.
    pub bounds: Aabb,
    /// Start of the node's range in the (permuted) triangle arrays.
    pub first_triangle: u32,
    /// Number of triangles in the range.
    pub triangle_count: u32,
    /// Index of the first child, or `-1` for a leaf.
    pub child_index: i32,
}

impl Node {
    fn leaf(bounds: Aabb, first_triangle: u32, triangle_count: u32) -> Self {
        Self {
            bounds,
            first_triangle,
            triangle_count,
            child_index: -1,
        }
    }

    /// True if this node directly owns its triangle range.
    pub fn is_leaf(&self) -> bool {
        self.child_index == -1
    }

    /// Estimated traversal cost of keeping this node unsplit.
    fn cost(&self) -> f32 {
        node_cost(self.bounds.size(), self.triangle_count)
    }
}

/// Surface-area-heuristic proxy cost of a box with the given extents.
///
/// `half_area = x*(y+z) + y*z`; the factor of two is dropped since costs
/// are only ever compared against each other. Zero-count inputs cost 0
/// regardless of the extents (an empty side must not poison the sum).
pub fn node_cost(size: Vec3A, triangle_count: u32) -> f32 {
    if triangle_count == 0 {
        return 0.0;
    }
    let half_area = size.x * (size.y + size.z) + size.y * size.z;
    half_area * triangle_count as f32
}

/// Candidate split plane together with its evaluated cost.
#[derive(Debug, Clone, Copy)]
struct SplitPlane {
    axis: usize,
    position: f32,
    cost: f32,
}

/// Cost of splitting the given summaries at `position` along `axis`.
///
/// Classifies every summary by centroid, grows one box per side, and sums
/// the two sides' costs.
fn evaluate_split(summaries: &[TriangleBounds], axis: usize, position: f32) -> f32 {
    let mut bounds_a = Aabb::EMPTY;
    let mut bounds_b = Aabb::EMPTY;
    let mut count_a = 0u32;
    let mut count_b = 0u32;

    for tri in summaries {
        if tri.center[axis] < position {
            bounds_a.grow_to_include(tri);
            count_a += 1;
        } else {
            bounds_b.grow_to_include(tri);
            count_b += 1;
        }
    }

    node_cost(bounds_a.size(), count_a) + node_cost(bounds_b.size(), count_b)
}

/// Search all axes for the cheapest split of a node's summaries.
///
/// Candidates are strictly interior to the node's bounds on each axis
/// (a split exactly at the boundary would produce an empty child). Ties
/// resolve to the candidate evaluated first: axis 0 before 1 before 2,
/// increasing position within an axis.
fn choose_split(node: &Node, summaries: &[TriangleBounds]) -> SplitPlane {
    let mut best = SplitPlane {
        axis: 0,
        position: 0.0,
        cost: f32::INFINITY,
    };

    for axis in 0..3 {
        let start = node.bounds.min[axis];
        let end = node.bounds.max[axis];

        for i in 0..SPLIT_TESTS_PER_AXIS {
            let t = (i + 1) as f32 / (SPLIT_TESTS_PER_AXIS + 1) as f32;
            let position = start + (end - start) * t;
            let cost = evaluate_split(summaries, axis, position);

            if cost < best.cost {
                best = SplitPlane {
                    axis,
                    position,
                    cost,
                };
            }
        }
    }

    best
}

/// Structural summary of a built hierarchy, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BvhStats {
    /// Total number of nodes.
    pub node_count: usize,
    /// Number of leaf nodes.
    pub leaf_count: usize,
    /// Deepest node level, counted from 1 at the root.
    pub max_depth: usize,
    /// Triangle count of the largest leaf.
    pub max_leaf_size: u32,
}

/// Immutable bounding volume hierarchy.
///
/// Built once at scene-load time; afterwards the node array and the permuted
/// triangle arrays are consumed read-only by the renderer.
#[derive(Debug)]
pub struct Bvh {
    /// Flat node array, root at index 0.
    pub nodes: Vec<Node>,
}

impl Bvh {
    /// Build a hierarchy over the given triangle summaries.
    ///
    /// Both arrays are permuted in lockstep; on return every node's
    /// `first_triangle..first_triangle + triangle_count` range denotes the
    /// same physical triangles in each array. Fails fast on empty input,
    /// mismatched array lengths, or non-finite geometry.
    pub fn build(
        summaries: &mut [TriangleBounds],
        triangles: &mut [Triangle],
    ) -> Result<Self, BvhError> {
        if summaries.len() != triangles.len() {
            return Err(BvhError::LengthMismatch {
                summaries: summaries.len(),
                triangles: triangles.len(),
            });
        }
        if summaries.is_empty() {
            return Err(BvhError::EmptyScene);
        }
        if let Some(index) = summaries.iter().position(|s| !s.is_finite()) {
            return Err(BvhError::NonFiniteTriangle { index });
        }

        // Index-stable growth: a binary hierarchy over N triangles never
        // exceeds 2N-1 nodes.
        let mut nodes = Vec::with_capacity(2 * summaries.len() - 1);

        let mut root_bounds = Aabb::EMPTY;
        for tri in summaries.iter() {
            root_bounds.grow_to_include(tri);
        }
        root_bounds.expand();
        nodes.push(Node::leaf(root_bounds, 0, summaries.len() as u32));

        let mut bvh = Self { nodes };
        bvh.split(0, 1, summaries, triangles);

        let stats = bvh.stats();
        info!(
            "Built BVH: {} nodes, {} leaves, max depth {}, largest leaf {} triangles",
            stats.node_count, stats.leaf_count, stats.max_depth, stats.max_leaf_size
        );

        Ok(bvh)
    }

    /// Recursively partition one node's triangle range.
    fn split(
        &mut self,
        node_index: usize,
        depth: usize,
        summaries: &mut [TriangleBounds],
        triangles: &mut [Triangle],
    ) {
        let node = self.nodes[node_index];
        if depth == MAX_DEPTH || node.triangle_count < 1 {
            if depth == MAX_DEPTH {
                debug!(
                    "Depth limit reached, leaf keeps {} triangles at [{}..{})",
                    node.triangle_count,
                    node.first_triangle,
                    node.first_triangle + node.triangle_count
                );
            }
            return;
        }

        let first = node.first_triangle as usize;
        let count = node.triangle_count as usize;

        let plane = choose_split(&node, &summaries[first..first + count]);
        if plane.cost >= node.cost() {
            return;
        }

        // Single in-place pass: A-side triangles are swapped into a growing
        // prefix of the range, with the same swap applied to the render
        // array. Child bounds grow as triangles are classified.
        let mut bounds_a = Aabb::EMPTY;
        let mut bounds_b = Aabb::EMPTY;
        let mut count_a = 0usize;

        for i in first..first + count {
            let tri = summaries[i];
            if tri.center[plane.axis] < plane.position {
                bounds_a.grow_to_include(&tri);
                let dest = first + count_a;
                summaries.swap(i, dest);
                triangles.swap(i, dest);
                count_a += 1;
            } else {
                bounds_b.grow_to_include(&tri);
            }
        }

        let count_b = count - count_a;
        if count_a == 0 || count_b == 0 {
            // Degenerate partition: all triangles landed on one side. The
            // node stays a leaf; the swaps above only reordered its own
            // range, which no invariant forbids.
            return;
        }

        bounds_a.expand();
        bounds_b.expand();

        let child_index = self.nodes.len();
        self.nodes
            .push(Node::leaf(bounds_a, first as u32, count_a as u32));
        self.nodes.push(Node::leaf(
            bounds_b,
            (first + count_a) as u32,
            count_b as u32,
        ));
        self.nodes[node_index].child_index = child_index as i32;

        self.split(child_index, depth + 1, summaries, triangles);
        self.split(child_index + 1, depth + 1, summaries, triangles);
    }

    /// Root node of the hierarchy.
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Walk the tree and summarize its structure.
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            node_count: self.nodes.len(),
            leaf_count: 0,
            max_depth: 0,
            max_leaf_size: 0,
        };

        let mut stack = vec![(0usize, 1usize)];
        while let Some((index, depth)) = stack.pop() {
            let node = &self.nodes[index];
            stats.max_depth = stats.max_depth.max(depth);
            if node.is_leaf() {
                stats.leaf_count += 1;
                stats.max_leaf_size = stats.max_leaf_size.max(node.triangle_count);
            } else {
                stack.push((node.child_index as usize, depth + 1));
                stack.push((node.child_index as usize + 1, depth + 1));
            }
        }

        stats
    }
}
