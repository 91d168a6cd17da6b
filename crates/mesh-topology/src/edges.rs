//! Edge reconstruction from triangle connectivity.
//!
//! Edges are identified by their welded endpoint indices, unordered. Each edge
//! remembers the direction in which it was first traversed, how many triangles
//! use it, and whether the second user traversed it in the opposite direction
//! (consistent winding across the edge).

use hashbrown::HashMap;
use tracing::trace;

use crate::Mesh;
use crate::types::{Edge, Triangle};

/// Canonical undirected key for the edge between `a` and `b`.
#[inline]
pub fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Unique undirected edges of a triangle list, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    edges: Vec<Edge>,
    index: HashMap<(u32, u32), usize>,
}

impl EdgeSet {
    /// Reconstruct the edge set of `triangles`.
    ///
    /// Each triangle contributes `(v0, v1)`, `(v1, v2)`, `(v2, v0)`.
    pub fn build(triangles: &[Triangle]) -> Self {
        let mut set = Self {
            edges: Vec::with_capacity(triangles.len() * 3 / 2),
            index: HashMap::with_capacity(triangles.len() * 3 / 2),
        };

        for tri in triangles {
            for (a, b) in tri.directed_edges() {
                set.insert(a, b);
            }
        }

        trace!(
            "Reconstructed {} edges from {} triangles",
            set.edges.len(),
            triangles.len()
        );
        set
    }

    fn insert(&mut self, a: u32, b: u32) {
        let key = edge_key(a, b);
        match self.index.get(&key) {
            Some(&i) => {
                let edge = &mut self.edges[i];
                edge.faces += 1;
                edge.oriented = edge.faces == 2 && edge.v == [b, a];
            }
            None => {
                self.index.insert(key, self.edges.len());
                self.edges.push(Edge {
                    v: [a, b],
                    oriented: false,
                    faces: 1,
                });
            }
        }
    }

    /// All edges in first-seen order.
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Look up the edge between `a` and `b` in either direction.
    pub fn get(&self, a: u32, b: u32) -> Option<&Edge> {
        self.index.get(&edge_key(a, b)).map(|&i| &self.edges[i])
    }

    /// Insertion-order position of the edge between `a` and `b`.
    #[inline]
    pub fn position(&self, a: u32, b: u32) -> Option<usize> {
        self.index.get(&edge_key(a, b)).copied()
    }

    /// True if some triangle uses the edge between `a` and `b`.
    #[inline]
    pub fn contains(&self, a: u32, b: u32) -> bool {
        self.index.contains_key(&edge_key(a, b))
    }

    /// Number of edges touching each vertex, for vertices `0..vertex_count`.
    ///
    /// Endpoints at or past `vertex_count` are ignored.
    pub fn vertex_degrees(&self, vertex_count: usize) -> Vec<u32> {
        let mut degrees = vec![0u32; vertex_count];
        for edge in &self.edges {
            for &v in &edge.v {
                if let Some(d) = degrees.get_mut(v as usize) {
                    *d += 1;
                }
            }
        }
        degrees
    }

    /// Consume the set, keeping only the ordered edge list.
    pub fn into_edges(self) -> Vec<Edge> {
        self.edges
    }
}

impl Mesh {
    /// Reconstruct the edge list from the current triangles.
    pub fn edges(&self) -> Vec<Edge> {
        EdgeSet::build(&self.triangles).into_edges()
    }
}

/// Position of the first edge in `edges` with the same endpoints as `edge`,
/// in either order.
///
/// A plain linear scan on exact indices; use [`EdgeSet::get`] for repeated
/// lookups.
pub fn find_edge(edges: &[Edge], edge: &Edge) -> Option<usize> {
    edges.iter().position(|e| e.matches(edge))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tris(faces: &[[u32; 3]]) -> Vec<Triangle> {
        faces.iter().map(|&v| Triangle::new(v)).collect()
    }

    fn cube_faces() -> Vec<Triangle> {
        tris(&[
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [3, 7, 6],
            [3, 6, 2],
            [0, 4, 7],
            [0, 7, 3],
            [1, 2, 6],
            [1, 6, 5],
        ])
    }

    #[test]
    fn test_edge_key_is_unordered() {
        assert_eq!(edge_key(3, 7), (3, 7));
        assert_eq!(edge_key(7, 3), (3, 7));
        assert_eq!(edge_key(5, 5), (5, 5));
    }

    #[test]
    fn test_single_triangle() {
        let set = EdgeSet::build(&tris(&[[0, 1, 2]]));
        assert_eq!(set.len(), 3);
        let v: Vec<_> = set.edges().iter().map(|e| e.v).collect();
        assert_eq!(v, vec![[0, 1], [1, 2], [2, 0]]);
        assert!(set.edges().iter().all(|e| e.faces == 1 && !e.oriented));
    }

    #[test]
    fn test_consistent_pair_is_oriented() {
        let set = EdgeSet::build(&tris(&[[0, 1, 2], [0, 2, 3]]));
        assert_eq!(set.len(), 5);

        let diagonal = set.get(2, 0).unwrap();
        assert_eq!(diagonal.v, [2, 0]);
        assert_eq!(diagonal.faces, 2);
        assert!(diagonal.oriented);
        assert!(!set.get(0, 1).unwrap().oriented);
    }

    #[test]
    fn test_flipped_triangle_breaks_orientation() {
        // Second triangle wound the same way around the shared edge.
        let set = EdgeSet::build(&tris(&[[0, 1, 2], [0, 3, 2]]));
        let diagonal = set.get(0, 2).unwrap();
        assert_eq!(diagonal.faces, 2);
        assert!(!diagonal.oriented);
    }

    #[test]
    fn test_cube_edges() {
        let set = EdgeSet::build(&cube_faces());
        assert_eq!(set.len(), 18);
        assert!(set.edges().iter().all(|e| e.faces == 2 && e.oriented));
    }

    #[test]
    fn test_third_occurrence_clears_orientation() {
        let set = EdgeSet::build(&tris(&[[0, 1, 2], [1, 0, 3], [0, 1, 4]]));
        let shared = set.get(0, 1).unwrap();
        assert_eq!(shared.faces, 3);
        assert!(!shared.oriented);
    }

    #[test]
    fn test_vertex_degrees() {
        let set = EdgeSet::build(&cube_faces());
        let degrees = set.vertex_degrees(9);
        // Corners on the split diagonals get 5 edges, the others 4.
        assert_eq!(degrees.iter().take(8).sum::<u32>(), 36);
        assert!(degrees.iter().take(8).all(|&d| d >= 3));
        assert_eq!(degrees[8], 0);
    }

    #[test]
    fn test_contains_and_find_edge() {
        let set = EdgeSet::build(&tris(&[[0, 1, 2]]));
        assert!(set.contains(1, 0));
        assert!(!set.contains(0, 3));

        let edges = set.into_edges();
        assert_eq!(find_edge(&edges, &Edge::new(0, 2)), Some(2));
        assert_eq!(find_edge(&edges, &Edge::new(1, 2)), Some(1));
        assert_eq!(find_edge(&edges, &Edge::new(3, 4)), None);
    }

    #[test]
    fn test_empty() {
        let set = EdgeSet::build(&[]);
        assert!(set.is_empty());
        assert!(set.get(0, 1).is_none());
    }
}
