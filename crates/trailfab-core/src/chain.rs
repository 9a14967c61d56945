//! Line chaining - join line pieces into maximal polylines.
//!
//! Clipping a border or river network leaves it in many short pieces, and
//! the same shared border appears once per country. This module:
//!
//! - collapses duplicated segments ([`dedup_segments`])
//! - joins pieces end to end wherever exactly two line ends meet
//!   ([`merge_lines`]), reversing pieces when needed
//!
//! Junctions where three or more ends meet stay as breaks, so a river
//! confluence keeps its three arms.
//!
//! Endpoints are snapped to a grid of `tolerance` before comparison. Pieces
//! coming out of the kernel already sit on that grid, so snapping only
//! absorbs float noise.

use geo::{Coord, LineString};
use std::collections::HashMap;
use std::collections::HashSet;

use crate::geometry::segments_of;

/// Grid cell of a snapped endpoint.
type NodeKey = (i64, i64);

/// Which end of a line sits at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Start,
    Finish,
}

#[inline]
fn node_key(c: Coord<f64>, tolerance: f64) -> NodeKey {
    ((c.x / tolerance).round() as i64, (c.y / tolerance).round() as i64)
}

/// Endpoint index: node -> every (line, end) touching it, in input order.
struct NodeIndex {
    nodes: HashMap<NodeKey, Vec<(usize, End)>>,
    tolerance: f64,
}

impl NodeIndex {
    fn build(lines: &[LineString<f64>], tolerance: f64) -> Self {
        let mut nodes: HashMap<NodeKey, Vec<(usize, End)>> = HashMap::new();
        for (i, line) in lines.iter().enumerate() {
            let (Some(first), Some(last)) = (line.0.first(), line.0.last()) else {
                continue;
            };
            nodes.entry(node_key(*first, tolerance)).or_default().push((i, End::Start));
            nodes.entry(node_key(*last, tolerance)).or_default().push((i, End::Finish));
        }
        Self { nodes, tolerance }
    }

    /// The other line end at `at`, if the node there has degree exactly 2
    /// and that end belongs to an unused line.
    fn continuation(&self, at: Coord<f64>, from: (usize, End), used: &[bool]) -> Option<(usize, End)> {
        let ends = self.nodes.get(&node_key(at, self.tolerance))?;
        if ends.len() != 2 {
            return None;
        }
        let other = if ends[0] == from { ends[1] } else { ends[0] };
        if used[other.0] { None } else { Some(other) }
    }
}

/// Merge lines that meet end to end at degree-2 nodes.
///
/// Output order follows the input: each merged line is started from the
/// first unused input line, so reruns produce identical results.
///
/// # Algorithm
///
/// 1. Index every line end by snapped position
/// 2. For each unused line, start a chain
/// 3. Extend forward from the chain's last point while its node has degree 2
/// 4. Extend backward from the chain's first point the same way
pub fn merge_lines(lines: &[LineString<f64>], tolerance: f64) -> Vec<LineString<f64>> {
    let owned: Vec<LineString<f64>> = lines.iter().filter(|l| l.0.len() >= 2).cloned().collect();
    if owned.is_empty() {
        return Vec::new();
    }

    let index = NodeIndex::build(&owned, tolerance);
    let mut used = vec![false; owned.len()];
    let mut merged = Vec::new();

    for start_idx in 0..owned.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;
        let mut chain: Vec<Coord<f64>> = owned[start_idx].0.clone();

        // Forward: leave through our Finish end
        let mut from = (start_idx, End::Finish);
        while let Some(tail) = chain.last().copied() {
            let Some((next, end)) = index.continuation(tail, from, &used) else {
                break;
            };
            used[next] = true;
            let coords = &owned[next].0;
            match end {
                End::Start => {
                    chain.extend(coords.iter().skip(1));
                    from = (next, End::Finish);
                }
                End::Finish => {
                    chain.extend(coords.iter().rev().skip(1));
                    from = (next, End::Start);
                }
            }
        }

        // Backward: leave through our Start end
        let mut from = (start_idx, End::Start);
        let mut prefix: Vec<Coord<f64>> = Vec::new();
        let mut head = chain[0];
        while let Some((prev, end)) = index.continuation(head, from, &used) {
            used[prev] = true;
            let coords = &owned[prev].0;
            // Collected in reverse; flipped once at the end.
            match end {
                End::Finish => {
                    prefix.extend(coords.iter().rev().skip(1));
                    from = (prev, End::Start);
                }
                End::Start => {
                    prefix.extend(coords.iter().skip(1));
                    from = (prev, End::Finish);
                }
            }
            head = match prefix.last() {
                Some(c) => *c,
                None => break,
            };
        }

        if !prefix.is_empty() {
            prefix.reverse();
            prefix.extend(chain);
            chain = prefix;
        }

        merged.push(LineString::new(chain));
    }

    merged
}

/// Split lines into segments and drop repeats, keeping first occurrences.
///
/// Segments are compared undirected, so a border traced clockwise by one
/// country and counter-clockwise by its neighbor collapses to one copy.
/// Zero-length segments are dropped.
pub fn dedup_segments(lines: &[LineString<f64>], tolerance: f64) -> Vec<LineString<f64>> {
    let mut seen: HashSet<(NodeKey, NodeKey)> = HashSet::new();
    let mut unique = Vec::new();

    for line in lines {
        for seg in segments_of(line) {
            let a = node_key(seg.start(), tolerance);
            let b = node_key(seg.end(), tolerance);
            if a == b {
                continue;
            }
            let key = if a <= b { (a, b) } else { (b, a) };
            if seen.insert(key) {
                unique.push(seg.to_line_string());
            }
        }
    }

    unique
}

// ============================================================================
// TESTS
// ============================================================================
