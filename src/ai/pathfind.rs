//! A* over the tile grid.
//!
//! Costs are in real units so the non-square tile shape is priced in:
//! horizontal steps cost a tile width, vertical steps a tile height, and
//! diagonals a tile width with a surcharge. A diagonal step is only legal
//! when both of its orthogonal neighbors are walkable, matching the
//! corner rule the clear-line test enforces.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use glam::IVec2;

use crate::constants::{DIAGONAL_COST_FACTOR, TILE_HEIGHT, TILE_WIDTH};
use crate::tile::tile_center;

#[derive(Debug, Clone, Copy)]
struct Node {
    estimate: f32,
    pos: IVec2,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.estimate == other.estimate && self.pos == other.pos
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the cheapest estimate first
        other.estimate.total_cmp(&self.estimate)
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn heuristic(a: IVec2, b: IVec2) -> f32 {
    tile_center(a).as_vec2().distance(tile_center(b).as_vec2())
}

/// Tile path from `from` to `to` inclusive of both ends. If `to` cannot be
/// reached the path degenerates to just `from`.
pub fn find_path(from: IVec2, to: IVec2, walkable: &impl Fn(IVec2) -> bool) -> Vec<IVec2> {
    if from == to {
        return vec![from];
    }

    let mut open = BinaryHeap::new();
    let mut came_from: HashMap<IVec2, IVec2> = HashMap::new();
    let mut g_score: HashMap<IVec2, f32> = HashMap::new();

    g_score.insert(from, 0.0);
    open.push(Node {
        estimate: heuristic(from, to),
        pos: from,
    });

    while let Some(Node { pos, .. }) = open.pop() {
        if pos == to {
            return reconstruct(&came_from, pos);
        }
        let g_here = g_score.get(&pos).copied().unwrap_or(f32::INFINITY);

        for (next, step_cost) in neighbors(pos, walkable) {
            let tentative = g_here + step_cost;
            if tentative < g_score.get(&next).copied().unwrap_or(f32::INFINITY) {
                came_from.insert(next, pos);
                g_score.insert(next, tentative);
                open.push(Node {
                    estimate: tentative + heuristic(next, to),
                    pos: next,
                });
            }
        }
    }

    vec![from]
}

fn neighbors(pos: IVec2, walkable: &impl Fn(IVec2) -> bool) -> Vec<(IVec2, f32)> {
    let mut out = Vec::with_capacity(8);
    let orth = [
        (IVec2::X, TILE_WIDTH as f32),
        (IVec2::NEG_X, TILE_WIDTH as f32),
        (IVec2::Y, TILE_HEIGHT as f32),
        (IVec2::NEG_Y, TILE_HEIGHT as f32),
    ];
    for (d, cost) in orth {
        let n = pos + d;
        if walkable(n) {
            out.push((n, cost));
        }
    }
    let diag_cost = TILE_WIDTH as f32 * DIAGONAL_COST_FACTOR;
    for d in [
        IVec2::new(1, 1),
        IVec2::new(1, -1),
        IVec2::new(-1, 1),
        IVec2::new(-1, -1),
    ] {
        let n = pos + d;
        // No corner cutting: both flanking orthogonals must be open
        if walkable(n) && walkable(IVec2::new(pos.x + d.x, pos.y)) && walkable(IVec2::new(pos.x, pos.y + d.y)) {
            out.push((n, diag_cost));
        }
    }
    out
}

fn reconstruct(came_from: &HashMap<IVec2, IVec2>, mut pos: IVec2) -> Vec<IVec2> {
    let mut path = vec![pos];
    while let Some(&prev) = came_from.get(&pos) {
        pos = prev;
        path.push(pos);
    }
    path.reverse();
    path
}
