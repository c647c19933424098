use crate::topology::TopologyModel;
use indexmap::IndexMap;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_SEED: u64 = 42;
const DEFAULT_ITERATIONS: usize = 50;
const MIN_DISTANCE: f64 = 0.01;
/// Above this many nodes the spring pass is skipped and the seeded
/// placement is used as is.
pub const MAX_FORCE_NODES: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Seeded Fruchterman-Reingold spring layout.
///
/// Positions depend only on the model and the seed, so re-rendering the
/// same topology gives the same picture. Output is centered on the origin
/// with the largest coordinate magnitude scaled to 1.
#[derive(Debug, Clone, Copy)]
pub struct LayoutProjector {
    pub seed: u64,
    pub iterations: usize,
}

impl Default for LayoutProjector {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl LayoutProjector {
    pub fn new(seed: u64, iterations: usize) -> Self {
        Self { seed, iterations }
    }

    /// Position for every node, in node insertion order.
    pub fn layout(&self, model: &TopologyModel) -> IndexMap<String, Point> {
        let n = model.node_count();
        let ids: Vec<&str> = model.nodes().map(|(id, _)| id).collect();

        if n == 0 {
            return IndexMap::new();
        }
        if n == 1 {
            return ids.iter().map(|id| (id.to_string(), Point::default())).collect();
        }

        let mut rng = Pcg64::seed_from_u64(self.seed);
        let mut pos: Vec<[f64; 2]> = (0..n).map(|_| [rng.random::<f64>(), rng.random::<f64>()]).collect();

        if n > MAX_FORCE_NODES {
            warn!(nodes = n, limit = MAX_FORCE_NODES, "Topology too large for spring layout, using seeded placement");
        } else {
            self.relax(model, &mut pos);
        }

        rescale(&mut pos);
        ids.into_iter()
            .zip(pos)
            .map(|(id, [x, y])| (id.to_string(), Point::new(x, y)))
            .collect()
    }

    fn relax(&self, model: &TopologyModel, pos: &mut [[f64; 2]]) {
        let n = pos.len();

        // Links pull regardless of direction.
        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for edge in model.edges() {
            if let (Some(s), Some(t)) = (model.index_of(&edge.source), model.index_of(&edge.target)) {
                if s != t {
                    neighbors[s].push(t);
                    neighbors[t].push(s);
                }
            }
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }

        let k = (1.0 / n as f64).sqrt();
        let mut temperature = 0.1 * span(pos);
        let cooling = temperature / (self.iterations as f64 + 1.0);
        let mut displacement = vec![[0.0f64; 2]; n];

        for _ in 0..self.iterations {
            for d in displacement.iter_mut() {
                *d = [0.0, 0.0];
            }
            for i in 0..n {
                for j in (i + 1)..n {
                    let dx = pos[i][0] - pos[j][0];
                    let dy = pos[i][1] - pos[j][1];
                    let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                    let push = k * k / (distance * distance);
                    displacement[i][0] += dx * push;
                    displacement[i][1] += dy * push;
                    displacement[j][0] -= dx * push;
                    displacement[j][1] -= dy * push;
                }
                for &j in &neighbors[i] {
                    let dx = pos[i][0] - pos[j][0];
                    let dy = pos[i][1] - pos[j][1];
                    let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                    let pull = distance / k;
                    displacement[i][0] -= dx * pull;
                    displacement[i][1] -= dy * pull;
                }
            }
            for (p, d) in pos.iter_mut().zip(&displacement) {
                let length = (d[0] * d[0] + d[1] * d[1]).sqrt().max(MIN_DISTANCE);
                p[0] += d[0] * temperature / length;
                p[1] += d[1] * temperature / length;
            }
            temperature -= cooling;
        }
    }
}

fn span(pos: &[[f64; 2]]) -> f64 {
    let mut widest: f64 = 0.0;
    for axis in 0..2 {
        let min = pos.iter().map(|p| p[axis]).fold(f64::INFINITY, f64::min);
        let max = pos.iter().map(|p| p[axis]).fold(f64::NEG_INFINITY, f64::max);
        widest = widest.max(max - min);
    }
    widest
}

/// Center on the origin and scale into [-1, 1].
fn rescale(pos: &mut [[f64; 2]]) {
    let n = pos.len() as f64;
    for axis in 0..2 {
        let mean = pos.iter().map(|p| p[axis]).sum::<f64>() / n;
        for p in pos.iter_mut() {
            p[axis] -= mean;
        }
    }
    let extent = pos
        .iter()
        .flat_map(|p| [p[0].abs(), p[1].abs()])
        .fold(0.0f64, f64::max);
    if extent > 0.0 {
        for p in pos.iter_mut() {
            p[0] /= extent;
            p[1] /= extent;
        }
    }
}
