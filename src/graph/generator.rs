//! Synthetic edge generators: uniform random and Kronecker (RMAT).
//!
//! Every edge is generated from its own RNG seeded by the edge's global
//! index through a SplitMix64 mixer, so the stream is reproducible and —
//! because ranks take global indices round-robin — the generated graph is
//! identical for every rank count.

use crate::graph::{Destination, Edge, EdgeList, NodeId, Weight};
use crate::runtime::Rank;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const GRAPH_SEED: u64 = 27491095;
const WEIGHT_SEED: u64 = 0xC0FF_EE11_D00D_F00D;

/// Maximum synthesized edge weight (weights are uniform in `1..=255`).
const MAX_WEIGHT: u64 = 255;

/// Steele/Vigna SplitMix64 mixer; decorrelates sequential seeds.
#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Parameterized synthetic edge-list generator.
pub struct Generator {
    scale: u32,
    degree: u32,
}

impl Generator {
    /// `2^scale` vertices with `degree` average out-degree.
    pub fn new(scale: u32, degree: u32) -> Self {
        Generator { scale, degree }
    }

    /// Vertex count of the generated graph.
    pub fn num_nodes(&self) -> NodeId {
        1i64 << self.scale
    }

    fn num_edges(&self) -> u64 {
        (self.num_nodes() as u64) * self.degree as u64
    }

    /// Generate this rank's round-robin share of the edge stream.
    /// Weights, if the payload carries them, are filled in by
    /// [`insert_weights`].
    pub fn generate<D: Destination>(&self, rank: &Rank, uniform: bool) -> EdgeList<D> {
        let n = self.num_nodes();
        let mut el = EdgeList::new();
        let mut idx = rank.pe() as u64;
        while idx < self.num_edges() {
            let mut rng = SmallRng::seed_from_u64(splitmix64(GRAPH_SEED ^ idx));
            let (u, v) = if uniform {
                (rng.gen_range(0..n), rng.gen_range(0..n))
            } else {
                self.rmat_edge(&mut rng)
            };
            el.push(Edge {
                u,
                v: D::from_node_weight(v, 0),
            });
            idx += rank.npes() as u64;
        }
        el
    }

    /// One RMAT edge: descend `scale` quadrant choices with the classic
    /// (0.57, 0.19, 0.19, 0.05) split.
    fn rmat_edge(&self, rng: &mut SmallRng) -> (NodeId, NodeId) {
        const A: f64 = 0.57;
        const B: f64 = 0.19;
        const C: f64 = 0.19;
        let mut u = 0i64;
        let mut v = 0i64;
        for bit in 0..self.scale {
            let r: f64 = rng.gen();
            if r < A {
                // upper-left quadrant: both bits clear
            } else if r < A + B {
                v |= 1 << bit;
            } else if r < A + B + C {
                u |= 1 << bit;
            } else {
                u |= 1 << bit;
                v |= 1 << bit;
            }
        }
        (u, v)
    }
}

/// Attach deterministic weights to a weight-carrying edge list whose source
/// had none. Local edge `j` on rank `p` is global edge `p + j·npes`, so the
/// assignment is independent of the rank count.
pub fn insert_weights<D: Destination>(rank: &Rank, el: &mut EdgeList<D>) {
    debug_assert!(D::HAS_WEIGHT);
    let npes = rank.npes() as u64;
    let pe = rank.pe() as u64;
    for (j, e) in el.iter_mut().enumerate() {
        let gidx = pe + j as u64 * npes;
        let w = 1 + (splitmix64(WEIGHT_SEED ^ gidx) % MAX_WEIGHT) as Weight;
        e.v = D::from_node_weight(e.v.node(), w);
    }
}
