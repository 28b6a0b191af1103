//! Brute-force L2 vector index.
//!
//! Stores vectors in insertion order and answers nearest-neighbour queries
//! by scanning all of them. Distances are squared Euclidean, which orders
//! results the same way as true L2 without the square root.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("vector has {got} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("cannot index an empty vector")]
    EmptyVector,
}

/// One search hit: the vector's insertion position and its distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Flat index over fixed-dimension `f32` vectors.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    dims: Option<usize>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimensionality fixed by the first vector added, if any.
    pub fn dims(&self) -> Option<usize> {
        self.dims
    }

    /// Append vectors. All must share the index's dimensionality; on error
    /// nothing from this call is added.
    pub fn add(&mut self, vectors: Vec<Vec<f32>>) -> Result<(), IndexError> {
        let mut expected = self.dims;
        for v in &vectors {
            if v.is_empty() {
                return Err(IndexError::EmptyVector);
            }
            match expected {
                Some(d) if d != v.len() => {
                    return Err(IndexError::DimensionMismatch {
                        expected: d,
                        got: v.len(),
                    })
                }
                _ => expected = Some(v.len()),
            }
        }
        self.dims = expected;
        self.vectors.extend(vectors);
        Ok(())
    }

    /// Up to `top_k` nearest vectors to `query`, closest first. Ties are
    /// broken by insertion position.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if let Some(d) = self.dims {
            if d != query.len() {
                return Err(IndexError::DimensionMismatch {
                    expected: d,
                    got: query.len(),
                });
            }
        }

        let mut hits: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, v)| Neighbor {
                position,
                distance: squared_l2(query, v),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(top_k);
        Ok(hits)
    }
}

/// NaN (from non-finite components) counts as infinitely far.
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    let d: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    if d.is_nan() {
        f32::INFINITY
    } else {
        d
    }
}
