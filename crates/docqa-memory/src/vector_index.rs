use crate::document::Chunk;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("cannot build an index without entries")]
    Empty,
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone)]
struct IndexedChunk {
    vector: Vec<f32>,
    chunk: Chunk,
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub score: f32,
    pub chunk: Chunk,
}

/// Immutable nearest-neighbour index over the chunks of one uploaded file.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
    dimension: usize,
}

impl VectorIndex {
    /// Build an index from `(embedding, chunk)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Empty`] when `entries` is empty and
    /// [`IndexError::DimensionMismatch`] when embeddings differ in length.
    pub fn build(entries: Vec<(Vec<f32>, Chunk)>) -> Result<Self, IndexError> {
        let dimension = entries.first().map(|(v, _)| v.len()).ok_or(IndexError::Empty)?;

        let mut indexed = Vec::with_capacity(entries.len());
        for (vector, chunk) in entries {
            if vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            indexed.push(IndexedChunk { vector, chunk });
        }

        Ok(Self {
            entries: indexed,
            dimension,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// Top-`limit` chunks by cosine similarity, best first. Ties keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DimensionMismatch`] if `query` has the wrong length.
    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .entries
            .iter()
            .map(|e| (cosine_similarity(query, &e.vector), e))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(score, e)| ScoredChunk {
                score,
                chunk: e.chunk.clone(),
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentMetadata;

    fn chunk(content: &str, chunk_index: usize) -> Chunk {
        Chunk {
            content: content.to_owned(),
            metadata: DocumentMetadata::new("doc.pdf", "application/pdf"),
            chunk_index,
        }
    }

    fn sample_index() -> VectorIndex {
        VectorIndex::build(vec![
            (vec![1.0, 0.0, 0.0], chunk("alpha", 0)),
            (vec![0.0, 1.0, 0.0], chunk("beta", 1)),
            (vec![0.7, 0.7, 0.0], chunk("gamma", 2)),
        ])
        .unwrap()
    }

    #[test]
    fn build_rejects_empty() {
        assert!(matches!(VectorIndex::build(vec![]), Err(IndexError::Empty)));
    }

    #[test]
    fn build_rejects_mixed_dimensions() {
        let err = VectorIndex::build(vec![
            (vec![1.0, 0.0], chunk("a", 0)),
            (vec![1.0, 0.0, 0.0], chunk("b", 1)),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn search_orders_by_similarity() {
        let index = sample_index();
        let results = index.search(&[1.0, 0.1, 0.0], 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.content, "alpha");
        assert_eq!(results[1].chunk.content, "gamma");
        assert_eq!(results[2].chunk.content, "beta");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn search_truncates_to_limit() {
        let results = sample_index().search(&[0.0, 1.0, 0.0], 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.content, "beta");
        assert!((results[0].score - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn search_limit_larger_than_index() {
        assert_eq!(sample_index().search(&[1.0, 0.0, 0.0], 10).unwrap().len(), 3);
    }

    #[test]
    fn search_rejects_wrong_query_dimension() {
        assert!(sample_index().search(&[1.0, 0.0], 3).is_err());
    }

    #[test]
    fn self_retrieval_returns_own_chunk_first() {
        let index = sample_index();
        for (i, name) in ["alpha", "beta", "gamma"].iter().enumerate() {
            let query = &index.entries[i].vector.clone();
            let top = index.search(query, 1).unwrap();
            assert_eq!(&top[0].chunk.content, name);
        }
    }

    #[test]
    fn accessors() {
        let index = sample_index();
        assert_eq!(index.len(), 3);
        assert!(!index.is_empty());
        assert_eq!(index.dimension(), 3);
        let names: Vec<_> = index.chunks().map(|c| c.content.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn cosine_similarity_orthogonal() {
        assert!(cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn cosine_similarity_zero_vector() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < f32::EPSILON);
    }
}
