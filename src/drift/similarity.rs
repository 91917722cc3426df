//! Cosine similarity over embedding vectors

/// Cosine similarity between two vectors.
///
/// Zero-norm vectors score 0, matching the warehouse cosine convention.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Minimum entry of the full pairwise similarity matrix over a batch.
///
/// The diagonal is included, so a single-element batch yields its
/// self-similarity (1.0 for any non-zero vector).
pub fn pairwise_min(batch: &[Vec<f32>]) -> Option<f32> {
    if batch.is_empty() {
        return None;
    }

    let mut minimum = f32::INFINITY;
    for a in batch {
        for b in batch {
            let sim = cosine(a, b);
            minimum = minimum.min(sim);
        }
    }

    Some(minimum)
}

/// Minimum similarity of one vector against every vector in a set
pub fn min_against(needle: &[f32], haystack: &[Vec<f32>]) -> Option<f32> {
    haystack
        .iter()
        .map(|v| cosine(needle, v))
        .fold(None, |acc, sim| match acc {
            None => Some(sim),
            Some(m) => Some(m.min(sim)),
        })
}
