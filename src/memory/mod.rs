pub mod confidence;
pub mod dedup;
pub mod forget;
pub mod search;
pub mod store;
pub mod types;

/// Convert an f32 embedding slice to raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            embedding.len() * std::mem::size_of::<f32>(),
        )
    }
}

/// Convert a cosine-similarity threshold to the equivalent L2 distance for
/// unit vectors: `d = sqrt(2 * (1 - cos))`.
pub fn cosine_threshold_to_l2(cosine_threshold: f64) -> f64 {
    (2.0 * (1.0 - cosine_threshold)).max(0.0).sqrt()
}

/// Convert an L2 distance between unit vectors back to cosine similarity:
/// `cos = 1 - d^2 / 2`.
pub fn l2_to_cosine(distance: f64) -> f64 {
    1.0 - distance * distance / 2.0
}

/// Lowercase, whitespace-collapsed text used for the exact dedup match.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
