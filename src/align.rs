//! Global edit distance between short byte sequences

/// Cost of a single insertion or deletion
const GAP_COST: usize = 1;

/// Cost of aligning two differing bytes
const MISMATCH_COST: usize = 1;

/// Computes the unit-cost edit distance between `a` and `b`
///
/// Fills the full `(|a| + 1) x (|b| + 1)` dynamic-programming matrix, so it is meant
/// for short sequences such as adaptors and the read fragments compared against them.
#[must_use]
pub fn edit_distance(a: &[u8], b: &[u8]) -> usize {
    let cols = b.len() + 1;
    let mut matrix = vec![0usize; (a.len() + 1) * cols];

    for i in 0..=a.len() {
        matrix[i * cols] = i * GAP_COST;
    }
    for j in 0..=b.len() {
        matrix[j] = j * GAP_COST;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let substitution = if a[i - 1] == b[j - 1] {
                0
            } else {
                MISMATCH_COST
            };
            let deletion = matrix[(i - 1) * cols + j] + GAP_COST;
            let insertion = matrix[i * cols + j - 1] + GAP_COST;
            let diagonal = matrix[(i - 1) * cols + j - 1] + substitution;
            matrix[i * cols + j] = deletion.min(insertion).min(diagonal);
        }
    }

    matrix[a.len() * cols + b.len()]
}
