// Chunk planning for transfers above the per-call amount limit.
// The limit is a property of the external wallet SDK, not of the ledger;
// callers inject it from settings rather than deriving it.

use crate::error::CoreError;

/// Split `total_lamports` into ordered chunks of at most `max_chunk_lamports`.
///
/// Greedy: every chunk is `min(max, remaining)`, so the final chunk carries
/// the remainder and the plan sums exactly to the total. A total at or below
/// the limit yields a single chunk equal to the total.
pub fn plan_chunks(total_lamports: u64, max_chunk_lamports: u64) -> Result<Vec<u64>, CoreError> {
    if total_lamports == 0 {
        return Err(CoreError::Validation(
            "Transfer amount must be greater than zero".to_string(),
        ));
    }
    if max_chunk_lamports == 0 {
        return Err(CoreError::Validation(
            "max_chunk_lamports must be greater than zero".to_string(),
        ));
    }

    let count = total_lamports.div_ceil(max_chunk_lamports) as usize;
    let mut chunks = Vec::with_capacity(count);
    let mut remaining = total_lamports;
    while remaining > 0 {
        let chunk = remaining.min(max_chunk_lamports);
        chunks.push(chunk);
        remaining -= chunk;
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sol_to_lamports;

    #[test]
    fn single_chunk_when_under_limit() {
        let chunks = plan_chunks(sol_to_lamports(0.001), sol_to_lamports(0.05)).unwrap();
        assert_eq!(chunks, vec![1_000_000]);
    }

    #[test]
    fn single_chunk_when_exactly_at_limit() {
        let max = sol_to_lamports(0.05);
        let chunks = plan_chunks(max, max).unwrap();
        assert_eq!(chunks, vec![max]);
    }

    #[test]
    fn remainder_lands_in_final_chunk() {
        // 0.12 SOL at a 0.05 SOL limit -> [0.05, 0.05, 0.02]
        let chunks = plan_chunks(sol_to_lamports(0.12), sol_to_lamports(0.05)).unwrap();
        assert_eq!(chunks, vec![50_000_000, 50_000_000, 20_000_000]);
    }

    #[test]
    fn exact_multiple_produces_equal_chunks() {
        let chunks = plan_chunks(sol_to_lamports(0.15), sol_to_lamports(0.05)).unwrap();
        assert_eq!(chunks, vec![50_000_000, 50_000_000, 50_000_000]);
    }

    #[test]
    fn sum_count_and_bounds_invariants() {
        for (total, max) in [
            (1u64, 1u64),
            (7, 3),
            (1_000_000_007, 50_000_000),
            (123_456_789, 10_000_000),
            (sol_to_lamports(2.5), sol_to_lamports(0.05)),
        ] {
            let chunks = plan_chunks(total, max).unwrap();
            assert_eq!(chunks.iter().sum::<u64>(), total);
            assert_eq!(chunks.len() as u64, total.div_ceil(max));
            assert!(chunks.iter().all(|&c| c > 0 && c <= max));
        }
    }

    #[test]
    fn zero_inputs_rejected() {
        assert!(plan_chunks(0, 10).is_err());
        assert!(plan_chunks(10, 0).is_err());
    }
}
