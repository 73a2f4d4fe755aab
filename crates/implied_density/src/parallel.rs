//! Rayon helpers for fanning work out over currencies and expiries.

use rayon::prelude::*;

/// Map every item, on the rayon pool when `parallel` is set.
///
/// Results come back in input order either way, so parallel and sequential
/// runs produce identical output.
pub fn map_ordered<T, R, F>(items: &[T], parallel: bool, mapper: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if parallel {
        items.par_iter().map(mapper).collect()
    } else {
        items.iter().map(mapper).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_matches_sequential() {
        let items: Vec<u64> = (0..1000).collect();
        let seq = map_ordered(&items, false, |x| x * x);
        let par = map_ordered(&items, true, |x| x * x);
        assert_eq!(seq, par);
        assert_eq!(par[999], 998_001);
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<u64> = Vec::new();
        assert!(map_ordered(&items, true, |x| x + 1).is_empty());
    }
}
