//! Bitonic comparator network for arbitrary lengths.
//!
//! Sorting splits a range in two, sorts the halves in opposite directions and
//! merges the resulting bitonic sequence. Lengths that are not a power of two are
//! handled by folding at the largest power of two below the length, which is
//! equivalent to padding the tail with elements that never move.
//!
//! The sequence of compare-exchange operations depends only on the length, never
//! on the data.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

/// Largest power of two strictly below `n` (n ≥ 2).
fn fold_point(n: usize) -> usize {
    let mut m = 1;
    while m << 1 < n {
        m <<= 1;
    }
    m
}

#[inline]
fn compare_exchange<T, K, F>(data: &mut [T], i: usize, j: usize, dir: Direction, key: &F)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let out_of_order = match dir {
        Direction::Descending => key(&data[i]) < key(&data[j]),
        Direction::Ascending => key(&data[i]) > key(&data[j]),
    };
    if out_of_order {
        data.swap(i, j);
    }
}

fn merge_range<T, K, F>(data: &mut [T], lo: usize, n: usize, dir: Direction, key: &F)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    if n < 2 {
        return;
    }
    let m = fold_point(n);
    for i in lo..lo + n - m {
        compare_exchange(data, i, i + m, dir, key);
    }
    merge_range(data, lo, m, dir, key);
    merge_range(data, lo + m, n - m, dir, key);
}

fn sort_range<T, K, F>(data: &mut [T], lo: usize, n: usize, dir: Direction, key: &F)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    if n < 2 {
        return;
    }
    let m = n / 2;
    sort_range(data, lo, m, dir.reverse(), key);
    sort_range(data, lo + m, n - m, dir, key);
    merge_range(data, lo, n, dir, key);
}

/// Sort `data` in place with the bitonic network.
pub fn sort_by_key<T, K, F>(data: &mut [T], dir: Direction, key: F)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    sort_range(data, 0, data.len(), dir, &key);
}

/// Merge a bitonic sequence in place.
///
/// For a descending merge the input must rise then fall; for an ascending merge
/// it must fall then rise.
pub fn merge_by_key<T, K, F>(data: &mut [T], dir: Direction, key: F)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    merge_range(data, 0, data.len(), dir, &key);
}

/// Merge two adjacent runs, each sorted in `dir`, split at `split`.
///
/// The first run is reversed so the whole slice becomes bitonic, then merged.
pub fn merge_sorted_runs<T, K, F>(data: &mut [T], split: usize, dir: Direction, key: F)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    assert!(split <= data.len(), "split {} beyond run length {}", split, data.len());
    data[..split].reverse();
    merge_range(data, 0, data.len(), dir, &key);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_sorted_desc(v: &[i32]) -> bool {
        v.windows(2).all(|w| w[0] >= w[1])
    }

    #[test]
    fn test_fold_point() {
        assert_eq!(fold_point(2), 1);
        assert_eq!(fold_point(3), 2);
        assert_eq!(fold_point(8), 4);
        assert_eq!(fold_point(13), 8);
        assert_eq!(fold_point(27), 16);
    }

    #[test]
    fn test_sort_every_length() {
        for n in 0..40 {
            let mut v: Vec<i32> = (0..n).map(|i| (i * 37 % 23) - 11).collect();
            let mut expected = v.clone();
            expected.sort_unstable_by(|a, b| b.cmp(a));
            sort_by_key(&mut v, Direction::Descending, |x| *x);
            assert_eq!(v, expected, "length {}", n);
        }
    }

    #[test]
    fn test_sort_ascending() {
        let mut v = vec![5, -1, 9, 3, 3, 0, 12];
        sort_by_key(&mut v, Direction::Ascending, |x| *x);
        assert_eq!(v, vec![-1, 0, 3, 3, 5, 9, 12]);
    }

    #[test]
    fn test_merge_uneven_runs() {
        for a in 0..12 {
            for b in 0..12 {
                let mut left: Vec<i32> = (0..a).map(|i| 100 - 7 * i).collect();
                let right: Vec<i32> = (0..b).map(|i| 95 - 5 * i).collect();
                left.extend(&right);
                merge_sorted_runs(&mut left, a as usize, Direction::Descending, |x| *x);
                assert!(is_sorted_desc(&left), "runs {} + {}: {:?}", a, b, left);
            }
        }
    }

    #[test]
    fn test_merge_bitonic_sequence() {
        let mut v = vec![1, 4, 8, 9, 7, 2];
        merge_by_key(&mut v, Direction::Descending, |x| *x);
        assert_eq!(v, vec![9, 8, 7, 4, 2, 1]);
    }
}
