//! Comb sort used to order sprites back to front.

/// Sort `dist` descending in place, applying the same permutation to
/// `order`.  Both slices must be the same length.
///
/// Comb sort with a shrink factor of 1.3 (`gap * 10 / 13`) and the
/// "rule of 11": gaps of 9 or 10 jump to 11.  The order of equal
/// distances is unspecified.
pub fn comb_sort(order: &mut [usize], dist: &mut [f64]) {
    debug_assert_eq!(order.len(), dist.len());
    let n = order.len().min(dist.len());

    let mut gap = n;
    let mut swapped = false;
    while gap > 1 || swapped {
        gap = (gap * 10) / 13;
        if gap == 9 || gap == 10 {
            gap = 11;
        }
        gap = gap.max(1);

        swapped = false;
        for i in 0..n - gap {
            let j = i + gap;
            if dist[i] < dist[j] {
                dist.swap(i, j);
                order.swap(i, j);
                swapped = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(dist: &[f64]) -> (Vec<usize>, Vec<f64>) {
        let mut order: Vec<usize> = (0..dist.len()).collect();
        let mut dist = dist.to_vec();
        comb_sort(&mut order, &mut dist);
        (order, dist)
    }

    #[test]
    fn sorts_descending_and_tracks_indices() {
        let input = [3.0, 9.5, 0.25, 7.0, 9.5, 1.0, 42.0, 0.0, 5.5, 2.0, 8.0, 6.0, 4.0];
        let (order, dist) = sorted(&input);

        assert!(dist.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(order[0], 6);
        for (o, d) in order.iter().zip(&dist) {
            assert_eq!(input[*o], *d);
        }

        let mut seen = order.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..input.len()).collect::<Vec<_>>());
    }

    #[test]
    fn trivial_inputs() {
        assert_eq!(sorted(&[]), (vec![], vec![]));
        assert_eq!(sorted(&[1.0]), (vec![0], vec![1.0]));
        assert_eq!(sorted(&[1.0, 2.0]), (vec![1, 0], vec![2.0, 1.0]));
    }

    #[test]
    fn large_reverse_input() {
        let input: Vec<f64> = (0..500).map(|i| i as f64 * 0.5).collect();
        let (order, dist) = sorted(&input);
        assert!(dist.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(order[0], 499);
        assert_eq!(order[499], 0);
    }
}
