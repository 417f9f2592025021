/// `n` strictly increasing integers, roughly log-spaced, from `min_val` to
/// `limit - 1 + min_val`
///
/// Where geometric spacing would repeat an integer the value is bumped by one
/// and the ratio recomputed for the remaining points.
pub fn gen_int_log_space(min_val: usize, limit: usize, n: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }

    let mut result: Vec<f64> = vec![1.0];
    let remaining_ratio = |last: f64, len: usize| (limit as f64 / last).powf(1.0 / (n - len) as f64);
    let mut ratio = if n > 1 { remaining_ratio(1.0, 1) } else { 1.0 };

    while result.len() < n {
        let last = result[result.len() - 1];
        let next = last * ratio;
        if next - last >= 1.0 {
            result.push(next);
        } else {
            result.push(last + 1.0);
            if result.len() < n {
                ratio = remaining_ratio(last + 1.0, result.len());
            }
        }
    }

    result
        .into_iter()
        .map(|v| (v.round() as usize) - 1 + min_val)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_and_length() {
        let grid = gen_int_log_space(10, 2000, 20);
        assert_eq!(grid.len(), 20);
        assert_eq!(grid[0], 10);
        assert_eq!(grid[19], 2009);
    }

    #[test]
    fn test_strictly_increasing_when_crowded() {
        // 30 points below 40 force the +1 bumps
        let grid = gen_int_log_space(5, 40, 30);
        assert_eq!(grid.len(), 30);
        assert!(grid.windows(2).all(|w| w[0] < w[1]), "{:?}", grid);
        assert_eq!(grid[0], 5);
    }

    #[test]
    fn test_degenerate_sizes() {
        assert!(gen_int_log_space(10, 100, 0).is_empty());
        assert_eq!(gen_int_log_space(10, 100, 1), vec![10]);
        assert_eq!(gen_int_log_space(3, 2, 2), vec![3, 4]);
    }
}
