/// Mean of `counts` within `radius` of `index`, excluding `index` itself.
///
/// The window is clipped to the slice bounds. An empty window (a single
/// element slice, or `index` out of bounds) yields `0.0`.
pub fn baseline(counts: &[usize], index: usize, radius: usize) -> f64 {
    if index >= counts.len() {
        return 0.0;
    }
    let start = index.saturating_sub(radius);
    let end = index.saturating_add(radius).min(counts.len() - 1);
    let (sum, n) = (start..=end)
        .filter(|&j| j != index)
        .fold((0usize, 0usize), |(sum, n), j| (sum + counts[j], n + 1));
    if n == 0 { 0.0 } else { sum as f64 / n as f64 }
}
