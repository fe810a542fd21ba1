//! レイテンシ統計
//!
//! 中央値とp95はソート済みサンプルに対する線形補間（rank = p * (n - 1)）で求める。

use crate::types::LatencyStats;

/// ソート済みサンプルのパーセンタイル（`p`は0.0-1.0）
///
/// サンプルが空なら`None`。
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// サンプルから統計値を計算（空なら`None`）
pub fn summarize(samples: &[f64]) -> Option<LatencyStats> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let average = sorted.iter().sum::<f64>() / sorted.len() as f64;
    Some(LatencyStats {
        average,
        median: percentile(&sorted, 0.5)?,
        p95: percentile(&sorted, 0.95)?,
        min: *sorted.first()?,
        max: *sorted.last()?,
    })
}
