//! Piecewise-linear mapping between two numeric axes.

/// Piecewise-linear `y` at `x` over `pairs`, which must be sorted by `x`.
///
/// - An exact match returns the listed `y` unchanged (the first one if `x` repeats).
/// - Queries outside `[min x, max x]` clamp to the nearest endpoint; nothing is extrapolated.
/// - Empty input, or a non-finite query, yields `None`.
pub fn interpolate(pairs: &[(f64, f64)], x: f64) -> Option<f64> {
    if !x.is_finite() {
        return None;
    }
    let (first, last) = (pairs.first()?, pairs.last()?);
    let Some(idx) = pairs.iter().position(|&(px, _)| px >= x) else {
        return Some(last.1);
    };
    let (x1, y1) = pairs[idx];
    if x1 == x {
        return Some(y1);
    }
    if idx == 0 {
        return Some(first.1);
    }
    let (x0, y0) = pairs[idx - 1];
    // x0 < x < x1 here, so the span is non-zero
    Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
}

/// Keep only points whose `x` strictly exceeds every earlier `x`.
///
/// Turns a noisy, mostly increasing series (e.g. cumulative weight vs. time)
/// into one that can be inverted; on plateaus and dips the first crossing wins.
pub fn first_crossing_pairs(points: impl IntoIterator<Item = (f64, f64)>) -> Vec<(f64, f64)> {
    let mut out: Vec<(f64, f64)> = Vec::new();
    for (x, y) in points {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        match out.last() {
            Some(&(prev_x, _)) if x <= prev_x => {}
            _ => out.push((x, y)),
        }
    }
    out
}
