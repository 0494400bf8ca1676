// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Log-spaced probe distances between the near and far planes.

/// Distances `exp(ln(near) + (i/N)·(ln(far) - ln(near)))` for `i = 1..N-1`.
///
/// Both endpoints are excluded, so `num_sample_points = N` yields `N - 1`
/// distances. Returns an empty vector when `N < 2`.
pub fn sample_distances(near: f32, far: f32, num_sample_points: u32) -> Vec<f32> {
    let log_near = near.ln();
    let log_far = far.ln();
    let log_diff = log_far - log_near;
    let n = num_sample_points as f32;

    (1..num_sample_points)
        .map(|i| {
            let alpha = i as f32 / n;
            (log_near + alpha * log_diff).exp()
        })
        .collect()
}
