#![allow(dead_code)]

use pairlist::Vector3D;

/// Cubic lattice with `n` points along each side, separated by `spacing`.
/// Each point is moved by up to `jitter` along each axis, following a
/// deterministic pattern.
pub fn lattice(n: usize, spacing: f64, jitter: f64) -> Vec<Vector3D> {
    let mut positions = Vec::with_capacity(n * n * n);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let seed = positions.len() as f64;
                positions.push(Vector3D::new(
                    spacing * i as f64 + jitter * f64::sin(1.3 * seed),
                    spacing * j as f64 + jitter * f64::sin(2.9 * seed + 0.5),
                    spacing * k as f64 + jitter * f64::sin(4.7 * seed + 1.1),
                ));
            }
        }
    }
    return positions;
}

/// Points spread on a long and thin box, with a few clusters of close points
pub fn elongated(n: usize) -> Vec<Vector3D> {
    (0..n).map(|i| {
        let x = i as f64;
        Vector3D::new(
            0.37 * x + 0.1 * f64::sin(7.0 * x),
            1.5 * f64::sin(0.31 * x),
            1.5 * f64::cos(0.53 * x),
        )
    }).collect()
}

/// Deterministic radii between 0 and `max`
pub fn radii(n: usize, max: f64) -> Vec<f64> {
    (0..n).map(|i| 0.5 * max * (1.0 + f64::sin(3.1 * i as f64))).collect()
}

/// Compute all the pairs by checking every possible pair, following the
/// conventions of self or cross pair lists
pub fn brute_force(
    coordinates1: &[Vector3D],
    coordinates2: &[Vector3D],
    cutoff: f64,
    radii: Option<(&[f64], &[f64])>,
    is_self: bool,
) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, ri) in coordinates1.iter().enumerate() {
        for (j, rj) in coordinates2.iter().enumerate() {
            if is_self && j >= i {
                break;
            }

            let range = match radii {
                Some((radii1, radii2)) => cutoff + radii1[i] + radii2[j],
                None => cutoff,
            };

            if ri.distance2(rj) <= range * range {
                pairs.push((i, j));
            }
        }
    }
    return pairs;
}
