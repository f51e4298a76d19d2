//! Numeric helpers shared by the statistical oracles.

/// Pivots smaller than this make a matrix count as singular.
pub const SINGULAR_PIVOT_EPSILON: f64 = 1e-12;

/// Complementary error function.
///
/// Chebyshev fit with fractional error below 1.2e-7 everywhere, including
/// far tails, which matters for p-values of strong dependencies.
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Two-sided p-value of a standard normal statistic: `P(|N(0,1)| >= |z|)`.
pub fn two_sided_normal_p(z: f64) -> f64 {
    erfc(z.abs() / std::f64::consts::SQRT_2).clamp(0.0, 1.0)
}

/// Inverts a square row-major matrix with Gauss-Jordan elimination and
/// partial pivoting. Returns `None` when the matrix is singular.
pub fn invert(matrix: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    let mut a: Vec<Vec<f64>> = matrix.to_vec();
    let mut inv: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r1, &r2| {
            a[r1][col]
                .abs()
                .partial_cmp(&a[r2][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        let pivot = a[pivot_row][col];
        if !pivot.is_finite() || pivot.abs() < SINGULAR_PIVOT_EPSILON {
            return None;
        }
        a.swap(col, pivot_row);
        inv.swap(col, pivot_row);

        for j in 0..n {
            a[col][j] /= pivot;
            inv[col][j] /= pivot;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                a[row][j] -= factor * a[col][j];
                inv[row][j] -= factor * inv[col][j];
            }
        }
    }
    Some(inv)
}

/// Sample covariance matrix of row-major data (`rows[sample][variable]`).
///
/// Uses the unbiased `n - 1` denominator. Callers guarantee at least two
/// rows of equal width.
pub fn covariance(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = rows.len();
    let p = rows.first().map(Vec::len).unwrap_or(0);
    let mut means = vec![0.0; p];
    for row in rows {
        for (m, v) in means.iter_mut().zip(row) {
            *m += v;
        }
    }
    for m in &mut means {
        *m /= n as f64;
    }

    let mut cov = vec![vec![0.0; p]; p];
    for row in rows {
        for i in 0..p {
            let di = row[i] - means[i];
            for j in i..p {
                cov[i][j] += di * (row[j] - means[j]);
            }
        }
    }
    let denom = (n as f64 - 1.0).max(1.0);
    for i in 0..p {
        for j in i..p {
            cov[i][j] /= denom;
            cov[j][i] = cov[i][j];
        }
    }
    cov
}
