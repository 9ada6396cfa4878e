// src/ops/radial.rs

//! # Zernike 다항식 평가기
//!
//! 극좌표 배열 `(rho, theta)` 위에서 단일 Zernike 다항식 $Z_n^m$을 원소별로 계산합니다.
//!
//! * `normed = true` - 단위 원판 위에서 면적 측도 `dA/π`에 대해 정규직교
//! * `normed = false` - Born/Wolf 규약, 원판 위에서 `max|Z| == 1`

use ndarray::{Array, ArrayView, Dimension, Zip};
use std::f64::consts::PI;

use crate::error::{Result, ZernikeError};

/// 정확한 이항 계수 `C(n, k)`.
///
/// `u64` 범위를 넘는 경우에만 곱셈 공식의 `f64` 근사로 대체합니다.
pub fn binom(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    if n <= 62 {
        return num_integer::binomial(n as u64, k as u64) as f64;
    }
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// 방사 다항식 $R_n^{|m|}$의 항 목록 `(계수, 지수)`.
///
/// `(n - |m|)`이 홀수이면 빈 목록을 돌려줍니다 (방사 다항식이 항등적으로 0).
pub fn radial_coefficients(n: i32, m: i32) -> Result<Vec<(f64, i32)>> {
    let rm = m.abs();
    if n < 0 || rm > n {
        return Err(ZernikeError::InvalidDescriptor { n, m });
    }
    if (n - rm) % 2 == 1 {
        return Ok(Vec::new());
    }
    let half = (n - rm) / 2;
    Ok((0..=half)
        .map(|k| {
            let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
            let c = sign * binom((n - k) as u32, k as u32) * binom((n - 2 * k) as u32, (half - k) as u32);
            (c, n - 2 * k)
        })
        .collect())
}

/// 정규화 상수 `1 / sqrt((1 + [m == 0]) / (2n + 2)) / sqrt(π)`
pub fn normalization(n: i32, m: i32) -> f64 {
    let delta = if m == 0 { 2.0 } else { 1.0 };
    1.0 / (delta / (2.0 * n as f64 + 2.0)).sqrt() / PI.sqrt()
}

/// 두 좌표 배열을 같은 모양으로 맞춥니다. 한쪽이 다른 쪽으로 broadcast 가능해야 합니다.
pub(crate) fn co_broadcast<'a, D: Dimension>(
    rho: &'a ArrayView<'_, f64, D>,
    theta: &'a ArrayView<'_, f64, D>,
) -> Result<(ArrayView<'a, f64, D>, ArrayView<'a, f64, D>)> {
    if rho.shape() == theta.shape() {
        return Ok((rho.view(), theta.view()));
    }
    if let Some(t) = theta.broadcast(rho.raw_dim()) {
        return Ok((rho.view(), t));
    }
    if let Some(r) = rho.broadcast(theta.raw_dim()) {
        return Ok((r, theta.view()));
    }
    Err(ZernikeError::ShapeMismatch {
        expected: rho.shape().to_vec(),
        found: theta.shape().to_vec(),
    })
}

/// 고전적인 `(n, m)` 열거에 따른 Zernike 다항식.
///
/// `m >= 0`이면 `cos(|m| θ)`, `m < 0`이면 `sin(|m| θ)`를 곱합니다.
/// `rho > 1`인 점(단위 원판 밖)에서 방사 부분은 0입니다.
pub fn nm_polynomial<D: Dimension>(
    n: i32,
    m: i32,
    rho: &ArrayView<f64, D>,
    theta: &ArrayView<f64, D>,
    normed: bool,
) -> Result<Array<f64, D>> {
    let terms = radial_coefficients(n, m)?;
    let (rho, theta) = co_broadcast(rho, theta)?;
    let mut out = Array::<f64, D>::zeros(rho.raw_dim());
    if terms.is_empty() {
        return Ok(out);
    }

    let rm = m.abs() as f64;
    let prefac = if normed { normalization(n, m) } else { 1.0 };
    let angular: fn(f64) -> f64 = if m >= 0 { f64::cos } else { f64::sin };

    Zip::from(&mut out)
        .and(&rho)
        .and(&theta)
        .par_for_each(|z, &r, &t| {
            if r > 1.0 {
                return;
            }
            let radial: f64 = terms.iter().map(|&(c, p)| c * r.powi(p)).sum();
            *z = prefac * radial * angular(rm * t);
        });
    Ok(out)
}
