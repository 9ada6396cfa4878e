// src/psf/fft.rs

//! 이산 푸리에 변환 보조 함수.
//!
//! 정방향은 정규화하지 않고 역방향은 `1/N`으로 나누는 규약을 따릅니다.

use ndarray::{concatenate, Array, Array1, ArrayView, Axis, Dimension, RemoveAxis, Slice, Zip};
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use crate::error::{Result, ZernikeError};

/// 샘플 간격 `d`인 길이 `n` 신호의 주파수 축 (영주파수가 맨 앞).
///
/// `[0, 1, ..., ceil(n/2)-1, -floor(n/2), ..., -1] / (d n)`
pub fn fftfreq(n: usize, d: f64) -> Array1<f64> {
    let scale = 1.0 / (d * n as f64);
    let positive = (n + 1) / 2;
    Array1::from_shape_fn(n, |i| {
        if i < positive {
            i as f64 * scale
        } else {
            (i as f64 - n as f64) * scale
        }
    })
}

/// `axis`를 따라 원소를 `shift`칸 순환 이동합니다 (`out[i] = a[(i - shift) mod n]`).
pub fn roll<T: Clone, D: RemoveAxis>(a: &ArrayView<T, D>, axis: Axis, shift: usize) -> Result<Array<T, D>> {
    let n = a.len_of(axis);
    if n == 0 {
        return Ok(a.to_owned());
    }
    let split = (n - shift % n) as isize;
    let head = a.slice_axis(axis, Slice::from(split..));
    let tail = a.slice_axis(axis, Slice::from(..split));
    concatenate(axis, &[head, tail]).map_err(|_| ZernikeError::ShapeMismatch {
        expected: a.shape().to_vec(),
        found: a.shape().to_vec(),
    })
}

/// 주어진 축들에서 영주파수를 가운데(`n/2`)로 옮깁니다.
pub fn fftshift_axes<T: Clone, D: RemoveAxis>(a: &ArrayView<T, D>, axes: &[Axis]) -> Result<Array<T, D>> {
    let mut out = a.to_owned();
    for &axis in axes {
        let n = out.len_of(axis);
        out = roll(&out.view(), axis, n / 2)?;
    }
    Ok(out)
}

/// [`fftshift_axes`]의 역
pub fn ifftshift_axes<T: Clone, D: RemoveAxis>(a: &ArrayView<T, D>, axes: &[Axis]) -> Result<Array<T, D>> {
    let mut out = a.to_owned();
    for &axis in axes {
        let n = out.len_of(axis);
        out = roll(&out.view(), axis, n - n / 2)?;
    }
    Ok(out)
}

/// 축 하나에 대한 1D 변환을 모든 레인에 병렬로 적용
pub(crate) fn process_axis<D: Dimension>(a: &mut Array<Complex64, D>, axis: Axis, fft: &Arc<dyn Fft<f64>>) {
    Zip::from(a.lanes_mut(axis)).par_for_each(|mut lane| {
        let mut buf: Vec<Complex64> = lane.iter().copied().collect();
        fft.process(&mut buf);
        for (dst, src) in lane.iter_mut().zip(buf) {
            *dst = src;
        }
    });
}

/// 여러 축에 대한 다차원 변환 계획. 축 길이별 1D 계획을 미리 만들어 둡니다.
#[derive(Clone)]
pub struct FftPlan {
    axes: Vec<(Axis, Arc<dyn Fft<f64>>)>,
    inverse: bool,
    len: usize,
}

impl FftPlan {
    /// `shape`의 `axes`에 대한 정방향 또는 역방향 계획
    pub fn new(shape: &[usize], axes: &[Axis], inverse: bool) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let planned = axes
            .iter()
            .map(|&axis| {
                let n = shape[axis.index()];
                let fft = if inverse {
                    planner.plan_fft_inverse(n)
                } else {
                    planner.plan_fft_forward(n)
                };
                (axis, fft)
            })
            .collect();
        let len = axes.iter().map(|a| shape[a.index()]).product();
        Self {
            axes: planned,
            inverse,
            len,
        }
    }

    /// 제자리 변환. 역방향이면 변환한 축들의 길이 곱으로 나눕니다.
    pub fn process<D: Dimension>(&self, a: &mut Array<Complex64, D>) {
        for (axis, fft) in &self.axes {
            process_axis(a, *axis, fft);
        }
        if self.inverse && self.len > 0 {
            let scale = 1.0 / self.len as f64;
            a.par_mapv_inplace(|v| v * scale);
        }
    }
}

impl std::fmt::Debug for FftPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftPlan")
            .field("axes", &self.axes.iter().map(|(a, _)| a.index()).collect::<Vec<_>>())
            .field("inverse", &self.inverse)
            .field("len", &self.len)
            .finish()
    }
}
