// src/psf/convolve.rs

//! 물체 볼륨과 PSF의 3차원 선형 합성곱 (FFT 기반).

use log::trace;
use ndarray::{s, Array3, ArrayView3, Axis, Zip};
use rustfft::num_complex::Complex64;

use super::fft::FftPlan;
use crate::error::{Result, ZernikeError};

const ALL_AXES: [Axis; 3] = [Axis(0), Axis(1), Axis(2)];

fn padded(a: &ArrayView3<f64>, shape: (usize, usize, usize)) -> Array3<Complex64> {
    let mut out = Array3::<Complex64>::zeros(shape);
    let (d0, d1, d2) = a.dim();
    Zip::from(out.slice_mut(s![..d0, ..d1, ..d2]))
        .and(a)
        .for_each(|o, &v| *o = Complex64::new(v, 0.0));
    out
}

/// `object * psf`의 선형 합성곱을 `object`와 같은 모양으로 잘라 돌려줍니다.
///
/// 전체 결과에서 축마다 `(psf_len - 1) / 2`부터 잘라내므로 홀수 크기 PSF의
/// 중심 복셀이 출력의 원점에 대응합니다.
pub fn convolve_same(object: &ArrayView3<f64>, psf: &ArrayView3<f64>) -> Result<Array3<f64>> {
    if object.is_empty() || psf.is_empty() {
        return Err(ZernikeError::ShapeMismatch {
            expected: object.shape().to_vec(),
            found: psf.shape().to_vec(),
        });
    }
    let (o0, o1, o2) = object.dim();
    let (p0, p1, p2) = psf.dim();
    let full = (o0 + p0 - 1, o1 + p1 - 1, o2 + p2 - 1);
    trace!("convolving {:?} with {:?} over {:?}", object.dim(), psf.dim(), full);

    let mut a = padded(object, full);
    let mut b = padded(psf, full);
    let forward = FftPlan::new(&[full.0, full.1, full.2], &ALL_AXES, false);
    forward.process(&mut a);
    forward.process(&mut b);

    Zip::from(&mut a).and(&b).par_for_each(|x, &y| *x *= y);
    FftPlan::new(&[full.0, full.1, full.2], &ALL_AXES, true).process(&mut a);

    let (z0, y0, x0) = ((p0 - 1) / 2, (p1 - 1) / 2, (p2 - 1) / 2);
    Ok(a
        .slice(s![z0..z0 + o0, y0..y0 + o1, x0..x0 + o2])
        .mapv(|c| c.re))
}
