// src/psf/mod.rs

//! # 3D PSF 생성기
//!
//! 스칼라 회절 모델로 수차 파면을 전파하여 3차원 점확산함수(PSF)를 만듭니다.
//!
//! 1. 중심 정렬된 측면 주파수 축 `kx, ky`와 초점면 대칭 `z` 축을 만든다
//! 2. 동공 `|k| < NA/λ`와 전파 항 `exp(-2πi z h / λ)`, `h = sqrt(n² - |k|²λ²)`로 기본 스택을 만든다
//! 3. 파면 위상 `exp(2πi φ / λ)`를 모든 z 단면에 곱한 뒤 단면별 2D 역변환

pub mod convolve;
pub mod fft;

#[cfg(test)]
mod __test__;

use log::{debug, trace};
use ndarray::{Array1, Array2, Array3, Axis, Zip};
use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

use crate::error::{Result, ZernikeError};
use crate::zernike::Aberration;

use self::fft::{fftfreq, fftshift_axes, FftPlan};

pub use self::convolve::convolve_same;

/// 측면 축 `(y, x)`
const LATERAL: [Axis; 2] = [Axis(1), Axis(2)];

/// PSF 생성기 설정
#[derive(Debug, Clone, PartialEq)]
pub struct PsfConfig {
    /// PSF 모양 `(z, y, x)`
    pub shape: (usize, usize, usize),

    /// 복셀 크기 `(dz, dy, dx)`, 마이크로미터
    pub units: (f64, f64, f64),

    /// 검출 파장, 마이크로미터
    pub lam_detection: f64,

    /// 굴절률
    pub n: f64,

    /// 검출 대물렌즈의 개구수
    pub na_detection: f64,

    /// 기본 스택을 동공으로 제한
    pub masked: bool,

    /// 파면 단위 원을 차단 주파수에 맞춤
    pub switch: bool,
}

impl Default for PsfConfig {
    fn default() -> Self {
        Self {
            shape: (64, 64, 64),
            units: (0.032, 0.016, 0.016),
            lam_detection: 0.775,
            n: 1.518,
            na_detection: 1.4,
            masked: true,
            switch: true,
        }
    }
}

impl PsfConfig {
    pub fn validate(&self) -> Result<()> {
        let (nz, ny, nx) = self.shape;
        if nz == 0 || ny == 0 || nx == 0 {
            return Err(ZernikeError::InvalidConfig(format!(
                "shape must be non-empty, got {:?}",
                self.shape
            )));
        }
        let (dz, dy, dx) = self.units;
        if ![dz, dy, dx].iter().all(|u| u.is_finite() && *u > 0.0) {
            return Err(ZernikeError::InvalidConfig(format!(
                "voxel units must be positive, got {:?}",
                self.units
            )));
        }
        for (label, value) in [
            ("lam_detection", self.lam_detection),
            ("n", self.n),
            ("na_detection", self.na_detection),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ZernikeError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    label, value
                )));
            }
        }
        Ok(())
    }
}

/// 초점면에 대해 대칭인 z 축
fn focal_axis(nz: usize, dz: f64) -> Array1<f64> {
    let center = if nz % 2 == 0 {
        (nz as f64 - 1.0) / 2.0
    } else {
        (nz / 2) as f64
    };
    Array1::from_shape_fn(nz, |i| dz * (i as f64 - center))
}

/// 파면을 3D PSF로 전파하는 생성기.
///
/// 생성 시 주파수 좌표와 기본 스택을 한 번 계산하고 이후에는 읽기만 하므로
/// 여러 스레드에서 공유할 수 있습니다.
#[derive(Debug, Clone)]
pub struct PsfGenerator3D {
    config: PsfConfig,
    kx: Array1<f64>,
    ky: Array1<f64>,
    z: Array1<f64>,
    k_cut: f64,
    k_base: Array3<Complex64>,
    k_rho: Array2<f64>,
    k_phi: Array2<f64>,
    k_mask: Array2<bool>,
    ifft: FftPlan,
}

impl PsfGenerator3D {
    pub fn new(config: PsfConfig) -> Result<Self> {
        config.validate()?;
        let (nz, ny, nx) = config.shape;
        let (dz, dy, dx) = config.units;
        let lam = config.lam_detection;
        let n = config.n;

        let ky = fftshift_axes(&fftfreq(ny, dy).view(), &[Axis(0)])?;
        let kx = fftshift_axes(&fftfreq(nx, dx).view(), &[Axis(0)])?;
        let z = focal_axis(nz, dz);

        let k_cut = config.na_detection / lam;
        let kr = Array2::from_shape_fn((ny, nx), |(i, j)| ky[i].hypot(kx[j]));
        let k_mask = kr.mapv(|r| r < k_cut);

        // 소멸파 (n² < |k|²λ²) 성분은 0
        let masked = config.masked;
        let mut k_base = Array3::<Complex64>::zeros((nz, ny, nx));
        Zip::indexed(&mut k_base).par_for_each(|(k, i, j), v| {
            if masked && !k_mask[[i, j]] {
                return;
            }
            let radicand = n * n - kr[[i, j]].powi(2) * lam * lam;
            if radicand < 0.0 {
                return;
            }
            *v = Complex64::from_polar(1.0, -2.0 * PI * z[k] / lam * radicand.sqrt());
        });

        let k_rho = if config.switch { &kr / k_cut } else { kr.clone() };
        let k_phi = Array2::from_shape_fn((ny, nx), |(i, j)| ky[i].atan2(kx[j]));

        debug!(
            "psf generator: shape={:?}, units={:?}, k_cut={:.4}, pupil={} of {}, masked={}, switch={}",
            config.shape,
            config.units,
            k_cut,
            k_mask.iter().filter(|&&m| m).count(),
            ny * nx,
            config.masked,
            config.switch
        );

        let ifft = FftPlan::new(&[nz, ny, nx], &LATERAL, true);
        Ok(Self {
            config,
            kx,
            ky,
            z,
            k_cut,
            k_base,
            k_rho,
            k_phi,
            k_mask,
            ifft,
        })
    }

    pub fn config(&self) -> &PsfConfig {
        &self.config
    }

    /// 중심 정렬된 x 주파수 축
    pub fn kx(&self) -> &Array1<f64> {
        &self.kx
    }

    /// 중심 정렬된 y 주파수 축
    pub fn ky(&self) -> &Array1<f64> {
        &self.ky
    }

    pub fn z(&self) -> &Array1<f64> {
        &self.z
    }

    /// 차단 주파수 `NA / λ`
    pub fn k_cut(&self) -> f64 {
        self.k_cut
    }

    pub fn k_base(&self) -> &Array3<Complex64> {
        &self.k_base
    }

    pub fn k_rho(&self) -> &Array2<f64> {
        &self.k_rho
    }

    pub fn k_phi(&self) -> &Array2<f64> {
        &self.k_phi
    }

    /// 동공 마스크 `|k| < k_cut`
    pub fn k_mask(&self) -> &Array2<bool> {
        &self.k_mask
    }

    /// 수차 평면 좌표에서 평가한 위상. `masked`이면 동공 밖은 0
    pub fn masked_phase<A: Aberration>(&self, phi: &A, normed: bool, masked: bool) -> Result<Array2<f64>> {
        let mut phase = phi.phase(&self.k_rho.view(), &self.k_phi.view(), normed, None)?;
        if masked {
            Zip::from(&mut phase).and(&self.k_mask).for_each(|p, &inside| {
                if !inside {
                    *p = 0.0;
                }
            });
        }
        Ok(phase)
    }

    /// 영점 이동 없는 복소 간섭성 PSF
    pub fn coherent_psf<A: Aberration>(&self, phi: &A, normed: bool, masked: bool) -> Result<Array3<Complex64>> {
        let phase = self.masked_phase(phi, normed, masked)?;
        let lam = self.config.lam_detection;
        let pupil = phase.mapv(|p| Complex64::from_polar(1.0, 2.0 * PI * p / lam));

        let mut field = self.k_base.clone();
        field
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .for_each(|mut plane| plane *= &pupil);

        trace!("inverse transform over {} planes", field.len_of(Axis(0)));
        self.ifft.process(&mut field);
        Ok(field)
    }

    /// 간섭성 PSF를 측면 축에서 중심 정렬한 복소장.
    ///
    /// 이름과 달리 세기가 아니라 복소장 그대로를 돌려줍니다. 세기는 [`Self::incoherent_psf_abs`].
    pub fn incoherent_psf<A: Aberration>(&self, phi: &A, normed: bool, masked: bool) -> Result<Array3<Complex64>> {
        let field = self.coherent_psf(phi, normed, masked)?;
        fftshift_axes(&field.view(), &LATERAL)
    }

    /// 세기 PSF `|field|²`, 측면 축에서 중심 정렬
    pub fn incoherent_psf_abs<A: Aberration>(&self, phi: &A, normed: bool, masked: bool) -> Result<Array3<f64>> {
        let field = self.coherent_psf(phi, normed, masked)?;
        let intensity = field.mapv(|c| c.norm_sqr());
        fftshift_axes(&intensity.view(), &LATERAL)
    }
}
