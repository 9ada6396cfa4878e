// src/scene/noise.rs

//! 가우시안/포아송 잡음 모델

use ndarray::{Array, Dimension, Zip};
use ndarray_rand::rand_distr::{Distribution, Normal, Poisson};
use ndarray_rand::RandomExt;
use rand::Rng;

use crate::error::{Result, ZernikeError};

/// `image + N(mean, sigma)`. `sigma`는 0 이상의 유한한 값이어야 합니다.
pub fn add_normal_noise<D, R>(rng: &mut R, image: &Array<f64, D>, mean: f64, sigma: f64) -> Result<Array<f64, D>>
where
    D: Dimension,
    R: Rng,
{
    if sigma < 0.0 {
        return Err(ZernikeError::NegativeBound(sigma));
    }
    let normal = Normal::new(mean, sigma)
        .map_err(|e| ZernikeError::InvalidConfig(format!("normal noise (mean={}, sigma={}): {}", mean, sigma, e)))?;
    Ok(Array::random_using(image.raw_dim(), normal, rng) + image)
}

/// 복셀마다 `Poisson(max(1, floor(x * snr + 1)))`에서 뽑은 값
pub fn add_poisson_noise<D, R>(rng: &mut R, image: &Array<f64, D>, snr: f64) -> Result<Array<f64, D>>
where
    D: Dimension,
    R: Rng,
{
    if !snr.is_finite() {
        return Err(ZernikeError::InvalidConfig(format!("snr must be finite, got {}", snr)));
    }
    let mut out = Array::<f64, D>::zeros(image.raw_dim());
    for (o, &x) in out.iter_mut().zip(image.iter()) {
        let lambda = (x * snr + 1.0).floor().max(1.0);
        let poisson = Poisson::new(lambda)
            .map_err(|e| ZernikeError::InvalidConfig(format!("poisson noise (lambda={}): {}", lambda, e)))?;
        *o = poisson.sample(rng);
    }
    Ok(out)
}

/// 매 호출마다 범위 안에서 균등하게 매개변수를 뽑는 잡음 모델
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseModel {
    /// 배경 잡음 평균의 범위
    pub mean: (f64, f64),
    /// 가우시안 표준편차의 범위
    pub sigma: (f64, f64),
    /// 신호 대 잡음비의 범위
    pub snr: (f64, f64),
}

impl NoiseModel {
    pub fn validate(&self) -> Result<()> {
        for (low, high) in [self.mean, self.sigma, self.snr] {
            if !((high - low).is_finite() && low <= high) {
                return Err(ZernikeError::InvalidRange { low, high });
            }
            if low < 0.0 {
                return Err(ZernikeError::NegativeBound(low));
            }
        }
        Ok(())
    }

    pub fn apply<D: Dimension>(&self, image: &Array<f64, D>) -> Result<Array<f64, D>> {
        self.apply_with(&mut rand::thread_rng(), image)
    }

    /// 영상을 `(x - min) / (max + min)`로 조정하고 가우시안과 포아송 잡음을 더한 뒤 `[0, 1]`로 자릅니다.
    ///
    /// `max + min == 0`인 영상(예: 전부 0)은 조정 단계에서 NaN이 되고, 결과에도 NaN이 그대로 남습니다.
    pub fn apply_with<D, R>(&self, rng: &mut R, image: &Array<f64, D>) -> Result<Array<f64, D>>
    where
        D: Dimension,
        R: Rng,
    {
        self.validate()?;
        let mean = rng.gen_range(self.mean.0..=self.mean.1);
        let sigma = rng.gen_range(self.sigma.0..=self.sigma.1);
        let snr = rng.gen_range(self.snr.0..=self.snr.1);

        let min = image.iter().copied().fold(f64::INFINITY, f64::min);
        let max = image.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let scaled = image.mapv(|x| (x - min) / (max + min));

        let mut noisy = add_normal_noise(rng, &scaled, mean, sigma)?;
        let shot = add_poisson_noise(rng, &scaled, snr)?;
        Zip::from(&mut noisy).and(&shot).for_each(|n, &p| {
            *n = (*n + p).clamp(0.0, 1.0);
        });
        Ok(noisy)
    }
}
