// src/scene/mod.rs

//! # 3D 물체 볼륨
//!
//! PSF와 합성곱할 시험용 물체를 만듭니다. 종류는 닫힌 열거형 [`ObjectSpec`]이며,
//! 이름과 매개변수 묶음에서 고르는 팩토리 [`ObjectSpec::instantiate`]를 제공합니다.

pub mod crop;
pub mod noise;

use log::warn;
use ndarray::{Array3, Zip};
use rand::Rng;

use crate::error::{Result, ZernikeError};

pub use self::crop::{crop, Jitter};
pub use self::noise::{add_normal_noise, add_poisson_noise, NoiseModel};

/// 볼륨 모양 `(z, y, x)`
pub type Shape3 = (usize, usize, usize);

/// 팩토리 입력. 종류마다 필요한 필드만 채우면 됩니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectParams {
    pub shape: Option<Shape3>,

    /// points: 점 개수
    pub num: Option<usize>,
    /// points: 중심에 점 하나를 둘지 (기본 `true`)
    pub center: Option<bool>,
    /// points: 경계로부터의 여백 (기본 0)
    pub pad_from_boundary: Option<usize>,

    /// sphere: 복셀 크기 `(dz, dy, dx)`
    pub units: Option<(f64, f64, f64)>,
    /// sphere: 반지름 (units와 같은 단위)
    pub radius: Option<f64>,
    /// sphere: 중심 이동 `(z, y, x)` (기본 0)
    pub off_centered: Option<(f64, f64, f64)>,

    /// image: 불러온 볼륨
    pub data: Option<Array3<f64>>,
}

/// 물체 종류와 그 매개변수
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectSpec {
    /// `num`개의 단위 복셀. `center`이면 하나는 정중앙에 둡니다.
    Points {
        shape: Shape3,
        num: usize,
        center: bool,
        pad_from_boundary: usize,
    },
    /// 반지름 `radius` 안쪽이 1인 구
    Sphere {
        shape: Shape3,
        units: (f64, f64, f64),
        radius: f64,
        off_centered: (f64, f64, f64),
    },
    /// 호출자가 불러온 볼륨
    Image { shape: Shape3, data: Array3<f64> },
}

fn missing(kind: &str, field: &str) -> ZernikeError {
    ZernikeError::InvalidConfig(format!("{} object requires `{}`", kind, field))
}

impl ObjectSpec {
    /// 대소문자를 무시한 이름(`points`, `sphere`, `image`/`images`)으로 종류를 고릅니다.
    pub fn instantiate(name: &str, params: ObjectParams) -> Result<Self> {
        let kind = name.trim().to_lowercase();
        let shape = params.shape;
        let spec = match kind.as_str() {
            "points" => ObjectSpec::Points {
                shape: shape.ok_or_else(|| missing("points", "shape"))?,
                num: params.num.ok_or_else(|| missing("points", "num"))?,
                center: params.center.unwrap_or(true),
                pad_from_boundary: params.pad_from_boundary.unwrap_or(0),
            },
            "sphere" => ObjectSpec::Sphere {
                shape: shape.ok_or_else(|| missing("sphere", "shape"))?,
                units: params.units.ok_or_else(|| missing("sphere", "units"))?,
                radius: params.radius.ok_or_else(|| missing("sphere", "radius"))?,
                off_centered: params.off_centered.unwrap_or((0.0, 0.0, 0.0)),
            },
            "image" | "images" => {
                let data = params.data.ok_or_else(|| missing("image", "data"))?;
                ObjectSpec::Image {
                    shape: shape.unwrap_or_else(|| data.dim()),
                    data,
                }
            }
            _ => return Err(ZernikeError::UnknownName(name.to_string())),
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn shape(&self) -> Shape3 {
        match self {
            ObjectSpec::Points { shape, .. } => *shape,
            ObjectSpec::Sphere { shape, .. } => *shape,
            ObjectSpec::Image { shape, .. } => *shape,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let shape = self.shape();
        if shape.0 == 0 || shape.1 == 0 || shape.2 == 0 {
            return Err(ZernikeError::InvalidConfig(format!(
                "object shape must be non-empty, got {:?}",
                shape
            )));
        }
        match self {
            ObjectSpec::Points {
                pad_from_boundary, ..
            } => {
                let smallest = shape.0.min(shape.1).min(shape.2);
                if *pad_from_boundary >= smallest / 2 {
                    return Err(ZernikeError::InvalidConfig(format!(
                        "padding {} must be smaller than half of {}",
                        pad_from_boundary, smallest
                    )));
                }
            }
            ObjectSpec::Sphere { units, radius, .. } => {
                if !(radius.is_finite() && *radius >= 0.0) {
                    return Err(ZernikeError::InvalidConfig(format!(
                        "sphere radius must be non-negative, got {}",
                        radius
                    )));
                }
                let extents = [
                    units.0 * shape.0 as f64,
                    units.1 * shape.1 as f64,
                    units.2 * shape.2 as f64,
                ];
                if !extents.iter().all(|&e| 2.0 * radius < e) {
                    return Err(ZernikeError::InvalidConfig(format!(
                        "sphere diameter {} exceeds object extent {:?}",
                        2.0 * radius,
                        extents
                    )));
                }
            }
            ObjectSpec::Image { data, .. } => {
                if data.dim() != shape {
                    return Err(ZernikeError::ShapeMismatch {
                        expected: vec![shape.0, shape.1, shape.2],
                        found: data.shape().to_vec(),
                    });
                }
            }
        }
        Ok(())
    }

    /// 스레드 RNG로 볼륨을 만듭니다.
    pub fn generate(&self) -> Result<Array3<f64>> {
        self.generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng>(&self, rng: &mut R) -> Result<Array3<f64>> {
        self.validate()?;
        let volume = match self {
            ObjectSpec::Points {
                shape,
                num,
                center,
                pad_from_boundary,
            } => {
                let mut volume = Array3::<f64>::zeros(*shape);
                let mut remaining = *num;
                if *center {
                    volume[[shape.0 / 2, shape.1 / 2, shape.2 / 2]] = 1.0;
                    remaining = remaining.saturating_sub(1);
                }
                // 모든 축에서 가장 짧은 축 길이 기준의 같은 범위를 씀
                let smallest = shape.0.min(shape.1).min(shape.2);
                let range = *pad_from_boundary..smallest - pad_from_boundary;
                for _ in 0..remaining {
                    let k = rng.gen_range(range.clone());
                    let j = rng.gen_range(range.clone());
                    let i = rng.gen_range(range.clone());
                    volume[[k, j, i]] = 1.0;
                }
                volume
            }
            ObjectSpec::Sphere {
                shape,
                units,
                radius,
                off_centered,
            } => {
                let coord = |i: usize, s: usize, u: f64, off: f64| u * (i as f64 - s as f64 / 2.0) - off;
                let mut volume = Array3::<f64>::zeros(*shape);
                Zip::indexed(&mut volume).par_for_each(|(k, j, i), v| {
                    let z = coord(k, shape.0, units.0, off_centered.0);
                    let y = coord(j, shape.1, units.1, off_centered.1);
                    let x = coord(i, shape.2, units.2, off_centered.2);
                    if (x * x + y * y + z * z).sqrt() <= *radius {
                        *v = 1.0;
                    }
                });
                volume
            }
            ObjectSpec::Image { data, .. } => data.clone(),
        };
        if volume.sum() <= 0.0 {
            warn!("no object generated for {:?} volume", volume.dim());
        }
        Ok(volume)
    }
}
