// src/scene/crop.rs

use ndarray::{s, Array3, ArrayView3, Axis};
use rand::Rng;

use super::Shape3;
use crate::error::{Result, ZernikeError};

/// 자르기 중심의 무작위 이동
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Jitter {
    /// 축별 최대 이동량. `None`이면 `min((half_image - half_crop) / 4, half_crop / 2)`
    pub max: Option<Shape3>,
}

impl Jitter {
    pub fn new(max: Shape3) -> Self {
        Self { max: Some(max) }
    }
}

fn halves(shape: Shape3) -> [usize; 3] {
    [shape.0 / 2, shape.1 / 2, shape.2 / 2]
}

/// 스레드 RNG를 쓰는 [`crop_with`]
pub fn crop(image: &ArrayView3<f64>, crop_shape: Shape3, jitter: Option<Jitter>, plane: Option<usize>) -> Result<Array3<f64>> {
    crop_with(&mut rand::thread_rng(), image, crop_shape, jitter, plane)
}

/// 영상 중심에서 축마다 `2 * (c / 2)` 크기로 자릅니다.
///
/// `plane`이 주어지면 잘라낸 볼륨에서 그 z 평면 하나만 남깁니다 (z 축 길이 1).
pub fn crop_with<R: Rng>(
    rng: &mut R,
    image: &ArrayView3<f64>,
    crop_shape: Shape3,
    jitter: Option<Jitter>,
    plane: Option<usize>,
) -> Result<Array3<f64>> {
    let half_crop = halves(crop_shape);
    let half_image = halves(image.dim());
    if half_crop.iter().zip(&half_image).any(|(c, i)| c > i) {
        return Err(ZernikeError::ShapeMismatch {
            expected: image.shape().to_vec(),
            found: vec![crop_shape.0, crop_shape.1, crop_shape.2],
        });
    }

    let mut loc = half_image;
    if let Some(jitter) = jitter {
        let max = match jitter.max {
            Some((a, b, c)) => [a, b, c],
            None => {
                let mut max = [0; 3];
                for (axis, m) in max.iter_mut().enumerate() {
                    *m = ((half_image[axis] - half_crop[axis]) / 4).min(half_crop[axis] / 2);
                }
                max
            }
        };
        let dims = image.shape();
        for axis in 0..3 {
            let (m, hi, hc) = (max[axis], half_image[axis], half_crop[axis]);
            if m > hi - hc || hi + m + hc > dims[axis] {
                return Err(ZernikeError::InvalidConfig(format!(
                    "jitter {:?} moves the crop outside the image {:?}",
                    max, dims
                )));
            }
            if m > 0 {
                let offset = rng.gen_range(-(m as isize)..m as isize);
                loc[axis] = (hi as isize - offset) as usize;
            }
        }
    }

    let cropped = image.slice(s![
        loc[0] - half_crop[0]..loc[0] + half_crop[0],
        loc[1] - half_crop[1]..loc[1] + half_crop[1],
        loc[2] - half_crop[2]..loc[2] + half_crop[2]
    ]);

    match plane {
        None => Ok(cropped.to_owned()),
        Some(p) if p < cropped.len_of(Axis(0)) => Ok(cropped.slice(s![p..p + 1, .., ..]).to_owned()),
        Some(p) => Err(ZernikeError::InvalidConfig(format!(
            "plane {} does not exist in a crop of depth {}",
            p,
            cropped.len_of(Axis(0))
        ))),
    }
}
