//! Zernike Optics - Zernike 다항식 기반 파면 수차와 3D PSF 시뮬레이션
//!
//! * [`ops`] - 다항식 평가기, 극좌표 격자 캐시, Noll/ANSI 인덱스 변환
//! * [`zernike`] - 단일 모드 [`Zernike`]와 가중합 [`ZernikeWavefront`]
//! * [`psf`] - 스칼라 회절 모델의 [`PsfGenerator3D`]와 FFT 합성곱
//! * [`scene`] - 시험용 물체 볼륨, 잡음, 자르기

pub mod error;
pub mod ops;
pub mod psf;
pub mod scene;
pub mod zernike;

pub use error::{Result, ZernikeError};
pub use ops::index::Order;
pub use psf::{convolve_same, PsfConfig, PsfGenerator3D};
pub use scene::{NoiseModel, ObjectParams, ObjectSpec};
pub use zernike::{Aberration, AmplitudeBound, ModeMap, Zernike, ZernikeIndex, ZernikeWavefront};
