use crate::ops::index::Order;

/// Zernike/PSF 연산의 오류.
///
/// 모든 변형은 문제가 된 값을 함께 담습니다.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ZernikeError {
    #[error("invalid Zernike descriptor (n={n}, m={m}): requires n >= 0, |m| <= n and n - m even")]
    InvalidDescriptor { n: i32, m: i32 },
    #[error("no Zernike polynomial with {order} index {index}")]
    UnknownIndex { index: u32, order: Order },
    #[error("could not identify the name of Zernike polynomial: {0:?}")]
    UnknownName(String),
    #[error("could not identify the Zernike nomenclature/order: {0:?} (expected noll or ansi)")]
    UnknownOrder(String),
    #[error("amplitude {value} for mode {index} is not a finite scalar")]
    InvalidAmplitude { index: String, value: f64 },
    #[error("invalid amplitude range [{low}, {high}]: lower bound must not exceed the upper bound")]
    InvalidRange { low: f64, high: f64 },
    #[error("symmetric amplitude bound must be non-negative, got {0}")]
    NegativeBound(f64),
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("grid size must be positive, got {0}")]
    InvalidSize(usize),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ZernikeError>;
