//! 격자, 인덱스, 다항식 평가 등 배열 수준의 순수 연산
pub mod grid;
pub mod index;
pub mod radial;

pub use self::grid::{outside_mask, rho_theta, CoordinateCache, PolarGrid};
pub use self::index::{
    ansi_to_nm, index_to_nm, is_valid_nm, name_to_ansi, nm_to_ansi, nm_to_index, nm_to_noll,
    noll_to_nm, Order, ANSI_NAMES, MAX_RADIAL_ORDER,
};
pub use self::radial::{binom, nm_polynomial, normalization, radial_coefficients};
