// src/zernike/mod.rs

//! # Zernike 모드
//!
//! 단일 Zernike 다항식을 `(n, m)` 기술자로 식별하는 불변 값 객체 [`Zernike`]와,
//! 여러 모드의 가중합인 [`ZernikeWavefront`]를 제공합니다.
//! 두 타입 모두 [`Aberration`]을 구현하므로 PSF 생성기에 그대로 넘길 수 있습니다.

pub mod wavefront;

#[cfg(test)]
mod __test__;

use ndarray::{Array, Array2, ArrayView, Dimension, Zip};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{Result, ZernikeError};
use crate::ops::grid::CoordinateCache;
use crate::ops::index::{self, Order, ANSI_NAMES};
use crate::ops::radial::{co_broadcast, nm_polynomial};

pub use self::wavefront::{AmplitudeBound, AmplitudeRanges, Amplitudes, ModeMap, ZernikeWavefront};

/// 단위 원판 위에서 평가할 수 있는 위상 수차
pub trait Aberration {
    /// 호출자가 제공한 극좌표 위의 값.
    ///
    /// `outside`가 `Some`이면 단위 원판 밖 점(무정규화 피스톤이 1 미만인 점)을 그 값으로 채웁니다.
    fn phase<D: Dimension>(
        &self,
        rho: &ArrayView<f64, D>,
        theta: &ArrayView<f64, D>,
        normed: bool,
        outside: Option<f64>,
    ) -> Result<Array<f64, D>>;

    /// 주어진 캐시의 `size x size` 격자 위의 값. 원판 밖은 `outside`로 채웁니다.
    fn polynomial_in(
        &self,
        cache: &CoordinateCache,
        size: usize,
        normed: bool,
        outside: f64,
    ) -> Result<Array2<f64>>;

    /// 전역 좌표 캐시를 사용하는 [`Aberration::polynomial_in`]. 보통 `outside = f64::NAN`.
    fn polynomial(&self, size: usize, normed: bool, outside: f64) -> Result<Array2<f64>> {
        self.polynomial_in(CoordinateCache::global(), size, normed, outside)
    }
}

/// [`Zernike`] 생성 입력
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZernikeIndex {
    /// 명시적 `(n, m)`
    Nm(i32, i32),
    /// 명명법에 따른 선형 인덱스
    Linear(u32),
    /// 표준 이름 (대소문자 무시) 또는 숫자 문자열
    Name(String),
}

impl From<(i32, i32)> for ZernikeIndex {
    fn from((n, m): (i32, i32)) -> Self {
        ZernikeIndex::Nm(n, m)
    }
}

impl From<[i32; 2]> for ZernikeIndex {
    fn from([n, m]: [i32; 2]) -> Self {
        ZernikeIndex::Nm(n, m)
    }
}

impl From<u32> for ZernikeIndex {
    fn from(j: u32) -> Self {
        ZernikeIndex::Linear(j)
    }
}

impl From<&str> for ZernikeIndex {
    fn from(name: &str) -> Self {
        ZernikeIndex::Name(name.to_string())
    }
}

impl From<String> for ZernikeIndex {
    fn from(name: String) -> Self {
        ZernikeIndex::Name(name)
    }
}

/// 단일 Zernike 다항식.
///
/// 생성 후에는 변경할 수 없습니다. 동등성과 해시는 `(n, m)`, 순서는 ANSI 인덱스를 따릅니다.
#[derive(Clone, Copy)]
pub struct Zernike {
    n: i32,
    m: i32,
    index_noll: u32,
    index_ansi: u32,
    name: Option<&'static str>,
}

impl Zernike {
    /// 일반 생성자. `order`는 `index`가 선형 인덱스일 때만 사용되며,
    /// 이름 입력은 항상 ANSI 명명법을 강제합니다.
    pub fn new(index: impl Into<ZernikeIndex>, order: Order) -> Result<Self> {
        match index.into() {
            ZernikeIndex::Nm(n, m) => Self::from_nm(n, m),
            ZernikeIndex::Linear(j) => Self::from_index(j, order),
            ZernikeIndex::Name(name) => {
                let trimmed = name.trim();
                if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
                    let j = trimmed
                        .parse::<u32>()
                        .map_err(|_| ZernikeError::UnknownName(name.clone()))?;
                    Self::from_index(j, order)
                } else {
                    Self::from_name(trimmed)
                }
            }
        }
    }

    pub fn from_nm(n: i32, m: i32) -> Result<Self> {
        if n >= index::MAX_RADIAL_ORDER {
            return Err(ZernikeError::InvalidDescriptor { n, m });
        }
        let index_noll = index::nm_to_noll(n, m)?;
        let index_ansi = index::nm_to_ansi(n, m)?;
        let name = ANSI_NAMES.get(index_ansi as usize).copied();
        Ok(Self {
            n,
            m,
            index_noll,
            index_ansi,
            name,
        })
    }

    pub fn from_index(j: u32, order: Order) -> Result<Self> {
        let (n, m) = index::index_to_nm(j, order)?;
        Self::from_nm(n, m)
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::from_index(index::name_to_ansi(name)?, Order::Ansi)
    }

    pub fn n(&self) -> i32 {
        self.n
    }

    pub fn m(&self) -> i32 {
        self.m
    }

    pub fn nm(&self) -> (i32, i32) {
        (self.n, self.m)
    }

    pub fn index_noll(&self) -> u32 {
        self.index_noll
    }

    pub fn index_ansi(&self) -> u32 {
        self.index_ansi
    }

    /// 명명법에 따른 선형 인덱스
    pub fn index(&self, order: Order) -> u32 {
        match order {
            Order::Noll => self.index_noll,
            Order::Ansi => self.index_ansi,
        }
    }

    /// 처음 15개 ANSI 모드에만 존재
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }
}

impl Aberration for Zernike {
    fn phase<D: Dimension>(
        &self,
        rho: &ArrayView<f64, D>,
        theta: &ArrayView<f64, D>,
        normed: bool,
        outside: Option<f64>,
    ) -> Result<Array<f64, D>> {
        let mut ans = nm_polynomial(self.n, self.m, rho, theta, normed)?;
        if let Some(value) = outside {
            let (rho, theta) = co_broadcast(rho, theta)?;
            let piston = nm_polynomial(0, 0, &rho, &theta, false)?;
            Zip::from(&mut ans).and(&piston).for_each(|a, &p| {
                if p < 1.0 {
                    *a = value;
                }
            });
        }
        Ok(ans)
    }

    fn polynomial_in(
        &self,
        cache: &CoordinateCache,
        size: usize,
        normed: bool,
        outside: f64,
    ) -> Result<Array2<f64>> {
        if size == 0 {
            return Err(ZernikeError::InvalidSize(size));
        }
        let grid = cache.grid(size)?;
        let mut ans = nm_polynomial(self.n, self.m, &grid.rho.view(), &grid.theta.view(), normed)?;
        Zip::from(&mut ans).and(&grid.outside).for_each(|a, &out| {
            if out {
                *a = outside;
            }
        });
        Ok(ans)
    }
}

impl PartialEq for Zernike {
    fn eq(&self, other: &Self) -> bool {
        self.nm() == other.nm()
    }
}

impl Eq for Zernike {}

impl Hash for Zernike {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nm().hash(state);
    }
}

// ANSI 인덱스는 (n, m)과 일대일이므로 Eq와 일관된다
impl Ord for Zernike {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index_ansi.cmp(&other.index_ansi)
    }
}

impl PartialOrd for Zernike {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Zernike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Zernike(n={}, m={:2}, noll={:2}, ansi={:2}",
            self.n, self.m, self.index_noll, self.index_ansi
        )?;
        match self.name {
            Some(name) => write!(f, ", name='{}')", name),
            None => write!(f, ")"),
        }
    }
}

impl fmt::Debug for Zernike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Zernike {
    type Err = ZernikeError;

    /// 이름 또는 Noll 인덱스 문자열
    fn from_str(s: &str) -> Result<Self> {
        Zernike::new(s, Order::Noll)
    }
}

impl TryFrom<(i32, i32)> for Zernike {
    type Error = ZernikeError;

    fn try_from((n, m): (i32, i32)) -> Result<Self> {
        Zernike::from_nm(n, m)
    }
}
