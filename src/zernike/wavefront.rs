// src/zernike/wavefront.rs

//! # Zernike 파면
//!
//! 여러 Zernike 모드의 가중합으로 표현되는 수차 파면. 진폭은 선형 인덱스 맵,
//! `(n, m)` 맵, 또는 명명법 순서의 평탄한 시퀀스로 줄 수 있습니다.

use ndarray::{Array, Array1, Array2, ArrayView, Dimension};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

use super::{Aberration, Zernike};
use crate::error::{Result, ZernikeError};
use crate::ops::grid::CoordinateCache;
use crate::ops::index::Order;
use crate::ops::radial::co_broadcast;

/// 모드별 값의 입력 형태
#[derive(Debug, Clone, PartialEq)]
pub enum ModeMap<T> {
    /// 선형 인덱스 -> 값 (명명법은 함께 주어지는 `Order`를 따름)
    Indexed(Vec<(u32, T)>),
    /// `(n, m)` -> 값
    Nm(Vec<((i32, i32), T)>),
    /// 명명법 순서의 평탄한 시퀀스. Noll은 1부터, ANSI는 0부터
    Sequence(Vec<T>),
}

pub type Amplitudes = ModeMap<f64>;
pub type AmplitudeRanges = ModeMap<AmplitudeBound>;

impl<T> ModeMap<T> {
    pub fn indexed(items: impl IntoIterator<Item = (u32, T)>) -> Self {
        ModeMap::Indexed(items.into_iter().collect())
    }

    pub fn nm(items: impl IntoIterator<Item = ((i32, i32), T)>) -> Self {
        ModeMap::Nm(items.into_iter().collect())
    }

    pub fn sequence(items: impl IntoIterator<Item = T>) -> Self {
        ModeMap::Sequence(items.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        match self {
            ModeMap::Indexed(v) => v.len(),
            ModeMap::Nm(v) => v.len(),
            ModeMap::Sequence(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 각 항목을 `(모드, 진단용 키 표기, 값)`으로 풀어냅니다.
    fn resolve(self, order: Order) -> Result<Vec<(Zernike, String, T)>> {
        match self {
            ModeMap::Indexed(items) => items
                .into_iter()
                .map(|(j, v)| Ok((Zernike::from_index(j, order)?, format!("{} {}", order, j), v)))
                .collect(),
            ModeMap::Nm(items) => items
                .into_iter()
                .map(|((n, m), v)| Ok((Zernike::from_nm(n, m)?, format!("({}, {})", n, m), v)))
                .collect(),
            ModeMap::Sequence(items) => {
                let offset = order.offset();
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| {
                        let j = offset + i as u32;
                        Ok((Zernike::from_index(j, order)?, format!("{} {}", order, j), v))
                    })
                    .collect()
            }
        }
    }
}

impl<T> From<Vec<T>> for ModeMap<T> {
    fn from(values: Vec<T>) -> Self {
        ModeMap::Sequence(values)
    }
}

impl<T: Clone> From<&[T]> for ModeMap<T> {
    fn from(values: &[T]) -> Self {
        ModeMap::Sequence(values.to_vec())
    }
}

impl<T, const N: usize> From<[T; N]> for ModeMap<T> {
    fn from(values: [T; N]) -> Self {
        ModeMap::Sequence(values.into_iter().collect())
    }
}

impl<T> From<Array1<T>> for ModeMap<T> {
    fn from(values: Array1<T>) -> Self {
        ModeMap::Sequence(values.into_iter().collect())
    }
}

impl<T> From<BTreeMap<u32, T>> for ModeMap<T> {
    fn from(map: BTreeMap<u32, T>) -> Self {
        ModeMap::Indexed(map.into_iter().collect())
    }
}

impl<T> From<HashMap<u32, T>> for ModeMap<T> {
    fn from(map: HashMap<u32, T>) -> Self {
        let mut items: Vec<_> = map.into_iter().collect();
        items.sort_by_key(|&(j, _)| j);
        ModeMap::Indexed(items)
    }
}

impl<T> From<BTreeMap<(i32, i32), T>> for ModeMap<T> {
    fn from(map: BTreeMap<(i32, i32), T>) -> Self {
        ModeMap::Nm(map.into_iter().collect())
    }
}

impl<T> From<HashMap<(i32, i32), T>> for ModeMap<T> {
    fn from(map: HashMap<(i32, i32), T>) -> Self {
        let mut items: Vec<_> = map.into_iter().collect();
        items.sort_by_key(|&(nm, _)| nm);
        ModeMap::Nm(items)
    }
}

/// 균등 분포 진폭 샘플링의 범위
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmplitudeBound {
    /// `[-v, v]`, `v >= 0`
    Symmetric(f64),
    /// `[low, high]`, `low <= high`
    Interval(f64, f64),
}

impl AmplitudeBound {
    /// 검증된 `(low, high)`. 폭 `high - low`도 유한해야 균등 분포를 만들 수 있습니다.
    pub fn bounds(&self) -> Result<(f64, f64)> {
        let (low, high) = match *self {
            AmplitudeBound::Symmetric(v) if v < 0.0 => return Err(ZernikeError::NegativeBound(v)),
            AmplitudeBound::Symmetric(v) => (-v, v),
            AmplitudeBound::Interval(low, high) => (low, high),
        };
        if (high - low).is_finite() && low <= high {
            Ok((low, high))
        } else {
            Err(ZernikeError::InvalidRange { low, high })
        }
    }
}

impl From<f64> for AmplitudeBound {
    fn from(v: f64) -> Self {
        AmplitudeBound::Symmetric(v)
    }
}

impl From<(f64, f64)> for AmplitudeBound {
    fn from((low, high): (f64, f64)) -> Self {
        AmplitudeBound::Interval(low, high)
    }
}

impl From<[f64; 2]> for AmplitudeBound {
    fn from([low, high]: [f64; 2]) -> Self {
        AmplitudeBound::Interval(low, high)
    }
}

/// Zernike 모드의 가중합으로 정의되는 파면.
///
/// 모드는 입력된 순서대로 보관됩니다. 같은 모드가 다시 나오면 첫 위치를 유지하고
/// 마지막 진폭으로 덮어씁니다.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZernikeWavefront {
    modes: Vec<(Zernike, f64)>,
}

impl ZernikeWavefront {
    pub fn new(amplitudes: impl Into<Amplitudes>, order: Order) -> Result<Self> {
        let resolved = amplitudes.into().resolve(order)?;
        let mut wavefront = Self::default();
        for (z, key, a) in resolved {
            if !a.is_finite() {
                return Err(ZernikeError::InvalidAmplitude { index: key, value: a });
            }
            wavefront.insert(z, a);
        }
        Ok(wavefront)
    }

    /// 모드가 없는 파면 (어디서나 0)
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_modes(modes: impl IntoIterator<Item = (Zernike, f64)>) -> Result<Self> {
        let mut wavefront = Self::default();
        for (z, a) in modes {
            if !a.is_finite() {
                return Err(ZernikeError::InvalidAmplitude {
                    index: format!("({}, {})", z.n(), z.m()),
                    value: a,
                });
            }
            wavefront.insert(z, a);
        }
        Ok(wavefront)
    }

    fn insert(&mut self, z: Zernike, a: f64) {
        match self.modes.iter_mut().find(|(k, _)| *k == z) {
            Some(slot) => slot.1 = a,
            None => self.modes.push((z, a)),
        }
    }

    /// 한 모드의 진폭만 바꾼 새 파면
    pub fn with_amplitude(&self, z: Zernike, a: f64) -> Result<Self> {
        if !a.is_finite() {
            return Err(ZernikeError::InvalidAmplitude {
                index: format!("({}, {})", z.n(), z.m()),
                value: a,
            });
        }
        let mut next = self.clone();
        next.insert(z, a);
        Ok(next)
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn zernikes(&self) -> impl Iterator<Item = &(Zernike, f64)> {
        self.modes.iter()
    }

    pub fn amplitude(&self, z: &Zernike) -> Option<f64> {
        self.modes.iter().find(|(k, _)| k == z).map(|&(_, a)| a)
    }

    fn dense(&self, key: impl Fn(&Zernike) -> u32) -> Vec<f64> {
        let Some(max) = self.modes.iter().map(|(z, _)| key(z)).max() else {
            return Vec::new();
        };
        let mut out = vec![0.0; max as usize + 1];
        for (z, a) in &self.modes {
            out[key(z) as usize] = *a;
        }
        out
    }

    /// Noll 1..=max 순서의 진폭, 없는 모드는 0
    pub fn amplitudes_noll(&self) -> Vec<f64> {
        let mut dense = self.dense(Zernike::index_noll);
        if !dense.is_empty() {
            dense.remove(0);
        }
        dense
    }

    /// ANSI 0..=max 순서의 진폭, 없는 모드는 0
    pub fn amplitudes_ansi(&self) -> Vec<f64> {
        self.dense(Zernike::index_ansi)
    }

    /// 입력된 순서의 진폭
    pub fn amplitudes_requested(&self) -> Vec<f64> {
        self.modes.iter().map(|&(_, a)| a).collect()
    }

    /// 모드별 범위에서 균등 분포로 진폭을 뽑은 새 파면 (스레드 RNG 사용)
    pub fn random_wavefront<B>(ranges: impl Into<ModeMap<B>>, order: Order) -> Result<Self>
    where
        B: Into<AmplitudeBound>,
    {
        Self::random_wavefront_with(&mut rand::thread_rng(), ranges, order)
    }

    pub fn random_wavefront_with<R, B>(
        rng: &mut R,
        ranges: impl Into<ModeMap<B>>,
        order: Order,
    ) -> Result<Self>
    where
        R: Rng,
        B: Into<AmplitudeBound>,
    {
        // 샘플링 전에 모든 범위를 검증
        let bounds = ranges
            .into()
            .resolve(order)?
            .into_iter()
            .map(|(z, _, b)| Ok((z, b.into().bounds()?)))
            .collect::<Result<Vec<_>>>()?;

        let mut wavefront = Self::default();
        for (z, (low, high)) in bounds {
            wavefront.insert(z, rng.gen_range(low..=high));
        }
        Ok(wavefront)
    }
}

impl Aberration for ZernikeWavefront {
    /// 모드마다 원판 밖 값을 채운 뒤 진폭을 곱해 더합니다.
    fn phase<D: Dimension>(
        &self,
        rho: &ArrayView<f64, D>,
        theta: &ArrayView<f64, D>,
        normed: bool,
        outside: Option<f64>,
    ) -> Result<Array<f64, D>> {
        let (rho, theta) = co_broadcast(rho, theta)?;
        let mut acc = Array::<f64, D>::zeros(rho.raw_dim());
        for (z, a) in &self.modes {
            let term = z.phase(&rho, &theta, normed, outside)?;
            acc.scaled_add(*a, &term);
        }
        Ok(acc)
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
        let mut acc = Array2::<f64>::zeros((size, size));
        for (z, a) in &self.modes {
            let term = z.polynomial_in(cache, size, normed, outside)?;
            acc.scaled_add(*a, &term);
        }
        Ok(acc)
    }
}
