// src/ops/grid.rs

//! # 극좌표 격자 캐시
//!
//! `size x size` 정사각 격자를 `[-1, 1]^2`에 균등하게 배치하고, 각 점의 극좌표
//! `(rho, theta)`와 단위 원판 바깥 마스크를 계산합니다. 격자는 크기에 대한 순수 함수이므로
//! 크기별로 한 번만 계산하고 최근 사용 순(MRU)으로 최대 `capacity`개까지 보관합니다.

use log::debug;
use ndarray::{Array1, Array2, Zip};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock};

use super::radial::nm_polynomial;
use crate::error::{Result, ZernikeError};

/// 기본 캐시 용량 (서로 다른 격자 크기의 수)
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// 한 격자 크기에 대한 극좌표와 원판 바깥 마스크
#[derive(Debug, Clone, PartialEq)]
pub struct PolarGrid {
    pub size: usize,
    /// 극 반지름, 행 인덱스가 y 축
    pub rho: Array2<f64>,
    /// 극각 `atan2(y, x)`
    pub theta: Array2<f64>,
    /// `true`인 점은 단위 원판 밖
    pub outside: Array2<bool>,
}

impl PolarGrid {
    /// 캐시 없이 격자를 계산합니다.
    pub fn compute(size: usize) -> Result<Self> {
        let (rho, theta) = rho_theta(size)?;
        let piston = nm_polynomial(0, 0, &rho.view(), &theta.view(), false)?;
        let outside = piston.mapv(|v| v < 1.0);
        Ok(Self {
            size,
            rho,
            theta,
            outside,
        })
    }
}

fn linspace_unit(size: usize) -> Array1<f64> {
    if size == 1 {
        return Array1::from_elem(1, -1.0);
    }
    let step = 2.0 / (size - 1) as f64;
    Array1::from_shape_fn(size, |i| -1.0 + step * i as f64)
}

/// `[-1, 1]^2` 위 균등 격자의 극좌표 (캐시하지 않음).
pub fn rho_theta(size: usize) -> Result<(Array2<f64>, Array2<f64>)> {
    if size == 0 {
        return Err(ZernikeError::InvalidSize(size));
    }
    let axis = linspace_unit(size);
    let mut rho = Array2::zeros((size, size));
    let mut theta = Array2::zeros((size, size));
    Zip::indexed(&mut rho)
        .and(&mut theta)
        .for_each(|(i, j), r, t| {
            let (y, x) = (axis[i], axis[j]);
            *r = y.hypot(x);
            *t = y.atan2(x);
        });
    Ok((rho, theta))
}

/// 격자 크기를 키로 하는 제한 용량 MRU 캐시.
///
/// 여러 스레드에서 공유할 수 있으며, 항목은 `Arc`로 반환되므로 잠금은 조회 동안만 유지됩니다.
#[derive(Debug)]
pub struct CoordinateCache {
    capacity: usize,
    entries: Mutex<VecDeque<Arc<PolarGrid>>>,
}

impl Default for CoordinateCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl CoordinateCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// 프로세스 전역 캐시
    pub fn global() -> &'static CoordinateCache {
        static GLOBAL: OnceLock<CoordinateCache> = OnceLock::new();
        GLOBAL.get_or_init(CoordinateCache::default)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Arc<PolarGrid>>> {
        // 캐시 내용은 순수 함수 결과이므로 poison 상태여도 그대로 사용한다
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 주어진 크기의 격자. 캐시에 없으면 계산해서 맨 앞에 넣습니다.
    pub fn grid(&self, size: usize) -> Result<Arc<PolarGrid>> {
        if let Some(hit) = self.lookup(size) {
            return Ok(hit);
        }
        debug!("coordinate cache miss for size {}", size);
        let grid = Arc::new(PolarGrid::compute(size)?);

        let mut entries = self.lock();
        // 잠금 밖에서 계산하는 동안 다른 스레드가 먼저 넣었을 수 있음
        if let Some(pos) = entries.iter().position(|g| g.size == size) {
            let existing = entries.remove(pos).unwrap_or(grid);
            entries.push_front(existing.clone());
            return Ok(existing);
        }
        entries.push_front(grid.clone());
        while entries.len() > self.capacity {
            if let Some(evicted) = entries.pop_back() {
                debug!("coordinate cache evicted size {}", evicted.size);
            }
        }
        Ok(grid)
    }

    fn lookup(&self, size: usize) -> Option<Arc<PolarGrid>> {
        let mut entries = self.lock();
        let pos = entries.iter().position(|g| g.size == size)?;
        let hit = entries.remove(pos)?;
        entries.push_front(hit.clone());
        Some(hit)
    }

    /// 격자의 `(rho, theta)`
    pub fn rho_theta(&self, size: usize) -> Result<(Array2<f64>, Array2<f64>)> {
        let grid = self.grid(size)?;
        Ok((grid.rho.clone(), grid.theta.clone()))
    }

    /// 단위 원판 바깥 마스크
    pub fn outside_mask(&self, size: usize) -> Result<Array2<bool>> {
        Ok(self.grid(size)?.outside.clone())
    }

    pub fn contains(&self, size: usize) -> bool {
        self.lock().iter().any(|g| g.size == size)
    }
}

/// 전역 캐시를 사용하는 단위 원판 바깥 마스크
pub fn outside_mask(size: usize) -> Result<Array2<bool>> {
    CoordinateCache::global().outside_mask(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_grid_layout() {
        let (rho, theta) = rho_theta(3).unwrap();
        // 행 인덱스가 y, 열 인덱스가 x
        assert_abs_diff_eq!(rho[[1, 1]], 0.0);
        assert_abs_diff_eq!(rho[[0, 0]], 2f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(theta[[2, 2]], FRAC_PI_4, epsilon = 1e-12);
        assert_abs_diff_eq!(theta[[0, 2]], -FRAC_PI_4, epsilon = 1e-12);
        assert_abs_diff_eq!(theta[[1, 2]], 0.0, epsilon = 1e-12);
        assert!(rho_theta(0).is_err());
    }

    #[test]
    fn test_outside_mask_matches_rho() {
        for size in [1, 2, 7, 32, 33] {
            let grid = PolarGrid::compute(size).unwrap();
            Zip::from(&grid.outside)
                .and(&grid.rho)
                .for_each(|&out, &r| assert_eq!(out, r > 1.0));
        }
    }

    #[test]
    fn test_cache_reuses_and_evicts() {
        let cache = CoordinateCache::new(2);
        let a = cache.grid(8).unwrap();
        let b = cache.grid(8).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        cache.grid(9).unwrap();
        cache.grid(8).unwrap(); // 8을 가장 최근으로
        cache.grid(10).unwrap(); // 9가 밀려남
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(8));
        assert!(cache.contains(10));
        assert!(!cache.contains(9));
        assert!(cache.grid(0).is_err());
    }
}
