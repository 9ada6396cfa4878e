// src/ops/index.rs

//! # Noll / ANSI 인덱스 변환
//!
//! 단일 정수 인덱스와 `(n, m)` 기술자 사이의 양방향 매핑을 제공합니다.
//! 역방향 테이블은 `n < MAX_RADIAL_ORDER` 범위의 모든 유효한 `(n, m)` 쌍을
//! 열거하여 처음 한 번만 생성됩니다.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{Result, ZernikeError};

/// 역방향 테이블에 포함되는 방사 차수의 상한 (배타적).
pub const MAX_RADIAL_ORDER: i32 = 200;

/// ANSI 순서로 나열한 처음 15개 모드의 표준 이름.
pub const ANSI_NAMES: [&str; 15] = [
    "piston",
    "tilt",
    "tip",
    "oblique astigmatism",
    "defocus",
    "vertical astigmatism",
    "vertical trefoil",
    "vertical coma",
    "horizontal coma",
    "oblique trefoil",
    "oblique quadrafoil",
    "oblique secondary astigmatism",
    "primary spherical",
    "vertical secondary astigmatism",
    "vertical quadrafoil",
];

/// 선형 인덱스 명명법
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Order {
    /// 1부터 시작하는 Noll 번호
    #[default]
    Noll,
    /// 0부터 시작하는 ANSI (OSA) 번호
    Ansi,
}

impl Order {
    /// 평탄한 진폭 시퀀스의 첫 번째 원소에 대응하는 인덱스
    pub fn offset(self) -> u32 {
        match self {
            Order::Noll => 1,
            Order::Ansi => 0,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Noll => write!(f, "noll"),
            Order::Ansi => write!(f, "ansi"),
        }
    }
}

impl FromStr for Order {
    type Err = ZernikeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "noll" => Ok(Order::Noll),
            "ansi" => Ok(Order::Ansi),
            _ => Err(ZernikeError::UnknownOrder(s.to_string())),
        }
    }
}

/// `(n, m)`가 Zernike 다항식을 정의하는지 확인
pub fn is_valid_nm(n: i32, m: i32) -> bool {
    n >= 0 && m.abs() <= n && (n - m).rem_euclid(2) == 0
}

fn check_nm(n: i32, m: i32) -> Result<()> {
    if is_valid_nm(n, m) {
        Ok(())
    } else {
        Err(ZernikeError::InvalidDescriptor { n, m })
    }
}

// 호출 전에 (n, m)의 유효성이 보장되어야 함
fn noll_unchecked(n: i32, m: i32) -> u32 {
    let j = (n * (n + 1)) / 2 + m.abs();
    let keep = (m > 0 && matches!(n % 4, 0 | 1)) || (m < 0 && matches!(n % 4, 2 | 3));
    if keep {
        j as u32
    } else {
        (j + 1) as u32
    }
}

fn ansi_unchecked(n: i32, m: i32) -> u32 {
    ((n * (n + 2) + m) / 2) as u32
}

/// 고전적인 Noll 번호
pub fn nm_to_noll(n: i32, m: i32) -> Result<u32> {
    check_nm(n, m)?;
    Ok(noll_unchecked(n, m))
}

/// ANSI 번호: `(n(n+2) + m) / 2`
pub fn nm_to_ansi(n: i32, m: i32) -> Result<u32> {
    check_nm(n, m)?;
    Ok(ansi_unchecked(n, m))
}

struct IndexTables {
    noll: HashMap<u32, (i32, i32)>,
    ansi: HashMap<u32, (i32, i32)>,
}

fn tables() -> &'static IndexTables {
    static TABLES: OnceLock<IndexTables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let pairs: Vec<(i32, i32)> = (0..MAX_RADIAL_ORDER)
            .flat_map(|n| (-n..=n).step_by(2).map(move |m| (n, m)))
            .collect();
        let mut noll = HashMap::with_capacity(pairs.len());
        let mut ansi = HashMap::with_capacity(pairs.len());
        for &(n, m) in &pairs {
            noll.insert(noll_unchecked(n, m), (n, m));
            ansi.insert(ansi_unchecked(n, m), (n, m));
        }
        IndexTables { noll, ansi }
    })
}

/// Noll 인덱스를 `(n, m)`으로 변환
pub fn noll_to_nm(j: u32) -> Result<(i32, i32)> {
    index_to_nm(j, Order::Noll)
}

/// ANSI 인덱스를 `(n, m)`으로 변환
pub fn ansi_to_nm(j: u32) -> Result<(i32, i32)> {
    index_to_nm(j, Order::Ansi)
}

/// 주어진 명명법의 선형 인덱스를 `(n, m)`으로 변환
pub fn index_to_nm(j: u32, order: Order) -> Result<(i32, i32)> {
    let table = match order {
        Order::Noll => &tables().noll,
        Order::Ansi => &tables().ansi,
    };
    table
        .get(&j)
        .copied()
        .ok_or(ZernikeError::UnknownIndex { index: j, order })
}

/// `(n, m)`을 주어진 명명법의 선형 인덱스로 변환
pub fn nm_to_index(n: i32, m: i32, order: Order) -> Result<u32> {
    match order {
        Order::Noll => nm_to_noll(n, m),
        Order::Ansi => nm_to_ansi(n, m),
    }
}

/// 대소문자를 구분하지 않고 표준 이름을 ANSI 인덱스로 변환
pub fn name_to_ansi(name: &str) -> Result<u32> {
    let lower = name.trim().to_lowercase();
    ANSI_NAMES
        .iter()
        .position(|&known| known == lower)
        .map(|i| i as u32)
        .ok_or_else(|| ZernikeError::UnknownName(name.to_string()))
}
