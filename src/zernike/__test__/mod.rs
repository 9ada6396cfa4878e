use crate::error::ZernikeError;
use crate::ops::grid::CoordinateCache;
use crate::ops::index::Order;
use crate::zernike::{Aberration, ModeMap, Zernike, ZernikeIndex, ZernikeWavefront};
use approx::assert_abs_diff_eq;
use ndarray::{arr1, Array2};
use std::collections::{BTreeSet, HashMap};


#[test]
fn test_noll_4_is_defocus() {
    let by_index = Zernike::new(4u32, Order::Noll).unwrap();
    let by_nm = Zernike::new((2, 0), Order::Noll).unwrap();
    assert_eq!(by_index, by_nm);
    assert_eq!(by_index.name(), Some("defocus"));
    assert_eq!(by_index.index_noll(), 4);
    assert_eq!(by_index.index_ansi(), 4);
}

#[test]
fn test_name_construction_forces_ansi() {
    let named = Zernike::new("Defocus", Order::Noll).unwrap();
    assert_eq!(named.nm(), Zernike::from_index(4, Order::Noll).unwrap().nm());

    // "tip"은 ANSI 2 = (1, 1)
    let tip: Zernike = "tip".parse().unwrap();
    assert_eq!(tip.nm(), (1, 1));

    // 숫자 문자열은 인덱스로 해석
    let numeric = Zernike::new("11", Order::Noll).unwrap();
    assert_eq!(numeric.nm(), (4, 0));
    assert_eq!(numeric.name(), Some("primary spherical"));

    assert!(matches!(
        Zernike::new("astigmatism", Order::Ansi),
        Err(ZernikeError::UnknownName(_))
    ));
}

#[test]
fn test_rejects_invalid_input() {
    assert_eq!(
        Zernike::from_nm(3, 2),
        Err(ZernikeError::InvalidDescriptor { n: 3, m: 2 })
    );
    assert!(Zernike::from_nm(200, 0).is_err());
    assert!(matches!(
        Zernike::new(ZernikeIndex::Linear(0), Order::Noll),
        Err(ZernikeError::UnknownIndex { .. })
    ));
    assert!(Zernike::new(0u32, Order::Ansi).is_ok());
}

#[test]
fn test_name_only_for_low_orders() {
    assert_eq!(Zernike::from_index(14, Order::Ansi).unwrap().name(), Some("vertical quadrafoil"));
    assert_eq!(Zernike::from_index(15, Order::Ansi).unwrap().name(), None);
}

#[test]
fn test_equality_hash_and_ordering() {
    let a = Zernike::from_nm(3, -1).unwrap();
    let b = Zernike::from_index(7, Order::Noll).unwrap();
    assert_eq!(a, b);

    let mut map = HashMap::new();
    map.insert(a, 1.0);
    map.insert(b, 2.0);
    assert_eq!(map.len(), 1);
    assert_eq!(map[&a], 2.0);

    let nms: [(i32, i32); 4] = [(2, 0), (0, 0), (1, 1), (1, -1)];
    let sorted: Vec<u32> = nms
        .into_iter()
        .map(|nm| Zernike::try_from(nm).unwrap())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|z| z.index_ansi())
        .collect();
    assert_eq!(sorted, vec![0, 1, 2, 4]);
}

#[test]
fn test_display() {
    let z = Zernike::from_nm(2, 0).unwrap();
    assert_eq!(z.to_string(), "Zernike(n=2, m= 0, noll= 4, ansi= 4, name='defocus')");
    let z = Zernike::from_nm(5, -5).unwrap();
    assert_eq!(z.to_string(), "Zernike(n=5, m=-5, noll=21, ansi=15)");
}

#[test]
fn test_polynomial_fills_outside() {
    let cache = CoordinateCache::new(4);
    let z = Zernike::from_nm(0, 0).unwrap();
    let p = z.polynomial_in(&cache, 16, false, f64::NAN).unwrap();
    let grid = cache.grid(16).unwrap();
    for ((i, j), &v) in p.indexed_iter() {
        if grid.outside[[i, j]] {
            assert!(v.is_nan());
        } else {
            assert_eq!(v, 1.0);
        }
    }
    let p = z.polynomial_in(&cache, 16, false, 0.0).unwrap();
    assert_eq!(p[[0, 0]], 0.0);
    assert!(z.polynomial(0, true, 0.0).is_err());
}

#[test]
fn test_phase_masking_is_optional() {
    let z = Zernike::from_nm(1, 1).unwrap();
    let rho = arr1(&[0.5, 1.5]);
    let theta = arr1(&[0.0, 0.0]);

    let unmasked = z.phase(&rho.view(), &theta.view(), false, None).unwrap();
    assert_eq!(unmasked, arr1(&[0.5, 0.0]));

    let masked = z.phase(&rho.view(), &theta.view(), false, Some(-7.0)).unwrap();
    assert_eq!(masked, arr1(&[0.5, -7.0]));
}

#[test]
fn test_wavefront_masks_each_term_before_summing() {
    let wf = ZernikeWavefront::new(ModeMap::nm([((0, 0), 2.0), ((2, 0), 3.0)]), Order::Noll).unwrap();
    let rho = arr1(&[0.0, 2.0]);
    let theta = arr1(&[0.0, 0.0]);
    let phase = wf.phase(&rho.view(), &theta.view(), false, Some(1.0)).unwrap();
    // 원판 안: 2 * 1 + 3 * (2*0 - 1) = -1, 원판 밖: 2 * 1 + 3 * 1 = 5
    assert_abs_diff_eq!(phase[0], -1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(phase[1], 5.0, epsilon = 1e-12);
}

#[test]
fn test_wavefront_polynomial_is_weighted_sum() {
    let cache = CoordinateCache::new(4);
    let defocus = Zernike::from_nm(2, 0).unwrap();
    let coma = Zernike::from_nm(3, 1).unwrap();
    let wf = ZernikeWavefront::from_modes([(defocus, 0.5), (coma, -0.25)]).unwrap();

    let total = wf.polynomial_in(&cache, 24, true, 0.0).unwrap();
    let expected = 0.5 * defocus.polynomial_in(&cache, 24, true, 0.0).unwrap()
        - 0.25 * coma.polynomial_in(&cache, 24, true, 0.0).unwrap();
    assert_abs_diff_eq!(total, expected, epsilon = 1e-12);
}

#[test]
fn test_zero_wavefront_evaluates_to_zero() {
    let wf = ZernikeWavefront::zero();
    assert!(wf.is_empty());
    let rho = Array2::from_elem((3, 5), 0.2);
    let theta = Array2::zeros((3, 5));
    let phase = wf.phase(&rho.view(), &theta.view(), true, Some(f64::NAN)).unwrap();
    assert_eq!(phase.dim(), (3, 5));
    assert!(phase.iter().all(|&v| v == 0.0));
}

#[test]
fn test_with_amplitude_copies() {
    let wf = ZernikeWavefront::new(vec![0.0, 0.1], Order::Noll).unwrap();
    let tilt = Zernike::from_index(2, Order::Noll).unwrap();
    let next = wf.with_amplitude(tilt, 0.4).unwrap();
    assert_eq!(wf.amplitude(&tilt), Some(0.1));
    assert_eq!(next.amplitude(&tilt), Some(0.4));
    assert!(wf.with_amplitude(tilt, f64::INFINITY).is_err());
}
