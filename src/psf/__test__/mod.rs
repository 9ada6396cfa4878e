use crate::error::ZernikeError;
use crate::ops::index::Order;
use crate::psf::{PsfConfig, PsfGenerator3D};
use crate::zernike::{Aberration, ModeMap, Zernike, ZernikeWavefront};
use approx::{assert_abs_diff_eq, assert_relative_eq};
use ndarray::{ArrayView2, Axis};

fn small_config() -> PsfConfig {
    PsfConfig {
        shape: (5, 8, 8),
        units: (1.0, 1.0, 1.0),
        lam_detection: 1.0,
        n: 1.33,
        na_detection: 0.5,
        masked: true,
        switch: true,
    }
}

fn argmax2(a: &ArrayView2<f64>) -> (usize, usize) {
    let mut best = ((0, 0), f64::MIN);
    for (idx, &v) in a.indexed_iter() {
        if v > best.1 {
            best = (idx, v);
        }
    }
    best.0
}

#[test]
fn test_default_config() {
    let config = PsfConfig::default();
    assert_eq!(config.shape, (64, 64, 64));
    assert_eq!(config.units, (0.032, 0.016, 0.016));
    assert!(config.masked && config.switch);
    assert!(config.validate().is_ok());
}

#[test]
fn test_rejects_bad_config() {
    let bad = [
        PsfConfig { shape: (0, 8, 8), ..small_config() },
        PsfConfig { units: (1.0, -1.0, 1.0), ..small_config() },
        PsfConfig { lam_detection: 0.0, ..small_config() },
        PsfConfig { na_detection: f64::NAN, ..small_config() },
    ];
    for config in bad {
        assert!(matches!(
            PsfGenerator3D::new(config),
            Err(ZernikeError::InvalidConfig(_))
        ));
    }
}

#[test]
fn test_frequency_and_focal_axes() -> anyhow::Result<()> {
    let gen = PsfGenerator3D::new(small_config())?;
    assert_eq!(gen.kx().to_vec(), vec![-0.5, -0.375, -0.25, -0.125, 0.0, 0.125, 0.25, 0.375]);
    assert_eq!(gen.ky(), gen.kx());
    assert_eq!(gen.z().to_vec(), vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
    assert_relative_eq!(gen.k_cut(), 0.5);

    let even = PsfGenerator3D::new(PsfConfig { shape: (4, 8, 8), units: (0.5, 1.0, 1.0), ..small_config() })?;
    assert_eq!(even.z().to_vec(), vec![-0.75, -0.25, 0.25, 0.75]);
    Ok(())
}

#[test]
fn test_pupil_mask_is_strict() -> anyhow::Result<()> {
    let gen = PsfGenerator3D::new(small_config())?;
    // ky = 0, kx = -0.5 은 |k| == k_cut
    assert!(!gen.k_mask()[[4, 0]]);
    assert!(gen.k_mask()[[4, 1]]);
    assert!(gen.k_mask()[[4, 4]]);
    Ok(())
}

#[test]
fn test_switch_rescales_aberration_plane() -> anyhow::Result<()> {
    let on = PsfGenerator3D::new(small_config())?;
    let off = PsfGenerator3D::new(PsfConfig { switch: false, ..small_config() })?;
    let scaled = on.k_rho() * on.k_cut();
    assert_abs_diff_eq!(scaled, off.k_rho().clone(), epsilon = 1e-12);
    assert_eq!(on.k_phi(), off.k_phi());
    Ok(())
}

#[test]
fn test_switch_changes_evaluated_phase() -> anyhow::Result<()> {
    let on = PsfGenerator3D::new(small_config())?;
    let off = PsfGenerator3D::new(PsfConfig { switch: false, ..small_config() })?;
    let wf = ZernikeWavefront::new(ModeMap::nm([((2, 0), 0.4), ((3, 1), -0.2), ((2, -2), 0.1)]), Order::Noll)?;

    let on_phase = on.masked_phase(&wf, true, false)?;
    let off_phase = off.masked_phase(&wf, true, false)?;
    assert!(on_phase != off_phase);

    // 같은 물리 주파수에서 switch는 pupil 반지름으로 나눈 좌표에서 평가한 것과 같음
    let rescaled = off.k_rho() / off.k_cut();
    let expected = wf.phase(&rescaled.view(), &off.k_phi().view(), true, None)?;
    assert_abs_diff_eq!(on_phase, expected, epsilon = 1e-9);

    // 마스크를 적용해도 pupil 안쪽의 관계는 유지
    let on_masked = on.masked_phase(&wf, true, true)?;
    for ((idx, &p), &inside) in on_masked.indexed_iter().zip(on.k_mask().iter()) {
        if inside {
            assert_abs_diff_eq!(p, expected[idx], epsilon = 1e-9);
        }
    }
    Ok(())
}

#[test]
fn test_base_stack_masking_and_evanescent_cut() -> anyhow::Result<()> {
    // k 범위가 n/λ를 넘도록 촘촘한 표본 간격
    let config = PsfConfig {
        shape: (3, 8, 8),
        units: (1.0, 0.1, 0.1),
        masked: false,
        ..small_config()
    };
    let gen = PsfGenerator3D::new(config.clone())?;
    let base = gen.k_base();
    // z = 0 평면: 전파 가능한 성분은 1, 소멸파는 0
    for ((i, j), v) in base.index_axis(Axis(0), 1).indexed_iter() {
        let kr = gen.ky()[i].hypot(gen.kx()[j]);
        if kr < config.n / config.lam_detection {
            assert_abs_diff_eq!(v.re, 1.0, epsilon = 1e-12);
        } else {
            assert_eq!(v.norm(), 0.0);
        }
    }

    let masked = PsfGenerator3D::new(PsfConfig { masked: true, ..config })?;
    for ((_, i, j), v) in masked.k_base().indexed_iter() {
        if !masked.k_mask()[[i, j]] {
            assert_eq!(v.norm(), 0.0);
        } else {
            assert_abs_diff_eq!(v.norm(), 1.0, epsilon = 1e-12);
        }
    }
    Ok(())
}

#[test]
fn test_masked_phase_zero_outside_pupil() -> anyhow::Result<()> {
    let gen = PsfGenerator3D::new(small_config())?;
    let wf = ZernikeWavefront::new(vec![0.0, 0.0, 0.0, 0.3], Order::Noll)?;
    let phase = gen.masked_phase(&wf, true, true)?;
    for (p, &inside) in phase.iter().zip(gen.k_mask().iter()) {
        if !inside {
            assert_eq!(*p, 0.0);
        }
    }
    // |k| == k_cut 인 점은 단위 원 위에 있어 마스크가 없으면 값이 남음
    let raw = gen.masked_phase(&wf, true, false)?;
    assert!(raw[[4, 0]] != 0.0);
    assert_eq!(phase[[4, 0]], 0.0);
    Ok(())
}

#[test]
fn test_focus_peak_is_centered() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let gen = PsfGenerator3D::new(small_config())?;
    let psf = gen.incoherent_psf_abs(&ZernikeWavefront::zero(), true, true)?;
    assert_eq!(psf.dim(), (5, 8, 8));
    assert_eq!(argmax2(&psf.index_axis(Axis(0), 2)), (4, 4));
    Ok(())
}

#[test]
fn test_plane_energy_matches_pupil() -> anyhow::Result<()> {
    let gen = PsfGenerator3D::new(small_config())?;
    let pupil = gen.k_mask().iter().filter(|&&m| m).count() as f64;
    let defocus = Zernike::from_nm(2, 0)?;
    let psf = gen.incoherent_psf_abs(&defocus, true, true)?;
    // 역변환이 1/N 규약이므로 평면 에너지는 |pupil|² / N
    for plane in psf.axis_iter(Axis(0)) {
        assert_relative_eq!(plane.sum(), pupil / 64.0, max_relative = 1e-9);
    }
    Ok(())
}

#[test]
fn test_incoherent_psf_is_centered_complex_field() -> anyhow::Result<()> {
    let gen = PsfGenerator3D::new(small_config())?;
    let coma = ZernikeWavefront::new(ModeMap::nm([((3, 1), 0.2)]), Order::Noll)?;
    let field = gen.incoherent_psf(&coma, true, true)?;
    let intensity = gen.incoherent_psf_abs(&coma, true, true)?;
    for (c, &v) in field.iter().zip(intensity.iter()) {
        assert_abs_diff_eq!(c.norm_sqr(), v, epsilon = 1e-12);
    }
    let coherent = gen.coherent_psf(&coma, true, true)?;
    assert_eq!(coherent[[0, 0, 0]], field[[0, 4, 4]]);
    Ok(())
}
