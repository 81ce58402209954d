//! End-to-end camera behavior through the public registry API.

use rand::{rngs::StdRng, Rng, SeedableRng};
use skyfx_app::{CameraError, CameraRegistry};
use skyfx_shared::math::{Mat4, Quat, Vec3};
use skyfx_tests::{default_camera, init_tracing, DT};

#[test]
fn fresh_camera_has_identity_view() -> anyhow::Result<()> {
    init_tracing();
    let mut cameras = CameraRegistry::new();
    let id = default_camera(&mut cameras)?;

    assert_eq!(cameras.view(id)?, Mat4::IDENTITY);
    let projection = cameras.projection(id)?;
    let f = 0.5f32.cos() / 0.5f32.sin();
    assert_eq!(projection.m[0][0], f);
    assert!((projection.m[1][1] - f * 800.0 / 600.0).abs() < 1e-5);
    assert_eq!(projection.m[2][3], -1.0);
    Ok(())
}

#[test]
fn smoothed_move_saturates_exactly() -> anyhow::Result<()> {
    let mut cameras = CameraRegistry::new();
    let id = default_camera(&mut cameras)?;
    let target = Vec3::new(10.0, 0.0, 0.0);
    cameras.set_position(id, target, false)?;
    assert_eq!(cameras.position(id)?, Vec3::ZERO);

    let mut last_distance = (target - cameras.position(id)?).len();
    for _ in 0..120 {
        cameras.update(DT);
        let distance = (target - cameras.position(id)?).len();
        assert!(distance <= last_distance);
        last_distance = distance;
    }
    assert_eq!(cameras.position(id)?, target);
    Ok(())
}

#[test]
fn forced_move_is_immediate() -> anyhow::Result<()> {
    let mut cameras = CameraRegistry::new();
    let id = default_camera(&mut cameras)?;
    let target = Vec3::new(-3.0, 4.0, 12.0);
    cameras.set_position(id, target, true)?;
    assert_eq!(cameras.position(id)?, target);
    cameras.update(DT);
    assert!(cameras.transform(id)?.transform_point(Vec3::ZERO).approx_eq(target, 1e-5));
    Ok(())
}

#[test]
fn derived_matrices_stay_consistent() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut cameras = CameraRegistry::new();
    let id = default_camera(&mut cameras)?;

    for _ in 0..50 {
        let position = Vec3::new(
            rng.gen_range(-10.0..10.0),
            rng.gen_range(-10.0..10.0),
            rng.gen_range(-10.0..10.0),
        );
        cameras.set_position(id, position, rng.gen_bool(0.5))?;
        cameras.set_yaw_pitch(id, rng.gen_range(-3.0..3.0), rng.gen_range(-1.5..1.5), false)?;
        cameras.update(DT);

        let camera = cameras.get(id)?;
        assert!((camera.orientation().len() - 1.0).abs() < 1e-5);
        assert!((*camera.transform() * *camera.view()).approx_eq(&Mat4::IDENTITY, 1e-3));
        assert_eq!(*camera.view_proj(), *camera.view() * *camera.projection());
        let round_trip = *camera.view_proj() * *camera.inv_view_proj();
        assert!(round_trip.approx_eq(&Mat4::IDENTITY, 1e-2), "{round_trip:?}");
    }
    Ok(())
}

#[test]
fn orientation_follows_yaw_then_pitch() -> anyhow::Result<()> {
    let mut cameras = CameraRegistry::new();
    let id = default_camera(&mut cameras)?;
    cameras.set_yaw_pitch(id, 0.8, 0.3, true)?;
    cameras.update(DT);

    let expected = (Quat::from_yaw_pitch_roll(0.8, 0.0, 0.0) * Quat::from_yaw_pitch_roll(0.0, 0.3, 0.0)).normalize();
    let camera = cameras.get(id)?;
    assert!(camera.orientation().approx_eq(expected, 1e-6));
    assert!(camera.at().approx_eq(expected.rotate(-Vec3::Z), 1e-5));
    assert!(camera.right().approx_eq(expected.rotate(Vec3::X), 1e-5));
    assert!(camera.up().approx_eq(expected.rotate(Vec3::Y), 1e-5));
    Ok(())
}

#[test]
fn resize_blends_independently_of_position() -> anyhow::Result<()> {
    let mut cameras = CameraRegistry::new();
    let id = default_camera(&mut cameras)?;
    cameras.set_position(id, Vec3::new(0.0, 0.0, -20.0), false)?;
    for _ in 0..5 {
        cameras.update(DT);
    }
    let mid_blend = cameras.get(id)?.position_blend().time();

    cameras.set_projection(id, 0.1, 1000.0, 0.5, 1600.0, 600.0, false)?;
    assert_eq!(cameras.get(id)?.position_blend().time(), mid_blend);
    cameras.update(0.5);
    let width = cameras.state(id)?.width;
    assert!(width > 800.0 && width < 1600.0);
    Ok(())
}

#[test]
fn cleared_registry_rejects_old_handles() -> anyhow::Result<()> {
    let mut cameras = CameraRegistry::new();
    let old = default_camera(&mut cameras)?;
    cameras.clear();
    let new = default_camera(&mut cameras)?;

    assert_eq!(old.index(), new.index());
    assert!(matches!(cameras.view(old), Err(CameraError::StaleId(_))));
    assert!(cameras.view(new).is_ok());
    Ok(())
}
