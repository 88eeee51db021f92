use approx::assert_relative_eq;
use camino::Utf8Path;
use orrery::{
    config::{SystemConfig, TheoryCache},
    constants::{AU, GM_EARTH, GM_MOON, GM_SUN},
    lunar::LunarTheory,
    orrery_errors::OrreryError,
    planetary::PlanetaryTheory,
    solar_system::SolarSystem,
    time::seconds_from_gregorian,
};

mod common;

fn data_dir() -> tempfile::TempDir {
    common::init_logger();
    let dir = tempfile::tempdir().unwrap();
    common::write_tables(Utf8Path::from_path(dir.path()).unwrap());
    dir
}

#[test]
fn test_sun_earth_moon_from_tables() {
    let dir = data_dir();
    let data = Utf8Path::from_path(dir.path()).unwrap();
    let mut system = SolarSystem::sun_earth_moon(data).unwrap();

    let start = seconds_from_gregorian(2017, 11, 4, 12, 0, 0);
    assert_relative_eq!(system.time(), start, epsilon = 1e-6);

    for _ in 0..4 {
        let sun = system.body_position("sun").unwrap();
        let earth = system.body_position("earth").unwrap();
        let moon = system.body_position("moon").unwrap();

        let earth_moon = (moon - earth).norm();
        assert!(
            (3.5e5..4.2e5).contains(&earth_moon),
            "Earth-Moon distance {earth_moon} km"
        );

        let earth_id = system.tree().find("earth").unwrap();
        let barycenter_id = system.tree().parent(earth_id).unwrap().unwrap();
        let barycenter = system.tree().absolute_position(barycenter_id).unwrap();

        let heliocentric = (barycenter - sun).norm();
        assert!(
            (0.98 * AU..1.02 * AU).contains(&heliocentric),
            "Sun-barycenter distance {heliocentric} km"
        );

        let closure = (earth - barycenter) * GM_EARTH + (moon - barycenter) * GM_MOON;
        assert!(closure.norm() < 1e-9 * GM_EARTH * earth_moon);

        // the sun is pulled toward the Earth-Moon barycenter by its mass ratio
        let solar_offset = sun - system.tree().absolute_position(system.root()).unwrap();
        assert_relative_eq!(
            solar_offset.norm(),
            heliocentric * (GM_EARTH + GM_MOON) / (GM_SUN + GM_EARTH + GM_MOON),
            max_relative = 1e-9
        );

        assert_relative_eq!(system.anchor(), -earth);
        system.step(3600.0);
    }

    assert_relative_eq!(system.time(), start + 4.0 * 3600.0 * 300.0, epsilon = 1e-3);
    assert_eq!(system.snapshot().len(), 3);
}

#[test]
fn test_theories_are_shared_between_systems() {
    let dir = data_dir();
    let data = Utf8Path::from_path(dir.path()).unwrap();
    let config = SystemConfig::sun_earth_moon(data);

    let mut cache = TheoryCache::new();
    config.build(&mut cache).unwrap();
    assert_eq!(cache.len(), 2);
    config.build(&mut cache).unwrap();
    assert_eq!(cache.len(), 2);

    let planetary = cache.planetary(&data.join("VSOP2013p3.dat"), 1e-16).unwrap();
    let lunar = cache.lunar(data, 1e-5).unwrap();
    assert_eq!(
        *planetary,
        PlanetaryTheory::from_path(&data.join("VSOP2013p3.dat"), 1e-16).unwrap()
    );
    assert_eq!(*lunar, LunarTheory::from_directory(data, 1e-5).unwrap());
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_missing_lunar_table_is_fatal() {
    let dir = data_dir();
    let data = Utf8Path::from_path(dir.path()).unwrap();
    std::fs::remove_file(data.join("ELP17")).unwrap();

    assert_eq!(
        SolarSystem::sun_earth_moon(data).unwrap_err(),
        OrreryError::TableNotFound(data.join("ELP17"))
    );
}

#[test]
fn test_malformed_planetary_table_is_fatal() {
    let dir = data_dir();
    let data = Utf8Path::from_path(dir.path()).unwrap();
    let mut lines: Vec<String> = common::planetary_table().lines().map(String::from).collect();
    lines[1] = "x".repeat(lines[1].len());
    std::fs::write(data.join("VSOP2013p3.dat"), lines.join("\n")).unwrap();

    assert!(matches!(
        SolarSystem::sun_earth_moon(data),
        Err(OrreryError::TableFormat { line: 2, .. })
    ));
}
