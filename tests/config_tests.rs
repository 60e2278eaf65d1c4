use std::io::Write;
use std::time::Duration;

use tile_slideshow::config::{Configuration, Timing};
use tile_slideshow::events::{SlideshowId, VerticalAnchor};
use tile_slideshow::grid::GridShape;
use tile_slideshow::pattern::{Axis, Pattern};

const IMAGES: &str = r#"
image-sets:
  - - src: "./img/background-sydney.jpg"
      y-position: bottom
    - src: "./img/background-desert.jpg"
"#;

#[test]
fn parse_kebab_case_config_with_defaults() {
    let cfg: Configuration = serde_yaml::from_str(IMAGES).unwrap();
    assert_eq!(cfg.container, "block");
    assert_eq!(cfg.grid, GridShape::new(10, 10));
    assert_eq!(cfg.timing, Timing::default());
    assert_eq!(cfg.timing.interval, Duration::from_millis(3000));
    assert_eq!(cfg.pattern, Pattern::Random { unique: false });
    assert_eq!(cfg.id, SlideshowId(0));
    assert_eq!(cfg.seed, None);

    let images = cfg.active_images();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].y_position, VerticalAnchor::Bottom);
    assert_eq!(images[1].y_position, VerticalAnchor::Center);
}

#[test]
fn parse_humantime_durations() {
    let yaml = format!(
        "{}\ninterval: 2s\ntransition: 900ms\nstep: 30ms\nsettle: 50ms\n",
        IMAGES
    );
    let cfg: Configuration = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(cfg.timing.interval, Duration::from_secs(2));
    assert_eq!(cfg.timing.transition, Duration::from_millis(900));
    assert_eq!(cfg.timing.step, Duration::from_millis(30));
    assert_eq!(cfg.timing.settle, Duration::from_millis(50));
}

#[test]
fn parse_pattern_preset_name() {
    let yaml = format!("{}\npattern: vertical-sweep\n", IMAGES);
    let cfg: Configuration = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(
        cfg.pattern,
        Pattern::Sweep {
            axis: Axis::Vertical,
            reversed: false,
            alternate: true,
        }
    );
}

#[test]
fn parse_tagged_pattern() {
    let yaml = format!(
        "{}\npattern:\n  type: corner\n  opposite: true\n",
        IMAGES
    );
    let cfg: Configuration = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(
        cfg.pattern,
        Pattern::Corner {
            opposite: true,
            alternate: false,
        }
    );

    let yaml = format!("{}\npattern:\n  type: random\n  unique: true\n", IMAGES);
    let cfg: Configuration = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(cfg.pattern, Pattern::Random { unique: true });
}

#[test]
fn reject_unknown_pattern() {
    let yaml = format!("{}\npattern: spiral\n", IMAGES);
    assert!(serde_yaml::from_str::<Configuration>(&yaml).is_err());
    let yaml = format!("{}\npattern:\n  type: spiral\n", IMAGES);
    assert!(serde_yaml::from_str::<Configuration>(&yaml).is_err());
}

#[test]
fn parse_grid_and_identity() {
    let yaml = format!(
        "{}\ncontainer: hero\ncontainer-height: 480\nid: 3\nseed: 9\ngrid:\n  rows: 4\n  columns: 6\n",
        IMAGES
    );
    let cfg: Configuration = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(cfg.container, "hero");
    assert!((cfg.container_height - 480.0).abs() < f32::EPSILON);
    assert_eq!(cfg.id, SlideshowId(3));
    assert_eq!(cfg.seed, Some(9));
    assert_eq!(cfg.grid, GridShape::new(4, 6));
}

#[test]
fn validated_accepts_complete_config() {
    let cfg: Configuration = serde_yaml::from_str(IMAGES).unwrap();
    assert!(cfg.validated().is_ok());
}

#[test]
fn validated_rejects_missing_images() {
    let cfg: Configuration = serde_yaml::from_str("container: block").unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("image-sets"));

    let cfg: Configuration = serde_yaml::from_str("image-sets: [[]]").unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn validated_rejects_out_of_range_set() {
    let yaml = format!("{}\nactive-image-set: 2\n", IMAGES);
    let cfg: Configuration = serde_yaml::from_str(&yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("active-image-set"));
}

#[test]
fn validated_rejects_empty_grid_and_zero_interval() {
    let yaml = format!("{}\ngrid:\n  rows: 0\n", IMAGES);
    let cfg: Configuration = serde_yaml::from_str(&yaml).unwrap();
    assert!(cfg.validated().is_err());

    let yaml = format!("{}\ninterval: 0s\n", IMAGES);
    let cfg: Configuration = serde_yaml::from_str(&yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn load_from_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}\npattern: corner\n", IMAGES).unwrap();
    let cfg = Configuration::from_yaml_file(file.path())
        .unwrap()
        .validated()
        .unwrap();
    assert_eq!(cfg.pattern.name(), "corner");
    assert_eq!(cfg.image_sets.len(), 1);
}
