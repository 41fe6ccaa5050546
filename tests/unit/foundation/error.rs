use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CinemagraphError::UnsupportedPathType("spiral".to_owned())
            .to_string()
            .contains("unsupported camera path type 'spiral'")
    );
    assert!(
        CinemagraphError::empty_scene_flow("x")
            .to_string()
            .contains("empty scene flow:")
    );
    assert!(
        CinemagraphError::encoding("x")
            .to_string()
            .contains("encoding error:")
    );
    assert!(
        CinemagraphError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn stages_name_the_failing_component() {
    assert_eq!(
        CinemagraphError::UnsupportedPathType("x".to_owned()).stage(),
        "camera path"
    );
    assert_eq!(
        CinemagraphError::NonFiniteField {
            what: "flow",
            x: 0,
            y: 0
        }
        .stage(),
        "flow integration"
    );
    assert_eq!(
        CinemagraphError::empty_scene_flow("x").stage(),
        "scene flow warp"
    );
    assert_eq!(CinemagraphError::encoding("x").stage(), "frame assembly");
}

#[test]
fn only_invalid_depth_is_recoverable() {
    let e = CinemagraphError::InvalidDepth {
        layer: 1,
        x: 2,
        y: 3,
        depth: -1.0,
    };
    assert!(!e.is_fatal());
    assert!(e.to_string().contains("layer 1, pixel (2, 3)"));
    assert!(CinemagraphError::encoding("x").is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CinemagraphError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
