use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ScrimError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ScrimError::geometry("x")
            .to_string()
            .contains("geometry error:")
    );
    assert!(
        ScrimError::replacement("x")
            .to_string()
            .contains("replacement error:")
    );
    assert!(
        ScrimError::sampling("x")
            .to_string()
            .contains("sampling error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ScrimError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
