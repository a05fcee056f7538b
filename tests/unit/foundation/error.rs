use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        StageError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(StageError::render("x").to_string().contains("render error:"));
    assert!(
        StageError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = StageError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn status_error_reads_like_a_fetch_failure() {
    let err = AssetError::Status {
        code: 404,
        reason: "Not Found".to_owned(),
    };
    assert_eq!(err.to_string(), "Fetch failed: 404 Not Found");

    let wrapped = StageError::from(err);
    assert!(wrapped.to_string().starts_with("asset error:"));
}
