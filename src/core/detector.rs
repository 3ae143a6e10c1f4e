/// Decide whether freshly fetched content differs from the stored
/// fingerprint.
///
/// A missing stored hash means the target has never been captured, so the
/// first check is always treated as changed. Otherwise this is exact
/// string inequality; no fuzzy comparison.
pub fn has_changed(new_hash: &str, old_hash: Option<&str>) -> bool {
    match old_hash {
        None => true,
        Some(old) => new_hash != old,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_check_always_changed() {
        assert!(has_changed("abc123", None));
        assert!(has_changed("", None));
    }

    #[test]
    fn test_identical_hash_is_unchanged() {
        assert!(!has_changed("abc123", Some("abc123")));
    }

    #[test]
    fn test_differing_hash_is_changed() {
        assert!(has_changed("abc123", Some("def456")));
    }
}
