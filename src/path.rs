//! Secret-store path construction

use vaultenv_core::Engine;

/// Build the path a secret is read from.
///
/// A single leading `/` is stripped from `root` and from `path`. The kv-v2
/// engine stores values under an extra `data` segment after its mount, so
/// for that engine the result is `root/data/path`; every other engine reads
/// `root/path`. An empty root yields the bare path.
///
/// ```
/// use vaultenv::format_path;
/// use vaultenv::Engine;
///
/// assert_eq!(format_path(&Engine::KvV2, "/secret", "/app"), "secret/data/app");
/// assert_eq!(format_path(&Engine::Aws, "", "/aws/creds/ci"), "aws/creds/ci");
/// ```
pub fn format_path(engine: &Engine, root: &str, path: &str) -> String {
    let root = root.strip_prefix('/').unwrap_or(root);
    let path = path.strip_prefix('/').unwrap_or(path);

    match (engine.is_versioned(), root.is_empty()) {
        (true, true) => format!("data/{}", path),
        (true, false) => format!("{}/data/{}", root, path),
        (false, true) => path.to_string(),
        (false, false) => format!("{}/{}", root, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kv_v2_inserts_data_segment() {
        assert_eq!(
            format_path(&Engine::KvV2, "/aws", "/path/value"),
            "aws/data/path/value"
        );
        assert_eq!(
            format_path(&Engine::KvV2, "secret", "app"),
            "secret/data/app"
        );
        assert_eq!(format_path(&Engine::KvV2, "", "app"), "data/app");
    }

    #[test]
    fn test_leading_slash_is_stripped() {
        assert_eq!(
            format_path(&Engine::Aws, "/aws", "/path/value"),
            "aws/path/value"
        );
        assert_eq!(
            format_path(&Engine::Aws, "/aws", "path/value"),
            "aws/path/value"
        );
    }

    #[test]
    fn test_empty_root() {
        assert_eq!(
            format_path(&Engine::Aws, "", "/aws/path/value"),
            "aws/path/value"
        );
        assert_eq!(
            format_path(&Engine::Generic("kv".into()), "/", "x"),
            "x"
        );
    }

    #[test]
    fn test_only_one_slash_is_stripped() {
        assert_eq!(
            format_path(&Engine::Generic("kv".into()), "//mount", "//key"),
            "/mount//key"
        );
    }
}
