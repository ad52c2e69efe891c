use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

/// Environment variable carrying the node-provider credential.
pub const CREDENTIAL_ENV: &str = "INFURA_PROJECT_ID";

/// Shape of the optional local secrets file:
///
/// ```toml
/// [infura]
/// project_id = "..."
/// ```
#[derive(Debug, Deserialize)]
struct SecretsFile {
    #[serde(default)]
    infura: Option<InfuraSecrets>,
}

#[derive(Debug, Deserialize)]
struct InfuraSecrets {
    #[serde(default)]
    project_id: Option<String>,
}

/// Resolve the Infura project ID.
///
/// Precedence: explicit value (CLI flag or `INFURA_PROJECT_ID`) first, then
/// the secrets file unless skipped. Absence everywhere is a fatal
/// configuration error, raised before any network call.
pub fn resolve_credential(
    explicit: Option<&str>,
    secrets_path: &Path,
    skip_secrets: bool,
) -> anyhow::Result<String> {
    if let Some(id) = explicit {
        let id = id.trim();
        if !id.is_empty() {
            return Ok(id.to_string());
        }
    }

    if !skip_secrets && secrets_path.exists() {
        let raw = fs::read_to_string(secrets_path)
            .with_context(|| format!("reading {}", secrets_path.display()))?;
        let secrets: SecretsFile = toml::from_str(&raw)
            .with_context(|| format!("parsing {}", secrets_path.display()))?;
        if let Some(id) = secrets.infura.and_then(|s| s.project_id) {
            return Ok(id);
        }
    }

    bail!(
        "Infura project ID not found. Set {CREDENTIAL_ENV} or add [infura] project_id to the secrets file."
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn secrets_file(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("secrets.toml");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn explicit_value_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = secrets_file(&dir, "[infura]\nproject_id = \"from-file\"\n");
        let id = resolve_credential(Some("from-env"), &path, false).unwrap();
        assert_eq!(id, "from-env");
    }

    #[test]
    fn falls_back_to_secrets_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = secrets_file(&dir, "[infura]\nproject_id = \"from-file\"\n");
        let id = resolve_credential(None, &path, false).unwrap();
        assert_eq!(id, "from-file");
    }

    #[test]
    fn skip_flag_ignores_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = secrets_file(&dir, "[infura]\nproject_id = \"from-file\"\n");
        let err = resolve_credential(None, &path, true).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn missing_everywhere_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = resolve_credential(None, &path, false).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn empty_explicit_value_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = secrets_file(&dir, "[infura]\nproject_id = \"from-file\"\n");
        let id = resolve_credential(Some("  "), &path, false).unwrap();
        assert_eq!(id, "from-file");
    }

    #[test]
    fn file_without_project_id_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = secrets_file(&dir, "[infura]\n");
        assert!(resolve_credential(None, &path, false).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = secrets_file(&dir, "not toml :::");
        let err = resolve_credential(None, &path, false).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
