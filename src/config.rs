use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

fn default_site_header() -> String {
    "site".to_string()
}

/// DMS score sources shared by the scoring binaries.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmsConfig {
    pub dms_file: PathBuf,
    pub escape_file: Option<PathBuf>,
    #[serde(default = "default_site_header")]
    pub site_header: String,
}

impl DmsConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, file) in self.files() {
            if file.as_os_str().is_empty() {
                bail!("empty path for '{name}'");
            }
        }

        if self.site_header.trim().is_empty() {
            bail!("invalid site header: must not be empty");
        }

        Ok(())
    }

    /// Configured score files as (name, path) pairs.
    pub fn files(&self) -> impl Iterator<Item = (&str, &Path)> {
        std::iter::once(("dmsFile", self.dms_file.as_path()))
            .chain(self.escape_file.as_deref().map(|p| ("escapeFile", p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f
    }

    #[test]
    fn valid_config_all_fields() {
        let json = r#"{
            "dmsFile": "data/h5_dms.csv",
            "escapeFile": "data/sera_escape.csv",
            "siteHeader": "sequential_site"
        }"#;
        let f = write_config(json);
        let config = DmsConfig::from_file(f.path()).unwrap();
        assert_eq!(config.dms_file, PathBuf::from("data/h5_dms.csv"));
        assert_eq!(config.site_header, "sequential_site");
        assert_eq!(config.files().count(), 2);
    }

    #[test]
    fn defaults() {
        let f = write_config(r#"{ "dmsFile": "data/h5_dms.csv" }"#);
        let config = DmsConfig::from_file(f.path()).unwrap();
        assert!(config.escape_file.is_none());
        assert_eq!(config.site_header, "site");
        assert_eq!(config.files().count(), 1);
    }

    #[test]
    fn empty_site_header() {
        let f = write_config(r#"{ "dmsFile": "a.csv", "siteHeader": " " }"#);
        let err = DmsConfig::from_file(f.path()).unwrap_err();
        assert!(err.to_string().contains("invalid site header"));
    }

    #[test]
    fn empty_dms_path() {
        let f = write_config(r#"{ "dmsFile": "" }"#);
        let err = DmsConfig::from_file(f.path()).unwrap_err();
        assert!(err.to_string().contains("empty path for 'dmsFile'"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DmsConfig::from_file(Path::new("/nonexistent/dms.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
