//! Load and store archive documents.
//!
//! YAML (`.yml`/`.yaml`) is the canonical format. The older line-oriented
//! `.object` format (`dotted.key>value` per line) is importable read-only:
//! it is folded into a YAML value tree and fed through the same serde
//! model, so both formats share one schema.

use crate::archive::record::ArchiveRecord;
use crate::core::{Result, RotabError};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Extensions the dispatcher treats as archive documents.
pub const YAML_EXTENSIONS: [&str; 2] = ["yml", "yaml"];
/// Read-only legacy format extension.
pub const LEGACY_EXTENSION: &str = "object";

/// On-disk flavor of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Legacy,
}

/// Classify a path by extension; `None` for unrelated files.
pub fn format_for(path: &Path) -> Option<DocumentFormat> {
    let ext = path.extension()?.to_str()?;
    if YAML_EXTENSIONS.contains(&ext) {
        Some(DocumentFormat::Yaml)
    } else if ext == LEGACY_EXTENSION {
        Some(DocumentFormat::Legacy)
    } else {
        None
    }
}

/// Parse a canonical YAML document.
pub fn parse_yaml(text: &str) -> Result<ArchiveRecord> {
    let record: ArchiveRecord = serde_yaml::from_str(text)
        .map_err(|e| RotabError::config_load(format!("invalid document: {}", e)))?;
    record.validate()?;
    Ok(record)
}

/// Parse a legacy `.object` document: one `dotted.key>value` pair per
/// line, `#` comments and blank lines ignored.
pub fn parse_legacy(text: &str) -> Result<ArchiveRecord> {
    let mut root = Mapping::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once('>').ok_or_else(|| {
            RotabError::config_load(format!("line {}: expected key>value", lineno + 1))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(RotabError::config_load(format!("line {}: empty key", lineno + 1)));
        }
        insert_dotted(&mut root, key, scalar(value.trim()));
    }

    let record: ArchiveRecord = serde_yaml::from_value(Value::Mapping(root))
        .map_err(|e| RotabError::config_load(format!("invalid legacy document: {}", e)))?;
    record.validate()?;
    Ok(record)
}

/// Integers stay integers so counter and port fields deserialize.
fn scalar(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    Value::String(raw.to_string())
}

fn insert_dotted(root: &mut Mapping, dotted: &str, value: Value) {
    let mut keys = dotted.split('.').peekable();
    let mut node = root;
    while let Some(key) = keys.next() {
        let key = Value::String(key.to_string());
        if keys.peek().is_none() {
            node.insert(key, value);
            return;
        }
        // a scalar already written at this prefix is displaced by the tree
        if !matches!(node.get(&key), Some(Value::Mapping(_))) {
            node.insert(key.clone(), Value::Mapping(Mapping::new()));
        }
        node = match node.get_mut(&key) {
            Some(Value::Mapping(m)) => m,
            _ => unreachable!("just inserted a mapping at this key"),
        };
    }
}

/// Load one document, dispatching on its extension.
pub async fn load(path: &Path) -> Result<ArchiveRecord> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RotabError::config_load(format!("{}: {}", path.display(), e)))?;
    match format_for(path) {
        Some(DocumentFormat::Yaml) => parse_yaml(&text),
        Some(DocumentFormat::Legacy) => parse_legacy(&text),
        None => Err(RotabError::config_load(format!(
            "{}: not an archive document",
            path.display()
        ))),
    }
}

/// Overwrite the canonical document. Written to a temporary sibling and
/// renamed so a crash mid-write never truncates the canonical state.
pub async fn save(record: &ArchiveRecord, path: &Path) -> Result<()> {
    let text = serde_yaml::to_string(record)
        .map_err(|e| RotabError::state_save(format!("{}: {}", record.meta.name, e)))?;

    let tmp = path.with_extension("yml.tmp");
    tokio::fs::write(&tmp, text.as_bytes())
        .await
        .map_err(|e| RotabError::state_save(format!("{}: {}", tmp.display(), e)))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| RotabError::state_save(format!("{}: {}", path.display(), e)))?;

    tracing::debug!(archive = %record.meta.name, path = %path.display(), "state saved");
    Ok(())
}

/// Where a failed run's record is diverted instead of the canonical file.
pub fn error_path(record: &ArchiveRecord) -> PathBuf {
    record
        .storage
        .log_dir
        .join(format!("{}.error.yml", record.meta.name))
}

/// Write the error document, leaving the canonical one untouched.
pub async fn save_error_document(record: &ArchiveRecord) -> Result<PathBuf> {
    let path = error_path(record);
    let text = serde_yaml::to_string(record)
        .map_err(|e| RotabError::state_save(format!("{}: {}", record.meta.name, e)))?;
    tokio::fs::write(&path, text.as_bytes())
        .await
        .map_err(|e| RotabError::state_save(format!("{}: {}", path.display(), e)))?;
    tracing::warn!(archive = %record.meta.name, path = %path.display(), "state diverted to error document");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Rule;
    use pretty_assertions::assert_eq;

    const LEGACY_DOC: &str = "\
# wizard output
meta.name>prod
meta.description>production hosts
manager.managerHost>vault
manager.managerUser>backup
manager.managerPort>22
targets.partitions>h1:/etc,h2:/var/www
worker.default.scriptDir>/usr/local/backup/bin
worker.default.tclLibPath>/usr/local/backup/lib
schedule.Mon>daily
schedule.Tue>daily
schedule.Wed>daily
schedule.Thu>daily
schedule.Fri>weekly
schedule.Sat>none
schedule.Sun>monthly
storage.logDir>/var/log/rotab
storage.remoteDevice>/dev/nst0
storage.listFileDir>/var/lib/rotab
storage.dailySets>4
storage.weeklySets>3
storage.monthlySets>2
notifications.adminUser>ops@example.org
state.currentRule>none
state.status>none
";

    #[test]
    fn test_format_detection() {
        assert_eq!(format_for(Path::new("a/prod.yml")), Some(DocumentFormat::Yaml));
        assert_eq!(format_for(Path::new("prod.yaml")), Some(DocumentFormat::Yaml));
        assert_eq!(format_for(Path::new("prod.object")), Some(DocumentFormat::Legacy));
        assert_eq!(format_for(Path::new("prod.txt")), None);
        assert_eq!(format_for(Path::new("README")), None);
    }

    #[test]
    fn test_legacy_import() {
        let rec = parse_legacy(LEGACY_DOC).unwrap();
        assert_eq!(rec.meta.name, "prod");
        assert_eq!(rec.manager.manager_port, 22);
        assert_eq!(rec.targets.partitions.len(), 2);
        assert_eq!(rec.schedule.sun, Rule::Monthly);
        assert_eq!(rec.storage.daily_sets, 4);
    }

    #[test]
    fn test_legacy_rejects_junk_lines() {
        assert!(parse_legacy("this is not a pair\n").is_err());
        assert!(parse_legacy(">value without key\n").is_err());
    }

    #[test]
    fn test_yaml_and_legacy_agree() {
        let legacy = parse_legacy(LEGACY_DOC).unwrap();
        let yaml = serde_yaml::to_string(&legacy).unwrap();
        let reparsed = parse_yaml(&yaml).unwrap();
        assert_eq!(legacy, reparsed);
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = parse_legacy(LEGACY_DOC).unwrap();
        rec.state.current_set.daily = Some(2);

        let path = dir.path().join("prod.yml");
        save(&rec, &path).await.unwrap();
        let loaded = load(&path).await.unwrap();
        assert_eq!(rec, loaded);

        // saving again over the same path is an overwrite, not an append
        save(&loaded, &path).await.unwrap();
        assert_eq!(load(&path).await.unwrap(), rec);
    }

    #[tokio::test]
    async fn test_error_document_divert() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = parse_legacy(LEGACY_DOC).unwrap();
        rec.storage.log_dir = dir.path().to_path_buf();

        let written = save_error_document(&rec).await.unwrap();
        assert_eq!(written, dir.path().join("prod.error.yml"));
        assert!(written.exists());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_config_error() {
        let err = load(Path::new("/nonexistent/prod.yml")).await.unwrap_err();
        assert_eq!(err.category(), "configLoad");
    }
}
