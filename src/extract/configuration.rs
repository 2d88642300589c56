//! Persistence configuration detection.

use std::path::Path;

use crate::model::{ConfigKind, ConfigurationFile};

/// File-name fragments that mark a persistence configuration file.
const NAME_MARKERS: &[&str] = &[
    "persistence.xml",
    "application.properties",
    "application.yml",
    "application.yaml",
    "hibernate.cfg.xml",
    "database",
    "datasource",
];

/// Content fragments (lowercase) that mark persistence settings.
const CONTENT_MARKERS: &[&str] = &[
    "jdbc",
    "datasource",
    "database",
    "hibernate",
    "jpa",
    "spring.datasource",
    "persistence-unit",
];

/// Returns the configuration record if the file holds persistence settings.
pub(crate) fn parse_configuration(
    rel: &str,
    ext: &str,
    content: &str,
) -> Option<ConfigurationFile> {
    let kind = ConfigKind::from_extension(ext)?;
    let file_name = Path::new(rel)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let by_name = NAME_MARKERS.iter().any(|m| file_name.contains(m));
    let by_content = || {
        let lower = content.to_lowercase();
        CONTENT_MARKERS.iter().any(|m| lower.contains(m))
    };
    if !by_name && !by_content() {
        return None;
    }

    Some(ConfigurationFile { source_path: rel.to_string(), kind, raw_content: content.to_string() })
}
