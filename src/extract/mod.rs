//! Source model extraction.
//!
//! Walks a directory tree through the [`FileSystem`] port, classifies each
//! candidate file as an entity, a data-access unit or a persistence
//! configuration, and parses it with regional pattern matchers. Nothing here
//! is a real parser: recovery is best-effort and tolerant of partial matches.

mod access;
mod configuration;
mod entity;

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::AnalysisError;
use crate::model::SourceModel;
use crate::ports::FileSystem;

/// Controls which parts of the tree are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Directory names that are never descended into (exact match).
    pub exclude_dir_names: Vec<String>,
    /// Extensions of annotated source files (lowercase, without dot).
    pub source_extensions: Vec<String>,
    /// Extensions of configuration candidates (lowercase, without dot).
    pub config_extensions: Vec<String>,
    /// Files larger than this are skipped.
    pub max_file_bytes: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            exclude_dir_names: [
                ".git",
                ".svn",
                ".hg",
                "target",
                "build",
                "out",
                "node_modules",
                ".gradle",
                ".mvn",
                ".idea",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            source_extensions: vec!["java".to_string()],
            config_extensions: ["properties", "xml", "yml", "yaml"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_file_bytes: 1024 * 1024,
        }
    }
}

/// Scans `root` and returns the recovered model with no relationships.
///
/// Relationships are derived afterwards by
/// [`resolve_relationships`](crate::resolve::resolve_relationships).
///
/// # Errors
///
/// Returns [`AnalysisError::InaccessibleRoot`] before reading anything if
/// `root` is not a readable directory, and [`AnalysisError::Walk`] if listing
/// the tree fails. Individual unreadable files are skipped.
pub fn analyze(
    fs: &dyn FileSystem,
    root: &Path,
    options: &ExtractOptions,
) -> Result<SourceModel, AnalysisError> {
    if !fs.is_dir(root) {
        return Err(AnalysisError::InaccessibleRoot { path: root.to_path_buf() });
    }

    let files = fs
        .walk_files(root, &options.exclude_dir_names)
        .map_err(|e| AnalysisError::Walk { path: root.to_path_buf(), message: e.to_string() })?;

    let mut model = SourceModel::default();

    for rel in files {
        if is_excluded(&rel, &options.exclude_dir_names) {
            continue;
        }
        let ext = extension(&rel);
        let is_source = options.source_extensions.contains(&ext);
        let is_config = options.config_extensions.contains(&ext);
        if !is_source && !is_config {
            continue;
        }

        let content = match fs.read_to_string(&root.join(&rel)) {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!(path = %rel, error = %err, "skipping unreadable file");
                continue;
            }
        };
        if content.len() > options.max_file_bytes {
            tracing::debug!(path = %rel, bytes = content.len(), "skipping oversized file");
            continue;
        }

        if is_source {
            classify_source(&mut model, &rel, &content);
        } else if let Some(config) = configuration::parse_configuration(&rel, &ext, &content) {
            tracing::debug!(path = %rel, kind = %config.kind, "configuration file");
            model.configurations.push(config);
        }
    }

    snap_entity_names(&mut model);

    tracing::info!(
        entities = model.entities.len(),
        data_access_units = model.data_access_units.len(),
        configurations = model.configurations.len(),
        "extraction finished"
    );
    Ok(model)
}

fn classify_source(model: &mut SourceModel, rel: &str, content: &str) {
    if entity::is_entity(content) {
        let parsed = entity::parse_entity(content, rel);
        if model.entity(&parsed.name).is_some() {
            tracing::warn!(entity = %parsed.name, path = %rel, "duplicate entity name skipped");
            return;
        }
        tracing::debug!(entity = %parsed.name, fields = parsed.fields.len(), path = %rel, "entity");
        model.entities.push(parsed);
    } else if access::is_data_access(content) {
        let unit = access::parse_data_access(content, rel);
        tracing::debug!(
            unit = %unit.name,
            operations = unit.operations.len(),
            path = %rel,
            "data access"
        );
        model.data_access_units.push(unit);
    }
}

/// Replaces each associated entity candidate with the known entity name that
/// matches it case-insensitively.
fn snap_entity_names(model: &mut SourceModel) {
    let names: Vec<String> = model.entities.iter().map(|e| e.name.clone()).collect();
    for unit in &mut model.data_access_units {
        let Some(candidate) = unit.associated_entity_name.as_deref() else {
            continue;
        };
        if let Some(known) = names.iter().find(|n| n.eq_ignore_ascii_case(candidate)) {
            unit.associated_entity_name = Some(known.clone());
        }
    }
}

fn is_excluded(rel: &str, exclude: &[String]) -> bool {
    let mut parts: Vec<&str> = rel.split('/').collect();
    parts.pop();
    parts.iter().any(|p| exclude.iter().any(|e| e == p))
}

fn extension(rel: &str) -> String {
    Path::new(rel)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

pub(crate) fn file_stem(rel: &str) -> String {
    Path::new(rel)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

static ANNOTATION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("valid regex"));

/// Names of all `@X` markers in `text`, in order of appearance.
pub(crate) fn annotation_names(text: &str) -> impl Iterator<Item = String> + '_ {
    ANNOTATION_NAME.captures_iter(text).map(|c| c[1].to_string())
}

/// Splits on commas that are not nested inside `<>` or `()`.
pub(crate) fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match ch {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::live::filesystem::LiveFileSystem;
    use crate::model::AssociationKind;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    const OWNER: &str = r#"
@Entity
@Table(name = "owners")
public class Owner {
    @Id
    private Long id;
    private String firstName;
    private String lastName;
    private String city;
    @OneToMany(mappedBy = "owner")
    private Set<Pet> pets;
}
"#;

    const OWNER_REPO: &str = r#"
public interface OwnerRepository extends JpaRepository<owner, Long> {
    @Query("SELECT o FROM Owner o WHERE o.lastName = :lastName")
    List<Owner> findByLastName(@Param("lastName") String lastName);
}
"#;

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = analyze(&LiveFileSystem, &missing, &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InaccessibleRoot { .. }));
    }

    #[test]
    fn classifies_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/main/java/demo/Owner.java", OWNER);
        write(root, "src/main/java/demo/OwnerRepository.java", OWNER_REPO);
        write(root, "src/main/java/demo/Util.java", "public class Util { private int x; }");
        write(
            root,
            "src/main/resources/application.properties",
            "spring.datasource.url=jdbc:h2:mem:x\n",
        );
        write(
            root,
            "src/main/resources/logback.xml",
            "<configuration><root level=\"info\"/></configuration>",
        );
        write(root, "target/classes/Owner.java", OWNER);
        write(root, "README.md", "@Entity");

        let model = analyze(&LiveFileSystem, root, &ExtractOptions::default()).unwrap();

        assert_eq!(model.entities.len(), 1);
        let owner = &model.entities[0];
        assert_eq!(owner.source_path, "src/main/java/demo/Owner.java");
        assert_eq!(owner.fields.len(), 5);

        assert_eq!(model.data_access_units.len(), 1);
        assert_eq!(model.data_access_units[0].associated_entity_name.as_deref(), Some("Owner"));

        let configs: Vec<&str> =
            model.configurations.iter().map(|c| c.source_path.as_str()).collect();
        assert_eq!(configs, vec!["src/main/resources/application.properties"]);
        assert!(model.relationships.is_empty());
    }

    #[test]
    fn three_plain_fields_and_one_association() {
        let dir = tempfile::tempdir().unwrap();
        let src = "@Entity\npublic class Vet {\n  private String a;\n  private String b;\n  \
                   private int c;\n  @OneToMany\n  private List<Specialty> specialties;\n}\n";
        write(dir.path(), "Vet.java", src);

        let model = analyze(&LiveFileSystem, dir.path(), &ExtractOptions::default()).unwrap();
        let vet = &model.entities[0];
        assert_eq!(vet.fields.len(), 4);
        assert_eq!(vet.association_count(), 1);
        assert_eq!(vet.fields[3].association_kind, Some(AssociationKind::ToMany));
    }

    #[test]
    fn duplicate_entity_names_keep_first() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/Owner.java", OWNER);
        write(dir.path(), "b/Owner.java", "@Entity\npublic class Owner { private String only; }");

        let model = analyze(&LiveFileSystem, dir.path(), &ExtractOptions::default()).unwrap();
        assert_eq!(model.entities.len(), 1);
        assert_eq!(model.entities[0].source_path, "a/Owner.java");
    }

    #[test]
    fn oversized_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Owner.java", OWNER);
        let options = ExtractOptions { max_file_bytes: 16, ..ExtractOptions::default() };

        let model = analyze(&LiveFileSystem, dir.path(), &options).unwrap();
        assert!(model.entities.is_empty());
    }

    #[test]
    fn excluded_components_are_rechecked() {
        assert!(is_excluded("a/node_modules/x.java", &["node_modules".to_string()]));
        assert!(!is_excluded("a/target.java", &["target".to_string()]));
    }

    #[test]
    fn splits_only_top_level_commas() {
        assert_eq!(
            split_top_level("@Param(\"id\") Long id, @Param(\"t\") Map<String, Long> tags"),
            vec!["@Param(\"id\") Long id", "@Param(\"t\") Map<String, Long> tags"]
        );
        assert_eq!(
            split_top_level("Map<String, Long> a, List<Pet> b"),
            vec!["Map<String, Long> a", "List<Pet> b"]
        );
        assert!(split_top_level("  ").is_empty());
    }
}
