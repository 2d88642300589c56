//! Entity recovery from annotated type declarations.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{annotation_names, file_stem};
use crate::model::{AssociationKind, Entity, Field};

/// Class-level markers that make a file an entity candidate.
static ENTITY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(?:Entity|Table|Document)\b").expect("valid regex"));

static CLASS_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:@\w+(?:\([^)]*\))?\s+)*(?:(?:public|protected|private|abstract|final|static)\s+)*class\s+(\w+)",
    )
    .expect("valid regex")
});

static NAMED_PERSISTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@(?:Table|Document)\s*\([^)]*?\b(?:name|collection|value)\s*=\s*"([^"]+)""#)
        .expect("valid regex")
});

static POSITIONAL_PERSISTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@(?:Table|Document)\s*\(\s*"([^"]+)""#).expect("valid regex")
});

/// Optional annotations, visibility, modifiers, type, name, initializer, `;`.
static FIELD_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"((?:@\w+(?:\s*\((?:[^()"]|"[^"]*"|\([^()]*\))*\))?\s*)*)\b(?:private|protected|public)\s+((?:(?:static|final|transient|volatile)\s+)*)([\w.]+(?:\s*<[^;=(){}]*>)?(?:\[\])*)\s+(\w+)\s*(?:=[^;]*)?;"#,
    )
    .expect("valid regex")
});

static MAPPED_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bmappedBy\s*=\s*"(\w+)""#).expect("valid regex"));

static TARGET_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"@(?:OneToMany|ManyToOne|OneToOne|ManyToMany)\s*\([^)]*?\btargetEntity\s*=\s*(?:\w+\.)*(\w+)\.class",
    )
    .expect("valid regex")
});

/// Markers that flag an identifier field.
const IDENTIFIER_TAGS: &[&str] = &["Id", "EmbeddedId"];

/// Association markers in precedence order.
const ASSOCIATION_TAGS: &[&str] = &["OneToMany", "ManyToOne", "OneToOne", "ManyToMany"];

/// Returns `true` if the text carries a class-level entity marker.
pub(crate) fn is_entity(content: &str) -> bool {
    ENTITY_MARKER.is_match(content)
}

/// Parses an entity candidate. Never fails; missing parts stay empty.
pub(crate) fn parse_entity(content: &str, source_path: &str) -> Entity {
    let decl = CLASS_DECL.captures(content);
    let name = decl
        .as_ref()
        .and_then(|c| c.get(1))
        .map_or_else(|| file_stem(source_path), |m| m.as_str().to_string());

    // Header: everything up to the end of the class declaration line.
    let header_end = decl.as_ref().and_then(|c| c.get(0)).map_or(content.len(), |m| m.end());
    let header = &content[..header_end];

    let structural_tags = header_tags(header);
    let persisted_name = NAMED_PERSISTED
        .captures(header)
        .or_else(|| POSITIONAL_PERSISTED.captures(header))
        .map(|c| c[1].to_string());

    let body = &content[header_end..];
    let fields = parse_fields(body);

    Entity { name, source_path: source_path.to_string(), fields, structural_tags, persisted_name }
}

/// Annotation names on lines that start with `@`.
fn header_tags(header: &str) -> BTreeSet<String> {
    header
        .lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with('@'))
        .flat_map(annotation_names)
        .collect()
}

fn parse_fields(body: &str) -> Vec<Field> {
    let mut fields: Vec<Field> = Vec::new();

    for caps in FIELD_DECL.captures_iter(body) {
        let modifiers = caps.get(2).map_or("", |m| m.as_str());
        if modifiers.split_whitespace().any(|m| m == "static") {
            continue;
        }

        let prefix = caps.get(1).map_or("", |m| m.as_str());
        let declared_type = normalize_type(&caps[3]);
        let name = caps[4].to_string();

        if fields.iter().any(|f| f.name == name) {
            tracing::debug!(field = %name, "duplicate field name ignored");
            continue;
        }

        let tags: BTreeSet<String> = annotation_names(prefix).collect();
        let is_identifier = IDENTIFIER_TAGS.iter().any(|t| tags.contains(*t));
        let association_kind = ASSOCIATION_TAGS
            .iter()
            .find(|t| tags.contains(**t))
            .and_then(|t| AssociationKind::from_marker(t));

        let mut field = Field::new(name, declared_type, tags, is_identifier, association_kind);
        if association_kind.is_some() {
            if let Some(target) = TARGET_ENTITY.captures(prefix) {
                field = field.with_target(&target[1]);
            }
            field.mapped_by = MAPPED_BY.captures(prefix).map(|c| c[1].to_string());
        }
        fields.push(field);
    }

    fields
}

/// Collapses whitespace inside a type token (`Map<String,  Long>` → `Map<String, Long>`).
fn normalize_type(raw: &str) -> String {
    let compact: String = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    compact.replace(" <", "<").replace("< ", "<").replace(" >", ">")
}
