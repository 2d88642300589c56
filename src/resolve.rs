//! Relationship derivation from association fields.

use crate::model::{Relationship, SourceModel};

/// Returns `model` with unresolved association targets inferred from their
/// declared types and one [`Relationship`] per association field.
///
/// Bidirectional pairs (`Owner.pets` / `Pet.owner`) stay as two records.
#[must_use]
pub fn resolve_relationships(mut model: SourceModel) -> SourceModel {
    let mut relationships = Vec::new();

    for entity in &mut model.entities {
        for field in &mut entity.fields {
            let Some(kind) = field.association_kind else {
                continue;
            };
            if field.target_entity_name.is_none() {
                field.target_entity_name = infer_target(&field.declared_type);
                if field.target_entity_name.is_none() {
                    tracing::debug!(
                        entity = %entity.name,
                        field = %field.name,
                        declared_type = %field.declared_type,
                        "association target could not be inferred"
                    );
                }
            }
            // Unresolved targets keep the raw declared type.
            let target_entity = field
                .target_entity_name
                .clone()
                .unwrap_or_else(|| field.declared_type.trim().to_string());
            relationships.push(Relationship {
                source_entity: entity.name.clone(),
                target_entity,
                kind,
                source_field_name: field.name.clone(),
                target_field_name: field.mapped_by.clone(),
            });
        }
    }

    tracing::info!(relationships = relationships.len(), "relationships resolved");
    model.relationships = relationships;
    model
}

/// Innermost generic argument (last one for maps), with array suffix and
/// package qualifier stripped.
///
/// `Set<Pet>` → `Pet`, `Map<String, List<Visit>>` → `Visit`,
/// `org.example.Owner[]` → `Owner`.
fn infer_target(declared_type: &str) -> Option<String> {
    let mut current = declared_type.trim();
    while let (Some(open), Some(close)) = (current.find('<'), current.rfind('>')) {
        if close <= open {
            break;
        }
        let inner = &current[open + 1..close];
        current = last_top_level_argument(inner).trim();
    }
    let simple = current.trim_end_matches("[]").trim().rsplit('.').next().unwrap_or_default();
    let valid = !simple.is_empty()
        && simple.chars().next().is_some_and(char::is_alphabetic)
        && simple.chars().all(|c| c.is_alphanumeric() || c == '_');
    valid.then(|| simple.to_string())
}

fn last_top_level_argument(inner: &str) -> &str {
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => start = i + 1,
            _ => {}
        }
    }
    &inner[start..]
}
