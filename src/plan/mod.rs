//! Normalized migration plan.
//!
//! [`normalize`] turns any [`Recommendation`](crate::recommend::Recommendation)
//! into a complete [`NormalizedPlan`]: every section is filled, either from
//! the recommendation or from deterministic defaults derived from the
//! [`SourceModel`](crate::model::SourceModel).

mod defaults;
mod normalize;
mod sections;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use normalize::normalize;

/// The plan handed to the impact estimator and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPlan {
    /// Proposed document schema.
    pub target_schema: TargetSchema,
    /// Code rewrites to apply.
    pub code_transformations: Vec<CodeTransformation>,
    /// Ordered migration steps.
    pub steps: Vec<MigrationStep>,
    /// Concepts worth explaining to the team.
    pub domain_concepts: Vec<DomainConcept>,
    /// Human-readable summary, computed from the other sections.
    pub summary_text: String,
}

/// Proposed document schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSchema {
    /// Collections, never empty when the model has entities.
    pub collections: Vec<Collection>,
    /// Embedding vs. referencing guidance, never empty.
    pub embedding_strategy: String,
    /// Index guidance, when any was given or derivable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexing_strategy: Option<String>,
}

/// A document collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection name.
    pub name: String,
    /// Document fields.
    pub fields: Vec<CollectionField>,
}

/// A document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionField {
    /// Field name.
    pub name: String,
    /// Document type (`ObjectId`, `String`, `Number`, `Date`, `Array`, ...).
    #[serde(rename = "type")]
    pub field_type: String,
    /// Optional note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Kind of source file a transformation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    /// Persistent entity classes.
    Entity,
    /// Repository / DAO types.
    DataAccess,
    /// Persistence configuration.
    Configuration,
    /// Anything else.
    General,
}

impl FileCategory {
    /// Guesses the category from a file name, a category label or a sentence.
    #[must_use]
    pub fn infer(text: &str) -> Self {
        let lower = text.to_lowercase().replace(['_', ' ', '-'], "");
        if lower.contains("dataaccess") || lower.contains("repository") || lower.contains("dao") {
            Self::DataAccess
        } else if lower.contains("entity") || lower.contains("model") {
            Self::Entity
        } else if lower.contains("config")
            || lower.contains("properties")
            || lower.contains("application")
        {
            Self::Configuration
        } else {
            Self::General
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Entity => "entity",
            Self::DataAccess => "data_access",
            Self::Configuration => "configuration",
            Self::General => "general",
        };
        f.write_str(label)
    }
}

/// A before/after code rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeTransformation {
    /// Kind of file the rewrite applies to.
    pub file_category: FileCategory,
    /// Text to look for.
    pub before_snippet: String,
    /// Replacement text.
    pub after_snippet: String,
    /// Why the rewrite is needed.
    pub explanation: String,
}

/// One ordered migration step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationStep {
    /// 1-based position.
    pub order: u32,
    /// Short title.
    pub title: String,
    /// What to do.
    pub description: String,
    /// Optional snippet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_snippet: Option<String>,
}

/// A concept relevant to the migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConcept {
    /// Concept name.
    pub name: String,
    /// Explanation.
    pub description: String,
    /// Why it matters here.
    pub relevance: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_inference() {
        assert_eq!(FileCategory::infer("Entity.java"), FileCategory::Entity);
        assert_eq!(FileCategory::infer("Update the domain model"), FileCategory::Entity);
        assert_eq!(FileCategory::infer("OwnerRepository.java"), FileCategory::DataAccess);
        assert_eq!(FileCategory::infer("data_access"), FileCategory::DataAccess);
        assert_eq!(FileCategory::infer("application.properties"), FileCategory::Configuration);
        assert_eq!(FileCategory::infer("pom.xml"), FileCategory::General);
    }

    #[test]
    fn categories_serialize_snake_case() {
        assert_eq!(serde_json::to_string(&FileCategory::DataAccess).unwrap(), "\"data_access\"");
        assert_eq!(FileCategory::Configuration.to_string(), "configuration");
    }
}
