//! Recommendation boundary.
//!
//! The generative model answers with JSON when it follows instructions and
//! with prose when it does not. [`Recommendation`] captures both shapes so
//! that [`crate::plan::normalize`] never has to guess what kind of value it
//! was handed.

pub mod prompt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Settings;
use crate::model::SourceModel;
use crate::ports::llm::{CompletionRequest, LlmClient};

/// Top-level keys that mark a structured recommendation.
pub const SECTION_KEYS: [&str; 4] =
    ["mongodb_schema", "code_transformations", "migration_steps", "mongodb_concepts"];

/// A raw recommendation, either structured or free text.
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    /// At least one recognized section was present in a JSON object.
    WellFormed(RecommendationPayload),
    /// Anything else, kept verbatim for line-based extraction.
    Unstructured(String),
}

impl Recommendation {
    /// Classifies raw model output.
    ///
    /// The JSON candidate is the slice from the first `{` to the last `}`, so
    /// surrounding prose or code fences are tolerated.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let object = json_slice(text)
            .and_then(|slice| serde_json::from_str::<Value>(slice).ok())
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            });

        match object {
            Some(map) if SECTION_KEYS.iter().any(|k| map.contains_key(*k)) => {
                Self::WellFormed(RecommendationPayload::from_object(&map))
            }
            _ => Self::Unstructured(text.to_string()),
        }
    }
}

fn json_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// The four recognized sections. A section that is absent, or whose value
/// does not have any accepted shape, is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationPayload {
    /// Target schema design.
    pub mongodb_schema: Option<SchemaSection>,
    /// Code rewrite suggestions.
    pub code_transformations: Option<Vec<TransformationItem>>,
    /// Ordered migration steps.
    pub migration_steps: Option<Vec<StepItem>>,
    /// Domain concepts worth explaining.
    pub mongodb_concepts: Option<Vec<ConceptItem>>,
}

impl RecommendationPayload {
    /// Reads each section independently; items that match no accepted shape
    /// are dropped without affecting their siblings.
    #[must_use]
    pub fn from_object(map: &Map<String, Value>) -> Self {
        Self {
            mongodb_schema: map
                .get("mongodb_schema")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            code_transformations: map.get("code_transformations").and_then(items),
            migration_steps: map.get("migration_steps").and_then(items),
            mongodb_concepts: map.get("mongodb_concepts").and_then(items),
        }
    }
}

fn items<T: serde::de::DeserializeOwned>(value: &Value) -> Option<Vec<T>> {
    let Value::Array(raw) = value else {
        tracing::debug!("recommendation section is not a list");
        return None;
    };
    Some(raw.iter().filter_map(|item| serde_json::from_value(item.clone()).ok()).collect())
}

/// Accepted shapes of the schema section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaSection {
    /// Explicit collection list.
    Structured {
        /// Proposed collections.
        collections: Vec<CollectionSpec>,
        /// Embedding vs. referencing guidance.
        #[serde(default)]
        embedding_strategy: Option<String>,
        /// Index guidance.
        #[serde(default)]
        indexing_strategy: Option<String>,
    },
    /// Prose description of the schema.
    Prose {
        /// Free text, parsed like an unstructured schema block.
        description: String,
        /// Embedding vs. referencing guidance.
        #[serde(default)]
        embedding_strategy: Option<String>,
        /// Index guidance.
        #[serde(default)]
        indexing_strategy: Option<String>,
    },
    /// Strategies only.
    Strategies {
        /// Embedding vs. referencing guidance.
        #[serde(default)]
        embedding_strategy: Option<String>,
        /// Index guidance.
        #[serde(default)]
        indexing_strategy: Option<String>,
    },
}

/// A proposed collection as the model describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// Collection name.
    pub name: String,
    /// Proposed document fields.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    /// Proposed indexes, kept loosely typed.
    #[serde(default)]
    pub indexes: Vec<Value>,
}

/// A proposed document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name.
    pub name: String,
    /// Document type name.
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    /// Optional note.
    #[serde(default)]
    pub description: Option<String>,
}

fn default_field_type() -> String {
    "String".to_string()
}

/// Accepted shapes of a code transformation item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransformationItem {
    /// Several changes grouped under one file.
    PerFile {
        /// File name or kind the changes apply to.
        file: String,
        /// Individual rewrites.
        changes: Vec<ChangeSpec>,
    },
    /// One rewrite with before/after text.
    Flat {
        /// Category or file kind, when given.
        #[serde(default, alias = "file_type")]
        file_category: Option<String>,
        /// Text to replace.
        #[serde(alias = "from", alias = "before_snippet")]
        before: String,
        /// Replacement text.
        #[serde(alias = "to", alias = "after_snippet")]
        after: String,
        /// Why the rewrite is needed.
        #[serde(default)]
        explanation: Option<String>,
    },
    /// A sentence describing the rewrite.
    Prose {
        /// Free text such as `Change @Entity to @Document`.
        description: String,
    },
}

/// One rewrite inside a [`TransformationItem::PerFile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSpec {
    /// Text to replace.
    #[serde(default)]
    pub from: String,
    /// Replacement text.
    #[serde(default)]
    pub to: String,
    /// Why the rewrite is needed.
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Accepted shapes of a migration step item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepItem {
    /// Numbered step with a title.
    Structured {
        /// Position as given by the model.
        #[serde(alias = "order")]
        step: u32,
        /// Short title.
        title: String,
        /// What to do.
        description: String,
        /// Optional snippet.
        #[serde(default, alias = "example_snippet")]
        code_example: Option<String>,
    },
    /// A sentence describing the step.
    Prose {
        /// Free text; the title is the first sentence.
        description: String,
    },
}

/// Accepted shapes of a concept item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConceptItem {
    /// Named concept.
    Structured {
        /// Concept name.
        #[serde(alias = "name")]
        concept: String,
        /// Explanation.
        description: String,
        /// Why it matters for this migration.
        #[serde(default)]
        relevance: Option<String>,
    },
    /// A sentence describing the concept.
    Prose {
        /// Free text; the name is the text before `:` or the first word.
        description: String,
    },
}

/// System instruction sent with every recommendation request.
pub const SYSTEM_PROMPT: &str = "You are an expert Java developer specializing in database \
migrations from relational databases to MongoDB.";

/// Asks the model for a recommendation about `model`.
///
/// Never fails: a failed call is logged and yields `Unstructured("")`, which
/// normalizes to the default plan.
pub async fn request(
    llm: &dyn LlmClient,
    settings: &Settings,
    model: &SourceModel,
) -> Recommendation {
    let request = CompletionRequest {
        model: settings.model.clone(),
        system: SYSTEM_PROMPT.to_string(),
        prompt: prompt::render_prompt(model),
        max_tokens: settings.max_tokens,
    };

    match llm.complete(&request).await {
        Ok(response) => {
            tracing::info!(
                prompt_tokens = response.prompt_tokens,
                completion_tokens = response.completion_tokens,
                "recommendation received"
            );
            let recommendation = Recommendation::parse(&response.text);
            if matches!(recommendation, Recommendation::Unstructured(_)) {
                tracing::warn!(
                    "recommendation is not structured JSON; falling back to line extraction"
                );
            }
            recommendation
        }
        Err(err) => {
            tracing::warn!(error = %err, "recommendation request failed; using defaults");
            Recommendation::Unstructured(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::filesystem::PortError;
    use crate::ports::llm::{CompletionFuture, CompletionResponse};
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn fenced_json_is_well_formed() {
        let text = "Here is the plan:\n```json\n{\"migration_steps\": [{\"step\": 1, \"title\": \"Go\", \"description\": \"Do it.\"}]}\n```\n";
        let Recommendation::WellFormed(payload) = Recommendation::parse(text) else {
            panic!("expected structured recommendation");
        };
        assert!(payload.mongodb_schema.is_none());
        let steps = payload.migration_steps.unwrap();
        assert_eq!(steps.len(), 1);
        assert!(matches!(&steps[0], StepItem::Structured { step: 1, .. }));
    }

    #[test]
    fn prose_and_unrelated_json_are_unstructured() {
        assert_eq!(
            Recommendation::parse("Migration steps:\n1. Install"),
            Recommendation::Unstructured("Migration steps:\n1. Install".into())
        );
        assert!(matches!(
            Recommendation::parse("{\"answer\": 42}"),
            Recommendation::Unstructured(_)
        ));
        assert!(matches!(Recommendation::parse("} nope {"), Recommendation::Unstructured(_)));
        assert!(matches!(Recommendation::parse(""), Recommendation::Unstructured(_)));
    }

    #[test]
    fn malformed_section_does_not_sink_siblings() {
        let map = json!({
            "mongodb_schema": 7,
            "code_transformations": [
                {"file": "Entity.java", "changes": [{"from": "@Entity", "to": "@Document"}]},
                {"file_type": "Repository", "before": "JpaRepository", "after": "MongoRepository"},
                {"description": "Change @Table to @Document"},
                42
            ],
            "mongodb_concepts": [{"name": "Indexing", "description": "Index hot fields."}]
        });
        let Value::Object(map) = map else { unreachable!() };
        let payload = RecommendationPayload::from_object(&map);

        assert!(payload.mongodb_schema.is_none());
        let transformations = payload.code_transformations.unwrap();
        assert_eq!(transformations.len(), 3);
        assert!(matches!(transformations[0], TransformationItem::PerFile { .. }));
        assert!(matches!(transformations[1], TransformationItem::Flat { .. }));
        assert!(matches!(transformations[2], TransformationItem::Prose { .. }));
        assert!(matches!(
            &payload.mongodb_concepts.unwrap()[0],
            ConceptItem::Structured { concept, relevance: None, .. } if concept == "Indexing"
        ));
        assert!(payload.migration_steps.is_none());
    }

    #[test]
    fn schema_shapes() {
        let structured: SchemaSection = serde_json::from_value(json!({
            "collections": [{"name": "owners", "fields": [{"name": "id", "type": "ObjectId"}, {"name": "city"}]}],
            "embedding_strategy": "Embed pets"
        }))
        .unwrap();
        let SchemaSection::Structured { collections, embedding_strategy, .. } = structured else {
            panic!("expected collections");
        };
        assert_eq!(collections[0].fields[1].field_type, "String");
        assert_eq!(embedding_strategy.as_deref(), Some("Embed pets"));

        let prose: SchemaSection =
            serde_json::from_value(json!({"description": "Owners collection"})).unwrap();
        assert!(matches!(prose, SchemaSection::Prose { .. }));

        let bare: SchemaSection =
            serde_json::from_value(json!({"indexing_strategy": "lastName"})).unwrap();
        assert!(matches!(bare, SchemaSection::Strategies { .. }));
    }

    struct ScriptedLlm {
        answer: Mutex<Option<Result<String, String>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl LlmClient for ScriptedLlm {
        fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
            self.seen.lock().unwrap().push(request.clone());
            let answer =
                self.answer.lock().unwrap().take().unwrap_or_else(|| Err("drained".into()));
            Box::pin(async move {
                answer
                    .map(|text| CompletionResponse {
                        text,
                        prompt_tokens: 10,
                        completion_tokens: 5,
                    })
                    .map_err(|e| -> PortError { e.into() })
            })
        }
    }

    fn scripted(answer: Result<&str, &str>) -> ScriptedLlm {
        ScriptedLlm {
            answer: Mutex::new(Some(answer.map(String::from).map_err(String::from))),
            seen: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn request_uses_settings_and_parses() {
        let llm = scripted(Ok("{\"mongodb_concepts\": []}"));
        let settings = Settings { model: "m-1".into(), max_tokens: 99, ..Settings::default() };

        let recommendation = request(&llm, &settings, &SourceModel::default()).await;
        assert!(matches!(recommendation, Recommendation::WellFormed(_)));

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen[0].model, "m-1");
        assert_eq!(seen[0].max_tokens, 99);
        assert_eq!(seen[0].system, SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn failed_request_degrades_to_empty() {
        let llm = scripted(Err("401 unauthorized"));
        let recommendation = request(&llm, &Settings::default(), &SourceModel::default()).await;
        assert_eq!(recommendation, Recommendation::Unstructured(String::new()));
    }
}
