//! Line-based extraction from prose recommendations.

use std::sync::LazyLock;

use regex::Regex;

use super::{
    CodeTransformation, Collection, CollectionField, DomainConcept, FileCategory, MigrationStep,
};
use crate::recommend::{
    ConceptItem, RecommendationPayload, SchemaSection, StepItem, TransformationItem,
};

/// Relevance given to concepts recovered from prose.
pub(super) const EXTRACTED_RELEVANCE: &str = "Extracted from recommendation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Schema,
    Transformations,
    Steps,
    Concepts,
}

impl Section {
    fn from_header(lower: &str) -> Option<Self> {
        if lower.contains("mongodb schema") || lower.contains("schema design") {
            Some(Self::Schema)
        } else if lower.contains("code transformation") || lower.contains("code change") {
            Some(Self::Transformations)
        } else if lower.contains("migration step") || lower.contains("migration process") {
            Some(Self::Steps)
        } else if lower.contains("mongodb concept") || lower.contains("best practice") {
            Some(Self::Concepts)
        } else {
            None
        }
    }
}

static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]?\s*").expect("valid regex"));

static FROM_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfrom\s+(.+?)\s+to\s+(.+)$").expect("valid regex"));

/// Splits free text into sections by header phrases and turns the lines of
/// each section into prose items.
pub(super) fn split(text: &str) -> RecommendationPayload {
    let mut schema = Vec::new();
    let mut transformations = Vec::new();
    let mut steps = Vec::new();
    let mut concepts = Vec::new();
    let mut current = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(section) = Section::from_header(&line.to_lowercase()) {
            current = Some(section);
            continue;
        }
        match current {
            Some(Section::Schema) => schema.push(line),
            Some(Section::Transformations) => transformations.push(line),
            Some(Section::Steps) => steps.push(line),
            Some(Section::Concepts) => concepts.push(line),
            None => {}
        }
    }

    let prose = |lines: &[&str], numbered: bool| -> Vec<String> {
        lines
            .iter()
            .enumerate()
            .filter(|(i, line)| {
                is_bullet(line)
                    || (numbered && NUMBERED.is_match(line))
                    || (*i > 0 && lines[i - 1].ends_with(':'))
            })
            .map(|(_, line)| (*line).to_string())
            .collect()
    };

    RecommendationPayload {
        mongodb_schema: (!schema.is_empty()).then(|| SchemaSection::Prose {
            description: schema.join("\n"),
            embedding_strategy: None,
            indexing_strategy: None,
        }),
        code_transformations: non_empty(
            prose(&transformations, true)
                .into_iter()
                .map(|description| TransformationItem::Prose { description })
                .collect(),
        ),
        migration_steps: non_empty(
            prose(&steps, true)
                .into_iter()
                .map(|description| StepItem::Prose { description })
                .collect(),
        ),
        mongodb_concepts: non_empty(
            prose(&concepts, false)
                .into_iter()
                .map(|description| ConceptItem::Prose { description })
                .collect(),
        ),
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

fn is_bullet(line: &str) -> bool {
    line.starts_with(['-', '*', '•', '+'])
}

/// Removes a leading bullet or list number.
fn strip_marker(line: &str) -> &str {
    let line = line.trim();
    let line = line.trim_start_matches(['-', '*', '•', '+']).trim_start();
    if line.starts_with(|c: char| c.is_ascii_digit()) {
        if let Some(m) = NUMBERED.find(line) {
            return &line[m.end()..];
        }
    }
    line
}

fn clean_snippet(raw: &str) -> String {
    raw.trim().trim_matches('`').trim().trim_end_matches('.').trim().to_string()
}

/// Parses `from X to Y`, `X -> Y`, `X → Y`, `X => Y` or `X: Y`.
///
/// Returns `None` unless both sides are non-empty.
pub(super) fn transformation_from_text(text: &str) -> Option<CodeTransformation> {
    let body = strip_marker(text);
    let (before, after) = if let Some(caps) = FROM_TO.captures(body) {
        (clean_snippet(&caps[1]), clean_snippet(&caps[2]))
    } else {
        let (before, after) =
            ["->", "→", "=>", ":"].iter().find_map(|sep| body.split_once(*sep))?;
        (clean_snippet(before), clean_snippet(after))
    };
    if before.is_empty() || after.is_empty() {
        return None;
    }

    Some(CodeTransformation {
        file_category: FileCategory::infer(body),
        before_snippet: before,
        after_snippet: after,
        explanation: body.to_string(),
    })
}

/// Title is the text up to the first `.`.
pub(super) fn step_from_text(text: &str, order: u32) -> MigrationStep {
    let body = strip_marker(text);
    let title = body.split('.').next().map(str::trim).filter(|t| !t.is_empty()).unwrap_or(body);
    MigrationStep {
        order,
        title: title.to_string(),
        description: body.to_string(),
        example_snippet: None,
    }
}

/// Name is the text before `:`, or the first word.
pub(super) fn concept_from_text(text: &str) -> DomainConcept {
    let body = strip_marker(text);
    let name = match body.split_once(':') {
        Some((name, _)) => name,
        None => body.split_whitespace().next().unwrap_or_default(),
    };
    DomainConcept {
        name: name.trim().trim_matches(['*', '`']).trim().to_string(),
        description: body.to_string(),
        relevance: EXTRACTED_RELEVANCE.to_string(),
    }
}

/// Collections from a prose schema block.
///
/// A line ending in ` collection` opens a collection; `name: description`
/// or `name - description` lines below it become fields.
pub(super) fn collections_from_text(text: &str) -> Vec<Collection> {
    let mut collections: Vec<Collection> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let header = line.trim_end_matches(':').trim_end();
        if header.to_lowercase().ends_with(" collection") {
            let name = header
                .get(..header.len().saturating_sub(" collection".len()))
                .unwrap_or_default()
                .trim_start_matches(['#', '*', '-', '`', ' '])
                .trim_matches(['*', '`', ' '])
                .to_lowercase();
            collections.push(Collection { name, fields: Vec::new() });
            continue;
        }

        let Some(current) = collections.last_mut() else {
            continue;
        };
        let body = strip_marker(line);
        let Some((name, description)) =
            body.split_once(':').or_else(|| body.split_once(" - "))
        else {
            continue;
        };
        let name = name.trim().trim_matches(['`', '*']).trim();
        let description = description.trim();
        if name.is_empty() {
            continue;
        }
        current.fields.push(CollectionField {
            name: name.to_string(),
            field_type: guess_type(name, description).to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
        });
    }

    collections
}

fn guess_type(name: &str, description: &str) -> &'static str {
    let lower_name = name.to_lowercase();
    let words: Vec<String> = description
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    let has = |candidates: &[&str]| words.iter().any(|w| candidates.contains(&w.as_str()));

    if has(&["objectid"])
        || lower_name == "id"
        || lower_name == "_id"
        || lower_name.ends_with("_id")
    {
        "ObjectId"
    } else if has(&["array", "list", "arrays", "lists"]) {
        "Array"
    } else if words.iter().any(|w| w.contains("date") || w.contains("time")) {
        "Date"
    } else if has(&["number", "int", "integer", "long", "double", "decimal", "numeric"]) {
        "Number"
    } else {
        "String"
    }
}

/// The first line mentioning `keyword` plus up to four following non-empty
/// lines, joined with spaces.
pub(super) fn strategy_from_text(text: &str, keyword: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let start = lines.iter().position(|l| l.to_lowercase().contains(keyword))?;
    let end = (start + 5).min(lines.len());
    Some(lines[start..end].join(" "))
}
