//! Change-impact estimation.
//!
//! Combines the recovered model with a normalized plan to decide, for every
//! discovered entity, data-access and configuration file, how hard its
//! conversion is and which recommended rewrites apply to it.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{ConfigKind, ConfigurationFile, DataAccessUnit, Entity, SourceModel};
use crate::plan::{CodeTransformation, FileCategory, NormalizedPlan};
use crate::ports::FileSystem;

/// Content markers that make a configuration file a deployment descriptor.
const DEPLOYMENT_MARKERS: &[&str] = &["persistence-unit", "<packaging>"];

/// Conversion difficulty of one file. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    /// Mechanical change.
    Low,
    /// Needs some care.
    Medium,
    /// Substantial rework.
    High,
}

impl ComplexityTier {
    /// `High` above `high_above`, `Medium` above `medium_above`, else `Low`.
    #[must_use]
    pub fn from_count(count: usize, medium_above: usize, high_above: usize) -> Self {
        if count > high_above {
            Self::High
        } else if count > medium_above {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(label)
    }
}

/// Required change for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path relative to the analyzed root.
    pub path: String,
    /// Kind of file.
    pub category: FileCategory,
    /// Snippet of the first matching rewrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_snippet: Option<String>,
    /// Replacement of the first matching rewrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_snippet: Option<String>,
    /// What has to change.
    pub description: String,
    /// Conversion difficulty.
    pub complexity_tier: ComplexityTier,
}

/// Aggregate counts over all file changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactSummary {
    /// Number of file changes.
    pub total_files: usize,
    /// Entity files.
    pub entity_file_count: usize,
    /// Data-access files.
    pub data_access_file_count: usize,
    /// Configuration files.
    pub config_file_count: usize,
    /// Files at [`ComplexityTier::High`].
    pub high_count: usize,
    /// Files at [`ComplexityTier::Medium`].
    pub medium_count: usize,
    /// Files at [`ComplexityTier::Low`].
    pub low_count: usize,
    /// `high * 8 + medium * 4 + low`.
    pub estimated_effort_hours: usize,
}

impl ImpactSummary {
    /// Aggregates `changes`; the result does not depend on their order.
    #[must_use]
    pub fn from_changes(changes: &[FileChange]) -> Self {
        let count_category = |c: FileCategory| changes.iter().filter(|f| f.category == c).count();
        let count_tier =
            |t: ComplexityTier| changes.iter().filter(|f| f.complexity_tier == t).count();

        let high_count = count_tier(ComplexityTier::High);
        let medium_count = count_tier(ComplexityTier::Medium);
        let low_count = count_tier(ComplexityTier::Low);

        Self {
            total_files: changes.len(),
            entity_file_count: count_category(FileCategory::Entity),
            data_access_file_count: count_category(FileCategory::DataAccess),
            config_file_count: count_category(FileCategory::Configuration),
            high_count,
            medium_count,
            low_count,
            estimated_effort_hours: effort_hours(high_count, medium_count, low_count),
        }
    }
}

/// Effort estimate in hours from tier counts.
#[must_use]
pub fn effort_hours(high: usize, medium: usize, low: usize) -> usize {
    high * 8 + medium * 4 + low
}

/// Per-file changes plus their summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    /// Entity files first, then data-access files, then configuration files.
    pub per_file: Vec<FileChange>,
    /// Aggregates over `per_file`.
    pub summary: ImpactSummary,
}

/// Tier of an entity: the higher of the field axis and the association axis.
#[must_use]
pub fn entity_tier(entity: &Entity) -> ComplexityTier {
    ComplexityTier::from_count(entity.fields.len(), 5, 10)
        .max(ComplexityTier::from_count(entity.association_count(), 2, 4))
}

/// Tier of a data-access unit: the higher of the operation axis and the
/// custom query axis.
#[must_use]
pub fn data_access_tier(unit: &DataAccessUnit) -> ComplexityTier {
    ComplexityTier::from_count(unit.operations.len(), 3, 7)
        .max(ComplexityTier::from_count(unit.custom_query_count(), 1, 3))
}

/// Tier of a configuration file.
#[must_use]
pub fn configuration_tier(config: &ConfigurationFile) -> ComplexityTier {
    let deployment = DEPLOYMENT_MARKERS.iter().any(|m| config.raw_content.contains(m));
    if config.kind == ConfigKind::Properties || deployment {
        ComplexityTier::Medium
    } else {
        ComplexityTier::Low
    }
}

/// Estimates the change impact of `plan` on the files behind `model`.
///
/// Entity and data-access files are re-read through `fs` to match rewrites;
/// a file that cannot be read simply matches nothing.
#[must_use]
pub fn estimate(
    fs: &dyn FileSystem,
    root: &Path,
    model: &SourceModel,
    plan: &NormalizedPlan,
) -> ImpactReport {
    let mut per_file = Vec::new();

    for entity in &model.entities {
        let text = read(fs, root, &entity.source_path);
        per_file.push(change(
            &entity.source_path,
            FileCategory::Entity,
            entity_tier(entity),
            &text,
            plan,
            "Convert JPA entity to MongoDB document.",
        ));
    }

    for unit in &model.data_access_units {
        let text = read(fs, root, &unit.source_path);
        per_file.push(change(
            &unit.source_path,
            FileCategory::DataAccess,
            data_access_tier(unit),
            &text,
            plan,
            "Convert JPA repository to MongoDB repository.",
        ));
    }

    for config in &model.configurations {
        per_file.push(change(
            &config.source_path,
            FileCategory::Configuration,
            configuration_tier(config),
            &config.raw_content,
            plan,
            "Update database configuration for MongoDB.",
        ));
    }

    let summary = ImpactSummary::from_changes(&per_file);
    tracing::info!(
        files = summary.total_files,
        high = summary.high_count,
        medium = summary.medium_count,
        low = summary.low_count,
        effort_hours = summary.estimated_effort_hours,
        "impact estimated"
    );
    ImpactReport { per_file, summary }
}

fn read(fs: &dyn FileSystem, root: &Path, rel: &str) -> String {
    fs.read_to_string(&root.join(rel)).unwrap_or_else(|err| {
        tracing::debug!(path = %rel, error = %err, "file not readable for transformation matching");
        String::new()
    })
}

fn change(
    path: &str,
    category: FileCategory,
    complexity_tier: ComplexityTier,
    text: &str,
    plan: &NormalizedPlan,
    headline: &str,
) -> FileChange {
    let matches = matching(&plan.code_transformations, category, text);

    let description = if matches.is_empty() {
        format!("{headline} Structural conversion; no recommended rewrite matched this file.")
    } else {
        let rewrites: Vec<String> = matches
            .iter()
            .map(|t| format!("Replace '{}' with '{}'", t.before_snippet, t.after_snippet))
            .collect();
        format!("{headline} {}.", rewrites.join("; "))
    };

    let first = matches.first();
    FileChange {
        path: path.to_string(),
        category,
        before_snippet: first.map(|t| t.before_snippet.clone()),
        after_snippet: first.map(|t| t.after_snippet.clone()),
        description,
        complexity_tier,
    }
}

/// Transformations of `category` whose before snippet occurs in `text`,
/// ignoring case.
fn matching<'a>(
    transformations: &'a [CodeTransformation],
    category: FileCategory,
    text: &str,
) -> Vec<&'a CodeTransformation> {
    let haystack = text.to_lowercase();
    transformations
        .iter()
        .filter(|t| t.file_category == category)
        .filter(|t| {
            let needle = t.before_snippet.trim();
            !needle.is_empty() && haystack.contains(&needle.to_lowercase())
        })
        .collect()
}
