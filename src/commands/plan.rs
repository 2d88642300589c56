//! `docshift plan` command.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::impact::{self, ImpactReport};
use crate::model::SourceModel;
use crate::plan::{normalize, NormalizedPlan};
use crate::recommend::{self, Recommendation};

/// Arguments of the `plan` command.
#[derive(Debug, Clone, Copy)]
pub struct PlanArgs<'a> {
    /// Root of the source tree.
    pub path: &'a Path,
    /// Saved recommendation text to use instead of the model.
    pub response: Option<&'a Path>,
    /// Plan from defaults without calling the model.
    pub offline: bool,
    /// Output format.
    pub format: OutputFormat,
    /// Output file; stdout when absent.
    pub output: Option<&'a Path>,
}

/// Structured output of the `plan` command.
#[derive(Debug, Serialize)]
struct PlanReport<'a> {
    plan: &'a NormalizedPlan,
    impact: &'a ImpactReport,
}

/// Execute the `plan` command.
///
/// # Errors
///
/// Returns an error string if the root is not an accessible directory, the
/// saved response cannot be read, or the output cannot be written. A failed
/// model call is not an error; the plan falls back to defaults.
pub fn run(ctx: &ServiceContext, settings: &Settings, args: &PlanArgs<'_>) -> Result<(), String> {
    let model = super::load_model(ctx, args.path)?;
    let recommendation = obtain_recommendation(ctx, settings, args, &model)?;
    let plan = normalize(&recommendation, &model);
    let impact = impact::estimate(ctx.fs.as_ref(), args.path, &model, &plan);

    let rendered = match args.format {
        OutputFormat::Text => render_text(&plan, &impact),
        structured => {
            super::render_structured(&PlanReport { plan: &plan, impact: &impact }, structured)?
        }
    };
    super::emit(ctx, args.output, &rendered)
}

fn obtain_recommendation(
    ctx: &ServiceContext,
    settings: &Settings,
    args: &PlanArgs<'_>,
    model: &SourceModel,
) -> Result<Recommendation, String> {
    if let Some(path) = args.response {
        let text = ctx
            .fs
            .read_to_string(path)
            .map_err(|e| format!("failed to read response {}: {e}", path.display()))?;
        return Ok(Recommendation::parse(&text));
    }
    if args.offline {
        tracing::info!("offline mode; planning from defaults");
        return Ok(Recommendation::Unstructured(String::new()));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start async runtime: {e}"))?;
    Ok(runtime.block_on(recommend::request(ctx.llm.as_ref(), settings, model)))
}

/// Plan summary followed by the per-file impact table.
fn render_text(plan: &NormalizedPlan, impact: &ImpactReport) -> String {
    let mut out = String::new();
    out.push_str(plan.summary_text.trim_end());
    out.push_str("\n\n## Impact\n\n");

    if impact.per_file.is_empty() {
        out.push_str("No files need changes.\n");
        return out;
    }

    let rows: Vec<Vec<String>> = impact
        .per_file
        .iter()
        .map(|c| vec![c.path.clone(), c.category.to_string(), c.complexity_tier.to_string()])
        .collect();
    out.push_str(&super::table(&["PATH", "CATEGORY", "TIER"], &rows));

    let s = &impact.summary;
    let _ = writeln!(
        out,
        "\n{} file(s): {} high, {} medium, {} low. Estimated effort: {} hours.",
        s.total_files, s.high_count, s.medium_count, s.low_count, s.estimated_effort_hours
    );
    out
}
