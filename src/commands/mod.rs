//! Command dispatch and handlers.

pub mod analyze;
pub mod plan;
pub mod probe;

use std::path::Path;

use serde::Serialize;

use crate::cli::{Command, OutputFormat};
use crate::config::Settings;
use crate::context::{RecordingSession, ServiceContext};
use crate::extract::{self, ExtractOptions};
use crate::model::SourceModel;
use crate::resolve::resolve_relationships;

/// Dispatch a parsed command to its handler.
///
/// Settings are loaded once here. When `DOCSHIFT_RECORD` is set, filesystem
/// and LLM interactions are recorded to a cassette at that path.
///
/// # Errors
///
/// Returns an error string if settings are invalid or the selected command
/// handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    let settings = Settings::load()?;

    let (ctx, session) = match &settings.record_path {
        Some(path) => {
            let (ctx, session) = ServiceContext::recording(&settings, path, &source_label(command));
            (ctx, Some(session))
        }
        None => (ServiceContext::live(&settings), None),
    };

    let result = dispatch_with_context(command, &ctx, &settings);

    // Finish recording after command completes (even on error)
    if let Some(session) = session {
        // Drop context first to release the recorder
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command with the given service context.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    settings: &Settings,
) -> Result<(), String> {
    match command {
        Command::Analyze { path, format, output } => {
            analyze::run(ctx, path, *format, output.as_deref())
        }
        Command::Plan { path, response, offline, format, output } => {
            let args = plan::PlanArgs {
                path,
                response: response.as_deref(),
                offline: *offline,
                format: *format,
                output: output.as_deref(),
            };
            plan::run(ctx, settings, &args)
        }
        Command::Probe { uri, timeout_secs } => probe::run(ctx, uri, *timeout_secs),
    }
}

fn source_label(command: &Command) -> String {
    match command {
        Command::Analyze { path, .. } | Command::Plan { path, .. } => path.display().to_string(),
        Command::Probe { .. } => "probe".to_string(),
    }
}

/// Finish a recording session and print the cassette path.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let path = session.finish()?;
    eprintln!("Recording saved to: {}", path.display());
    Ok(())
}

/// Extracts and resolves the model for `root`.
pub(crate) fn load_model(ctx: &ServiceContext, root: &Path) -> Result<SourceModel, String> {
    let model = extract::analyze(ctx.fs.as_ref(), root, &ExtractOptions::default())
        .map_err(|e| e.to_string())?;
    Ok(resolve_relationships(model))
}

/// Serializes `value` for the structured formats.
pub(crate) fn render_structured<T: Serialize>(
    value: &T,
    format: OutputFormat,
) -> Result<String, String> {
    match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| format!("failed to render YAML: {e}"))
        }
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| format!("failed to render JSON: {e}")),
        OutputFormat::Text => Err("text output has no structured rendering".to_string()),
    }
}

/// Writes `rendered` to `output` through the filesystem port, or to stdout.
pub(crate) fn emit(
    ctx: &ServiceContext,
    output: Option<&Path>,
    rendered: &str,
) -> Result<(), String> {
    match output {
        Some(path) => {
            ctx.fs
                .write(path, rendered)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("Wrote {}", path.display());
            Ok(())
        }
        None => {
            print!("{rendered}");
            Ok(())
        }
    }
}

/// Left-aligned table with a dashed rule under the header.
pub(crate) fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| rows.iter().map(|r| r[i].len()).max().unwrap_or(0).max(h.len()))
        .collect();

    let line = |cells: Vec<String>| -> String {
        let padded: Vec<String> =
            cells.iter().zip(&widths).map(|(c, &w)| format!("{c:<w$}")).collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(headers.iter().map(ToString::to_string).collect());
    out.push_str(&line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in rows {
        out.push_str(&line(row.clone()));
    }
    out
}
