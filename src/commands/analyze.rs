//! `docshift analyze` command.

use std::fmt::Write as _;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::context::ServiceContext;
use crate::model::SourceModel;

/// Execute the `analyze` command.
///
/// # Errors
///
/// Returns an error string if the root is not an accessible directory or
/// the output cannot be written.
pub fn run(
    ctx: &ServiceContext,
    path: &Path,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<(), String> {
    let model = super::load_model(ctx, path)?;
    let rendered = match format {
        OutputFormat::Text => render_text(&model),
        structured => super::render_structured(&model, structured)?,
    };
    super::emit(ctx, output, &rendered)
}

/// Counts plus one row per entity.
fn render_text(model: &SourceModel) -> String {
    let mut out = String::new();
    let counts = [
        ("Entities:", model.entities.len()),
        ("Data-access units:", model.data_access_units.len()),
        ("Configuration files:", model.configurations.len()),
        ("Relationships:", model.relationships.len()),
    ];
    for (label, count) in counts {
        let _ = writeln!(out, "{label:<21}{count}");
    }

    if model.entities.is_empty() {
        return out;
    }

    let rows: Vec<Vec<String>> = model
        .entities
        .iter()
        .map(|e| {
            vec![
                e.name.clone(),
                e.fields.len().to_string(),
                e.association_count().to_string(),
                e.source_path.clone(),
            ]
        })
        .collect();
    out.push('\n');
    out.push_str(&super::table(&["ENTITY", "FIELDS", "ASSOCIATIONS", "PATH"], &rows));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    const OWNER: &str = r"
@Entity
@Table(name = 'owners')
public class Owner {
    @Id
    @GeneratedValue
    private Integer id;
    private String city;
    @OneToMany(mappedBy = 'owner')
    private Set<Pet> pets;
}
";

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Owner.java"), OWNER.replace('\'', "\"")).unwrap();
        dir
    }

    #[test]
    fn text_lists_entities() {
        let dir = fixture();
        let ctx = ServiceContext::live(&Settings::default());
        let model = crate::commands::load_model(&ctx, dir.path()).unwrap();
        let text = render_text(&model);
        assert!(text.contains("Entities:            1"));
        assert!(text.contains("Relationships:       1"));
        assert!(text.contains("Owner"));
        assert!(text.contains("ASSOCIATIONS"));
    }

    #[test]
    fn writes_json_to_output_file() {
        let dir = fixture();
        let out = dir.path().join("report").join("model.json");
        let ctx = ServiceContext::live(&Settings::default());
        run(&ctx, dir.path(), OutputFormat::Json, Some(&out)).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(written["entities"][0]["name"], "Owner");
        assert_eq!(written["entities"][0]["persisted_name"], "owners");
    }

    #[test]
    fn missing_root_is_an_error() {
        let ctx = ServiceContext::live(&Settings::default());
        let err = run(&ctx, Path::new("/nonexistent/docshift/root"), OutputFormat::Text, None)
            .unwrap_err();
        assert!(err.contains("not an accessible directory"));
    }
}
