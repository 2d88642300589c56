//! Repository / DAO recovery.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{file_stem, split_top_level};
use crate::model::{DataAccessUnit, Operation, Parameter};

static NAMED_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:interface|class)\s+\w*(?:Repository|Dao|DAO)\b").expect("valid regex")
});

static EXTENDS_REPOSITORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bextends\s+[\w.]*Repository\b").expect("valid regex"));

/// Type declaration at the start of a line, so prose in doc comments never
/// matches.
static TYPE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:@\w+(?:\([^)]*\))?\s+)*(?:(?:public|protected|private|abstract|final|static)\s+)*(?:interface|class)\s+(\w+)",
    )
    .expect("valid regex")
});

/// Annotations, modifiers, optional type parameters, return type, name,
/// parameter list, optional `throws`, `;`.
static OPERATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"((?:@\w+(?:\s*\((?:[^()"]|"(?:[^"\\]|\\.)*"|\([^()]*\))*\))?\s*)*)(?:\b(?:public|protected|private|abstract|static|default|final|synchronized)\s+)*(?:<[^>]*>\s+)?\b([\w.]+(?:\s*<[^;(){}=]*>)?(?:\[\])*)\s+(\w+)\s*\(((?:[^()"]|"[^"]*"|\([^()]*\))*)\)\s*(?:throws\s+[\w.,\s]+?)?\s*;"#,
    )
    .expect("valid regex")
});

static QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@Query\s*\(\s*(?:value\s*=\s*)?"((?:[^"\\]|\\.)*)""#).expect("valid regex")
});

static PARAM_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@\w+(?:\s*\((?:[^()"]|"[^"]*")*\))?"#).expect("valid regex")
});

/// Tokens that the operation pattern can pick up as a return type but never are.
const NOT_A_TYPE: &[&str] = &["return", "new", "throw", "else", "case", "package", "import"];

/// Name suffixes stripped to guess the served entity.
const UNIT_SUFFIXES: &[&str] = &["Repository", "Dao", "DAO"];

/// Returns `true` if the text declares a repository or DAO style type.
pub(crate) fn is_data_access(content: &str) -> bool {
    NAMED_UNIT.is_match(content) || EXTENDS_REPOSITORY.is_match(content)
}

/// Parses a data-access candidate. Never fails; missing parts stay empty.
pub(crate) fn parse_data_access(content: &str, source_path: &str) -> DataAccessUnit {
    let decl = TYPE_DECL.captures(content);
    let name = decl
        .as_ref()
        .and_then(|c| c.get(1))
        .map_or_else(|| file_stem(source_path), |m| m.as_str().to_string());

    let body_start = decl.as_ref().and_then(|c| c.get(0)).map_or(0, |m| m.end());
    let after_decl = &content[body_start..];
    let clause = extends_clause(after_decl);

    let base_interfaces: BTreeSet<String> =
        clause.map(split_top_level).unwrap_or_default().into_iter().map(base_name).collect();

    let associated_entity_name = clause
        .and_then(first_generic_argument)
        .or_else(|| strip_suffix(&name));

    let body = after_decl.find('{').map_or("", |i| &after_decl[i + 1..]);
    let operations = parse_operations(body);

    DataAccessUnit {
        name,
        source_path: source_path.to_string(),
        associated_entity_name,
        base_interfaces,
        operations,
    }
}

/// Text between `extends` and the opening brace or `implements`.
fn extends_clause(after_decl: &str) -> Option<&str> {
    let header = after_decl.split('{').next().unwrap_or_default();
    let (_, rest) = header.split_once("extends")?;
    let clause = rest.split("implements").next().unwrap_or_default().trim();
    (!clause.is_empty()).then_some(clause)
}

/// `org.x.JpaRepository<Owner, Long>` → `JpaRepository`.
fn base_name(raw: &str) -> String {
    let without_generics = raw.split('<').next().unwrap_or_default().trim();
    without_generics.rsplit('.').next().unwrap_or_default().to_string()
}

fn first_generic_argument(clause: &str) -> Option<String> {
    let open = clause.find('<')?;
    let inner = &clause[open + 1..];
    let first = split_top_level(inner).into_iter().next()?;
    let first = first.trim_end_matches('>').split('<').next().unwrap_or_default().trim();
    let simple = first.rsplit('.').next().unwrap_or_default();
    (!simple.is_empty() && simple.chars().all(|c| c.is_alphanumeric() || c == '_'))
        .then(|| simple.to_string())
}

fn strip_suffix(name: &str) -> Option<String> {
    UNIT_SUFFIXES
        .iter()
        .find_map(|s| name.strip_suffix(*s))
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

fn parse_operations(body: &str) -> Vec<Operation> {
    OPERATION
        .captures_iter(body)
        .filter_map(|caps| {
            let return_type = caps[2].split_whitespace().collect::<Vec<_>>().join(" ");
            if NOT_A_TYPE.contains(&return_type.as_str()) {
                return None;
            }
            let prefix = caps.get(1).map_or("", |m| m.as_str());
            let custom_query = QUERY.captures(prefix).map(|q| q[1].to_string());
            Some(Operation {
                name: caps[3].to_string(),
                return_type,
                parameters: parse_parameters(&caps[4]),
                custom_query,
            })
        })
        .collect()
}

fn parse_parameters(list: &str) -> Vec<Parameter> {
    split_top_level(list)
        .into_iter()
        .filter_map(|fragment| {
            let cleaned = PARAM_ANNOTATION.replace_all(fragment, " ");
            let tokens: Vec<&str> =
                cleaned.split_whitespace().filter(|t| *t != "final").collect();
            let (name, type_tokens) = tokens.split_last()?;
            if type_tokens.is_empty() {
                return None;
            }
            Some(Parameter { name: (*name).to_string(), declared_type: type_tokens.join(" ") })
        })
        .collect()
}
