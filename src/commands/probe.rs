//! `docshift probe` command.

use std::time::Duration;

use crate::context::ServiceContext;

/// Execute the `probe` command.
///
/// Prints the outcome and its details.
///
/// # Errors
///
/// Returns an error string naming the failure category when the server is
/// not reachable.
pub fn run(ctx: &ServiceContext, uri: &str, timeout_secs: u64) -> Result<(), String> {
    let result = ctx.probe.probe(uri, Duration::from_secs(timeout_secs));

    println!("{}", result.message);
    for (key, value) in &result.details {
        println!("  {key}: {value}");
    }

    if result.success {
        Ok(())
    } else {
        let category = result.details.get("error_type").map_or("unexpected", String::as_str);
        Err(format!("probe failed ({category})"))
    }
}
