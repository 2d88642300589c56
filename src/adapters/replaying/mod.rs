//! Replaying adapters that serve recorded interactions from a cassette.

pub mod filesystem;
pub mod llm;

use std::sync::Mutex;

use serde::de::DeserializeOwned;

use crate::cassette::replayer::CassetteReplayer;
use crate::ports::filesystem::PortError;

pub use filesystem::ReplayingFileSystem;
pub use llm::ReplayingLlmClient;

/// Pops the next recorded output for `port::method`.
///
/// # Panics
///
/// Panics if the cassette has no interaction left for the pair.
pub(crate) fn next_output(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> serde_json::Value {
    let mut guard = replayer.lock().expect("replayer lock poisoned");
    guard.next_interaction(port, method).output.clone()
}

/// Decodes a recorded `Result` output.
///
/// Mirror of `recording::record_result`: `{"Ok": v}` or `{"Err": "msg"}`.
/// Lowercase `ok`/`err` keys are accepted for hand-written cassettes, and a
/// bare value is treated as `Ok`.
pub(crate) fn replay_result<T: DeserializeOwned>(
    output: serde_json::Value,
    context: &str,
) -> Result<T, PortError> {
    if let Some(err) = output.get("Err").or_else(|| output.get("err")) {
        let msg = err.as_str().unwrap_or("unknown error").to_string();
        return Err(msg.into());
    }
    let value = match output.get("Ok").or_else(|| output.get("ok")) {
        Some(v) => v.clone(),
        None => output,
    };
    serde_json::from_value(value)
        .map_err(|e| format!("{context}: failed to deserialize: {e}").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_both_key_spellings() {
        let a: String = replay_result(json!({"Ok": "x"}), "t").unwrap();
        let b: String = replay_result(json!({"ok": "x"}), "t").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn err_becomes_port_error() {
        let r: Result<String, _> = replay_result(json!({"Err": "boom"}), "t");
        assert_eq!(r.unwrap_err().to_string(), "boom");
    }

    #[test]
    fn bare_value_is_ok() {
        let v: Vec<String> = replay_result(json!(["a.java"]), "t").unwrap();
        assert_eq!(v, vec!["a.java"]);
    }
}
