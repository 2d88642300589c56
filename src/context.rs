//! Service context bundling all port trait objects.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::adapters::live::filesystem::LiveFileSystem;
use crate::adapters::live::llm::LiveLlmClient;
use crate::adapters::live::probe::LiveConnectivityProbe;
use crate::adapters::recording::{RecordingFileSystem, RecordingLlmClient};
use crate::adapters::replaying::{ReplayingFileSystem, ReplayingLlmClient};
use crate::cassette::format::Cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::config::Settings;
use crate::ports::filesystem::FileSystem;
use crate::ports::llm::LlmClient;
use crate::ports::probe::ConnectivityProbe;

/// Bundles all port trait objects into a single context.
///
/// Constructors wire up different adapter implementations (live, recording,
/// replaying). The connectivity probe is always live; cassettes only cover
/// the filesystem and the LLM.
pub struct ServiceContext {
    /// Filesystem for walking and reading the analyzed tree.
    pub fs: Box<dyn FileSystem>,
    /// LLM client for migration recommendations.
    pub llm: Box<dyn LlmClient>,
    /// Reachability check for the target database.
    pub probe: Box<dyn ConnectivityProbe>,
}

/// An in-progress cassette recording.
///
/// Call [`RecordingSession::finish`] after the context that feeds it has
/// been dropped.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Writes the cassette and returns its path.
    ///
    /// # Errors
    ///
    /// Returns an error string if the recording is still shared with a live
    /// context or the cassette cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "recording is still in use by a service context".to_string())?
            .into_inner()
            .map_err(|_| "recorder lock poisoned".to_string())?;
        recorder.finish().map_err(|e| format!("failed to write cassette: {e}"))
    }
}

impl ServiceContext {
    /// Creates a live context. The API key is taken from `settings`.
    #[must_use]
    pub fn live(settings: &Settings) -> Self {
        Self {
            fs: Box::new(LiveFileSystem),
            llm: Box::new(LiveLlmClient::new(settings.api_key.clone())),
            probe: Box::new(LiveConnectivityProbe),
        }
    }

    /// Creates a live context whose filesystem and LLM interactions are
    /// recorded to a cassette at `path`.
    ///
    /// `source` names what is being analyzed and is stored in the cassette.
    #[must_use]
    pub fn recording(settings: &Settings, path: &Path, source: &str) -> (Self, RecordingSession) {
        let recorder =
            Arc::new(Mutex::new(CassetteRecorder::new(path, "docshift-session", source)));

        let ctx = Self {
            fs: Box::new(RecordingFileSystem::new(Box::new(LiveFileSystem), Arc::clone(&recorder))),
            llm: Box::new(RecordingLlmClient::new(
                Box::new(LiveLlmClient::new(settings.api_key.clone())),
                Arc::clone(&recorder),
            )),
            probe: Box::new(LiveConnectivityProbe),
        };
        (ctx, RecordingSession { recorder })
    }

    /// Creates a context that replays filesystem and LLM interactions from
    /// the cassette at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette = Cassette::from_yaml(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;

        // Each port gets its own replayer so per-port cursors are independent.
        Ok(Self {
            fs: Box::new(ReplayingFileSystem::new(CassetteReplayer::new(&cassette))),
            llm: Box::new(ReplayingLlmClient::new(CassetteReplayer::new(&cassette))),
            probe: Box::new(LiveConnectivityProbe),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::Interaction;
    use crate::ports::llm::CompletionRequest;
    use chrono::Utc;
    use serde_json::json;

    fn write_cassette(path: &Path, interactions: Vec<Interaction>) {
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            source: "/repo".into(),
            interactions,
        };
        std::fs::write(path, serde_yaml::to_string(&cassette).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn replaying_context_serves_both_ports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.cassette.yaml");
        write_cassette(
            &path,
            vec![
                Interaction {
                    seq: 0,
                    port: "fs".into(),
                    method: "is_dir".into(),
                    input: json!({"path": "/repo"}),
                    output: json!(true),
                },
                Interaction {
                    seq: 1,
                    port: "llm".into(),
                    method: "complete".into(),
                    input: json!({}),
                    output: json!({
                        "Ok": {"text": "{}", "prompt_tokens": 1, "completion_tokens": 1}
                    }),
                },
            ],
        );

        let ctx = ServiceContext::replaying(&path).unwrap();
        assert!(ctx.fs.is_dir(Path::new("/repo")));
        let request = CompletionRequest {
            model: "m".into(),
            system: "s".into(),
            prompt: "p".into(),
            max_tokens: 10,
        };
        let response = ctx.llm.complete(&request).await.unwrap();
        assert_eq!(response.text, "{}");
    }

    #[test]
    fn replaying_missing_cassette_is_an_error() {
        let err =
            ServiceContext::replaying(Path::new("/nonexistent/run.cassette.yaml")).err().unwrap();
        assert!(err.contains("Failed to read cassette file"));
    }

    #[test]
    fn recording_session_writes_after_context_drop() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("A.java"), "class A {}").unwrap();
        let path = dir.path().join("out").join("run.cassette.yaml");

        let (ctx, session) = ServiceContext::recording(&Settings::default(), &path, "fixture");
        assert!(ctx.fs.is_dir(dir.path()));
        let text = ctx.fs.read_to_string(&dir.path().join("A.java")).unwrap();
        assert_eq!(text, "class A {}");
        drop(ctx);

        let written = session.finish().unwrap();
        let cassette = Cassette::from_yaml(&std::fs::read_to_string(written).unwrap()).unwrap();
        assert_eq!(cassette.source, "fixture");
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[1].method, "read_to_string");
    }

    #[test]
    fn finishing_while_context_alive_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.yaml");
        let (ctx, session) = ServiceContext::recording(&Settings::default(), &path, "x");
        assert!(session.finish().is_err());
        drop(ctx);
    }
}
