//! Replaying adapter for the `FileSystem` port.

use std::path::Path;
use std::sync::Mutex;

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::filesystem::{FileSystem, PortError};

/// Replays recorded filesystem operations from a cassette.
pub struct ReplayingFileSystem {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingFileSystem {
    /// Creates a new replaying filesystem from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl FileSystem for ReplayingFileSystem {
    fn read_to_string(&self, _path: &Path) -> Result<String, PortError> {
        replay_result(next_output(&self.replayer, "fs", "read_to_string"), "fs::read_to_string")
    }

    fn write(&self, _path: &Path, _contents: &str) -> Result<(), PortError> {
        let output = next_output(&self.replayer, "fs", "write");
        if output.is_null() {
            return Ok(());
        }
        replay_result(output, "fs::write")
    }

    fn is_dir(&self, _path: &Path) -> bool {
        next_output(&self.replayer, "fs", "is_dir")
            .as_bool()
            .expect("fs::is_dir: expected boolean output")
    }

    fn walk_files(&self, _root: &Path, _skip_dirs: &[String]) -> Result<Vec<String>, PortError> {
        replay_result(next_output(&self.replayer, "fs", "walk_files"), "fs::walk_files")
    }
}
