//! Serves recorded interactions back in order.

use std::collections::{HashMap, VecDeque};

use super::format::{Cassette, Interaction};

/// Replays interactions from a loaded cassette.
///
/// Each `port::method` pair has its own queue, so calls on different
/// methods may interleave differently from the recording.
pub struct CassetteReplayer {
    queues: HashMap<(String, String), VecDeque<Interaction>>,
    last: Option<Interaction>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<(String, String), VecDeque<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            queues
                .entry((interaction.port.clone(), interaction.method.clone()))
                .or_default()
                .push_back(interaction.clone());
        }
        Self { queues, last: None }
    }

    /// Return the next interaction for the given port and method.
    ///
    /// # Panics
    ///
    /// Panics if the cassette has no (more) interactions for the pair; the
    /// message lists the pairs that still have interactions left.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> &Interaction {
        let key = (port.to_string(), method.to_string());
        let next = self.queues.get_mut(&key).and_then(VecDeque::pop_front);

        let Some(interaction) = next else {
            let mut remaining: Vec<String> = self
                .queues
                .iter()
                .filter(|(_, q)| !q.is_empty())
                .map(|((p, m), q)| format!("{p}::{m} ({})", q.len()))
                .collect();
            remaining.sort();
            panic!(
                "Cassette exhausted: no interactions left for port={port:?} method={method:?}. \
                 Remaining: [{}]",
                remaining.join(", ")
            );
        };

        self.last.insert(interaction)
    }
}
