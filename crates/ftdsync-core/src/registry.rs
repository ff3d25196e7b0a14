use dashmap::DashMap;

/// Issuer-keyed staging area for history lines produced during one run.
///
/// Producers push concurrently without external locking; each issuer's lines keep
/// their insertion order within a shard lock. The registry is drained once at flush.
#[derive(Debug, Default)]
pub struct PendingLines {
    queues: DashMap<String, Vec<String>>,
}

impl PendingLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, issuer: &str, line: String) {
        self.queues.entry(issuer.to_owned()).or_default().push(line);
    }

    pub fn issuer_count(&self) -> usize {
        self.queues.len()
    }

    pub fn line_count(&self) -> usize {
        self.queues.iter().map(|queue| queue.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Removes and returns every non-empty queue, ordered by issuer.
    pub fn drain(&self) -> Vec<(String, Vec<String>)> {
        let mut issuers: Vec<String> = self.queues.iter().map(|queue| queue.key().clone()).collect();
        issuers.sort();

        issuers
            .into_iter()
            .filter_map(|issuer| self.queues.remove(&issuer))
            .filter(|(_, lines)| !lines.is_empty())
            .collect()
    }
}
