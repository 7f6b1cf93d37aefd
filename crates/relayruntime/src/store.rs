use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relaycore::{Execution, WorkflowExecution};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// A run record the store can index and evict.
pub trait Tracked: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
    fn owner(&self) -> &str;
    fn started_at(&self) -> DateTime<Utc>;
    fn finished_at(&self) -> Option<DateTime<Utc>>;
    fn is_terminal(&self) -> bool;
}

impl Tracked for Execution {
    fn id(&self) -> &str {
        &self.id
    }
    fn owner(&self) -> &str {
        &self.user_id
    }
    fn started_at(&self) -> DateTime<Utc> {
        self.start_time
    }
    fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }
    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl Tracked for WorkflowExecution {
    fn id(&self) -> &str {
        &self.id
    }
    fn owner(&self) -> &str {
        &self.user_id
    }
    fn started_at(&self) -> DateTime<Utc> {
        self.start_time
    }
    fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }
    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Storage for run records. Orchestration only ever talks to this trait.
#[async_trait]
pub trait ExecutionStore<T: Tracked>: Send + Sync {
    async fn get(&self, id: &str) -> Option<T>;

    /// Insert or replace the record with the same id.
    async fn put(&self, record: T);

    /// Records started by `owner`, newest first.
    async fn list_by_owner(&self, owner: &str) -> Vec<T>;
}

/// How long finished records stay around.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    /// Upper bound on stored records. Only terminal records are evicted to honour it.
    pub max_records: usize,
    /// Terminal records older than this (by end time) are dropped.
    pub ttl: Option<Duration>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_records: 1000,
            ttl: Some(Duration::from_secs(24 * 60 * 60)),
        }
    }
}

/// In-process store. Running records are never evicted.
pub struct MemoryStore<T: Tracked> {
    records: RwLock<HashMap<String, T>>,
    policy: RetentionPolicy,
}

impl<T: Tracked> MemoryStore<T> {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            policy,
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn evict(&self, records: &mut HashMap<String, T>) {
        if let Some(ttl) = self.policy.ttl {
            let now = Utc::now();
            records.retain(|id, r| {
                let expired = r.is_terminal()
                    && r.finished_at()
                        .and_then(|end| (now - end).to_std().ok())
                        .is_some_and(|age| age > ttl);
                if expired {
                    tracing::debug!(execution_id = %id, "Expired run record");
                }
                !expired
            });
        }

        if records.len() <= self.policy.max_records {
            return;
        }

        let mut evictable: Vec<(String, DateTime<Utc>)> = records
            .values()
            .filter(|r| r.is_terminal())
            .map(|r| (r.id().to_string(), r.started_at()))
            .collect();
        evictable.sort_by_key(|(_, started)| *started);

        let excess = records.len() - self.policy.max_records;
        for (id, _) in evictable.into_iter().take(excess) {
            records.remove(&id);
            tracing::debug!(execution_id = %id, "Evicted run record");
        }
    }
}

impl<T: Tracked> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new(RetentionPolicy::default())
    }
}

#[async_trait]
impl<T: Tracked> ExecutionStore<T> for MemoryStore<T> {
    async fn get(&self, id: &str) -> Option<T> {
        self.records.read().await.get(id).cloned()
    }

    async fn put(&self, record: T) {
        let mut records = self.records.write().await;
        records.insert(record.id().to_string(), record);
        self.evict(&mut records);
    }

    async fn list_by_owner(&self, owner: &str) -> Vec<T> {
        let mut owned: Vec<T> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.owner() == owner)
            .cloned()
            .collect();
        owned.sort_by_key(|r| std::cmp::Reverse(r.started_at()));
        owned
    }
}
