use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Score entry handed to the external progress store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: i64,
    pub module: String,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

impl ProgressRecord {
    pub fn new(user_id: i64, module: impl Into<String>, score: f64) -> Self {
        Self {
            user_id,
            module: module.into(),
            score,
            timestamp: Utc::now(),
        }
    }
}

/// Where progress records go. Implemented by the hosting application.
pub trait ProgressSink {
    fn record(&mut self, record: &ProgressRecord) -> Result<()>;
}

/// Keeps records in memory, newest last.
#[derive(Debug, Default)]
pub struct MemoryProgressSink {
    records: Vec<ProgressRecord>,
}

impl MemoryProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ProgressRecord] {
        &self.records
    }

    pub fn for_user(&self, user_id: i64) -> impl Iterator<Item = &ProgressRecord> + '_ {
        self.records.iter().filter(move |r| r.user_id == user_id)
    }
}

impl ProgressSink for MemoryProgressSink {
    fn record(&mut self, record: &ProgressRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_filters_by_user() -> Result<()> {
        let mut sink = MemoryProgressSink::new();
        sink.record(&ProgressRecord::new(1, "segmentation", 80.0))?;
        sink.record(&ProgressRecord::new(2, "segmentation", 55.5))?;
        sink.record(&ProgressRecord::new(1, "segmentation", 92.3))?;

        let scores: Vec<f64> = sink.for_user(1).map(|r| r.score).collect();
        assert_eq!(scores, vec![80.0, 92.3]);
        assert_eq!(sink.records().len(), 3);
        Ok(())
    }

    #[test]
    fn test_record_serializes_timestamp() -> Result<()> {
        let record = ProgressRecord::new(7, "segmentation", 100.0);
        let json = serde_json::to_value(&record)?;
        assert_eq!(json["module"], "segmentation");
        assert!(json["timestamp"].as_str().is_some());
        Ok(())
    }
}
