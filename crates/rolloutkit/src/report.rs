//! Reporter seam for sync output
//!
//! Sync operations never print. They describe what they do through a
//! [`Reporter`], so a CLI can render it and tests can capture it.

use crate::batch::SettledRecord;

/// Which sync operation produced a settled batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Delete,
    Persist,
}

impl Operation {
    /// Past-tense label for summaries
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Delete => "deleted",
            Self::Persist => "updated",
        }
    }
}

/// Receives operator-facing output from sync operations
pub trait Reporter: Send {
    /// A line of diagnostic text
    fn line(&mut self, text: &str);

    /// The settled outcomes of a batch
    fn settled(&mut self, operation: Operation, records: &[SettledRecord]);
}

/// A single reported event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Line(String),
    Settled {
        operation: Operation,
        records: Vec<SettledRecord>,
    },
}

/// Reporter that keeps every record in memory
#[derive(Debug, Default)]
pub struct CaptureReporter {
    pub records: Vec<Record>,
}

impl CaptureReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reported events
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// The text lines only
    pub fn lines(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|r| match r {
                Record::Line(text) => Some(text.as_str()),
                Record::Settled { .. } => None,
            })
            .collect()
    }

    /// Settled records of every batch, flattened
    pub fn settled_records(&self) -> Vec<&SettledRecord> {
        self.records
            .iter()
            .flat_map(|r| match r {
                Record::Settled { records, .. } => records.iter().collect(),
                Record::Line(_) => Vec::new(),
            })
            .collect()
    }
}

impl Reporter for CaptureReporter {
    fn line(&mut self, text: &str) {
        self.records.push(Record::Line(text.to_string()));
    }

    fn settled(&mut self, operation: Operation, records: &[SettledRecord]) {
        self.records.push(Record::Settled {
            operation,
            records: records.to_vec(),
        });
    }
}
