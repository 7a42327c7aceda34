use crate::creatives::CreativeRow;
use crate::processor::{Outcome, RowProcessor};
use log::info;

#[derive(Debug, Clone)]
pub struct Success {
    pub row: CreativeRow,
    pub ad_id: u64,
    pub creative_id: u64,
}

#[derive(Debug, Clone)]
pub struct Failure {
    pub row: CreativeRow,
    pub reason: String,
}

/// Outcomes of a batch, split by kind, each in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub successes: Vec<Success>,
    pub failures: Vec<Failure>,
}

impl BatchReport {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success {
                row,
                ad_id,
                creative_id,
            } => self.successes.push(Success {
                row,
                ad_id,
                creative_id,
            }),
            Outcome::Failure { row, reason } => self.failures.push(Failure { row, reason }),
        }
    }

    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }
}

/// Runs every row through the processor, one at a time and in order. A failed
/// row is recorded and the batch moves on.
pub async fn process_rows(processor: &RowProcessor<'_>, rows: Vec<CreativeRow>) -> BatchReport {
    let total = rows.len();
    let mut report = BatchReport::default();

    for (index, row) in rows.into_iter().enumerate() {
        info!("Row {}/{} (line {})", index + 1, total, row.line);
        report.record(processor.process(row).await);
    }

    info!(
        "Processed {} rows: {} ads created, {} failures",
        report.total(),
        report.successes.len(),
        report.failures.len()
    );

    report
}
