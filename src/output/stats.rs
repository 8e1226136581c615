//! Status statistics from the record store

use crate::model::UrlStatus;
use crate::storage::RecordStore;
use crate::InsightError;
use std::collections::HashMap;

/// Count of URL records per status
#[derive(Debug, Clone, Default)]
pub struct StatusStatistics {
    pub total_urls: u64,
    pub by_status: HashMap<UrlStatus, u64>,
}

impl StatusStatistics {
    pub fn count(&self, status: UrlStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Share of records that reached `done`, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total_urls == 0 {
            return 0.0;
        }
        (self.count(UrlStatus::Done) as f64 / self.total_urls as f64) * 100.0
    }
}

/// Loads per-status counts from storage
pub fn load_statistics(store: &dyn RecordStore) -> Result<StatusStatistics, InsightError> {
    let records = store.list_urls()?;

    let mut by_status = HashMap::new();
    for record in &records {
        *by_status.entry(record.status).or_insert(0) += 1;
    }

    Ok(StatusStatistics {
        total_urls: records.len() as u64,
        by_status,
    })
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &StatusStatistics) {
    println!("=== URL Statistics ===\n");
    println!("  Total URLs: {}", stats.total_urls);

    for status in UrlStatus::all_statuses() {
        let count = stats.count(status);
        if count > 0 {
            println!("  {}: {}", status, count);
        }
    }

    println!(
        "\nSuccess Rate: {:.1}% ({} / {} URLs analyzed)",
        stats.success_rate(),
        stats.count(UrlStatus::Done),
        stats.total_urls
    );
}
