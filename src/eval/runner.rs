//! Batch coordination: fan items out across a fixed worker pool.
//!
//! Workers take a round-robin slice of the input and send each finished
//! outcome back over a channel; no mutable state is shared. Completion
//! order is unspecified, so the collector restores the original input
//! order before building the result.

use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::info;

use crate::config::EvalConfig;
use crate::dataset::DatasetItem;
use crate::eval::item::{ItemOutcome, evaluate_item};
use crate::ocr::OcrBackend;

/// All outcomes of one batch run, in input order.
#[derive(Debug)]
pub struct BatchResult {
    pub outcomes: Vec<ItemOutcome>,
}

/// Runs the full batch across `worker_count` workers.
///
/// Produces exactly one outcome per input item regardless of worker count;
/// a failing item never aborts the batch. Progress is logged every
/// `progress_interval` collected outcomes.
pub fn run_batch(
    items: &[DatasetItem],
    worker_count: usize,
    backend: &dyn OcrBackend,
    scratch_dir: &Path,
    config: &EvalConfig,
) -> BatchResult {
    let worker_count = worker_count.clamp(1, items.len().max(1));
    let (sender, receiver) = mpsc::channel::<(usize, ItemOutcome)>();

    let mut indexed: Vec<(usize, ItemOutcome)> = Vec::with_capacity(items.len());
    thread::scope(|scope| {
        for worker in 0..worker_count {
            let sender = sender.clone();
            scope.spawn(move || {
                for (index, item) in items.iter().enumerate().skip(worker).step_by(worker_count) {
                    let outcome = evaluate_item(item, backend, scratch_dir, config);
                    if sender.send((index, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(sender);

        let interval = config.progress_interval.max(1);
        for received in receiver.iter() {
            indexed.push(received);
            if indexed.len() % interval == 0 {
                info!("processed {}/{} images", indexed.len(), items.len());
            }
        }
    });
    info!("processed {}/{} images", indexed.len(), items.len());

    indexed.sort_by_key(|(index, _)| *index);
    BatchResult {
        outcomes: indexed.into_iter().map(|(_, outcome)| outcome).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::aggregate::aggregate;
    use crate::eval::test_support::{StubBackend, StubReply, write_item};
    use tempfile::tempdir;

    fn make_dataset(dir: &Path, count: usize) -> Vec<DatasetItem> {
        (0..count)
            .map(|i| write_item(dir, dir, &format!("car_{i:03}"), &format!("KA{i:02}AB123")))
            .collect()
    }

    #[test]
    fn test_one_outcome_per_item_in_input_order() {
        let dir = tempdir().unwrap();
        let items = make_dataset(dir.path(), 9);
        let backend = StubBackend::new(StubReply::Text("KA00AB123".to_string()));
        let config = EvalConfig::default();

        for workers in [1, 4] {
            let result = run_batch(&items, workers, &backend, dir.path(), &config);

            assert_eq!(result.outcomes.len(), items.len());
            let ids: Vec<&str> = result.outcomes.iter().map(|o| o.image_id()).collect();
            let expected: Vec<&str> = items.iter().map(|i| i.image_id.as_str()).collect();
            assert_eq!(ids, expected);
        }
    }

    #[test]
    fn test_worker_count_does_not_change_aggregates() {
        let dir = tempdir().unwrap();
        let items = make_dataset(dir.path(), 12);
        // Mix of exact matches, misses, and one failure.
        let backend = StubBackend::new(StubReply::Text("KA00AB123".to_string()))
            .with_reply("car_003", StubReply::Text("KA03AB123".to_string()))
            .with_reply("car_007", StubReply::Fail);
        let config = EvalConfig::default();

        let single = aggregate(run_batch(&items, 1, &backend, dir.path(), &config));
        let pooled = aggregate(run_batch(&items, 5, &backend, dir.path(), &config));

        assert_eq!(single.total_items, pooled.total_items);
        assert_eq!(single.accuracy, pooled.accuracy);
        for bucket in crate::eval::Bucket::ALL {
            assert_eq!(
                single.bucket_counts.get(bucket),
                pooled.bucket_counts.get(bucket)
            );
        }
    }

    #[test]
    fn test_single_failure_is_isolated() {
        let dir = tempdir().unwrap();
        let items = make_dataset(dir.path(), 6);
        let backend = StubBackend::new(StubReply::Text("KA00AB123".to_string()))
            .with_reply("car_002", StubReply::Fail);
        let config = EvalConfig::default();

        let result = run_batch(&items, 3, &backend, dir.path(), &config);

        assert_eq!(result.outcomes.len(), 6);
        let no_plate: Vec<&str> = result
            .outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::NoPlate(_)))
            .map(|o| o.image_id())
            .collect();
        assert_eq!(no_plate, vec!["car_002"]);
        // Every other item still got scored normally.
        let scored = result
            .outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::Scored(_)))
            .count();
        assert_eq!(scored, 5);
    }

    #[test]
    fn test_empty_batch() {
        let dir = tempdir().unwrap();
        let backend = StubBackend::new(StubReply::Fail);
        let config = EvalConfig::default();

        let result = run_batch(&[], 4, &backend, dir.path(), &config);
        assert!(result.outcomes.is_empty());
    }
}
