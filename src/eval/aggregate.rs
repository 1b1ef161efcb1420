//! Bucketed aggregation of batch outcomes.
//!
//! Scored records fall into five severity buckets by discrepancy value.
//! No-plate and error outcomes are tracked as disjoint reports: they are
//! never counted in the bucket distribution or the accuracy denominator.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::eval::item::{DiscrepancyRecord, ErrorRecord, ItemOutcome, NoPlateRecord};
use crate::eval::runner::BatchResult;

/// Severity class of a scored discrepancy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucket {
    Zero,
    One,
    Two,
    Three,
    FourPlus,
}

impl Bucket {
    pub const ALL: [Bucket; 5] = [
        Bucket::Zero,
        Bucket::One,
        Bucket::Two,
        Bucket::Three,
        Bucket::FourPlus,
    ];

    pub fn from_discrepancy(discrepancy: usize) -> Self {
        match discrepancy {
            0 => Bucket::Zero,
            1 => Bucket::One,
            2 => Bucket::Two,
            3 => Bucket::Three,
            _ => Bucket::FourPlus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Bucket::Zero => "0D",
            Bucket::One => "1D",
            Bucket::Two => "2D",
            Bucket::Three => "3D",
            Bucket::FourPlus => "4D+",
        }
    }

    fn index(self) -> usize {
        match self {
            Bucket::Zero => 0,
            Bucket::One => 1,
            Bucket::Two => 2,
            Bucket::Three => 3,
            Bucket::FourPlus => 4,
        }
    }
}

/// Count of scored records per bucket.
#[derive(Clone, Debug, Default)]
pub struct BucketCounts([usize; 5]);

impl BucketCounts {
    pub fn record(&mut self, bucket: Bucket) {
        self.0[bucket.index()] += 1;
    }

    pub fn get(&self, bucket: Bucket) -> usize {
        self.0[bucket.index()]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Bucket, usize)> + '_ {
        Bucket::ALL.into_iter().map(|bucket| (bucket, self.get(bucket)))
    }
}

// Serialized as a label-to-count map so the JSON reads like the report table.
impl Serialize for BucketCounts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(Bucket::ALL.len()))?;
        for (bucket, count) in self.iter() {
            map.serialize_entry(bucket.label(), &count)?;
        }
        map.end()
    }
}

/// Everything the report sinks need from one batch run.
#[derive(Clone, Debug, Serialize)]
pub struct BatchSummary {
    /// Total inputs, scored or not
    pub total_items: usize,
    pub bucket_counts: BucketCounts,
    /// Share of scored records with zero discrepancy; 1.0 when nothing scored
    pub accuracy: f64,
    /// All scored records, in input order
    pub scored: Vec<DiscrepancyRecord>,
    pub no_plate: Vec<NoPlateRecord>,
    pub errors: Vec<ErrorRecord>,
}

/// Buckets the outcomes of a batch run and computes summary accuracy.
///
/// Runs single-threaded after all workers are done; record order follows
/// the batch result, which the coordinator has already restored to input
/// order.
pub fn aggregate(result: BatchResult) -> BatchSummary {
    let total_items = result.outcomes.len();
    let mut scored = Vec::new();
    let mut no_plate = Vec::new();
    let mut errors = Vec::new();

    for outcome in result.outcomes {
        match outcome {
            ItemOutcome::Scored(record) => scored.push(record),
            ItemOutcome::NoPlate(record) => no_plate.push(record),
            ItemOutcome::Failed(record) => errors.push(record),
        }
    }

    let mut bucket_counts = BucketCounts::default();
    for record in &scored {
        bucket_counts.record(Bucket::from_discrepancy(record.discrepancy));
    }

    let accuracy = if bucket_counts.total() == 0 {
        1.0
    } else {
        bucket_counts.get(Bucket::Zero) as f64 / bucket_counts.total() as f64
    };

    BatchSummary {
        total_items,
        bucket_counts,
        accuracy,
        scored,
        no_plate,
        errors,
    }
}
