//! Landmark recordings: detector output captured to CSV for offline replay.
//!
//! One row per detected hand, no header, `#` starts a comment:
//!
//! ```text
//! timestamp_ns, hand_index, x0, y0, z0, ..., x20, y20, z20
//! ```
//!
//! Rows sharing a timestamp form one [`DetectionBatch`]. A row with only a
//! timestamp (or too few fields for a hand) records a frame in which nothing
//! was detected.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;
use tracing::{debug, warn};

use crate::hand::{DetectionBatch, HandSample, LANDMARKS_PER_HAND, Landmark, MAX_HANDS};

/// Timestamp, hand index and 21 × 3 coordinates.
const FIELDS_PER_HAND_ROW: usize = 2 + LANDMARKS_PER_HAND * 3;

/// Load a recording from a CSV file.
pub fn load_recording<P: AsRef<Path>>(path: P) -> Result<Vec<DetectionBatch>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    load_recording_from_reader(file).with_context(|| format!("Failed to read {}", path.display()))
}

/// Load a recording from any CSV source. Sequences are assigned in file order.
pub fn load_recording_from_reader<R: Read>(reader: R) -> Result<Vec<DetectionBatch>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut batches: Vec<DetectionBatch> = Vec::new();
    // (hand_index, sample) for the batch being assembled
    let mut pending: Vec<(u32, HandSample)> = Vec::new();

    for (row, rec) in rdr.records().enumerate() {
        let rec = rec?;
        if rec.is_empty() || rec[0].is_empty() {
            continue;
        }
        let ts: u64 = rec[0]
            .parse()
            .with_context(|| format!("Bad timestamp {:?} on row {}", &rec[0], row + 1))?;

        match batches.last() {
            Some(last) if last.timestamp_ns == ts => {}
            Some(last) if last.timestamp_ns > ts => {
                bail!(
                    "Timestamps must not decrease (row {}: {} after {})",
                    row + 1,
                    ts,
                    last.timestamp_ns
                );
            }
            _ => {
                finish_batch(batches.last_mut(), &mut pending);
                let sequence = batches.len() as u64;
                batches.push(DetectionBatch::empty(sequence, ts));
            }
        }

        if rec.len() < FIELDS_PER_HAND_ROW {
            continue;
        }

        let hand_index: u32 = rec[1]
            .parse()
            .with_context(|| format!("Bad hand index {:?} on row {}", &rec[1], row + 1))?;

        let coord = |field: usize| -> Result<f64> {
            rec[field].parse().with_context(|| {
                format!(
                    "Bad coordinate {:?} in field {} on row {}",
                    &rec[field],
                    field + 1,
                    row + 1
                )
            })
        };
        let mut landmarks = [Landmark::zeros(); LANDMARKS_PER_HAND];
        for (i, lm) in landmarks.iter_mut().enumerate() {
            let base = 2 + i * 3;
            *lm = Landmark::new(coord(base)?, coord(base + 1)?, coord(base + 2)?);
        }

        match HandSample::new(landmarks) {
            Some(sample) => pending.push((hand_index, sample)),
            None => warn!("Dropping non-finite hand on row {}", row + 1),
        }
    }
    finish_batch(batches.last_mut(), &mut pending);

    debug!("Loaded {} detection batches", batches.len());
    Ok(batches)
}

/// Move the pending hands into `batch`, ordered by hand index.
fn finish_batch(batch: Option<&mut DetectionBatch>, pending: &mut Vec<(u32, HandSample)>) {
    let Some(batch) = batch else {
        pending.clear();
        return;
    };
    pending.sort_by_key(|(index, _)| *index);
    if pending.len() > MAX_HANDS {
        warn!(
            "Batch at {} ns has {} hands, keeping {}",
            batch.timestamp_ns,
            pending.len(),
            MAX_HANDS
        );
        pending.truncate(MAX_HANDS);
    }
    batch.hands.extend(pending.drain(..).map(|(_, sample)| sample));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::WRIST;
    use approx::assert_relative_eq;

    fn hand_row(ts: u64, index: u32, x: f64) -> String {
        let coords: Vec<String> = (0..LANDMARKS_PER_HAND)
            .map(|i| format!("{},{},{}", x, 0.5 + i as f64 * 0.01, 0.0))
            .collect();
        format!("{},{},{}\n", ts, index, coords.join(","))
    }

    #[test]
    fn test_groups_rows_by_timestamp() {
        let mut csv = String::from("# timestamp_ns,hand_index,x0,y0,z0,...\n");
        csv += &hand_row(100, 1, 0.7);
        csv += &hand_row(100, 0, 0.3);
        csv += "200\n";
        csv += &hand_row(300, 0, 0.4);

        let batches = load_recording_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(batches.len(), 3);

        assert_eq!(batches[0].sequence, 0);
        assert_eq!(batches[0].timestamp_ns, 100);
        assert_eq!(batches[0].hands.len(), 2);
        // ordered by hand index, not row order
        assert_relative_eq!(batches[0].primary().unwrap().landmark(WRIST).x, 0.3);
        assert_relative_eq!(batches[0].secondary().unwrap().landmark(WRIST).x, 0.7);

        assert_eq!(batches[1].sequence, 1);
        assert!(batches[1].hands.is_empty());

        assert_eq!(batches[2].hands.len(), 1);
        assert_relative_eq!(batches[2].primary().unwrap().landmark(WRIST).y, 0.5);
    }

    #[test]
    fn test_extra_hands_truncated() {
        let csv = hand_row(10, 0, 0.1) + &hand_row(10, 1, 0.2) + &hand_row(10, 2, 0.3);
        let batches = load_recording_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].hands.len(), MAX_HANDS);
    }

    #[test]
    fn test_non_finite_hand_dropped() {
        let csv = hand_row(10, 0, 0.1).replacen("0.1", "NaN", 1);
        let batches = load_recording_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].hands.is_empty());
    }

    #[test]
    fn test_decreasing_timestamp_rejected() {
        let csv = hand_row(200, 0, 0.1) + &hand_row(100, 0, 0.1);
        assert!(load_recording_from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_bad_number_rejected() {
        let csv = hand_row(10, 0, 0.1).replacen("0.1", "abc", 1);
        assert!(load_recording_from_reader(csv.as_bytes()).is_err());
        assert!(load_recording_from_reader("xyz\n".as_bytes()).is_err());
    }

    #[test]
    fn test_bad_coordinate_names_row_and_field() {
        let csv = hand_row(10, 0, 0.1) + &hand_row(20, 0, 0.2).replacen("0.2", "oops", 1);
        let err = load_recording_from_reader(csv.as_bytes()).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("\"oops\""), "{}", msg);
        assert!(msg.contains("field 3 on row 2"), "{}", msg);
    }

    #[test]
    fn test_missing_file() {
        assert!(load_recording("/nonexistent/recording.csv").is_err());
    }
}
