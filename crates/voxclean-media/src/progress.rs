//! Parsing of FFmpeg `-progress` output.
//!
//! FFmpeg writes blocks of `key=value` lines, each block closed by
//! `progress=continue` or `progress=end`.

use serde::{Deserialize, Serialize};

const PROGRESS_KEYS: &[&str] = &[
    "bitrate",
    "total_size",
    "out_time_us",
    "out_time_ms",
    "out_time",
    "dup_frames",
    "drop_frames",
    "speed",
    "progress",
];

/// Snapshot of an encode in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Audio encoded so far, in seconds
    pub out_time_secs: f64,
    /// Same position as FFmpeg prints it
    pub out_time: String,
    /// Multiple of realtime; 0.0 until FFmpeg reports one
    pub speed: f64,
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Fraction of a clip of `duration_secs` encoded so far, in `[0, 1]`.
    pub fn fraction_of(&self, duration_secs: f64) -> f64 {
        if duration_secs <= 0.0 {
            return 0.0;
        }
        (self.out_time_secs / duration_secs).clamp(0.0, 1.0)
    }

    /// Seconds left for a clip of `duration_secs` at the current speed.
    pub fn remaining_secs(&self, duration_secs: f64) -> Option<f64> {
        if self.speed <= 0.0 {
            return None;
        }
        Some((duration_secs - self.out_time_secs).max(0.0) / self.speed)
    }

    fn apply(&mut self, key: &str, value: &str) {
        match key {
            // Both carry microseconds
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_secs = us as f64 / 1_000_000.0;
                }
            }
            "out_time" => self.out_time = value.to_string(),
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    self.speed = speed;
                }
            }
            _ => {}
        }
    }
}

/// Fold one stderr line into `current`; returns a snapshot when a block closes.
pub(crate) fn parse_progress_line(
    line: &str,
    current: &mut FfmpegProgress,
) -> Option<FfmpegProgress> {
    let (key, value) = line.trim().split_once('=')?;
    let value = value.trim();

    if key == "progress" {
        current.is_complete = value == "end";
        return Some(current.clone());
    }

    current.apply(key, value);
    None
}

pub(crate) fn is_progress_line(line: &str) -> bool {
    matches!(line.split_once('='), Some((key, _)) if PROGRESS_KEYS.contains(&key.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(lines: &[&str]) -> Vec<FfmpegProgress> {
        let mut current = FfmpegProgress::default();
        lines
            .iter()
            .filter_map(|line| parse_progress_line(line, &mut current))
            .collect()
    }

    #[test]
    fn test_blocks_produce_snapshots() {
        let snapshots = feed(&[
            "total_size=1024",
            "out_time_us=2500000",
            "out_time=00:00:02.500000",
            "speed=12.5x",
            "progress=continue",
            "out_time_us=10000000",
            "speed=N/A",
            "progress=end",
        ]);

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].out_time_secs, 2.5);
        assert_eq!(snapshots[0].out_time, "00:00:02.500000");
        assert!(!snapshots[0].is_complete);

        // Unparseable speed keeps the last reading
        assert_eq!(snapshots[1].speed, 12.5);
        assert_eq!(snapshots[1].out_time_secs, 10.0);
        assert!(snapshots[1].is_complete);
    }

    #[test]
    fn test_fraction_and_remaining() {
        let progress = FfmpegProgress {
            out_time_secs: 15.0,
            speed: 5.0,
            ..Default::default()
        };
        assert_eq!(progress.fraction_of(30.0), 0.5);
        assert_eq!(progress.fraction_of(10.0), 1.0);
        assert_eq!(progress.fraction_of(0.0), 0.0);
        assert_eq!(progress.remaining_secs(30.0), Some(3.0));
        assert_eq!(FfmpegProgress::default().remaining_secs(30.0), None);
    }

    #[test]
    fn test_diagnostics_are_not_progress() {
        assert!(is_progress_line("out_time=00:00:01.000000"));
        assert!(is_progress_line("progress=continue"));
        assert!(!is_progress_line("[aac @ 0x55d0] Too many bits per frame"));
        assert!(!is_progress_line("Stream mapping:"));
    }
}
