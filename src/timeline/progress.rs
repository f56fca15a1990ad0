use crate::timeline::lyrics::LyricLine;

/// Durations at or below this are treated as zero-length.
const MIN_DURATION_SECS: f64 = 1e-9;

/// Normalized fraction of `line`'s duration elapsed at `time`, in `[0, 1]`.
///
/// Drives the karaoke sweep of the current line. Zero-length lines report
/// `1.0` (fully highlighted) instead of dividing by zero. Only meaningful
/// for the active line; callers do not compute it for other window slots.
pub fn highlight_progress(line: &LyricLine, time: f64) -> f64 {
    let duration = line.end - line.start;
    if !(duration > MIN_DURATION_SECS) {
        return 1.0;
    }
    ((time - line.start) / duration).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_map_to_zero_and_one() {
        let line = LyricLine::new("x", 2.0, 4.0);
        assert_eq!(highlight_progress(&line, 2.0), 0.0);
        assert_eq!(highlight_progress(&line, 3.0), 0.5);
        assert_eq!(highlight_progress(&line, 4.0), 1.0);
    }

    #[test]
    fn clamps_outside_the_interval() {
        let line = LyricLine::new("x", 2.0, 4.0);
        assert_eq!(highlight_progress(&line, 0.0), 0.0);
        assert_eq!(highlight_progress(&line, 100.0), 1.0);
    }

    #[test]
    fn zero_duration_is_fully_highlighted() {
        let line = LyricLine::new("x", 2.0, 2.0);
        assert_eq!(highlight_progress(&line, 2.0), 1.0);
        assert_eq!(highlight_progress(&line, 1.0), 1.0);
    }

    #[test]
    fn monotonic_non_decreasing_in_time() {
        let line = LyricLine::new("x", 1.0, 3.0);
        let mut prev = 0.0;
        let mut t = 0.0;
        while t < 4.0 {
            let p = highlight_progress(&line, t);
            assert!(p >= prev);
            prev = p;
            t += 0.05;
        }
    }
}
