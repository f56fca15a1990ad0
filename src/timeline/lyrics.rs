/// Number of lines in a display window: two above, the current line, two below.
pub const WINDOW_SPAN: usize = 5;

/// Index of the current line inside a resolved window.
pub const CENTER_SLOT: usize = 2;

/// Sentinel lines padding each end of the real sequence.
const PAD: usize = 2;

/// One timed lyric line.
///
/// Real lines satisfy `start < end`; `text` may be empty (padding lines are
/// empty and are never rendered with highlight styling). The input sequence
/// is sorted ascending by `start` and non-overlapping, a precondition of
/// the timeline, not validated defensively here.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LyricLine {
    /// Line text; empty for padding.
    pub text: String,
    /// Start of the line's active interval in seconds (inclusive).
    pub start: f64,
    /// End of the line's active interval in seconds (exclusive).
    pub end: f64,
}

impl LyricLine {
    /// Construct a line from text and its `[start, end)` interval.
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    fn sentinel(at: f64) -> Self {
        Self {
            text: String::new(),
            start: at,
            end: at,
        }
    }

    /// Return `true` when this line carries no text (sentinels and spacer
    /// lines).
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

/// Immutable, sentinel-padded view over a sorted lyric sequence.
///
/// The input is logically extended with two zero-length lines far in the
/// past and two far in the future, so a 5-line window is constructible at
/// any instant, including before the first and after the last real line.
#[derive(Clone, Debug)]
pub struct LyricTimeline {
    /// `2 + real + 2` lines; invariant `padded.len() == real_len + 4`.
    padded: Vec<LyricLine>,
    real_len: usize,
    /// Fallback for window offsets that run past the leading pad (only
    /// reachable while the sentinel before the first real line is current).
    out_of_range: LyricLine,
}

impl LyricTimeline {
    /// Build a timeline from the input sequence (sorted, non-overlapping).
    pub fn new(lines: Vec<LyricLine>) -> Self {
        let real_len = lines.len();
        let mut padded = Vec::with_capacity(real_len + 2 * PAD);
        for _ in 0..PAD {
            padded.push(LyricLine::sentinel(f64::NEG_INFINITY));
        }
        padded.extend(lines);
        for _ in 0..PAD {
            padded.push(LyricLine::sentinel(f64::INFINITY));
        }
        Self {
            padded,
            real_len,
            out_of_range: LyricLine::sentinel(f64::NEG_INFINITY),
        }
    }

    /// Number of real (unpadded) lines.
    pub fn len(&self) -> usize {
        self.real_len
    }

    /// Return `true` when the timeline holds no real lines.
    pub fn is_empty(&self) -> bool {
        self.real_len == 0
    }

    /// Resolve the padded index of the line that is current at `time`.
    ///
    /// A line is active on `[start, end)`. When `time` falls in a gap (or
    /// past the last line), the most recently passed line stays current;
    /// before the first line the current slot is the leading sentinel.
    /// Monotonic non-decreasing in `time`.
    fn active_index(&self, time: f64) -> usize {
        let real = &self.padded[PAD..PAD + self.real_len];
        // Starts are sorted ascending, so the last line with start <= time
        // is either the containing line or the most recently passed one.
        match real.partition_point(|l| l.start <= time) {
            0 => PAD - 1,
            n => PAD + n - 1,
        }
    }

    /// The five lines at offsets −2..+2 around the current line.
    ///
    /// Always exactly [`WINDOW_SPAN`] entries; entries whose underlying line
    /// is a sentinel have empty text.
    pub fn resolve_window(&self, time: f64) -> [&LyricLine; WINDOW_SPAN] {
        let center = self.active_index(time) as isize;
        std::array::from_fn(|slot| {
            let idx = center + slot as isize - CENTER_SLOT as isize;
            if idx < 0 {
                &self.out_of_range
            } else {
                // The trailing pad guarantees idx stays in bounds above.
                &self.padded[idx as usize]
            }
        })
    }

    /// The line current at `time` (the window's center slot).
    pub fn active_line(&self, time: f64) -> &LyricLine {
        &self.padded[self.active_index(time)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_lines() -> LyricTimeline {
        LyricTimeline::new(vec![
            LyricLine::new("Hello", 0.0, 2.0),
            LyricLine::new("World", 2.0, 4.0),
        ])
    }

    #[test]
    fn padded_len_invariant() {
        let tl = two_lines();
        assert_eq!(tl.padded.len(), tl.len() + 4);
    }

    #[test]
    fn window_always_has_five_entries() {
        for tl in [
            LyricTimeline::new(vec![]),
            LyricTimeline::new(vec![LyricLine::new("only", 1.0, 2.0)]),
            two_lines(),
        ] {
            for t in [-100.0, 0.0, 1.0, 2.0, 3.9, 4.0, 1e6] {
                assert_eq!(tl.resolve_window(t).len(), WINDOW_SPAN);
            }
        }
    }

    #[test]
    fn before_first_line_current_is_sentinel() {
        let tl = two_lines();
        let win = tl.resolve_window(-0.5);
        assert!(win[CENTER_SLOT].is_blank());
        assert_eq!(win[CENTER_SLOT + 1].text, "Hello");
    }

    #[test]
    fn start_boundary_is_inclusive_end_exclusive() {
        let tl = two_lines();
        assert_eq!(tl.active_line(0.0).text, "Hello");
        assert_eq!(tl.active_line(1.0).text, "Hello");
        // t == end of "Hello" belongs to "World".
        assert_eq!(tl.active_line(2.0).text, "World");
    }

    #[test]
    fn after_last_line_stays_on_last() {
        let tl = two_lines();
        assert_eq!(tl.active_line(4.0).text, "World");
        assert_eq!(tl.active_line(1e9).text, "World");
    }

    #[test]
    fn gap_keeps_previous_line_current() {
        let tl = LyricTimeline::new(vec![
            LyricLine::new("a", 0.0, 1.0),
            LyricLine::new("b", 5.0, 6.0),
        ]);
        assert_eq!(tl.active_line(3.0).text, "a");
        assert_eq!(tl.active_line(5.0).text, "b");
    }

    #[test]
    fn active_index_is_monotonic_in_time() {
        let tl = LyricTimeline::new(vec![
            LyricLine::new("a", 0.0, 1.0),
            LyricLine::new("b", 1.5, 2.0),
            LyricLine::new("c", 2.0, 3.0),
        ]);
        let mut last = 0;
        let mut t = -1.0;
        while t < 5.0 {
            let idx = tl.active_index(t);
            assert!(idx >= last, "index rewound at t={t}");
            last = idx;
            t += 0.01;
        }
    }

    #[test]
    fn empty_timeline_is_all_sentinels() {
        let tl = LyricTimeline::new(vec![]);
        assert!(tl.is_empty());
        for line in tl.resolve_window(12.0) {
            assert!(line.is_blank());
        }
    }

    #[test]
    fn single_line_window_edges() {
        let tl = LyricTimeline::new(vec![LyricLine::new("only", 1.0, 2.0)]);
        let win = tl.resolve_window(1.5);
        assert_eq!(win[CENTER_SLOT].text, "only");
        assert!(win[0].is_blank() && win[1].is_blank());
        assert!(win[3].is_blank() && win[4].is_blank());
    }
}
