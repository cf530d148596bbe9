use serde::Deserialize;
use serde::Serialize;
use tally_protocol::CountLine;

/// Read-side completion summary over the confirmed count lines. Session
/// deltas are deliberately excluded: progress reflects server truth only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub counted: usize,
    pub total: usize,
    pub percent: f64,
}

impl Progress {
    pub fn of<'a>(lines: impl IntoIterator<Item = &'a CountLine>) -> Self {
        let mut counted = 0;
        let mut total = 0;
        for line in lines {
            total += 1;
            if line.is_counted() {
                counted += 1;
            }
        }
        let percent = if total == 0 {
            0.0
        } else {
            counted as f64 / total as f64 * 100.0
        };
        Self {
            counted,
            total,
            percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tally_protocol::CountId;
    use tally_protocol::ItemId;

    fn line(confirmed: Option<u32>) -> CountLine {
        let mut line = CountLine::new(CountId::new(), ItemId::new(), 3);
        line.confirmed_actual_quantity = confirmed;
        line
    }

    #[test]
    fn empty_count_is_zero_percent() {
        let progress = Progress::of([]);
        assert_eq!(progress.counted, 0);
        assert_eq!(progress.total, 0);
        assert_eq!(progress.percent, 0.0);
    }

    #[test]
    fn counted_lines_have_non_null_confirmed_quantity() {
        let lines = vec![line(Some(4)), line(None), line(Some(0)), line(None)];
        let progress = Progress::of(&lines);
        assert_eq!(progress.counted, 2);
        assert_eq!(progress.total, 4);
        assert_eq!(progress.percent, 50.0);
    }

    #[test]
    fn zero_confirmed_still_counts_as_counted() {
        // A confirmed quantity of zero means "counted and found none",
        // which is distinct from "not yet counted".
        let lines = vec![line(Some(0))];
        assert_eq!(Progress::of(&lines).percent, 100.0);
    }
}
