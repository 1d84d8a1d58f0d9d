//! Synthesizes missing minute-bars between gaps in a historical fetch so the
//! sequence `Bootstrap` returns always satisfies the `Bar` invariant: every
//! pair of adjacent bars is exactly `BAR_INTERVAL_MS` apart.

use helion_core::{Bar, BAR_INTERVAL_MS};

/// Walks `bars` (assumed sorted ascending by timestamp) pairwise and inserts
/// synthetic bars wherever the gap between neighbors exceeds one interval.
/// Deterministic and reproducible: same input, same output, every time.
pub fn gap_fill(bars: &[Bar]) -> Vec<Bar> {
    if bars.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(bars.len());
    out.push(bars[0]);

    for pair in bars.windows(2) {
        let (cur, next) = (pair[0], pair[1]);
        let gap = next.timestamp_ms.saturating_sub(cur.timestamp_ms);
        if gap > BAR_INTERVAL_MS {
            let missing = gap / BAR_INTERVAL_MS - 1;
            for i in 1..=missing {
                let ts = cur.timestamp_ms + i * BAR_INTERVAL_MS;
                out.push(Bar::synthetic_from_close(ts, cur.close));
            }
        }
        out.push(next);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use helion_core::{Price, Size};
    use rust_decimal_macros::dec;

    fn bar(ts: u64, o: &str, h: &str, l: &str, c: &str, v: &str) -> Bar {
        Bar {
            timestamp_ms: ts,
            open: Price::new(o.parse().unwrap()),
            high: Price::new(h.parse().unwrap()),
            low: Price::new(l.parse().unwrap()),
            close: Price::new(c.parse().unwrap()),
            volume: Size::new(v.parse().unwrap()),
        }
    }

    #[test]
    fn fills_single_gap_with_three_synthetic_bars() {
        // input OHLCV [(t=0, 1,2,0.5,1.5,10), (t=180000, 1.6,2,1.2,1.8,12)]
        let input = vec![
            bar(0, "1", "2", "0.5", "1.5", "10"),
            bar(180_000, "1.6", "2", "1.2", "1.8", "12"),
        ];

        let filled = gap_fill(&input);
        let timestamps: Vec<u64> = filled.iter().map(|b| b.timestamp_ms).collect();
        assert_eq!(timestamps, vec![0, 60_000, 120_000, 180_000]);

        let synthetic_close = Price::new(dec!(1.5));
        for b in &filled[1..3] {
            assert_eq!(b.open, synthetic_close);
            assert_eq!(b.high, synthetic_close);
            assert_eq!(b.low, synthetic_close);
            assert_eq!(b.close, synthetic_close);
            assert!(b.volume.is_zero());
        }
    }

    #[test]
    fn no_gap_returns_input_unchanged() {
        let input = vec![
            bar(0, "1", "1", "1", "1", "0"),
            bar(60_000, "1", "1", "1", "1", "0"),
        ];
        assert_eq!(gap_fill(&input), input);
    }

    #[test]
    fn result_has_no_gaps_for_any_input_ordering() {
        let input = vec![
            bar(0, "1", "1", "1", "1", "0"),
            bar(300_000, "2", "2", "2", "2", "0"),
        ];
        let filled = gap_fill(&input);
        for pair in filled.windows(2) {
            assert_eq!(pair[1].timestamp_ms - pair[0].timestamp_ms, BAR_INTERVAL_MS);
        }
    }
}
