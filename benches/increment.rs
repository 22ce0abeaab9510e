//! Benchmarks for the counter hot path
//!
//! Measures lock + rotation + update cost at different slot widths:
//! - 1ms slots rotate on nearly every call
//! - 500ms and 1min slots mostly hit the no-rotation path
//! - contended increments from several threads
//!
//! Run with: cargo bench --bench increment

use divan::{black_box, Bencher};
use ratecount::RateCounter;
use std::sync::Arc;
use std::time::Duration;

fn main() {
    divan::main();
}

fn make_counter(resolution: Duration) -> RateCounter {
    RateCounter::new(resolution, 5).unwrap()
}

// =============================================================================
// Increment
// =============================================================================

mod increment {
    use super::*;

    #[divan::bench]
    fn small_resolution(bencher: Bencher) {
        let counter = make_counter(Duration::from_millis(1));
        bencher.bench(|| counter.increment(black_box(1)));
    }

    #[divan::bench]
    fn mid_resolution(bencher: Bencher) {
        let counter = make_counter(Duration::from_millis(500));
        bencher.bench(|| counter.increment(black_box(1)));
    }

    #[divan::bench]
    fn large_resolution(bencher: Bencher) {
        let counter = make_counter(Duration::from_secs(60));
        bencher.bench(|| counter.increment(black_box(1)));
    }

    #[divan::bench(threads = [2, 4, 8])]
    fn contended(bencher: Bencher) {
        let counter = Arc::new(make_counter(Duration::from_millis(500)));
        bencher.bench(|| counter.increment(black_box(1)));
    }
}

// =============================================================================
// Rate
// =============================================================================

mod rate {
    use super::*;

    #[divan::bench(args = [1, 5, 60])]
    fn rate_over_windows(bencher: Bencher, windows: usize) {
        let counter = RateCounter::new(Duration::from_millis(500), windows).unwrap();
        counter.increment(1);
        bencher.bench(|| black_box(counter.rate()));
    }
}
