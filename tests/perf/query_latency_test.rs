use std::time::Instant;

use crate::model::TabRecord;
use crate::search::rank;

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

#[test]
fn warm_query_p95_under_budget() {
    let mut tabs: Vec<TabRecord> = (0..2_000)
        .map(|i| {
            TabRecord::new(
                i,
                &format!("Document {i:05} - Shared Drive"),
                &format!("docs{}.example.com", i % 37),
            )
        })
        .collect();

    tabs.push(TabRecord::new(9_999, "Inbox (3)", "mail.google.com"));

    for _ in 0..20 {
        let _ = rank("goog", &tabs);
    }

    let mut batch_p95 = Vec::with_capacity(5);
    for _ in 0..5 {
        let mut samples = Vec::with_capacity(40);
        for _ in 0..40 {
            let start = Instant::now();
            let _ = rank("doc shared", &tabs);
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
        }
        batch_p95.push(p95_ms(&mut samples));
    }

    batch_p95.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median_p95 = batch_p95[batch_p95.len() / 2];

    assert!(
        median_p95 <= 50.0,
        "median batch p95 too high: {median_p95:.3}ms (budget 50.0ms); batches={batch_p95:?}",
    );
}
