use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

#[test]
fn results_keep_input_order() {
    let items: Vec<u32> = (0..20).collect();
    let out = run_bounded(3, &items, |i| Ok(i * 10)).unwrap();
    assert_eq!(out, items.iter().map(|i| i * 10).collect::<Vec<_>>());
}

#[test]
fn concurrency_never_exceeds_worker_count() {
    let active = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);
    let items: Vec<u32> = (0..12).collect();
    run_bounded(2, &items, |_| {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(5));
        active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();
    assert!(peak.load(Ordering::SeqCst) <= 2);
}

#[test]
fn first_error_in_input_order_wins() {
    let items: Vec<u32> = (0..8).collect();
    let err = run_bounded(4, &items, |i| {
        if *i == 3 || *i == 6 {
            Err(ReskinError::remote(format!("item {i}")))
        } else {
            Ok(*i)
        }
    })
    .unwrap_err();
    assert!(err.to_string().contains("item 3"), "{err}");
}

#[test]
fn zero_workers_is_rejected() {
    assert!(run_bounded(0, &[1u8], |_| Ok(())).is_err());
    assert!(run_bounded(0, &[] as &[u8], |_| Ok(())).unwrap().is_empty());
}
