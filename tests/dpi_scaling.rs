use screengrab::dpi::{scale_factor, DpiCache};
use screengrab::scale_for_dpi;

#[test]
fn scale_for_dpi_table() {
    let cases = [
        (1920, 96, 1920),
        (1920, 144, 2880),
        (100, 120, 125),
        (0, 144, 0),
        (1080, 192, 2160),
        (1, 120, 1),
        (2, 120, 3),
    ];
    for (value, dpi, expected) in cases {
        assert_eq!(scale_for_dpi(value, dpi), expected, "{} at {} DPI", value, dpi);
    }
}

#[test]
fn low_dpi_leaves_values_alone() {
    assert_eq!(scale_for_dpi(1920, 72), 1920);
    assert_eq!(scale_for_dpi(1920, 0), 1920);
}

#[test]
fn scale_factor_is_relative_to_96() {
    assert_eq!(scale_factor(96), 1.0);
    assert_eq!(scale_factor(144), 1.5);
}

#[test]
fn cache_is_keyed_per_context() {
    let cache = DpiCache::new();
    assert_eq!(cache.get_or_insert_with(1isize, || 96), 96);
    assert_eq!(cache.get_or_insert_with(2isize, || 144), 144);
    assert_eq!(cache.get_or_insert_with(1isize, || 192), 96);
    assert_eq!(cache.len(), 2);
}

#[test]
fn cache_allows_concurrent_readers() {
    let cache = std::sync::Arc::new(DpiCache::new());
    cache.get_or_insert_with(7isize, || 120);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            std::thread::spawn(move || cache.get_or_insert_with(7isize, || 0))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 120);
    }
}
