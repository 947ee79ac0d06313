/// Arithmetic mean rounded to the nearest integer. Returns 0 for empty input.
pub fn rounded_mean(values: &[u32]) -> u32 {
    if values.is_empty() {
        return 0;
    }
    let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
    (sum as f64 / values.len() as f64).round() as u32
}

/// Most frequent value in `values`, or `fallback` when empty.
///
/// Among values tied for the highest count, the one seen first wins.
pub fn most_common<T: Copy + Eq>(values: impl IntoIterator<Item = T>, fallback: T) -> T {
    // first-seen order is kept so ties resolve deterministically
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best = fallback;
    let mut best_count = 0;
    for (value, count) in counts {
        if count > best_count {
            best = value;
            best_count = count;
        }
    }
    best
}

/// Formats an hour of day (0–23) as a 12-hour clock label, e.g. `2:00 PM`.
pub fn format_hour(hour: u32) -> String {
    let period = if hour >= 12 { "PM" } else { "AM" };
    let display = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };
    format!("{display}:00 {period}")
}
