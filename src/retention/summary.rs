use std::collections::BTreeSet;

use super::cohort::ratio;
use crate::report::{CohortInterval, IntervalGrowth, IntervalRate, RetentionSummary};

pub fn summarize(intervals: &[CohortInterval]) -> Option<RetentionSummary> {
    if intervals.len() < 2 {
        return None;
    }

    // The first interval has no baseline; intervals without a rate are
    // skipped rather than counted as zero.
    let eligible: Vec<&CohortInterval> = intervals
        .iter()
        .skip(1)
        .filter(|interval| interval.retention_rate.is_some())
        .collect();

    let retained_total: usize = eligible
        .iter()
        .map(|interval| interval.retained_participants.len())
        .sum();
    let baseline_total: usize = eligible
        .iter()
        .map(|interval| interval.previous_participants.len())
        .sum();

    let unique_participants = intervals
        .iter()
        .flat_map(|interval| interval.participants.iter())
        .collect::<BTreeSet<_>>()
        .len();

    Some(RetentionSummary {
        intervals_compared: eligible.len(),
        average_retention_rate: ratio(retained_total, baseline_total),
        highest_retention: extreme_rate(&eligible, |candidate, best| candidate > best),
        lowest_retention: extreme_rate(&eligible, |candidate, best| candidate < best),
        highest_growth: highest_growth(&intervals[1..]),
        total_participants: intervals.iter().map(|i| i.participants.len()).sum(),
        unique_participants,
    })
}

/// Ties keep the earliest interval.
fn extreme_rate<F>(eligible: &[&CohortInterval], replaces: F) -> Option<IntervalRate>
where
    F: Fn(f64, f64) -> bool,
{
    eligible
        .iter()
        .filter_map(|interval| interval.retention_rate.map(|rate| (rate, *interval)))
        .fold(None::<(f64, &CohortInterval)>, |best, (rate, interval)| match best {
            Some((best_rate, _)) if !replaces(rate, best_rate) => best,
            _ => Some((rate, interval)),
        })
        .map(|(rate, interval)| IntervalRate {
            interval_key: interval.interval_key.clone(),
            rate,
        })
}

fn highest_growth(intervals: &[CohortInterval]) -> Option<IntervalGrowth> {
    intervals
        .iter()
        .filter_map(|interval| {
            interval
                .growth
                .filter(|growth| *growth > 0)
                .map(|growth| (growth, interval))
        })
        .fold(None::<(i64, &CohortInterval)>, |best, (growth, interval)| match best {
            Some((best_growth, _)) if growth <= best_growth => best,
            _ => Some((growth, interval)),
        })
        .map(|(growth, interval)| IntervalGrowth {
            interval_key: interval.interval_key.clone(),
            growth,
        })
}
