use pulse_core::FunnelReportStep;

use crate::types::FunnelStepResult;

/// `part` as a percentage of `whole`, 0 when `whole` is 0
fn percent(part: f64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part / whole as f64 * 100.0
    }
}

/// Derive per-step metrics from the reported counts
///
/// Keeps the reported order. Drop-off and conversion compare with the
/// previous step and are absent for the first one; bar width compares with
/// the first step.
pub fn compute_step_metrics(steps: &[FunnelReportStep]) -> Vec<FunnelStepResult> {
    let first = steps.first().map(|s| s.users).unwrap_or(0);

    steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let count = step.users;
            let (drop_off_percent, conversion_rate_percent) = if index == 0 {
                (None, None)
            } else {
                let previous = steps[index - 1].users;
                let lost = previous as f64 - count as f64;
                (
                    Some(percent(lost, previous)),
                    Some(percent(count as f64, previous)),
                )
            };

            FunnelStepResult {
                event_name: step.event_name.clone(),
                count,
                drop_off_percent,
                conversion_rate_percent,
                bar_width_percent: percent(count as f64, first),
            }
        })
        .collect()
}

/// Last step's count as a percentage of the first step's
pub fn overall_conversion_percent(results: &[FunnelStepResult]) -> f64 {
    match (results.first(), results.last()) {
        (Some(first), Some(last)) => percent(last.count as f64, first.count),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(counts: &[(&str, u64)]) -> Vec<FunnelReportStep> {
        counts
            .iter()
            .map(|(name, users)| FunnelReportStep {
                event_name: name.to_string(),
                users: *users,
            })
            .collect()
    }

    #[test]
    fn test_three_step_metrics() {
        let results = compute_step_metrics(&report(&[
            ("app_open", 1000),
            ("signup", 400),
            ("purchase", 100),
        ]));

        let drop_off: Vec<_> = results.iter().map(|r| r.drop_off_percent).collect();
        let conversion: Vec<_> = results.iter().map(|r| r.conversion_rate_percent).collect();
        let bar_width: Vec<_> = results.iter().map(|r| r.bar_width_percent).collect();

        assert_eq!(drop_off, vec![None, Some(60.0), Some(75.0)]);
        assert_eq!(conversion, vec![None, Some(40.0), Some(25.0)]);
        assert_eq!(bar_width, vec![100.0, 40.0, 10.0]);
        assert_eq!(overall_conversion_percent(&results), 10.0);
    }

    #[test]
    fn test_zero_first_step_has_no_division_fault() {
        let results = compute_step_metrics(&report(&[("a", 0), ("b", 0), ("c", 0)]));
        for result in &results {
            assert_eq!(result.bar_width_percent, 0.0);
        }
        assert_eq!(results[1].drop_off_percent, Some(0.0));
        assert_eq!(results[1].conversion_rate_percent, Some(0.0));
        assert_eq!(overall_conversion_percent(&results), 0.0);
    }

    #[test]
    fn test_zero_previous_step_guard() {
        let results = compute_step_metrics(&report(&[("a", 10), ("b", 0), ("c", 5)]));
        assert_eq!(results[1].drop_off_percent, Some(100.0));
        assert_eq!(results[2].drop_off_percent, Some(0.0));
        assert_eq!(results[2].conversion_rate_percent, Some(0.0));
        assert_eq!(results[2].bar_width_percent, 50.0);
    }

    #[test]
    fn test_order_is_preserved() {
        let results = compute_step_metrics(&report(&[("z", 5), ("a", 50), ("m", 1)]));
        let names: Vec<_> = results.iter().map(|r| r.event_name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
        // A later step larger than the previous one is reported as is
        assert_eq!(results[1].drop_off_percent, Some(-900.0));
        assert_eq!(results[1].conversion_rate_percent, Some(1000.0));
    }

    #[test]
    fn test_empty_report() {
        assert!(compute_step_metrics(&[]).is_empty());
        assert_eq!(overall_conversion_percent(&[]), 0.0);
    }
}
