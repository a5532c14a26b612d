use log::{debug, info};
use std::collections::BTreeMap;

use crate::schema::{CanonicalMetricValue, Metric, MetricObservation, Quarter, Unit};

#[derive(Debug, Clone)]
struct VoteGroup {
    metric: Metric,
    value: f64,
    unit: Unit,
    count: usize,
    first_seen: usize,
    tags: Vec<Option<Quarter>>,
}

impl VoteGroup {
    fn matches(&self, obs: &MetricObservation) -> bool {
        self.metric == obs.metric
            && self.unit == obs.unit
            && self.value.to_bits() == obs.numeric_value.to_bits()
    }

    /// Most frequent known quarter among members; ties go to the earliest quarter.
    fn modal_quarter(&self) -> Option<Quarter> {
        let mut counts: BTreeMap<Quarter, usize> = BTreeMap::new();
        for q in self.tags.iter().flatten() {
            *counts.entry(*q).or_insert(0) += 1;
        }
        let best = counts.values().copied().max()?;
        counts
            .into_iter()
            .find(|(_, count)| *count == best)
            .map(|(q, _)| q)
    }
}

pub struct FrequencyDisambiguator;

impl FrequencyDisambiguator {
    /// Observations tagged with another quarter are ignored; untagged ones still vote.
    /// Ties between equally frequent values go to the one seen first. Metrics with no
    /// surviving observation are left out. Output is in metric priority order.
    pub fn select(
        observations: &[MetricObservation],
        target: Quarter,
    ) -> Vec<CanonicalMetricValue> {
        let mut groups: Vec<VoteGroup> = Vec::new();
        let mut kept = 0usize;

        for obs in observations {
            if obs.quarter_tag.is_some_and(|q| q != target) {
                continue;
            }
            kept += 1;

            match groups.iter_mut().find(|g| g.matches(obs)) {
                Some(group) => {
                    group.count += 1;
                    group.tags.push(obs.quarter_tag);
                }
                None => {
                    let first_seen = groups.len();
                    groups.push(VoteGroup {
                        metric: obs.metric,
                        value: obs.numeric_value,
                        unit: obs.unit,
                        count: 1,
                        first_seen,
                        tags: vec![obs.quarter_tag],
                    });
                }
            }
        }

        debug!(
            "{} of {} observations kept for {}",
            kept,
            observations.len(),
            target
        );

        // Stable order: metric priority, then count descending, then first seen.
        groups.sort_by(|a, b| {
            a.metric
                .cmp(&b.metric)
                .then(b.count.cmp(&a.count))
                .then(a.first_seen.cmp(&b.first_seen))
        });

        let mut winners: Vec<CanonicalMetricValue> = Vec::new();
        for group in &groups {
            if winners.last().is_some_and(|w| w.metric == group.metric) {
                continue;
            }
            info!(
                "Selected {} = {} ({:?}) from {} occurrence(s)",
                group.metric, group.value, group.unit, group.count
            );
            winners.push(CanonicalMetricValue {
                metric: group.metric,
                numeric_value: group.value,
                unit: group.unit,
                quarter_tag: group.modal_quarter(),
                occurrences: group.count,
            });
        }

        winners
    }
}
