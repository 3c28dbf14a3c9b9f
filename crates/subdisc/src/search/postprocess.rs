//! Re-scoring of multi-label results against several learned networks.
//!
//! Hill climbing ends in a local optimum, so a single network per side makes
//! WEED depend on where the climb happened to stop. Post-processing learns
//! `c` networks for the whole table and `c` for each subgroup with
//! randomized climbs and replaces each quality by the mean WEED over all
//! `c * c` pairs.

use rand::Rng;
use tracing::{debug, info};

use crate::bayesian::{Bayesian, BinaryTable, Dag};
use crate::error::Result;
use crate::quality::MultiLabelMeasure;

use super::SubgroupSet;

/// Learn `count` networks with randomized hill climbing.
pub fn sample_networks<R: Rng + ?Sized>(
    table: &BinaryTable,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Dag>> {
    (0..count)
        .map(|_| {
            let mut bayesian = Bayesian::new(table)?;
            bayesian.climb_with(&mut *rng);
            Ok(bayesian.into_dag())
        })
        .collect()
}

/// Mean WEED over every (local, global) pair.
pub fn mean_weed(
    measure: &MultiLabelMeasure,
    coverage: usize,
    locals: &[Dag],
    globals: &[Dag],
) -> f64 {
    let pairs = locals.len() * globals.len();
    if pairs == 0 {
        return 0.0;
    }
    let total: f64 = locals
        .iter()
        .flat_map(|local| globals.iter().map(move |global| (local, global)))
        .map(|(local, global)| measure.weed(coverage, local, global))
        .sum();
    total / pairs as f64
}

/// Re-score every subgroup of a multi-label result and rebuild the set.
pub fn postprocess_multi_label<R: Rng + ?Sized>(
    result: SubgroupSet,
    labels: &BinaryTable,
    measure: &MultiLabelMeasure,
    count: usize,
    rng: &mut R,
) -> Result<SubgroupSet> {
    if count == 0 || result.is_empty() {
        return Ok(result);
    }

    info!(
        "Post-processing {} subgroups with {} networks per side",
        result.len(),
        count
    );
    let globals = sample_networks(labels, count, rng)?;

    let mut rescored = SubgroupSet::new(result.capacity());
    for mut subgroup in result {
        let selected = labels.select_rows(subgroup.members());
        let locals = sample_networks(&selected, count, rng)?;
        let quality = mean_weed(measure, subgroup.coverage(), &locals, &globals);
        debug!(
            "{}: {:.4} -> {:.4}",
            subgroup.conditions(),
            subgroup.quality(),
            quality
        );
        subgroup.set_quality(quality);
        rescored.add(subgroup);
    }
    rescored.set_ids();
    Ok(rescored)
}
