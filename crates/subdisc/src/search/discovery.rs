//! The main search loop.

use fixedbitset::FixedBitSet;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Instant;
use tracing::{debug, info, trace};

use crate::condition::{Condition, ConditionValue};
use crate::config::{NumericStrategy, SearchParameters, SearchStrategy};
use crate::error::Result;
use crate::subgroup::Subgroup;
use crate::table::Table;

use super::postprocess::postprocess_multi_label;
use super::{Candidate, CandidateQueue, Evaluator, Refinement, RefinementList, SubgroupSet};

/// Whether `deadline` has passed. `None` never expires.
fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() > deadline)
}

/// One search run over a table.
///
/// Candidates are popped from a [`CandidateQueue`], refined, scored and
/// offered both to the result set and back to the queue. The run ends when
/// the queue is empty or the deadline passes; running out of time is not an
/// error, and whatever was found so far is the result.
pub struct SubgroupDiscovery<'t> {
    params: &'t SearchParameters,
    table: &'t Table,
    evaluator: Evaluator,
    domains: Vec<Vec<ConditionValue>>,
    result: SubgroupSet,
    candidate_count: usize,
}

impl<'t> SubgroupDiscovery<'t> {
    /// Prepare a run. Fails for invalid parameters and unsupported targets.
    pub fn new(params: &'t SearchParameters, table: &'t Table) -> Result<Self> {
        params.validate()?;
        let evaluator = Evaluator::new(table, params)?;

        let domains = table
            .columns()
            .iter()
            .map(|column| {
                if column.attribute_type().is_numeric_like() {
                    Vec::new()
                } else {
                    column.domain()
                }
            })
            .collect();

        Ok(Self {
            params,
            table,
            evaluator,
            domains,
            result: SubgroupSet::new(params.maximum_subgroups),
            candidate_count: 0,
        })
    }

    pub fn result(&self) -> &SubgroupSet {
        &self.result
    }

    pub fn into_result(self) -> SubgroupSet {
        self.result
    }

    /// Number of refinements that were scored.
    pub fn candidate_count(&self) -> usize {
        self.candidate_count
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Run the search, with the time budget counted from `begin`.
    pub fn mine(&mut self, begin: Instant) -> Result<()> {
        let deadline = self.params.deadline(begin);
        let width = match self.params.strategy {
            SearchStrategy::Beam | SearchStrategy::BestFirst => Some(self.params.strategy_width),
            SearchStrategy::BreadthFirst | SearchStrategy::DepthFirst => None,
        };

        let mut queue = CandidateQueue::new(self.params.strategy, width);
        queue.add(Candidate::new(Subgroup::root(self.table.row_count()), 0.0));

        let mut timed_out = false;
        while let Some(candidate) = queue.remove_first() {
            if expired(deadline) {
                timed_out = true;
                break;
            }

            let parent = candidate.into_subgroup();
            if parent.depth() >= self.params.search_depth {
                continue;
            }

            let refinements =
                RefinementList::with_domains(self.table, &parent, &self.params.target, &self.domains);
            debug!(
                "Refining '{}' (coverage {}): {} refinements",
                parent.conditions(),
                parent.coverage(),
                refinements.len()
            );

            for refinement in &refinements {
                if expired(deadline) {
                    timed_out = true;
                    break;
                }
                if !self.apply_refinement(&parent, refinement, &mut queue, deadline)? {
                    timed_out = true;
                    break;
                }
            }
            if timed_out {
                break;
            }
        }

        self.result.set_ids();
        info!(
            "Mining finished{}: {} candidates, {} subgroups, best quality {:?}, {:.2?} elapsed",
            if timed_out { " (time limit reached)" } else { "" },
            self.candidate_count,
            self.result.len(),
            self.result.best_score(),
            begin.elapsed()
        );
        Ok(())
    }

    /// Evaluate all children of one refinement. Returns `false` when the
    /// deadline passed before the refinement was done.
    fn apply_refinement(
        &mut self,
        parent: &Subgroup,
        refinement: &Refinement,
        queue: &mut CandidateQueue,
        deadline: Option<Instant>,
    ) -> Result<bool> {
        let attribute = match refinement {
            Refinement::Equals { .. } => {
                if let Some(condition) = refinement.condition() {
                    if let Some(child) = self.score_child(parent, condition?)? {
                        self.consider(child, queue);
                    }
                }
                return Ok(true);
            }
            Refinement::Numeric { attribute, .. } => attribute.index(),
        };

        let thresholds = match self.params.numeric_strategy {
            NumericStrategy::All | NumericStrategy::Best => {
                self.table.unique_numeric_domain(attribute, parent.members())?
            }
            NumericStrategy::Bins => self.bin_thresholds(attribute, parent.members())?,
        };

        if self.params.numeric_strategy == NumericStrategy::Best {
            let mut best: Option<Subgroup> = None;
            for threshold in thresholds {
                if expired(deadline) {
                    // an unfinished batch has no well-defined best
                    return Ok(false);
                }
                let child = self.score_child(parent, refinement.condition_at(threshold)?)?;
                if let Some(child) = child
                    && best.as_ref().is_none_or(|b| child.quality() > b.quality())
                {
                    best = Some(child);
                }
            }
            if let Some(best) = best {
                self.consider(best, queue);
            }
            return Ok(true);
        }

        for threshold in thresholds {
            if expired(deadline) {
                return Ok(false);
            }
            if let Some(child) = self.score_child(parent, refinement.condition_at(threshold)?)? {
                self.consider(child, queue);
            }
        }
        Ok(true)
    }

    /// Distinct equal-frequency split points for [`NumericStrategy::Bins`].
    pub(crate) fn bin_thresholds(&self, attribute: usize, members: &FixedBitSet) -> Result<Vec<f32>> {
        let mut points = self
            .table
            .split_points(attribute, members, self.params.nr_bins - 1)?;
        points.dedup();
        Ok(points)
    }

    /// Build and score the child `parent AND condition`, unless it covers
    /// too few rows.
    fn score_child(&self, parent: &Subgroup, condition: Condition) -> Result<Option<Subgroup>> {
        let mut members = self.table.evaluate(&condition)?;
        members.intersect_with(parent.members());
        if members.count_ones(..) < self.params.minimum_coverage {
            return Ok(None);
        }

        let evaluation = self.evaluator.evaluate(&members)?;
        let mut child =
            Subgroup::new(parent.conditions().with(condition), members).with_quality(evaluation.quality);
        if let Some(model) = evaluation.model {
            child.attach_model(model);
        }
        Ok(Some(child))
    }

    fn consider(&mut self, child: Subgroup, queue: &mut CandidateQueue) {
        self.candidate_count += 1;
        trace!(
            "Candidate {}: '{}' coverage {} quality {:.6}",
            self.candidate_count,
            child.conditions(),
            child.coverage(),
            child.quality()
        );

        if child.quality() > self.params.quality_measure_minimum {
            self.result.add(child.clone());
        }
        if child.depth() < self.params.search_depth {
            let priority = child.quality();
            queue.add(Candidate::new(child, priority));
        }
    }

    /// Re-score multi-label results with several networks per side.
    ///
    /// Does nothing for other targets or when post-processing is disabled.
    pub fn post_process(&mut self) -> Result<()> {
        let (Some(labels), Some(measure)) = (
            self.evaluator.labels(),
            self.evaluator.multi_label_measure(),
        ) else {
            return Ok(());
        };

        let mut rng = match self.params.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let result = std::mem::replace(&mut self.result, SubgroupSet::new(self.params.maximum_subgroups));
        self.result = postprocess_multi_label(
            result,
            labels,
            measure,
            self.params.post_processing_count,
            &mut rng,
        )?;
        Ok(())
    }
}
