//! Structure learning by hill climbing on the BDeu score.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use tracing::trace;

use super::{BinaryTable, Dag};
use crate::error::Result;

/// Largest parent set a node may get.
pub const MAX_PARENTS: usize = 4;

/// Smallest score gain that counts as an improvement.
const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Add(usize, usize),
    Remove(usize, usize),
    Reverse(usize, usize),
}

/// Learns a [`Dag`] over the columns of a [`BinaryTable`].
///
/// The network score decomposes over nodes, so each move only rescores the
/// one or two families it touches. Family scores are cached per
/// `(child, parent set)`.
pub struct Bayesian<'a> {
    table: &'a BinaryTable,
    dag: Dag,
    cache: HashMap<(usize, u64), f64>,
}

impl<'a> Bayesian<'a> {
    pub fn new(table: &'a BinaryTable) -> Result<Self> {
        let dag = Dag::new(table.names().to_vec())?;
        Ok(Self {
            table,
            dag,
            cache: HashMap::new(),
        })
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    pub fn into_dag(self) -> Dag {
        self.dag
    }

    /// Total BDeu score of the current structure.
    pub fn score(&mut self) -> f64 {
        let mut total = 0.0;
        for node in 0..self.dag.size() {
            let mask = self.dag.parent_mask(node);
            total += self.family_score(node, mask);
        }
        total
    }

    fn family_score(&mut self, child: usize, mask: u64) -> f64 {
        if let Some(&score) = self.cache.get(&(child, mask)) {
            return score;
        }
        let mut columns: Vec<usize> = (0..self.dag.size())
            .filter(|&p| mask & (1 << p) != 0)
            .collect();
        columns.push(child);
        let score = self.table.family_bdeu(&columns);
        self.cache.insert((child, mask), score);
        score
    }

    fn candidate_moves(&self) -> Vec<Move> {
        let n = self.dag.size();
        let mut moves = Vec::new();
        for from in 0..n {
            for to in 0..n {
                if from == to {
                    continue;
                }
                if self.dag.has_edge(from, to) {
                    moves.push(Move::Remove(from, to));
                    moves.push(Move::Reverse(from, to));
                } else if !self.dag.has_edge(to, from) {
                    moves.push(Move::Add(from, to));
                }
            }
        }
        moves
    }

    /// Score change of a move, or `None` when it is not legal.
    fn gain(&mut self, step: Move) -> Option<f64> {
        match step {
            Move::Add(from, to) => {
                if self.dag.parent_count(to) >= MAX_PARENTS || self.dag.has_path(to, from) {
                    return None;
                }
                let mask = self.dag.parent_mask(to);
                Some(self.family_score(to, mask | (1 << from)) - self.family_score(to, mask))
            }
            Move::Remove(from, to) => {
                let mask = self.dag.parent_mask(to);
                Some(self.family_score(to, mask & !(1 << from)) - self.family_score(to, mask))
            }
            Move::Reverse(from, to) => {
                if self.dag.parent_count(from) >= MAX_PARENTS {
                    return None;
                }
                let mut without = self.dag.clone();
                without.remove_edge(from, to);
                if without.has_path(from, to) {
                    return None;
                }
                let to_mask = self.dag.parent_mask(to);
                let from_mask = self.dag.parent_mask(from);
                Some(
                    self.family_score(to, to_mask & !(1 << from)) - self.family_score(to, to_mask)
                        + self.family_score(from, from_mask | (1 << to))
                        - self.family_score(from, from_mask),
                )
            }
        }
    }

    fn apply(&mut self, step: Move) {
        let applied = match step {
            Move::Add(from, to) => self.dag.add_edge(from, to),
            Move::Remove(from, to) => self.dag.remove_edge(from, to),
            Move::Reverse(from, to) => self.dag.reverse_edge(from, to),
        };
        debug_assert!(applied, "illegal move {:?}", step);
    }

    /// Greedy best-improvement search from the current structure.
    ///
    /// Each step applies the single add, remove or reverse with the largest
    /// gain. Stops at a local optimum; every step raises the score, so it
    /// always terminates.
    pub fn climb(&mut self) -> &Dag {
        let mut steps = 0usize;
        loop {
            let mut best: Option<(Move, f64)> = None;
            for step in self.candidate_moves() {
                if let Some(gain) = self.gain(step)
                    && gain > EPS
                    && best.is_none_or(|(_, g)| gain > g)
                {
                    best = Some((step, gain));
                }
            }
            match best {
                Some((step, _)) => {
                    self.apply(step);
                    steps += 1;
                }
                None => break,
            }
        }
        trace!("Hill climbing converged after {} steps: {}", steps, self.dag);
        &self.dag
    }

    /// First-improvement search visiting moves in random order.
    ///
    /// Different generators reach different local optima, which gives a
    /// sample of plausible structures.
    pub fn climb_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &Dag {
        let mut steps = 0usize;
        loop {
            let mut moves = self.candidate_moves();
            moves.shuffle(rng);

            let mut improved = false;
            for step in moves {
                if self.gain(step).is_some_and(|gain| gain > EPS) {
                    self.apply(step);
                    steps += 1;
                    improved = true;
                    break;
                }
            }
            if !improved {
                break;
            }
        }
        trace!("Randomized climbing converged after {} steps: {}", steps, self.dag);
        &self.dag
    }
}
