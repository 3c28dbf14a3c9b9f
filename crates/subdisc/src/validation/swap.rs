//! Swap randomization of the target columns.

use rand::Rng;
use tracing::{debug, error, trace};

use crate::error::{Result, SubdiscError};
use crate::table::{Column, Table};
use crate::target::TargetConcept;

/// Attempts per repetition before giving up on a mining pass that keeps
/// finding no subgroups.
pub const MAX_SWAP_RETRIES: usize = 100;

/// Exclusive checkout of a table whose target columns get permuted.
///
/// The original target columns are saved on creation and written back when
/// the checkout is dropped, whichever way the caller leaves.
pub(crate) struct TargetCheckout<'a> {
    table: &'a mut Table,
    saved: Vec<Column>,
}

impl<'a> TargetCheckout<'a> {
    pub(crate) fn new(table: &'a mut Table, target: &TargetConcept) -> Result<Self> {
        let saved = target
            .target_indices()
            .into_iter()
            .map(|index| table.column_checked(index).cloned())
            .collect::<Result<Vec<_>>>()?;
        debug!("Checked out {} target columns", saved.len());
        Ok(Self { table, saved })
    }

    pub(crate) fn table(&self) -> &Table {
        &*self.table
    }

    pub(crate) fn table_mut(&mut self) -> &mut Table {
        &mut *self.table
    }
}

impl Drop for TargetCheckout<'_> {
    fn drop(&mut self) {
        for column in self.saved.drain(..) {
            let index = column.index();
            if let Err(e) = self.table.replace_column(index, column) {
                error!("Failed to restore target column {index}: {e}");
            }
        }
        debug!("Restored target columns");
    }
}

/// Run `repetitions` mining passes on swap-randomized copies of the target.
///
/// `mine` returns the best quality of a pass, or `None` when it found no
/// subgroups; such a pass is repeated with a fresh permutation, at most
/// [`MAX_SWAP_RETRIES`] times per repetition.
pub(crate) fn run_swap_repetitions<R, F>(
    table: &mut Table,
    target: &TargetConcept,
    repetitions: usize,
    rng: &mut R,
    mut mine: F,
) -> Result<Vec<f64>>
where
    R: Rng + ?Sized,
    F: FnMut(&Table) -> Result<Option<f64>>,
{
    let mut checkout = TargetCheckout::new(table, target)?;
    let mut samples = Vec::with_capacity(repetitions);

    for repetition in 0..repetitions {
        let mut attempts = 0;
        let quality = loop {
            if attempts == MAX_SWAP_RETRIES {
                return Err(SubdiscError::SwapRandomizationExhausted {
                    repetition,
                    attempts,
                });
            }
            attempts += 1;
            checkout.table_mut().swap_randomize_target(target, rng)?;
            if let Some(quality) = mine(checkout.table())? {
                break quality;
            }
            trace!("Repetition {repetition}: no subgroups, retrying");
        };
        trace!("Repetition {}: {}", repetition + 1, quality);
        samples.push(quality);
    }
    Ok(samples)
}
