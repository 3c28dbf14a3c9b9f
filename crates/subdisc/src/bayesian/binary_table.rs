//! Boolean matrix over the target columns, with contingency counting and BDeu.

use fixedbitset::FixedBitSet;

use crate::error::{Result, SubdiscError};
use crate::table::{AttributeType, Table};

// Lanczos series coefficients
const GAMMA_C1: f64 = 76.18009173;
const GAMMA_C2: f64 = -86.50532033;
const GAMMA_C3: f64 = 24.01409822;
const GAMMA_C4: f64 = -1.231739516;
const GAMMA_C5: f64 = 0.120858003e-2;
const GAMMA_C6: f64 = -0.536382e-5;
const GAMMA_STP: f64 = 2.50662827465;

/// Largest number of columns a contingency table may span.
pub const MAX_CONTINGENCY_COLUMNS: usize = 24;

/// Approximation of `ln Γ(x)` for `x > 0`.
pub fn log_gamma(x: f64) -> f64 {
    let ser = 1.0
        + GAMMA_C1 / x
        + GAMMA_C2 / (x + 1.0)
        + GAMMA_C3 / (x + 2.0)
        + GAMMA_C4 / (x + 3.0)
        + GAMMA_C5 / (x + 4.0)
        + GAMMA_C6 / (x + 5.0);
    (x - 0.5) * (x + 4.5).ln() - x - 4.5 + (GAMMA_STP * ser).ln()
}

/// Columns of booleans sharing one row count.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryTable {
    names: Vec<String>,
    columns: Vec<FixedBitSet>,
    row_count: usize,
}

impl BinaryTable {
    pub fn new(names: Vec<String>, columns: Vec<FixedBitSet>, row_count: usize) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(SubdiscError::Internal(format!(
                "{} names for {} binary columns",
                names.len(),
                columns.len()
            )));
        }
        if let Some((name, column)) = names
            .iter()
            .zip(&columns)
            .find(|(_, c)| c.len() != row_count)
        {
            return Err(SubdiscError::RowCountMismatch {
                column: name.clone(),
                expected: row_count,
                actual: column.len(),
            });
        }

        Ok(Self {
            names,
            columns,
            row_count,
        })
    }

    /// Copy the given binary columns out of a table.
    pub fn from_table(table: &Table, indices: &[usize]) -> Result<Self> {
        let mut names = Vec::with_capacity(indices.len());
        let mut columns = Vec::with_capacity(indices.len());

        for &index in indices {
            let column = table.column_checked(index)?;
            let bits = column
                .binary_values()
                .ok_or_else(|| SubdiscError::AttributeTypeMismatch {
                    column: column.name().to_string(),
                    expected: AttributeType::Binary.to_string(),
                    actual: column.attribute_type().to_string(),
                })?;
            names.push(column.attribute().name_or_short().to_string());
            columns.push(bits.clone());
        }

        Self::new(names, columns, table.row_count())
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, index: usize) -> Option<&FixedBitSet> {
        self.columns.get(index)
    }

    /// Table restricted to the rows set in `members`, in row order.
    pub fn select_rows(&self, members: &FixedBitSet) -> Self {
        let rows: Vec<usize> = members.ones().filter(|&r| r < self.row_count).collect();
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut selected = FixedBitSet::with_capacity(rows.len());
                for (new_row, &row) in rows.iter().enumerate() {
                    selected.set(new_row, column.contains(row));
                }
                selected
            })
            .collect();

        Self {
            names: self.names.clone(),
            columns,
            row_count: rows.len(),
        }
    }

    /// Contingency counts over the given columns.
    ///
    /// A row's cell index reads its values as a binary number with the first
    /// listed column as the most significant bit.
    pub fn counts(&self, indices: &[usize]) -> Vec<u32> {
        let dimensions = indices.len();
        let mut counts = vec![0u32; 1 << dimensions];
        let powers: Vec<usize> = (0..dimensions).map(|j| 1 << (dimensions - j - 1)).collect();

        for row in 0..self.row_count {
            let cell: usize = indices
                .iter()
                .zip(&powers)
                .filter(|(column, _)| self.columns[**column].contains(row))
                .map(|(_, power)| power)
                .sum();
            counts[cell] += 1;
        }
        counts
    }

    /// BDeu score of the last listed column given the others as parents.
    pub fn family_bdeu(&self, indices: &[usize]) -> f64 {
        if self.row_count == 0 || indices.is_empty() {
            return 0.0;
        }
        debug_assert!(indices.len() <= MAX_CONTINGENCY_COLUMNS);
        bdeu_from_counts(&self.counts(indices))
    }

    /// BDeu score of the last column given all other columns as parents.
    pub fn bdeu(&self) -> f64 {
        let indices: Vec<usize> = (0..self.columns.len()).collect();
        self.family_bdeu(&indices)
    }
}

/// BDeu with a uniform prior over a contingency table whose least
/// significant bit is the child variable.
fn bdeu_from_counts(counts: &[u32]) -> f64 {
    let size = counts.len();
    let parent_configurations = size / 2;
    let alpha_ijk = 1.0 / size as f64;
    let alpha_ij = 1.0 / parent_configurations as f64;
    let log_gamma_alpha_ijk = log_gamma(alpha_ijk);
    let log_gamma_alpha_ij = log_gamma(alpha_ij);

    (0..parent_configurations)
        .map(|j| {
            let negative = counts[2 * j] as f64;
            let positive = counts[2 * j + 1] as f64;
            let posterior = log_gamma(alpha_ijk + negative) - log_gamma_alpha_ijk
                + log_gamma(alpha_ijk + positive)
                - log_gamma_alpha_ijk;
            log_gamma_alpha_ij - log_gamma(alpha_ij + negative + positive) + posterior
        })
        .sum()
}
