/**
 * File: /src/bicluster.rs
 * Created Date: Tuesday, March 18th 2025
 * Author: Zihan
 * -----
 * Last Modified: Wednesday, 2nd April 2025 10:47:30 am
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 */

use ndarray::Array2;
use std::error::Error;
use std::fmt;

/// Normalized output of one biclustering run, independent of which
/// algorithm produced it.
///
/// `rows()` is a boolean membership matrix of shape
/// (n_biclusters x n_samples), `columns()` of shape
/// (n_biclusters x n_features). Row i of both jointly defines bicluster i;
/// `biclusters()` is the same information as ordered index-set pairs.
///
/// A result with zero biclusters is valid: both matrices have zero rows and
/// the pair list is empty.
///
/// # Example
/// ```
/// use rbiclust::bicluster::BiclusterResult;
/// let result = BiclusterResult::from_index_sets(
///     vec![vec![0, 2]],
///     vec![vec![1]],
///     3,
///     2,
/// ).unwrap();
///
/// assert_eq!(result.n_biclusters(), 1);
/// assert_eq!(result.biclusters()[0], (vec![0, 2], vec![1]));
/// assert!(result.rows()[(0, 2)]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BiclusterResult {
    rows: Array2<bool>,
    columns: Array2<bool>,
    biclusters: Vec<(Vec<usize>, Vec<usize>)>,
}

impl BiclusterResult {
    /// Result with no biclusters for a matrix of the given shape.
    pub fn empty(n_samples: usize, n_features: usize) -> Self {
        BiclusterResult {
            rows: Array2::from_elem((0, n_samples), false),
            columns: Array2::from_elem((0, n_features), false),
            biclusters: Vec::new(),
        }
    }

    /// Build from membership matrices already in the normalized
    /// orientation: `rows` (k x n_samples), `columns` (k x n_features).
    pub fn from_membership(
        rows: Array2<bool>,
        columns: Array2<bool>,
    ) -> Result<Self, NormalizationError> {
        if rows.nrows() != columns.nrows() {
            return Err(NormalizationError::RankMismatch {
                row_blocks: rows.nrows(),
                col_blocks: columns.nrows(),
            });
        }

        let biclusters = rows
            .outer_iter()
            .zip(columns.outer_iter())
            .map(|(row_mask, col_mask)| {
                (true_indices(row_mask.iter()), true_indices(col_mask.iter()))
            })
            .collect();

        Ok(BiclusterResult {
            rows,
            columns,
            biclusters,
        })
    }

    /// Build from per-bicluster index lists. `rows[i]` and `cols[i]` define
    /// bicluster i; every index is checked against the data shape.
    pub fn from_index_sets(
        rows: Vec<Vec<usize>>,
        cols: Vec<Vec<usize>>,
        n_samples: usize,
        n_features: usize,
    ) -> Result<Self, NormalizationError> {
        if rows.len() != cols.len() {
            return Err(NormalizationError::RankMismatch {
                row_blocks: rows.len(),
                col_blocks: cols.len(),
            });
        }

        let k = rows.len();
        let mut row_matrix = Array2::from_elem((k, n_samples), false);
        let mut col_matrix = Array2::from_elem((k, n_features), false);

        for (i, indices) in rows.iter().enumerate() {
            for &index in indices {
                if index >= n_samples {
                    return Err(NormalizationError::RowIndexOutOfRange {
                        bicluster: i,
                        index,
                        n_samples,
                    });
                }
                row_matrix[(i, index)] = true;
            }
        }
        for (i, indices) in cols.iter().enumerate() {
            for &index in indices {
                if index >= n_features {
                    return Err(NormalizationError::ColIndexOutOfRange {
                        bicluster: i,
                        index,
                        n_features,
                    });
                }
                col_matrix[(i, index)] = true;
            }
        }

        // rebuild the pair list from the matrices so duplicates collapse
        // and indices come out sorted
        Self::from_membership(row_matrix, col_matrix)
    }

    pub fn rows(&self) -> &Array2<bool> {
        &self.rows
    }

    pub fn columns(&self) -> &Array2<bool> {
        &self.columns
    }

    pub fn biclusters(&self) -> &[(Vec<usize>, Vec<usize>)] {
        &self.biclusters
    }

    pub fn n_biclusters(&self) -> usize {
        self.biclusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.biclusters.is_empty()
    }

    pub fn n_samples(&self) -> usize {
        self.rows.ncols()
    }

    pub fn n_features(&self) -> usize {
        self.columns.ncols()
    }

    /// Shape of bicluster i as (rows, columns).
    pub fn size(&self, i: usize) -> Option<(usize, usize)> {
        self.biclusters
            .get(i)
            .map(|(rows, cols)| (rows.len(), cols.len()))
    }
}

fn true_indices<'a>(mask: impl Iterator<Item = &'a bool>) -> Vec<usize> {
    mask.enumerate()
        .filter(|(_, &member)| member)
        .map(|(index, _)| index)
        .collect()
}

/// Errors raised while normalizing raw engine output.
#[derive(Debug)]
pub enum NormalizationError {
    RankMismatch {
        row_blocks: usize,
        col_blocks: usize,
    },
    RowIndexOutOfRange {
        bicluster: usize,
        index: usize,
        n_samples: usize,
    },
    ColIndexOutOfRange {
        bicluster: usize,
        index: usize,
        n_features: usize,
    },
}

impl fmt::Display for NormalizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationError::RankMismatch {
                row_blocks,
                col_blocks,
            } => write!(
                f,
                "row side reports {} biclusters but column side reports {}",
                row_blocks, col_blocks
            ),
            NormalizationError::RowIndexOutOfRange {
                bicluster,
                index,
                n_samples,
            } => write!(
                f,
                "bicluster {} has row index {} but the data has {} samples",
                bicluster, index, n_samples
            ),
            NormalizationError::ColIndexOutOfRange {
                bicluster,
                index,
                n_features,
            } => write!(
                f,
                "bicluster {} has column index {} but the data has {} features",
                bicluster, index, n_features
            ),
        }
    }
}

impl Error for NormalizationError {}
