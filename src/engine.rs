/**
 * File: /src/engine.rs
 * Created Date: Wednesday, March 19th 2025
 * Author: Zihan
 * -----
 * Last Modified: Monday, 14th April 2025 9:02:54 pm
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 */

use log::{debug, info};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use crate::bicluster::BiclusterResult;
use crate::params::{ParamValue, ParameterSet};

/// Which engine routine a model invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    ChengChurch,
    XMotifs,
    Plaid,
}

impl ModelId {
    /// Name of the engine routine this identifier selects.
    pub fn routine(self) -> &'static str {
        match self {
            ModelId::ChengChurch => "BCCC",
            ModelId::XMotifs => "BCXmotifs",
            ModelId::Plaid => "BCPlaid",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.routine())
    }
}

/// Data matrix in the engine's native layout: a column-major flat buffer.
///
/// The in-process representation is row-major `ndarray`; the engine wants
/// columns contiguous, so marshalling copies once here.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineMatrix {
    nrow: usize,
    ncol: usize,
    values: Vec<f64>,
}

impl EngineMatrix {
    pub fn from_view(x: ArrayView2<f64>) -> Self {
        let (nrow, ncol) = x.dim();
        let mut values = Vec::with_capacity(nrow * ncol);
        for j in 0..ncol {
            for i in 0..nrow {
                values.push(x[(i, j)]);
            }
        }
        EngineMatrix { nrow, ncol, values }
    }

    pub fn nrow(&self) -> usize {
        self.nrow
    }

    pub fn ncol(&self) -> usize {
        self.ncol
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[col * self.nrow + row]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// One fully marshalled engine invocation.
#[derive(Debug, Clone)]
pub struct EngineCall {
    pub model: ModelId,
    pub data: EngineMatrix,
    /// Parameter names already translated to the engine's convention.
    pub params: Vec<(String, ParamValue)>,
    pub seed: u64,
}

/// Raw engine output before normalization. The shape differs per routine;
/// callers never see this type, only the normalized [`BiclusterResult`].
#[derive(Debug, Clone)]
pub enum RawOutput {
    /// Membership matrices in the engine's orientation:
    /// `row_membership` is (n_samples x k), `col_membership` is
    /// (k x n_features). BCCC and BCPlaid report this shape.
    Membership {
        row_membership: Array2<bool>,
        col_membership: Array2<bool>,
    },
    /// Per-bicluster row and column index lists, paired by position.
    /// BCXmotifs reports motifs this way.
    IndexSets {
        rows: Vec<Vec<usize>>,
        cols: Vec<Vec<usize>>,
    },
}

impl RawOutput {
    /// Normalize into the common result shape, checking the output against
    /// the data dimensions the engine was called with.
    fn normalize(
        self,
        model: ModelId,
        n_samples: usize,
        n_features: usize,
    ) -> Result<BiclusterResult, EngineInvocationError> {
        let malformed = |message: String| EngineInvocationError::MalformedOutput { model, message };

        match self {
            RawOutput::Membership {
                row_membership,
                col_membership,
            } => {
                if row_membership.nrows() != n_samples {
                    return Err(malformed(format!(
                        "row membership has {} rows, expected {} samples",
                        row_membership.nrows(),
                        n_samples
                    )));
                }
                if col_membership.ncols() != n_features {
                    return Err(malformed(format!(
                        "column membership has {} columns, expected {} features",
                        col_membership.ncols(),
                        n_features
                    )));
                }
                // the engine reports samples as rows; the normalized shape
                // wants one bicluster per row, so transpose the row side
                let rows = row_membership.t().to_owned();
                BiclusterResult::from_membership(rows, col_membership)
                    .map_err(|e| malformed(e.to_string()))
            }
            RawOutput::IndexSets { rows, cols } => {
                BiclusterResult::from_index_sets(rows, cols, n_samples, n_features)
                    .map_err(|e| malformed(e.to_string()))
            }
        }
    }
}

/// The external biclustering engine, consumed as a black box.
///
/// Implementations wrap whatever actually computes: a native library, a
/// subprocess, an FFI call. The bridge guarantees at most one `run` is in
/// flight at a time, so implementations may keep process-global state.
pub trait BiclusterEngine: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, call: &EngineCall) -> Result<RawOutput, EngineInvocationError>;
}

/// Errors surfaced at the engine boundary.
///
/// Rejections and non-convergence are reported with the engine's own
/// message attached uninterpreted.
#[derive(Debug)]
pub enum EngineInvocationError {
    EmptyInput {
        model: ModelId,
        n_samples: usize,
        n_features: usize,
    },
    Rejected {
        model: ModelId,
        message: String,
    },
    MalformedOutput {
        model: ModelId,
        message: String,
    },
}

impl EngineInvocationError {
    pub fn model(&self) -> ModelId {
        match self {
            EngineInvocationError::EmptyInput { model, .. } => *model,
            EngineInvocationError::Rejected { model, .. } => *model,
            EngineInvocationError::MalformedOutput { model, .. } => *model,
        }
    }
}

impl fmt::Display for EngineInvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineInvocationError::EmptyInput {
                model,
                n_samples,
                n_features,
            } => write!(
                f,
                "{} requires a non-empty matrix, got {}x{}",
                model, n_samples, n_features
            ),
            EngineInvocationError::Rejected { model, message } => {
                write!(f, "{} rejected the invocation: {}", model, message)
            }
            EngineInvocationError::MalformedOutput { model, message } => {
                write!(f, "{} returned malformed output: {}", model, message)
            }
        }
    }
}

impl Error for EngineInvocationError {}

// The engine keeps process-global interpreter state, so every invocation in
// the process goes through this one gate no matter how many bridges exist.
static ENGINE_GATE: Mutex<()> = Mutex::new(());

/// Narrow call surface into the external engine.
///
/// Owns the marshalling in both directions: matrix and parameters into the
/// engine's conventions on the way in, heterogeneous raw output into
/// [`BiclusterResult`] on the way out.
pub struct EngineBridge {
    engine: Box<dyn BiclusterEngine>,
}

impl EngineBridge {
    pub fn new(engine: Box<dyn BiclusterEngine>) -> Self {
        EngineBridge { engine }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Run one algorithm against the engine and normalize its output.
    ///
    /// Blocks until the engine returns; concurrent callers are serialized.
    pub fn invoke(
        &self,
        model: ModelId,
        x: ArrayView2<f64>,
        params: &ParameterSet,
        seed: u64,
    ) -> Result<BiclusterResult, EngineInvocationError> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(EngineInvocationError::EmptyInput {
                model,
                n_samples,
                n_features,
            });
        }

        let call = EngineCall {
            model,
            data: EngineMatrix::from_view(x),
            params: marshal_params(params),
            seed,
        };

        let raw = {
            // gate held only around the engine itself; normalization below
            // is pure and runs outside it
            let _gate = ENGINE_GATE.lock().unwrap_or_else(PoisonError::into_inner);
            let start = Instant::now();
            let raw = self.engine.run(&call)?;
            debug!(
                "{} returned from engine `{}` in {:?}",
                model,
                self.engine.name(),
                start.elapsed()
            );
            raw
        };

        let result = raw.normalize(model, n_samples, n_features)?;
        info!(
            "{} found {} biclusters on {}x{} data",
            model,
            result.n_biclusters(),
            n_samples,
            n_features
        );
        Ok(result)
    }
}

/// Translate parameter names into the engine's dotted convention
/// (`row_release` becomes `row.release`); values pass through unchanged.
fn marshal_params(params: &ParameterSet) -> Vec<(String, ParamValue)> {
    params
        .iter()
        .map(|(name, value)| (name.replace('_', "."), value.clone()))
        .collect()
}
