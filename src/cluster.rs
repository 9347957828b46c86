//! Wrappers for the external biclustering algorithms.
//!
//! Three variants share one capability contract: bind a routine identifier
//! and a merged [`ParameterSet`] to the engine bridge, fit a data matrix,
//! expose the normalized result. A model-selection harness can hold them as
//! `Box<dyn BiclusterModel>` and sweep parameter grids without caring which
//! algorithm is behind the trait.

use log::info;
use ndarray::{Array2, ArrayView2};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::bicluster::BiclusterResult;
use crate::engine::{EngineBridge, EngineInvocationError, ModelId};
use crate::params::{ParamValue, ParameterSet};

/// Failure of one `fit` call. Carries the model identifier and the engine
/// error; the fit is never retried and no partial state survives it.
#[derive(Debug)]
pub struct FitError {
    model: ModelId,
    source: EngineInvocationError,
}

impl FitError {
    pub fn model(&self) -> ModelId {
        self.model
    }
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fitting {} failed: {}", self.model, self.source)
    }
}

impl Error for FitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Common contract over the three algorithm variants.
///
/// `fit` blocks until the engine returns and yields a reference to the
/// stored result, so `model.fit(x.view())?.biclusters()` reads in one
/// expression. The accessors return `None` until a fit has succeeded; a
/// failed fit leaves the model unfitted even if an earlier fit succeeded.
pub trait BiclusterModel {
    fn model_id(&self) -> ModelId;

    fn params(&self) -> &ParameterSet;

    fn random_state(&self) -> u64;

    fn fit(&mut self, x: ArrayView2<f64>) -> Result<&BiclusterResult, FitError>;

    fn fitted(&self) -> Option<&BiclusterResult>;

    /// Boolean row-membership matrix (n_biclusters x n_samples).
    fn rows(&self) -> Option<&Array2<bool>> {
        self.fitted().map(|result| result.rows())
    }

    /// Boolean column-membership matrix (n_biclusters x n_features).
    fn columns(&self) -> Option<&Array2<bool>> {
        self.fitted().map(|result| result.columns())
    }

    /// Ordered (row-index-set, column-index-set) pairs, one per bicluster.
    fn biclusters(&self) -> Option<&[(Vec<usize>, Vec<usize>)]> {
        self.fitted().map(|result| result.biclusters())
    }
}

/// State shared by every variant: one bridge call per fit, results
/// overwritten wholesale, cleared up front so a failure leaves nothing.
struct ModelCore {
    model: ModelId,
    bridge: Arc<EngineBridge>,
    params: ParameterSet,
    random_state: u64,
    fitted: Option<BiclusterResult>,
}

impl ModelCore {
    fn new(
        model: ModelId,
        bridge: Arc<EngineBridge>,
        random_state: u64,
        defaults: ParameterSet,
        overrides: &[(&str, ParamValue)],
    ) -> Self {
        ModelCore {
            model,
            bridge,
            params: defaults.merge(overrides),
            random_state,
            fitted: None,
        }
    }

    fn fit(&mut self, x: ArrayView2<f64>) -> Result<&BiclusterResult, FitError> {
        // clear first: a failed fit must leave the model as if never fit
        self.fitted = None;

        let start = Instant::now();
        let result = self
            .bridge
            .invoke(self.model, x, &self.params, self.random_state)
            .map_err(|source| FitError {
                model: self.model,
                source,
            })?;
        info!(
            "{} fit completed in {:?}, {} biclusters",
            self.model,
            start.elapsed(),
            result.n_biclusters()
        );

        Ok(self.fitted.insert(result))
    }
}

/// Wrapper for the engine's BCCC routine (Cheng & Church).
pub struct ChengChurch {
    core: ModelCore,
}

impl ChengChurch {
    pub fn defaults() -> ParameterSet {
        ParameterSet::from_defaults(&[
            ("delta", ParamValue::Float(0.1)),
            ("alpha", ParamValue::Float(1.5)),
            ("number", ParamValue::Int(100)),
        ])
    }

    pub fn new(bridge: Arc<EngineBridge>, random_state: u64) -> Self {
        Self::with_params(bridge, random_state, &[])
    }

    pub fn with_params(
        bridge: Arc<EngineBridge>,
        random_state: u64,
        overrides: &[(&str, ParamValue)],
    ) -> Self {
        ChengChurch {
            core: ModelCore::new(
                ModelId::ChengChurch,
                bridge,
                random_state,
                Self::defaults(),
                overrides,
            ),
        }
    }
}

impl BiclusterModel for ChengChurch {
    fn model_id(&self) -> ModelId {
        self.core.model
    }

    fn params(&self) -> &ParameterSet {
        &self.core.params
    }

    fn random_state(&self) -> u64 {
        self.core.random_state
    }

    fn fit(&mut self, x: ArrayView2<f64>) -> Result<&BiclusterResult, FitError> {
        self.core.fit(x)
    }

    fn fitted(&self) -> Option<&BiclusterResult> {
        self.core.fitted.as_ref()
    }
}

/// Wrapper for the engine's BCXmotifs routine.
pub struct XMotifs {
    core: ModelCore,
}

impl XMotifs {
    pub fn defaults() -> ParameterSet {
        ParameterSet::from_defaults(&[
            ("number", ParamValue::Int(1)),
            ("ns", ParamValue::Int(200)),
            ("nd", ParamValue::Int(100)),
            ("sd", ParamValue::Int(5)),
            ("alpha", ParamValue::Float(0.05)),
        ])
    }

    pub fn new(bridge: Arc<EngineBridge>, random_state: u64) -> Self {
        Self::with_params(bridge, random_state, &[])
    }

    pub fn with_params(
        bridge: Arc<EngineBridge>,
        random_state: u64,
        overrides: &[(&str, ParamValue)],
    ) -> Self {
        XMotifs {
            core: ModelCore::new(
                ModelId::XMotifs,
                bridge,
                random_state,
                Self::defaults(),
                overrides,
            ),
        }
    }
}

impl BiclusterModel for XMotifs {
    fn model_id(&self) -> ModelId {
        self.core.model
    }

    fn params(&self) -> &ParameterSet {
        &self.core.params
    }

    fn random_state(&self) -> u64 {
        self.core.random_state
    }

    fn fit(&mut self, x: ArrayView2<f64>) -> Result<&BiclusterResult, FitError> {
        self.core.fit(x)
    }

    fn fitted(&self) -> Option<&BiclusterResult> {
        self.core.fitted.as_ref()
    }
}

/// Wrapper for the engine's BCPlaid routine.
///
/// `fit_model` is an opaque model formula (additive row, column and layer
/// effects by default) handed to the engine uninterpreted.
pub struct Plaid {
    core: ModelCore,
}

impl Plaid {
    pub fn defaults() -> ParameterSet {
        ParameterSet::from_defaults(&[
            ("cluster", ParamValue::Str("b".to_string())),
            ("fit_model", ParamValue::formula("y ~ m + a + b")),
            ("background", ParamValue::Bool(true)),
            ("row_release", ParamValue::Float(0.7)),
            ("col_release", ParamValue::Float(0.7)),
            ("shuffle", ParamValue::Int(3)),
            ("back_fit", ParamValue::Int(0)),
            ("max_layers", ParamValue::Int(20)),
            ("iter_startup", ParamValue::Int(5)),
            ("iter_layer", ParamValue::Int(10)),
            ("verbose", ParamValue::Bool(false)),
        ])
    }

    pub fn new(bridge: Arc<EngineBridge>, random_state: u64) -> Self {
        Self::with_params(bridge, random_state, &[])
    }

    pub fn with_params(
        bridge: Arc<EngineBridge>,
        random_state: u64,
        overrides: &[(&str, ParamValue)],
    ) -> Self {
        Plaid {
            core: ModelCore::new(
                ModelId::Plaid,
                bridge,
                random_state,
                Self::defaults(),
                overrides,
            ),
        }
    }
}

impl BiclusterModel for Plaid {
    fn model_id(&self) -> ModelId {
        self.core.model
    }

    fn params(&self) -> &ParameterSet {
        &self.core.params
    }

    fn random_state(&self) -> u64 {
        self.core.random_state
    }

    fn fit(&mut self, x: ArrayView2<f64>) -> Result<&BiclusterResult, FitError> {
        self.core.fit(x)
    }

    fn fitted(&self) -> Option<&BiclusterResult> {
        self.core.fitted.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BiclusterEngine, EngineCall, RawOutput};
    use ndarray::Array2;

    /// Reports one bicluster spanning the top-left half of the data.
    struct HalfBlockEngine;

    impl BiclusterEngine for HalfBlockEngine {
        fn name(&self) -> &str {
            "half-block"
        }

        fn run(&self, call: &EngineCall) -> Result<RawOutput, EngineInvocationError> {
            let rows: Vec<usize> = (0..call.data.nrow() / 2).collect();
            let cols: Vec<usize> = (0..call.data.ncol() / 2).collect();
            Ok(RawOutput::IndexSets {
                rows: vec![rows],
                cols: vec![cols],
            })
        }
    }

    struct FailingEngine;

    impl BiclusterEngine for FailingEngine {
        fn name(&self) -> &str {
            "failing"
        }

        fn run(&self, call: &EngineCall) -> Result<RawOutput, EngineInvocationError> {
            Err(EngineInvocationError::Rejected {
                model: call.model,
                message: "did not converge".to_string(),
            })
        }
    }

    fn half_block_bridge() -> Arc<EngineBridge> {
        Arc::new(EngineBridge::new(Box::new(HalfBlockEngine)))
    }

    #[test]
    fn test_cheng_church_defaults() {
        let model = ChengChurch::new(half_block_bridge(), 0);

        assert_eq!(model.model_id(), ModelId::ChengChurch);
        assert_eq!(model.params().get("delta"), Some(&ParamValue::Float(0.1)));
        assert_eq!(model.params().get("alpha"), Some(&ParamValue::Float(1.5)));
        assert_eq!(model.params().get("number"), Some(&ParamValue::Int(100)));
        assert_eq!(model.params().len(), 3);
        assert!(model.fitted().is_none());
    }

    #[test]
    fn test_xmotifs_defaults() {
        let model = XMotifs::new(half_block_bridge(), 0);

        assert_eq!(model.model_id(), ModelId::XMotifs);
        assert_eq!(model.params().get("number"), Some(&ParamValue::Int(1)));
        assert_eq!(model.params().get("ns"), Some(&ParamValue::Int(200)));
        assert_eq!(model.params().get("nd"), Some(&ParamValue::Int(100)));
        assert_eq!(model.params().get("sd"), Some(&ParamValue::Int(5)));
        assert_eq!(model.params().get("alpha"), Some(&ParamValue::Float(0.05)));
        assert_eq!(model.params().len(), 5);
    }

    #[test]
    fn test_plaid_defaults() {
        let model = Plaid::new(half_block_bridge(), 0);

        assert_eq!(model.model_id(), ModelId::Plaid);
        assert_eq!(
            model.params().get("cluster"),
            Some(&ParamValue::Str("b".to_string()))
        );
        assert_eq!(
            model.params().get("fit_model"),
            Some(&ParamValue::Formula("y ~ m + a + b".to_string()))
        );
        assert_eq!(model.params().get("back_fit"), Some(&ParamValue::Int(0)));
        assert_eq!(model.params().get("max_layers"), Some(&ParamValue::Int(20)));
        assert_eq!(
            model.params().get("verbose"),
            Some(&ParamValue::Bool(false))
        );
        assert_eq!(model.params().len(), 11);
    }

    #[test]
    fn test_overrides_merge_and_unknown_keys_drop() {
        let model = ChengChurch::with_params(
            half_block_bridge(),
            0,
            &[
                ("delta", ParamValue::Float(0.2)),
                ("bogus", ParamValue::Int(1)),
            ],
        );

        assert_eq!(model.params().get("delta"), Some(&ParamValue::Float(0.2)));
        assert!(!model.params().contains("bogus"));
        assert_eq!(model.params().len(), 3);
    }

    #[test]
    fn test_fit_stores_result() {
        let mut model = ChengChurch::new(half_block_bridge(), 0);
        let x = Array2::<f64>::ones((6, 4));

        let result = model.fit(x.view()).unwrap();
        assert_eq!(result.n_biclusters(), 1);
        assert_eq!(result.biclusters()[0], (vec![0, 1, 2], vec![0, 1]));

        assert_eq!(model.rows().unwrap().dim(), (1, 6));
        assert_eq!(model.columns().unwrap().dim(), (1, 4));
        assert_eq!(model.biclusters().unwrap().len(), 1);
    }

    #[test]
    fn test_fit_failure_propagates_and_leaves_unfit() {
        let bridge = Arc::new(EngineBridge::new(Box::new(FailingEngine)));
        let mut model = XMotifs::new(bridge, 0);
        let x = Array2::<f64>::ones((4, 4));

        let err = model.fit(x.view()).unwrap_err();
        assert_eq!(err.model(), ModelId::XMotifs);
        assert!(err.to_string().contains("did not converge"));
        assert!(err.source().is_some());

        assert!(model.fitted().is_none());
        assert!(model.rows().is_none());
        assert!(model.columns().is_none());
        assert!(model.biclusters().is_none());
    }

    #[test]
    fn test_failed_fit_clears_previous_result() {
        // succeed against the block engine, then fail on empty input
        let mut model = Plaid::new(half_block_bridge(), 0);
        let x = Array2::<f64>::ones((4, 4));
        model.fit(x.view()).unwrap();
        assert!(model.fitted().is_some());

        let empty = Array2::<f64>::zeros((0, 4));
        assert!(model.fit(empty.view()).is_err());
        assert!(model.fitted().is_none());
    }

    #[test]
    fn test_models_behind_trait_object() {
        let bridge = half_block_bridge();
        let mut models: Vec<Box<dyn BiclusterModel>> = vec![
            Box::new(ChengChurch::new(bridge.clone(), 0)),
            Box::new(XMotifs::new(bridge.clone(), 0)),
            Box::new(Plaid::new(bridge, 0)),
        ];
        let x = Array2::<f64>::ones((8, 6));

        for model in models.iter_mut() {
            let result = model.fit(x.view()).unwrap();
            assert_eq!(result.n_biclusters(), 1);
        }
        let ids: Vec<ModelId> = models.iter().map(|m| m.model_id()).collect();
        assert_eq!(ids, vec![ModelId::ChengChurch, ModelId::XMotifs, ModelId::Plaid]);
    }
}
