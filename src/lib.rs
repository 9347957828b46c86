/*
 * File: /src/lib.rs
 * Created Date: Tuesday, March 18th 2025
 * Author: Zihan
 * -----
 * Last Modified: Monday, 14th April 2025 9:11:32 pm
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 */

//! Uniform wrappers for external biclustering algorithms.
//!
//! Cheng-Church, X-Motifs and Plaid live in an external statistical engine
//! with incompatible parameter sets and output shapes. This crate puts one
//! contract over all three: [`cluster::BiclusterModel`] for the fit
//! lifecycle, [`params::ParameterSet`] for configuration, and
//! [`bicluster::BiclusterResult`] for the normalized output a
//! model-selection harness scores against ground truth. The engine itself
//! stays behind [`engine::BiclusterEngine`]; all invocations are
//! serialized through [`engine::EngineBridge`].

pub mod bicluster;
pub mod cluster;
pub mod engine;
pub mod params;

pub use bicluster::BiclusterResult;
pub use cluster::{BiclusterModel, ChengChurch, FitError, Plaid, XMotifs};
pub use engine::{BiclusterEngine, EngineBridge, EngineInvocationError, ModelId};
pub use params::{ParamValue, ParameterSet};
