//! Scenario input synthesis for an external travel-demand model.
//!
//! A model configuration declares families of input files. For one
//! experiment's parameters, every triggered family materialises its working
//! input files from packaged reference sets by category substitution, mixture,
//! delta extrapolation, column scaling or one of the template manipulations.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;

pub use common::config::{ModelConfig, ModelConfigError};
pub use domain::{
    FamilyDescriptor, FamilyKind, ParameterDictionary, ParameterValue, ScenarioError,
    ScenarioErrorCategory, ScenarioResult, SynthesisError, SynthesisRequest, WorkingArtifact,
};
pub use modules::{
    FamilyFailure, FamilyOutcome, ModelRunConfig, ModelRunner, RunOutcome, ScenarioSynthesizer,
    SynthesisReport,
};
