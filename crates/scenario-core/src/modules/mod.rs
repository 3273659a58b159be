pub mod categorical;
pub mod delta;
pub mod growth;
pub mod mixture;
pub mod runner;
pub mod scale;
pub mod serialization;
pub mod year_assign;

mod dispatch;
pub(crate) mod helpers;
mod traits;

pub use dispatch::{FamilyFailure, FamilyOutcome, ScenarioSynthesizer, SynthesisReport};
pub use helpers::ReferenceTable;
pub use runner::{ModelRunConfig, ModelRunner, RunOutcome};
pub use traits::{FamilyRequest, FamilyTransform};
