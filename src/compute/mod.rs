//! Fitted artifacts and the inference path.
//!
//! - Standardization of aligned rows ([`StandardScaler`])
//! - Linear and tree regressors ([`Regressor`])
//! - Startup loading of the scaler/model pair ([`FittedArtifacts`])

pub mod artifacts;
pub mod model;
pub mod scaler;

pub use artifacts::FittedArtifacts;
pub use model::{LinearModel, ModelKind, Regressor, TreeModel};
pub use scaler::StandardScaler;
