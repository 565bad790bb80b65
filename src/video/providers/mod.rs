//! Video generation providers.

#[cfg(feature = "runway")]
mod runway;

#[cfg(feature = "runway")]
pub use runway::{
    estimate_cost, estimate_cost_for_model, RunwayProvider, RunwayProviderBuilder, TimeoutPolicy,
    DOLLARS_PER_CREDIT,
};
