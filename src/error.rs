//! Error types for the extent-aging simulator.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running the simulator.
///
/// Per `spec.md` §7, only configuration problems are recoverable this way;
/// invariant violations are `assert!`/`panic!` because they indicate a bug
/// in the simulator, not a workload condition.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// A primary or secondary threshold was given outside `[0, 100]`.
    #[error("threshold out of range [0, 100]: {name} = {value}")]
    ThresholdOutOfRange { name: String, value: i64 },

    /// Stripe geometry is internally inconsistent.
    #[error(
        "inconsistent stripe geometry: num_localities={num_localities} \
         num_data_exts_per_locality={num_data_exts_per_locality}, \
         need localities * per_locality >= 1"
    )]
    InvalidGeometry {
        num_localities: usize,
        num_data_exts_per_locality: usize,
    },

    /// Two components were constructed with conflicting sampler seeds.
    #[error("sampler seed conflict: {0}")]
    SamplerSeedConflict(String),

    /// `ext_size` or another numeric CLI argument was not a valid positive
    /// integer.
    #[error("invalid configuration value: {0}")]
    InvalidConfig(String),
}
