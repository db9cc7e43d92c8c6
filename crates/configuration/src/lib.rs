pub mod configuration;
pub mod environment;
pub mod error;
pub mod identity;
pub mod values;
pub mod version1;

pub use configuration::{make_runtime_configuration, Configuration};
pub use error::IdentityError;
pub use identity::ConnectionIdentity;
pub use values::uri::ConnectionUri;
pub use version1::{parse_configuration, sample_configuration, ParsedConfiguration};

/// One-line description of what the collector does.
pub fn description() -> &'static str {
    "Read metrics from one database instance."
}
