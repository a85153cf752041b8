pub mod error;
pub mod settings;
pub mod format;
pub mod sphinx;
pub mod plan;
pub mod target;
pub mod executor;
pub mod report;
pub mod cli;

pub use error::StepError;
pub use executor::{Executor, Launcher, SystemLauncher};
pub use plan::{Invocation, Plan, Step};
pub use settings::BuildSettings;
pub use target::Target;
