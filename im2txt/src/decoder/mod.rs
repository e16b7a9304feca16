pub(crate) mod search;
pub(crate) mod session;
pub(crate) mod state;
pub(crate) mod top_n;

pub use search::{beam_search, DecodeRun, StepOutcome};
pub use session::StepExpander;
pub use state::*;
pub use top_n::{Scored, TopN};
