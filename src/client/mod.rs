mod cache;
mod http;
mod session;
mod submit;

pub use cache::{LAST_PROJECTION_KEY, LAST_PROJECTION_PARAMS_KEY, ResultCache};
pub use http::{Calculator, HttpCalculator, TransportError};
pub use session::Session;
pub use submit::{RequestSequencer, SubmissionOutcome, Submitter, Ticket};
