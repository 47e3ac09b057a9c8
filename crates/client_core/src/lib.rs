//! Client-side state machines for the receipts service: the gateway that
//! owns all network I/O, the explicit session context, and the controllers
//! behind the upload, listing and detail views.

pub mod auth;
pub mod config;
pub mod criteria;
pub mod detail;
pub mod error;
pub mod gateway;
pub mod highlight;
pub mod listing;
pub mod outcome;
pub mod submission;
pub mod view;

pub use auth::{AuthContext, LoginResult, MemorySessionStore, Navigator, Route, SessionStore};
pub use criteria::{SearchCriteria, SearchForm};
pub use detail::{DetailController, ErrorReporter};
pub use error::{FailureReport, GatewayError};
pub use gateway::{GatewayClient, UploadFile};
pub use highlight::HighlightTerm;
pub use listing::ListingController;
pub use outcome::RequestOutcome;
pub use submission::{SubmissionMachine, SubmissionState, UploadForm};

#[cfg(test)]
mod test_support;
