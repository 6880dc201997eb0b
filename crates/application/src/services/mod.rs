mod application_service;
mod period_closer;
mod period_service;
mod selection_service;
mod vote_service;

pub use application_service::{
    ApplicationService, ApplicationServiceDependencies, SubmitApplicationRequest,
};
pub use period_closer::{PeriodCloser, PeriodCloserDependencies};
pub use period_service::{PeriodService, PeriodServiceDependencies, PeriodSnapshot};
pub use selection_service::{SelectionOutcome, SelectionService, SelectionServiceDependencies};
pub use vote_service::{VoteOutcome, VoteService, VoteServiceDependencies, VotingStatus};

#[cfg(test)]
mod support;

#[cfg(test)]
mod vote_service_tests;
