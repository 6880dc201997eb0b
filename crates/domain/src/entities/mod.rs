//! 领域实体模块

pub mod application;
pub mod vote;
pub mod voting_period;

pub use application::{
    is_supported_country, Application, ApplicationId, ApplicationStatus, SUPPORTED_COUNTRIES,
};
pub use vote::{next_vote_time, Vote, VoteId};
pub use voting_period::{PeriodId, PeriodStatus, VotingPeriod};
