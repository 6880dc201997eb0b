//! 投票台账服务单元测试
//!
//! 覆盖一天一票（含并发竞争与跨天恢复）、目标合法性检查、
//! 唯一约束作为权威去重信号，以及存储层失败的传播。

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use domain::{
    Application, ApplicationId, ApplicationRepository, PeriodId, RepositoryError, VisitorId, Vote,
    VoteRepository, VotingPeriod,
};

use crate::clock::Clock;
use crate::errors::{ApplicationError, VoteError};
use crate::services::support::{InMemoryStorage, ManualClock};
use crate::services::vote_service::{VoteService, VoteServiceDependencies};

fn clock_at(hour: u32) -> Arc<ManualClock> {
    Arc::new(ManualClock::at(
        Utc.with_ymd_and_hms(2026, 3, 10, hour, 0, 0).unwrap(),
    ))
}

fn vote_service(storage: &Arc<InMemoryStorage>, clock: &Arc<ManualClock>) -> VoteService {
    VoteService::new(VoteServiceDependencies {
        vote_repository: storage.clone(),
        application_repository: storage.clone(),
        clock: clock.clone(),
    })
}

/// 铸造一个投票中的周期和一份入选申请
async fn seed_ballot(storage: &Arc<InMemoryStorage>) -> (PeriodId, ApplicationId) {
    let mut period = VotingPeriod::open(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(), 30);
    period.start_voting().unwrap();
    let period_id = period.id;
    domain::PeriodRepository::create(storage.as_ref(), &period)
        .await
        .unwrap();

    let mut application = Application::new(
        "a".repeat(250),
        3000.0,
        "Other",
        "contact@example.com",
        Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap(),
    );
    application.approve();
    application.mark_selected(period_id).unwrap();
    storage.create(&application).await.unwrap();

    (period_id, application.id)
}

#[tokio::test]
async fn first_vote_of_the_day_succeeds() {
    let storage = InMemoryStorage::new();
    let clock = clock_at(13);
    let service = vote_service(&storage, &clock);
    let (period, target) = seed_ballot(&storage).await;

    let outcome = service.cast_vote("v_abc123", target, period).await.unwrap();

    assert_eq!(outcome.application_id, target);
    // 下一次可投时间是下一个 UTC 零点
    assert_eq!(
        outcome.next_vote_time,
        Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap()
    );
    assert_eq!(storage.votes_of(target).await, 1);
    assert_eq!(storage.vote_records().await, 1);
}

#[tokio::test]
async fn second_vote_same_day_is_rejected_with_next_time() {
    let storage = InMemoryStorage::new();
    let clock = clock_at(13);
    let service = vote_service(&storage, &clock);
    let (period, target) = seed_ballot(&storage).await;

    service.cast_vote("v_abc123", target, period).await.unwrap();
    let second = service.cast_vote("v_abc123", target, period).await;

    match second {
        Err(ApplicationError::Vote(VoteError::AlreadyVotedToday { next_vote_time })) => {
            assert_eq!(
                next_vote_time,
                Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap()
            );
        }
        other => panic!("期望 AlreadyVotedToday，实际: {other:?}"),
    }

    assert_eq!(storage.votes_of(target).await, 1);
    assert_eq!(storage.vote_records().await, 1);
}

#[tokio::test]
async fn concurrent_double_vote_increments_tally_exactly_once() {
    let storage = InMemoryStorage::new();
    let clock = clock_at(13);
    let service = vote_service(&storage, &clock);
    let (period, target) = seed_ballot(&storage).await;

    let (left, right) = futures::join!(
        service.cast_vote("v_abc123", target, period),
        service.cast_vote("v_abc123", target, period)
    );

    let successes = [&left, &right].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "并发双投只允许一票生效");
    assert_eq!(storage.votes_of(target).await, 1);
    assert_eq!(storage.vote_records().await, 1);
}

#[tokio::test]
async fn visitor_can_vote_again_next_day() {
    let storage = InMemoryStorage::new();
    let clock = clock_at(13);
    let service = vote_service(&storage, &clock);
    let (period, target) = seed_ballot(&storage).await;

    let first = service.cast_vote("v_abc123", target, period).await.unwrap();
    assert!(!service.can_vote_today("v_abc123", period).await.unwrap());

    clock.advance_days(1);

    // 第一次投票返回的 next_vote_time 恰好落在新的一天的开始
    assert!(first.next_vote_time <= clock.now());
    assert!(service.can_vote_today("v_abc123", period).await.unwrap());

    service.cast_vote("v_abc123", target, period).await.unwrap();
    assert_eq!(storage.votes_of(target).await, 2);
}

#[tokio::test]
async fn different_visitors_vote_independently() {
    let storage = InMemoryStorage::new();
    let clock = clock_at(13);
    let service = vote_service(&storage, &clock);
    let (period, target) = seed_ballot(&storage).await;

    service.cast_vote("v_alice", target, period).await.unwrap();
    service.cast_vote("v_bob", target, period).await.unwrap();

    assert_eq!(storage.votes_of(target).await, 2);
}

#[tokio::test]
async fn vote_for_unknown_application_is_ineligible() {
    let storage = InMemoryStorage::new();
    let clock = clock_at(13);
    let service = vote_service(&storage, &clock);
    let (period, _) = seed_ballot(&storage).await;

    let ghost = ApplicationId(uuid::Uuid::new_v4());
    let result = service.cast_vote("v_abc123", ghost, period).await;
    assert!(matches!(
        result,
        Err(ApplicationError::Vote(VoteError::IneligibleTarget(_)))
    ));
}

#[tokio::test]
async fn vote_for_unselected_application_is_ineligible() {
    let storage = InMemoryStorage::new();
    let clock = clock_at(13);
    let service = vote_service(&storage, &clock);
    let (period, _) = seed_ballot(&storage).await;

    // 待审核申请不在选票上
    let pending = Application::new(
        "a".repeat(250),
        900.0,
        "Other",
        "contact@example.com",
        clock.now(),
    );
    storage.create(&pending).await.unwrap();

    let result = service.cast_vote("v_abc123", pending.id, period).await;
    assert!(matches!(
        result,
        Err(ApplicationError::Vote(VoteError::IneligibleTarget(_)))
    ));
    assert_eq!(storage.vote_records().await, 0);
}

#[tokio::test]
async fn vote_for_application_of_another_period_is_ineligible() {
    let storage = InMemoryStorage::new();
    let clock = clock_at(13);
    let service = vote_service(&storage, &clock);
    let (_, target) = seed_ballot(&storage).await;

    let foreign_period = PeriodId(uuid::Uuid::new_v4());
    let result = service.cast_vote("v_abc123", target, foreign_period).await;
    assert!(matches!(
        result,
        Err(ApplicationError::Vote(VoteError::IneligibleTarget(_)))
    ));
}

#[tokio::test]
async fn voting_status_reflects_today_vote() {
    let storage = InMemoryStorage::new();
    let clock = clock_at(13);
    let service = vote_service(&storage, &clock);
    let (period, target) = seed_ballot(&storage).await;

    let before = service.voting_status("v_abc123", period).await.unwrap();
    assert!(before.can_vote);
    assert!(!before.voted_today);
    assert!(before.today_votes.is_empty());
    assert!(before.next_vote_time.is_none());

    service.cast_vote("v_abc123", target, period).await.unwrap();

    let after = service.voting_status("v_abc123", period).await.unwrap();
    assert!(!after.can_vote);
    assert!(after.voted_today);
    assert_eq!(after.today_votes, vec![target]);
    assert_eq!(
        after.next_vote_time,
        Some(Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap())
    );
}

mockall::mock! {
    pub VoteRepo {}

    #[async_trait::async_trait]
    impl VoteRepository for VoteRepo {
        async fn find_vote_on_day(
            &self,
            visitor_id: &VisitorId,
            period_id: PeriodId,
            day: NaiveDate,
        ) -> Result<Option<Vote>, RepositoryError>;
        async fn record_vote(&self, vote: &Vote) -> Result<Vote, RepositoryError>;
        async fn count_votes(&self, period_id: Option<PeriodId>) -> Result<u64, RepositoryError>;
    }
}

#[tokio::test]
async fn uniqueness_conflict_is_the_authoritative_dedup_signal() {
    // 预检查放行、写入时撞唯一约束——竞争窗口内的真实情形
    let storage = InMemoryStorage::new();
    let (period, target) = seed_ballot(&storage).await;

    let mut votes = MockVoteRepo::new();
    votes
        .expect_find_vote_on_day()
        .returning(|_, _, _| Ok(None));
    votes
        .expect_record_vote()
        .returning(|_| Err(RepositoryError::Conflict));

    let clock = clock_at(13);
    let service = VoteService::new(VoteServiceDependencies {
        vote_repository: Arc::new(votes),
        application_repository: storage.clone(),
        clock: clock.clone(),
    });

    let result = service.cast_vote("v_abc123", target, period).await;
    assert!(matches!(
        result,
        Err(ApplicationError::Vote(VoteError::AlreadyVotedToday { .. }))
    ));
}

#[tokio::test]
async fn storage_failure_surfaces_as_hard_error() {
    let storage = InMemoryStorage::new();
    let (period, target) = seed_ballot(&storage).await;

    let mut votes = MockVoteRepo::new();
    votes
        .expect_find_vote_on_day()
        .returning(|_, _, _| Err(RepositoryError::storage("数据库不可用")));

    let clock = clock_at(13);
    let service = VoteService::new(VoteServiceDependencies {
        vote_repository: Arc::new(votes),
        application_repository: storage.clone(),
        clock: clock.clone(),
    });

    let result = service.cast_vote("v_abc123", target, period).await;
    assert!(matches!(
        result,
        Err(ApplicationError::Repository(RepositoryError::Storage { .. }))
    ));
}
