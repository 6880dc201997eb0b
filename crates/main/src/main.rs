//! 主应用程序入口
//!
//! 装配存储、应用服务与 Axum Web API 并启动服务。

use std::sync::Arc;

use application::{
    ApplicationService, ApplicationServiceDependencies, PeriodCloser, PeriodCloserDependencies,
    PeriodService, PeriodServiceDependencies, SelectionService, SelectionServiceDependencies,
    SystemClock, VoteService, VoteServiceDependencies,
};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, PgApplicationRepository, PgPeriodRepository, PgVoteRepository, MIGRATOR,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, AppStateConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 加载配置
    let config = AppConfig::load()?;

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').last().unwrap_or("unknown")
    );

    // 创建 PostgreSQL 连接池并运行迁移
    let pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;
    MIGRATOR.run(&pool).await?;

    // 创建 repository 实例
    let application_repository: Arc<dyn domain::ApplicationRepository> =
        Arc::new(PgApplicationRepository::new(pool.clone()));
    let period_repository: Arc<dyn domain::PeriodRepository> =
        Arc::new(PgPeriodRepository::new(pool.clone()));
    let vote_repository: Arc<dyn domain::VoteRepository> = Arc::new(PgVoteRepository::new(pool));

    let clock: Arc<dyn application::Clock> = Arc::new(SystemClock);

    // 创建应用层服务
    let application_service = Arc::new(ApplicationService::new(ApplicationServiceDependencies {
        application_repository: application_repository.clone(),
        clock: clock.clone(),
    }));

    let selection_service = Arc::new(SelectionService::new(SelectionServiceDependencies {
        application_repository: application_repository.clone(),
    }));

    let period_service = Arc::new(PeriodService::new(PeriodServiceDependencies {
        period_repository: period_repository.clone(),
        application_repository: application_repository.clone(),
        clock: clock.clone(),
        period_duration_days: config.voting.period_duration_days,
    }));

    let period_closer = Arc::new(PeriodCloser::new(PeriodCloserDependencies {
        period_repository: period_repository.clone(),
        clock: clock.clone(),
        period_duration_days: config.voting.period_duration_days,
    }));

    let vote_service = Arc::new(VoteService::new(VoteServiceDependencies {
        vote_repository,
        application_repository: application_repository.clone(),
        clock,
    }));

    // 创建应用状态
    let state = AppState::new(AppStateConfig {
        application_service,
        selection_service,
        period_service,
        period_closer,
        vote_service,
        admin_token: config.admin.token.clone(),
        default_selection_count: config.voting.selection_count,
    });

    // 启动 Web 服务器
    let app = router(state);
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;

    tracing::info!(
        "资助投票服务启动在 http://{}:{}",
        config.server.host,
        config.server.port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
