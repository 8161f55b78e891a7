use std::{process, sync::Arc, time::Duration};

use duodriven::{
    application::{
        blog::BlogService,
        chat::ChatService,
        contact::ContactService,
        error::AppError,
        gateways::{ChatGateway, ContactForwarder},
        newsletter::NewsletterService,
        posts::PostService,
        render::markdown_renderer,
        repos::{ContactsRepo, HealthRepo, PostsRepo, PostsWriteRepo, SubscribersRepo},
        scheduler::spawn_publication_sweep,
        sitemap::SitemapService,
        stats::StatsService,
        syndication::SyndicationService,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiRateLimiter, ApiState, HttpState, RouterState},
        telemetry,
        webhooks::{WebhookChatGateway, WebhookContactForwarder},
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(kind = error.kind(), error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(kind = error.kind(), error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;
    info!(
        environment = settings.site.environment.as_str(),
        version = env!("CARGO_PKG_VERSION"),
        "duodriven starting"
    );

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
        config::Command::PublishScheduled(_) => run_publish_scheduled(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    init_repositories(&settings).await?;
    info!("database migrations applied");
    Ok(())
}

async fn run_publish_scheduled(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let posts = PostService::new(repositories.clone(), repositories);
    let published = posts.publish_scheduled().await?;
    info!(count = published.len(), ids = ?published, "scheduled posts published");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_router_state(repositories, &settings)?;

    let sweep_handle = settings.scheduler.enabled.then(|| {
        spawn_publication_sweep(state.api.posts.as_ref().clone(), settings.scheduler.cadence)
    });

    let result = serve_http(&settings, state).await;

    if let Some(handle) = sweep_handle {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let pool = PostgresRepositories::connect(
        &settings.database.url,
        settings.database.max_connections.get(),
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_router_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<RouterState, AppError> {
    let posts_reader: Arc<dyn PostsRepo> = repositories.clone();
    let posts_writer: Arc<dyn PostsWriteRepo> = repositories.clone();
    let subscribers: Arc<dyn SubscribersRepo> = repositories.clone();
    let contacts: Arc<dyn ContactsRepo> = repositories.clone();
    let health: Arc<dyn HealthRepo> = repositories;

    let (chat_gateway, contact_forwarder) = build_webhooks(&settings.integrations)?;
    let public_url = settings.site.public_url.as_str();

    let newsletter = Arc::new(NewsletterService::new(subscribers.clone()));
    let http_state = HttpState {
        blog: Arc::new(BlogService::new(
            posts_reader.clone(),
            posts_writer.clone(),
            markdown_renderer(),
        )),
        syndication: Arc::new(SyndicationService::new(posts_reader.clone(), public_url)),
        sitemap: Arc::new(SitemapService::new(posts_reader.clone(), public_url)),
        chat: Arc::new(ChatService::new(chat_gateway)),
        contact: Arc::new(ContactService::new(contacts.clone(), contact_forwarder)),
        newsletter: newsletter.clone(),
        health,
        public_url: Arc::from(public_url),
    };

    if settings.api.key.is_none() {
        warn!("no API key configured; the content API rejects every request");
    }

    let api_state = ApiState {
        api_key: settings.api.key.as_deref().map(Arc::from),
        posts: Arc::new(PostService::new(posts_reader.clone(), posts_writer)),
        newsletter,
        stats: Arc::new(StatsService::new(posts_reader, subscribers, contacts)),
        rate_limiter: Arc::new(ApiRateLimiter::new(
            Duration::from_secs(settings.rate_limit.window_seconds.get().into()),
            settings.rate_limit.max_requests.get(),
        )),
    };

    Ok(RouterState {
        http: http_state,
        api: api_state,
    })
}

type Webhooks = (
    Option<Arc<dyn ChatGateway>>,
    Option<Arc<dyn ContactForwarder>>,
);

fn build_webhooks(integrations: &config::IntegrationSettings) -> Result<Webhooks, AppError> {
    let chat: Option<Arc<dyn ChatGateway>> = match integrations.chat_webhook_url.as_ref() {
        Some(url) => Some(Arc::new(
            WebhookChatGateway::new(url.clone(), integrations.chat_timeout).map_err(|err| {
                AppError::from(InfraError::configuration(format!(
                    "failed to build chat webhook client: {err}"
                )))
            })?,
        )),
        None => {
            warn!("chat webhook not configured; chat replies with the fallback message");
            None
        }
    };

    let contact: Option<Arc<dyn ContactForwarder>> =
        match integrations.contact_webhook_url.as_ref() {
            Some(url) => Some(Arc::new(
                WebhookContactForwarder::new(url.clone(), integrations.contact_timeout).map_err(
                    |err| {
                        AppError::from(InfraError::configuration(format!(
                            "failed to build contact webhook client: {err}"
                        )))
                    },
                )?,
            )),
            None => None,
        };

    Ok((chat, contact))
}

async fn serve_http(settings: &config::Settings, state: RouterState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(addr = %settings.server.addr, "listening");

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown({
        let shutdown = shutdown.clone();
        async move { shutdown.notified().await }
    });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut server => return flatten_server_result(joined),
        _ = shutdown_signal() => {}
    }

    info!(
        grace_seconds = settings.server.graceful_shutdown.as_secs(),
        "shutdown requested; draining connections"
    );
    shutdown.notify_one();

    match tokio::time::timeout(settings.server.graceful_shutdown, &mut server).await {
        Ok(joined) => flatten_server_result(joined),
        Err(_) => {
            warn!("graceful shutdown timed out; aborting open connections");
            server.abort();
            Ok(())
        }
    }
}

fn flatten_server_result(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    joined
        .map_err(|err| AppError::unexpected(format!("server task failed: {err}")))?
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
