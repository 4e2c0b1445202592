use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use vetrina::{
    application::{
        catalog::{CatalogService, CatalogTtls},
        error::AppError,
        favorites::FavoriteService,
        objectstore::ObjectStore,
        promos::PromoService,
        repos::{FavoritesRepo, ProductsRepo, ProductsWriteRepo, PromosRepo, PromosWriteRepo},
        search::SearchIndex,
    },
    cache::{CacheStore, memory::InMemoryCache},
    config::{CliArgs, Settings},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AppState},
        objectstore::HttpObjectStore,
        redis::RedisCache,
        search::MeiliSearchIndex,
        telemetry,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let args = CliArgs::parse();
    let settings = Settings::load(&args)
        .map_err(|err| AppError::validation(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging)?;

    let state = build_state(&settings).await?;
    serve(&settings, state).await
}

async fn build_state(settings: &Settings) -> Result<AppState, AppError> {
    let repositories = Arc::new(PostgresRepositories::connect(&settings.database).await?);

    let cache: Arc<dyn CacheStore> = match settings.cache.redis_url.as_deref() {
        Some(url) => Arc::new(RedisCache::connect(url).await?),
        None => {
            info!("no redis url configured, using in-process cache");
            Arc::new(InMemoryCache::new())
        }
    };

    let index: Arc<dyn SearchIndex> = Arc::new(MeiliSearchIndex::connect(&settings.search).await?);
    let objects: Arc<dyn ObjectStore> = Arc::new(HttpObjectStore::new(&settings.object_store)?);

    let products_repo: Arc<dyn ProductsRepo> = repositories.clone();
    let products_write_repo: Arc<dyn ProductsWriteRepo> = repositories.clone();
    let promos_repo: Arc<dyn PromosRepo> = repositories.clone();
    let promos_write_repo: Arc<dyn PromosWriteRepo> = repositories.clone();
    let favorites_repo: Arc<dyn FavoritesRepo> = repositories.clone();

    let ttls = CatalogTtls {
        product: settings.cache.product_ttl(),
        listing: settings.cache.listing_ttl(),
        search: settings.cache.search_ttl(),
        visit_lock: settings.cache.visit_lock_ttl(),
    };

    let catalog = CatalogService::new(
        products_repo,
        products_write_repo.clone(),
        favorites_repo.clone(),
        cache.clone(),
        index,
        objects.clone(),
        ttls,
        settings.search.mirror_policy,
    );
    let promos = PromoService::new(
        promos_repo,
        promos_write_repo,
        products_write_repo,
        cache.clone(),
        objects,
        settings.cache.listing_ttl(),
    );
    let favorites = FavoriteService::new(
        favorites_repo,
        cache,
        settings.cache.favorite_rate_limit_window(),
    );

    Ok(AppState {
        catalog,
        promos,
        favorites,
    })
}

async fn serve(settings: &Settings, state: AppState) -> Result<(), AppError> {
    let router = http::router(state);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(InfraError::from)?;

    info!(%addr, "listening");

    let shutdown_grace = Duration::from_secs(settings.server.graceful_shutdown_secs);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown_grace))
        .await
        .map_err(InfraError::from)?;

    Ok(())
}

async fn shutdown_signal(grace: Duration) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install shutdown handler");
        return;
    }
    info!(grace_secs = grace.as_secs(), "shutdown signal received");
}
