use std::{io, sync::OnceLock, time};

use application::{
    config,
    gateway::{self, Clients, Gateway},
    rpc::{
        auth::{self, Auth},
        identity::{self, Identity},
        task::{self, Tasks},
        Http,
    },
    Args, Component, Config, Service,
};
use axum::{body::Body, extract::MatchedPath, Router};
use axum_client_ip::InsecureClientIp;
use service::infra::{
    cache::{self, KeyValue, Redis},
    postgres, Postgres,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    fmt::MakeWriter,
    layer::{Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
};

/// Levels written to stderr rather than stdout.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Most verbose level written, once the [`Config`] is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(output(io::stdout, false))
        .with(output(io::stderr, true))
        .init();

    _ = start().await;
}

/// Creates a compact log output writing either the [`STDERR_LEVELS`] or all
/// the others, down to the configured [`LOG_LEVEL`].
fn output<S, W>(writer: W, stderr: bool) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_filter(filter_fn(move |meta| {
            let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
            meta.is_span()
                || STDERR_LEVELS.contains(meta.level()) == stderr
                    && max >= *meta.level()
        }))
}

async fn start() -> Result<(), ()> {
    let Args { config, component } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        server,
        token,
        postgres,
        redis,
        clients,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let app: Router = match component {
        Component::Gateway => {
            let client = reqwest::Client::new();
            let clients = Clients {
                identity: Http::with_client(client.clone(), clients.identity),
                auth: Http::with_client(client.clone(), clients.auth),
                task: Http::with_client(client, clients.task),
            };
            gateway::router(Gateway::new(clients, token.into()))
        }
        Component::Identity => identity::router(Identity::new(Service::new(
            token.into(),
            connect(postgres).await?,
        ))),
        Component::Auth => auth::router(Auth::new(Service::new(
            token.into(),
            connect(postgres).await?,
        ))),
        Component::Task => {
            let redis = Redis::new(&cache::redis::Config::from(redis))
                .map_err(|e| {
                    log::error!("failed to initialize `Redis` client: {e}");
                })?;
            task::router(Tasks::new(Service::with_cache(
                token.into(),
                connect(postgres).await?,
                KeyValue::new(redis),
            )))
        }
    };

    let mut cors = CorsLayer::new()
        .allow_methods([
            http::Method::DELETE,
            http::Method::GET,
            http::Method::OPTIONS,
            http::Method::POST,
            http::Method::PUT,
        ])
        .allow_headers([
            http::header::AUTHORIZATION,
            http::header::CONTENT_TYPE,
        ]);
    for origin in server.cors.origins {
        cors = cors.allow_origin(
            origin.parse::<http::header::HeaderValue>().map_err(|e| {
                log::error!("`{origin}` is not current CORS origin: {e}");
            })?,
        );
    }

    let app = app
        .layer(TimeoutLayer::new(server.request_timeout))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(log_response),
        );

    let port = server.port.unwrap_or_else(|| component.default_port());
    let listener = TcpListener::bind((server.host.clone(), port))
        .await
        .map_err(|e| {
            log::error!("failed to listen on `{}:{port}`: {e}", server.host);
        })?;

    log::info!("{component} listening on `{}:{port}`", server.host);

    axum::serve(listener, app)
        .await
        .map_err(|e| log::error!("webserver failed: {e}"))
}

/// Opens a span of the provided HTTP request.
fn request_span(req: &http::Request<Body>) -> tracing::Span {
    let client_ip = InsecureClientIp::from(req.headers(), req.extensions())
        .map(|ip| ip.0.to_string())
        .ok();
    tracing::info_span!(
        "HTTP request",
        http.client_ip = client_ip,
        http.method = req.method().as_str(),
        http.route = req
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str),
        http.target = req
            .uri()
            .path_and_query()
            .map(http::uri::PathAndQuery::as_str),
        http.user_agent = req
            .headers()
            .get(http::header::USER_AGENT)
            .and_then(|h| h.to_str().ok()),
        http.status_code = tracing::field::Empty,
    )
}

/// Records the status and the duration of a served HTTP request.
fn log_response(
    res: &http::Response<Body>,
    took: time::Duration,
    span: &tracing::Span,
) {
    let status = res.status();
    _ = span.record("http.status_code", status.as_u16());

    let took = format!("{}ms", took.as_millis());
    if status.is_server_error() {
        tracing::error!(duration = took);
    } else if status.is_client_error() {
        tracing::warn!(duration = took);
    } else {
        tracing::info!(duration = took);
    }
}

/// Connects to the [`Postgres`] store and runs its migrations.
async fn connect(conf: config::Postgres) -> Result<Postgres, ()> {
    let mut postgres = Postgres::new(&conf.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;

    _ = postgres.migrate(&migrations::runner()).await.map_err(|e| {
        log::error!("failed to run database migrations: {e}");
    })?;

    Ok(postgres)
}
