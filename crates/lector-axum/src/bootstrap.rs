//! Axum server bootstrap - the composition root.
//!
//! This module is the ONLY place where the store, library, coordinator and
//! speaker are constructed. Handlers receive them through [`AppState`].
//!
//! [`AppState`]: crate::state::AppState

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use lector_core::paths::library_dir_in;
use lector_core::ports::{BookCatalogPort, ReaderSessionPort};
use lector_core::services::AutocommitCoordinator;
use lector_core::{ReaderSettings, ResolvedPaths, validate_settings};
use lector_store::{BookLibrary, LibraryConfig, ReaderSessionStore, ReaderStoreConfig};
use lector_voice::{ReaderSpeaker, SpeechBackendConfig};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 9797;

/// Environment variable naming an external TTS program (`command:` form optional).
pub const TTS_COMMAND_ENV: &str = "LECTOR_TTS_COMMAND";
/// Environment variable forcing the dry-run speech backend.
pub const TTS_DRY_RUN_ENV: &str = "LECTOR_TTS_DRY_RUN";

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP server.
    pub port: u16,
    /// Where state, lock and library files live.
    pub paths: ResolvedPaths,
    /// Reader tunables.
    pub settings: ReaderSettings,
    /// Speech backend used by `next?speak=1`.
    pub speech: SpeechBackendConfig,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Config from the environment: resolved paths, `LECTOR_*` settings and
    /// the TTS backend selection.
    pub fn with_defaults() -> Result<Self> {
        let paths = ResolvedPaths::resolve().context("Failed to resolve data paths")?;
        let settings = ReaderSettings::from_env().context("Invalid reader settings")?;
        Ok(Self {
            port: DEFAULT_PORT,
            paths,
            settings,
            speech: speech_from_env()?,
            cors: CorsConfig::default(),
        })
    }

    /// Config with every path under `root` and default settings.
    pub fn under(root: &Path) -> Result<Self> {
        let library = library_dir_in(root, None)?;
        Ok(Self {
            port: DEFAULT_PORT,
            paths: ResolvedPaths::under(root, library),
            settings: ReaderSettings::default(),
            speech: SpeechBackendConfig::DryRun,
            cors: CorsConfig::default(),
        })
    }

    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_speech(mut self, speech: SpeechBackendConfig) -> Self {
        self.speech = speech;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ReaderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }
}

fn speech_from_env() -> Result<SpeechBackendConfig> {
    let dry_run = std::env::var(TTS_DRY_RUN_ENV)
        .ok()
        .map(|v| lector_core::settings::parse_bool(TTS_DRY_RUN_ENV, &v))
        .transpose()?
        .unwrap_or(false);
    if dry_run {
        return Ok(SpeechBackendConfig::DryRun);
    }

    match std::env::var(TTS_COMMAND_ENV) {
        Ok(raw) if !raw.trim().is_empty() => {
            let spec = if raw.trim_start().starts_with("command:") {
                raw
            } else {
                format!("command:{raw}")
            };
            Ok(spec.parse()?)
        }
        _ => Ok(SpeechBackendConfig::DryRun),
    }
}

/// Application context for the Axum adapter.
///
/// Holds one instance of every service; handlers share it via `Arc`.
pub struct AxumContext {
    /// Durable reader sessions.
    pub store: Arc<dyn ReaderSessionPort>,
    /// Book library index.
    pub library: Arc<dyn BookCatalogPort>,
    /// Stream-id keyed autocommit registry.
    pub coordinator: Arc<AutocommitCoordinator>,
    /// Playback streams.
    pub speaker: Arc<ReaderSpeaker>,
    /// Effective reader settings.
    pub settings: ReaderSettings,
    /// Effective paths.
    pub paths: ResolvedPaths,
}

impl std::fmt::Debug for AxumContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AxumContext")
            .field("speaker", &self.speaker)
            .field("coordinator", &self.coordinator)
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

/// Wire every service for the given configuration.
pub fn bootstrap(config: &ServerConfig) -> Result<AxumContext> {
    validate_settings(&config.settings).context("Invalid reader settings")?;

    tracing::info!(
        target: "lector.paths",
        data_root = %config.paths.data_root.display(),
        reader_state_path = %config.paths.reader_state_path.display(),
        library_dir = %config.paths.library_dir.display(),
        speech = %config.speech,
        "Axum bootstrap resolved paths"
    );

    // 1. Session store
    let store: Arc<dyn ReaderSessionPort> = Arc::new(ReaderSessionStore::new(
        ReaderStoreConfig::from_paths(&config.paths, &config.settings),
    ));

    // 2. Library
    let library: Arc<dyn BookCatalogPort> = Arc::new(BookLibrary::new(LibraryConfig::from_paths(
        &config.paths,
        &config.settings,
    )));

    // 3. Autocommit coordinator over the same store
    let coordinator = Arc::new(AutocommitCoordinator::new(Arc::clone(&store)));

    // 4. Speech backend and speaker
    let backend = config
        .speech
        .build(config.settings.speech_chars_per_second);
    let speaker = Arc::new(ReaderSpeaker::new(
        Arc::clone(&store),
        Arc::clone(&coordinator),
        backend,
        config.settings.clone(),
    ));

    Ok(AxumContext {
        store,
        library,
        coordinator,
        speaker,
        settings: config.settings.clone(),
        paths: config.paths.clone(),
    })
}

/// Start the web server and run until Ctrl-C.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    use tokio::net::TcpListener;
    use tracing::info;

    let ctx = bootstrap(&config)?;
    let speaker = Arc::clone(&ctx.speaker);
    let app = crate::routes::create_router(ctx, &config.cors);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("lector reader server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    info!("Shutting down, cancelling active playback");
    speaker.shutdown();
    Ok(())
}
