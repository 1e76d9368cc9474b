use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use ratatui::layout::Rect;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use lazyimg::application::{CacheGate, Imager};
use lazyimg::domain::ImageStatus;
use lazyimg::domain::ports::LoadMarkerPort;
use lazyimg::infrastructure::{
    AppConfig, CliArgs, DiskMarkerStore, HttpImageSource, MemoryMarkerStore, StorageManager,
    ViewportIntersector,
};
use lazyimg::presentation::LazyImage;

const VIEWPORT_WIDTH: u16 = 80;

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let storage = match &args.config {
        Some(path) => StorageManager::with_dir(
            path.parent()
                .map_or_else(std::path::PathBuf::new, std::path::Path::to_path_buf),
        ),
        None => StorageManager::new()?,
    };
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok(config)
}

async fn open_marker_store(config: &AppConfig) -> Arc<dyn LoadMarkerPort> {
    if let Some(dir) = config.effective_marker_dir() {
        match DiskMarkerStore::new(dir).await {
            Ok(store) => return Arc::new(store),
            Err(e) => warn!(error = %e, "Falling back to in-memory load markers"),
        }
    }
    Arc::new(MemoryMarkerStore::default())
}

const fn status_label(status: &ImageStatus) -> &'static str {
    match status {
        ImageStatus::NotStarted => "not_started",
        ImageStatus::Deferred => "deferred",
        ImageStatus::Loading => "loading",
        ImageStatus::Ready => "ready",
        ImageStatus::Failed(_) => "failed",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    info!(version = lazyimg::VERSION, images = args.urls.len(), "Starting lazyimg");
    if args.urls.is_empty() {
        warn!("No image URLs given");
        return Ok(());
    }

    let viewport_cfg = &config.viewport;
    let viewport = Arc::new(ViewportIntersector::new(Rect::new(
        0,
        0,
        VIEWPORT_WIDTH,
        viewport_cfg.height,
    )));
    let gate = CacheGate::new(open_marker_store(&config).await);
    let source = Arc::new(HttpImageSource::new(&config.loader)?);

    let mut images = Vec::with_capacity(args.urls.len());
    let mut offset: u16 = 0;
    for url in &args.urls {
        let target = viewport.register(Rect::new(0, offset, VIEWPORT_WIDTH, viewport_cfg.slot_height));
        offset = offset.saturating_add(viewport_cfg.slot_height);

        let props = config
            .image
            .props(url.as_str())
            .with_alt(Some(url.clone()))
            .on_load(|loaded| {
                info!(url = %loaded.url, attempts = loaded.attempts, dimensions = ?loaded.dimensions(), "Image loaded");
            })
            .on_error(|failed| {
                warn!(url = %failed.url, attempts = failed.attempts, error = %failed.error, "Image failed");
            });

        let image = LazyImage::mount(props, Imager::new(source.clone()), gate.clone(), viewport.clone());
        image.set_ref(Some(target));
        images.push((url.clone(), image));
    }

    let bottom = offset.saturating_sub(viewport_cfg.height);
    let settle_ticks = config
        .loader
        .timeout_secs
        .saturating_mul(1000)
        .saturating_add(config.image.debounce)
        / viewport_cfg.tick_ms.max(1);
    let mut idle_ticks = 0u64;
    let mut ticker = tokio::time::interval(viewport_cfg.tick_interval());

    loop {
        ticker.tick().await;
        if images.iter().all(|(_, image)| image.view().status.is_settled()) {
            break;
        }
        let before = viewport.scroll();
        if before < bottom {
            viewport.scroll_by(i32::from(viewport_cfg.scroll_rows()));
        }
        if viewport.scroll() == before {
            idle_ticks += 1;
            if idle_ticks > settle_ticks {
                warn!("Gave up waiting for images to settle");
                break;
            }
        }
    }

    for (url, image) in images {
        let view = image.view();
        let line = serde_json::json!({
            "url": url,
            "status": status_label(&view.status),
            "attributes": view.attributes,
        });
        println!("{line}");
        image.unmount().await;
    }

    Ok(())
}
