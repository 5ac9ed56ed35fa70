mod assets;
mod config;
mod db_bootstrap;
mod db_manager;
mod paths;
mod ui;

use std::{cell::RefCell, path::PathBuf, rc::Rc, sync::Arc, thread, time::Duration};

use assets::{AssetStore, DirAssetStore};
use config::Config;
use db_bootstrap::{BootstrapError, DatabaseBootstrapper, EnsureOutcome};
use db_manager::RecentCities;
use log::{debug, error, info};
use paths::{AppDataPaths, FixedPaths, PathResolver};
use slint::{ComponentHandle, Timer, TimerMode};
use ui::index_strip::{IndexStrip, TouchingLetterListener};

slint::include_modules!();

const TOUCHED_LABEL_LINGER: Duration = Duration::from_millis(800);

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn build_bootstrapper(config: &Config) -> DatabaseBootstrapper {
    let assets: Arc<dyn AssetStore> = match &config.assets.dir {
        Some(dir) => Arc::new(DirAssetStore::new(dir.clone())),
        None => Arc::new(DirAssetStore::beside_executable()),
    };
    let paths: Arc<dyn PathResolver> = match &config.database.target_dir {
        Some(dir) => Arc::new(FixedPaths(dir.clone())),
        None => Arc::new(AppDataPaths),
    };
    DatabaseBootstrapper::new(assets, paths, config.database.settings())
}

/// Materializes the city database and reads the recent-city list.
///
/// Blocking; runs on the bootstrap worker.
fn prepare_databases(
    bootstrapper: &DatabaseBootstrapper,
    config: &Config,
) -> Result<(EnsureOutcome, Vec<String>), String> {
    let outcome = match config.database.split_parts {
        Some(parts) => bootstrapper.ensure_large(parts),
        None => bootstrapper.ensure(),
    }
    .map_err(|err| error_chain(&err))?;

    let schema_objects = bootstrapper
        .with_writable(|conn| {
            conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
                row.get::<_, i64>(0)
            })
        })
        .map_err(|err: BootstrapError| error_chain(&err))?;
    debug!(
        "City database at version {} exposes {} schema objects",
        bootstrapper.version(),
        schema_objects
    );
    bootstrapper.close();

    let recent_path = bootstrapper
        .database_dir()
        .join(&config.recent.database_name);
    let recent = RecentCities::open(&recent_path, config.recent.version)
        .and_then(|store| store.latest(config.recent.limit))
        .map_err(|err| error_chain(&err))?;
    Ok((outcome, recent))
}

fn spawn_bootstrap_worker(
    ui: &AppWindow,
    bootstrapper: DatabaseBootstrapper,
    config: Config,
) -> std::io::Result<()> {
    let ui_handle = ui.as_weak();
    thread::Builder::new()
        .name("db-bootstrap".to_string())
        .spawn(move || {
            let result = prepare_databases(&bootstrapper, &config);
            let status = match &result {
                Ok((EnsureOutcome::Copied(bytes), _)) => {
                    format!("City database installed ({} bytes)", bytes)
                }
                Ok((EnsureOutcome::AlreadyPresent, _)) => "City database ready".to_string(),
                Err(message) => {
                    error!("Database bootstrap failed: {}", message);
                    format!("Could not prepare city database: {}", message)
                }
            };
            let recent = result.map(|(_, recent)| recent).unwrap_or_default();
            let _ = slint::invoke_from_event_loop(move || {
                if let Some(ui) = ui_handle.upgrade() {
                    ui.set_status_text(status.into());
                    ui::city_grid::show_recent_cities(&ui, recent);
                }
            });
        })?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Debug);
    clog.init();

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    if std::env::var_os("SLINT_BACKEND").is_none() {
        std::env::set_var("SLINT_BACKEND", "winit-software");
        info!("SLINT_BACKEND not set. Defaulting to winit-software");
    }

    let config_file = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("contact_list.toml");
    let config = config::load_or_create(&config_file);

    let ui = AppWindow::new()?;

    let strip = Rc::new(RefCell::new(IndexStrip::new()));
    let hide_timer = Rc::new(Timer::default());
    let ui_handle = ui.as_weak();
    let listener: Rc<dyn TouchingLetterListener> = Rc::new(move |label: &str| {
        debug!("Index strip touched {}", label);
        let Some(ui) = ui_handle.upgrade() else {
            return;
        };
        ui.set_touched_label(label.into());
        ui.set_show_touched_label(true);
        let ui_for_hide = ui.as_weak();
        hide_timer.start(TimerMode::SingleShot, TOUCHED_LABEL_LINGER, move || {
            if let Some(ui) = ui_for_hide.upgrade() {
                ui.set_show_touched_label(false);
            }
        });
    });
    strip.borrow_mut().set_listener(Some(listener));
    ui::strip_bridge::install_index_strip(&ui, strip);

    let bootstrapper = build_bootstrapper(&config);
    let recent_path = bootstrapper
        .database_dir()
        .join(&config.recent.database_name);
    ui::city_grid::install_city_grid(&ui, recent_path, config.recent.clone());

    spawn_bootstrap_worker(&ui, bootstrapper, config)?;

    ui.run()?;
    Ok(())
}
