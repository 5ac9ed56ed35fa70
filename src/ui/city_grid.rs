//! Hot-city grid above the recent list. A tap records the city as recently
//! visited and refreshes the list.

use std::{
    path::{Path, PathBuf},
    rc::Rc,
    thread,
    time::{SystemTime, UNIX_EPOCH},
};

use log::{debug, warn};
use slint::{ComponentHandle, ModelRc, SharedString, VecModel};

use crate::{
    config::RecentConfig,
    db_manager::RecentCities,
    ui::grid_measure::{MeasureSpec, UnboundedGrid},
    AppWindow,
};

pub const HOT_COLUMNS: usize = 3;
/// Row pitch in the markup's hot grid.
pub const HOT_ROW_HEIGHT: i32 = 44;

/// Full grid height; the scrolling panel it sits in never clips it.
pub fn hot_grid_height(items: usize, panel_height: i32) -> i32 {
    UnboundedGrid.content_height(
        items,
        HOT_COLUMNS,
        HOT_ROW_HEIGHT,
        MeasureSpec::exactly(panel_height.max(0)),
    )
}

/// Stores a visit to `name` at `date` and returns the refreshed recent list.
pub fn record_visit(
    path: &Path,
    config: &RecentConfig,
    name: &str,
    date: i64,
) -> Result<Vec<String>, rusqlite::Error> {
    let store = RecentCities::open(path, config.version)?;
    store.record(name, date)?;
    store.latest(config.limit)
}

pub fn show_recent_cities(ui: &AppWindow, recent: Vec<String>) {
    let cities: Vec<SharedString> = recent.into_iter().map(SharedString::from).collect();
    ui.set_recent_cities(ModelRc::from(Rc::new(VecModel::from(cities))));
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

/// Fills the grid and records taps on a worker thread.
pub fn install_city_grid(ui: &AppWindow, recent_path: PathBuf, config: RecentConfig) {
    let cities: Vec<SharedString> = config.hot_cities.iter().map(SharedString::from).collect();
    let height = hot_grid_height(cities.len(), ui.get_city_panel_height().round() as i32);
    ui.set_hot_cities(ModelRc::from(Rc::new(VecModel::from(cities))));
    ui.set_hot_grid_height(height as f32);

    let ui_handle = ui.as_weak();
    ui.on_city_chosen(move |name| {
        debug!("Hot city chosen {}", name);
        let ui_handle = ui_handle.clone();
        let recent_path = recent_path.clone();
        let config = config.clone();
        let spawned = thread::Builder::new()
            .name("recent-city".to_string())
            .spawn(move || {
                match record_visit(&recent_path, &config, name.as_str(), now_millis()) {
                    Ok(recent) => {
                        let _ = slint::invoke_from_event_loop(move || {
                            if let Some(ui) = ui_handle.upgrade() {
                                show_recent_cities(&ui, recent);
                            }
                        });
                    }
                    Err(err) => warn!(
                        "Failed to record recent city. path={} error={}",
                        recent_path.display(),
                        err
                    ),
                }
            });
        if let Err(err) = spawned {
            warn!("Failed to spawn recent-city worker: {}", err);
        }
    });
}
