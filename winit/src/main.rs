// Prevent console window in addition to Slint window in Windows release builds when, e.g., starting the app via file manager. Ignored on other platforms.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

slint::include_modules!();

use std::sync::Arc;

use energy_monitor_common::channel::{
    ChannelConfig, ChannelControllerSharedPointer, DummyChannelController, ThingSpeakController,
};
use energy_monitor_common::chart::ChartGeometry;
use energy_monitor_common::display::{ChartSeries, DisplayModel};
use energy_monitor_common::screen::{self, CancelSignal, FetchGuard, ScreenState};

/// Our App struct that holds the UI and the channel controller.
///
/// When it runs, it fetches the most recent feeds once, on a worker thread, and shows them as two charts.
/// Dropping the App drops the fetch guard, so a fetch that is still running cannot touch the UI anymore.
struct App {
    ui: AppWindow,
    channel_controller: ChannelControllerSharedPointer,
    fetch_guard: FetchGuard,
}

impl App {
    /// Create a new App struct.
    ///
    /// If a channel is configured (config file or `THINGSPEAK_*` environment variables), read from ThingSpeak,
    /// otherwise fall back to the bundled dummy channel.
    fn new() -> anyhow::Result<Self> {
        let ui = AppWindow::new()?;

        let channel_controller: ChannelControllerSharedPointer = match ChannelConfig::load()? {
            Some(config) => {
                log::info!("Reading channel {} from {}", config.channel_id, config.host);
                Arc::new(ThingSpeakController::new(config))
            }
            None => {
                log::warn!("No channel configured, showing dummy data");
                Arc::new(DummyChannelController::new()?)
            }
        };

        ui.global::<ViewModel>().set_loading(true);

        Ok(Self {
            ui,
            channel_controller,
            fetch_guard: FetchGuard::new(),
        })
    }

    /// Run the App: start the fetch, then run the UI (and map an error to an anyhow::Error).
    fn run(&mut self) -> anyhow::Result<()> {
        self.start_fetch();

        self.ui.run().map_err(|e| e.into())
    }

    /// Fetch once on a worker thread and hand the result back to the event loop.
    fn start_fetch(&self) {
        let ui_handle = self.ui.as_weak();
        let controller = self.channel_controller.clone();
        let cancel = self.fetch_guard.signal();

        std::thread::spawn(move || {
            let Some(state) = fetch(controller, cancel) else {
                return;
            };
            let model = state.display_model();

            // The closure only runs if the window still exists.
            let result = ui_handle.upgrade_in_event_loop(move |ui| show(&ui, &model));
            if let Err(e) = result {
                log::warn!("Cannot show fetched feeds: {e}");
            }
        });
    }
}

/// Blocks on the fetch with a runtime of its own.
fn fetch(controller: ChannelControllerSharedPointer, cancel: CancelSignal) -> Option<ScreenState> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build();

    match runtime {
        Ok(runtime) => runtime.block_on(screen::load(controller.as_ref(), cancel)),
        Err(e) => {
            log::error!("Error starting the fetch runtime: {e}");
            Some(ScreenState::Failed(e.to_string()))
        }
    }
}

/// Leave the loading state and show both charts.
fn show(ui: &AppWindow, model: &DisplayModel) {
    let view_model = ui.global::<ViewModel>();

    view_model.set_voltage(ChartData::from_series(&model.voltage, &model.labels));
    view_model.set_temperature(ChartData::from_series(&model.temperature, &model.labels));
    view_model.set_loading(false);
}

impl ChartData {
    /// Convert a series into the chart struct of the UI.
    fn from_series(series: &ChartSeries, labels: &[String]) -> Self {
        let geometry = ChartGeometry::new(&series.values, series.unit_suffix);

        let y_ticks: Vec<slint::SharedString> = geometry.y_ticks.iter().map(|tick| tick.as_str().into()).collect();
        let labels: Vec<slint::SharedString> = labels.iter().map(|label| label.as_str().into()).collect();

        Self {
            legend: series.legend.into(),
            color: slint::Color::from_rgb_u8(series.color.red, series.color.green, series.color.blue),
            path: geometry.path.into(),
            y_ticks: slint::ModelRc::new(slint::VecModel::from(y_ticks)),
            labels: slint::ModelRc::new(slint::VecModel::from(labels)),
        }
    }
}

/// A minimal main function that initializes the App and runs it.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut app = App::new()?;

    app.run()
}
