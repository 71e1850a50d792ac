use std::path::Path;

use analog_explorer::app::AnalogExplorerApp;
use analog_explorer::ui::panels;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([760.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Analog Explorer – Analogue Dates Dashboard",
        options,
        Box::new(|_cc| {
            let mut app = AnalogExplorerApp::default();

            // Optional startup paths: data file first, run config second.
            let mut args = std::env::args().skip(1);
            if let Some(data) = args.next() {
                panels::load_data_path(&mut app.state, Path::new(&data));
            }
            if let Some(config) = args.next() {
                panels::load_config_path(&mut app.state, Path::new(&config));
            }

            Ok(Box::new(app))
        }),
    )
}
