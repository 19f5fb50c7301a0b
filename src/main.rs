use std::path::PathBuf;

use eframe::egui;
use runplot::app::RunPlotApp;

fn main() -> eframe::Result {
    env_logger::init();

    let mut app = RunPlotApp::default();
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        app.state.open_path(&path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "RunPlot – Run History Viewer",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
