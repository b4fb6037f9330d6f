use eframe::egui;

use jgp_lookup::state::AppState;
use crate::ui::{panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct JgpLookupApp {
    pub state: AppState,
}

impl JgpLookupApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for JgpLookupApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.state);
        });

        // ---- Left side panel: search criteria ----
        egui::SidePanel::left("search_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::search_panel(ui, &mut self.state);
            });

        // ---- Central panel: results ----
        egui::CentralPanel::default().show(ctx, |ui| {
            table::results(ui, &self.state);
        });
    }
}
