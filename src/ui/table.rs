use eframe::egui::{self, Align, Layout, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use jgp_lookup::data::model::Field;
use jgp_lookup::state::AppState;

const ROW_HEIGHT: f32 = 20.0;

// ---------------------------------------------------------------------------
// Results table (central panel)
// ---------------------------------------------------------------------------

/// Render the results heading and one table row per matching record.
pub fn results(ui: &mut Ui, state: &AppState) {
    ui.label(state.results_label());
    ui.add_space(4.0);

    if state.dataset.is_empty() && state.load_error.is_some() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No data loaded");
        });
        return;
    }

    let rows: Vec<_> = state.results().collect();

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(Layout::left_to_right(Align::Center))
            .columns(Column::auto().at_least(100.0).clip(true), Field::ALL.len())
            .header(ROW_HEIGHT + 4.0, |mut header| {
                for field in Field::ALL {
                    header.col(|ui: &mut Ui| {
                        ui.strong(field.label());
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                    let record = rows[row.index()];
                    for field in Field::ALL {
                        row.col(|ui: &mut Ui| {
                            ui.add(egui::Label::new(record.field_text(field).into_owned()).truncate());
                        });
                    }
                });
            });
    });
}
