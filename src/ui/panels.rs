use eframe::egui::{self, Color32, Key, RichText, Ui};

use jgp_lookup::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – search form
// ---------------------------------------------------------------------------

/// Render the search criteria form.
pub fn search_panel(ui: &mut Ui, state: &mut AppState) {
    ui.add_space(4.0);
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(RichText::new("JGP Data Lookup").strong());
        ui.label("Easy way to find and view participant information");
    });
    ui.add_space(8.0);

    ui.strong("Search Criteria");
    ui.separator();

    let mut submitted = false;

    egui::Grid::new("search_criteria")
        .num_columns(2)
        .spacing([8.0, 8.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("County:");
            submitted |= county_input(ui, state);
            ui.end_row();

            submitted |= text_field(ui, "ID Number:", &mut state.inputs.national_id);
            submitted |= text_field(ui, "Phone Number:", &mut state.inputs.phone_number);
            submitted |= text_field(ui, "Full Name:", &mut state.inputs.full_name);
        });

    ui.add_space(12.0);
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Search Records").clicked() {
            submitted = true;
        }
        if ui.button("Clear").clicked() {
            state.clear();
        }
    });

    if submitted {
        state.run_search();
    }

    if let Some(msg) = &state.notice {
        ui.add_space(8.0);
        ui.label(RichText::new(msg).color(Color32::from_rgb(230, 160, 20)));
    }
}

/// County input: free text plus a dropdown of matching vocabulary values.
/// Returns true when Enter was pressed in the text box.
fn county_input(ui: &mut Ui, state: &mut AppState) -> bool {
    let suggestions: Vec<String> = state
        .county_suggestions()
        .into_iter()
        .map(str::to_string)
        .collect();

    ui.horizontal(|ui: &mut Ui| {
        let response = ui.add(
            egui::TextEdit::singleline(&mut state.inputs.county)
                .hint_text("Type or pick")
                .desired_width(150.0),
        );

        egui::ComboBox::from_id_salt("county")
            .selected_text("")
            .width(24.0)
            .show_ui(ui, |ui: &mut Ui| {
                for county in suggestions {
                    let label = county.clone();
                    ui.selectable_value(&mut state.inputs.county, county, label);
                }
            });

        response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter))
    })
    .inner
}

/// Labelled single-line input. Returns true when Enter was pressed in it.
fn text_field(ui: &mut Ui, label: &str, value: &mut String) -> bool {
    ui.label(label);
    let response = ui.add(egui::TextEdit::singleline(value).desired_width(180.0));
    ui.end_row();
    response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter))
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / status bar.
pub fn top_bar(ui: &mut Ui, state: &AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Quit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        ui.separator();

        match &state.source {
            Some(path) => ui.label(format!(
                "{} records loaded from {}",
                state.dataset.len(),
                path.display()
            )),
            None => ui.label("No data file configured"),
        };

        if let Some(msg) = &state.load_error {
            ui.separator();
            ui.label(RichText::new(format!("Error: {msg}")).color(Color32::RED));
        }
    });
}
