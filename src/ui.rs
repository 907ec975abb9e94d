use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;

use eframe::egui::{self, Color32, RichText};

use crate::app::{Desk, HistoryView};
use crate::backend::Backend;
use crate::config::DeskConfig;
use crate::desktop;
use crate::draft::{Field, Tab};
use crate::gate::{PhraseFeedback, REQUIRED_PHRASE};
use crate::gateway::{Gateway, Outcome};
use crate::model::format_date;
use crate::status::StatusLevel;

const SUCCESS: Color32 = Color32::from_rgb(4, 120, 87);
const DANGER: Color32 = Color32::from_rgb(185, 28, 28);

pub struct DeskApp {
    desk: Desk,
    gateway: Gateway,
    outcomes: Receiver<Outcome>,
}

enum RowAction {
    Preview(i64),
    Download(i64, String),
}

impl DeskApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: &DeskConfig, backend: Arc<dyn Backend>) -> Self {
        let ctx = cc.egui_ctx.clone();
        let (gateway, outcomes) = Gateway::new(backend, move || ctx.request_repaint());

        let mut desk = Desk::new(config);
        desk.load_files();

        let mut app = Self {
            desk,
            gateway,
            outcomes,
        };
        app.submit_tasks();
        app
    }

    fn drain_outcomes(&mut self) {
        loop {
            match self.outcomes.try_recv() {
                Ok(outcome) => self.desk.apply(outcome),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::error!("outcome channel disconnected");
                    break;
                }
            }
        }
    }

    fn submit_tasks(&mut self) {
        for task in self.desk.take_tasks() {
            self.gateway.submit(task);
        }
    }

    fn tab_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for tab in Tab::ALL {
                let active = self.desk.current_tab() == tab;
                if ui.selectable_label(active, tab.label()).clicked() {
                    self.desk.switch_to(tab);
                }
            }
        });
    }

    fn action_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Save All").clicked() {
                self.desk.save_all();
            }
            if ui.button("Generate Invoices").clicked() {
                self.desk.generate(false);
            }
            if ui.button("Preview (Dry Run)").clicked() {
                self.desk.generate(true);
            }
            if let Some(status) = self.desk.status().current() {
                let color = match status.level {
                    StatusLevel::Info => ui.visuals().text_color(),
                    StatusLevel::Success => SUCCESS,
                    StatusLevel::Error => DANGER,
                };
                ui.separator();
                ui.label(RichText::new(&status.message).color(color));
            }
        });

        if let Some(output) = self.desk.output() {
            ui.separator();
            egui::ScrollArea::vertical()
                .id_salt("output")
                .max_height(140.0)
                .show(ui, |ui| {
                    ui.label(RichText::new(output).monospace());
                });
        }
    }

    fn editor_tab(&mut self, ui: &mut egui::Ui, tab: Tab) {
        match tab.fields() {
            [field] => {
                ui.add(
                    egui::TextEdit::multiline(self.desk.editors.buffer_mut(*field))
                        .desired_width(f32::INFINITY)
                        .desired_rows(18)
                        .code_editor(),
                );
            }
            _ => {
                ui.label("Description");
                ui.add(
                    egui::TextEdit::multiline(self.desk.editors.buffer_mut(Field::Description))
                        .desired_width(f32::INFINITY)
                        .desired_rows(10),
                );
                ui.add_space(8.0);
                ui.label("Amount");
                ui.text_edit_singleline(self.desk.editors.buffer_mut(Field::Amount));
            }
        }
    }

    fn history_tab(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Invoice History");
            if ui.button("Refresh").clicked() {
                self.desk.request_history_refresh();
            }
        });
        ui.separator();

        let mut action = None;
        match self.desk.history() {
            HistoryView::Idle => {}
            HistoryView::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading invoices...");
                });
            }
            HistoryView::Empty => {
                ui.label("No invoices yet. Generate one to see it here.");
            }
            HistoryView::Error(message) => {
                ui.colored_label(DANGER, message.as_str());
            }
            HistoryView::Table(rows) => {
                let selected = self.desk.selected();
                egui::ScrollArea::vertical()
                    .id_salt("history")
                    .max_height(ui.available_height() * 0.45)
                    .show(ui, |ui| {
                        egui::Grid::new("invoices").striped(true).num_columns(6).show(ui, |ui| {
                            for header in ["Number", "Service", "Invoice Date", "Due Date", "Created", ""] {
                                ui.strong(header);
                            }
                            ui.end_row();

                            for invoice in rows {
                                let is_selected = selected == Some(invoice.id);
                                if ui.selectable_label(is_selected, invoice.invoice_number.as_str()).clicked() {
                                    action = Some(RowAction::Preview(invoice.id));
                                }
                                ui.label(invoice.service.as_str());
                                ui.label(format_date(&invoice.invoice_date));
                                ui.label(format_date(&invoice.due_date));
                                ui.label(format_date(&invoice.created_at));
                                ui.horizontal(|ui| {
                                    if ui.button("Preview").clicked() {
                                        action = Some(RowAction::Preview(invoice.id));
                                    }
                                    if ui.button("Download").clicked() {
                                        action = Some(RowAction::Download(
                                            invoice.id,
                                            invoice.invoice_number.clone(),
                                        ));
                                    }
                                });
                                ui.end_row();
                            }
                        });
                    });
            }
        }

        match action {
            Some(RowAction::Preview(id)) => self.desk.preview_invoice(id),
            Some(RowAction::Download(id, number)) => self.desk.download_invoice(id, &number),
            None => {}
        }

        ui.separator();
        let mut open = false;
        match self.desk.preview() {
            None => {
                ui.label(RichText::new("Select an invoice to preview it.").italics());
            }
            Some(preview) => {
                let invoice = &preview.invoice;
                ui.heading(format!("Invoice {}", invoice.invoice_number));
                ui.label(invoice.service.as_str());
                ui.label(format!(
                    "Issued {} · due {}",
                    format_date(&invoice.invoice_date),
                    format_date(&invoice.due_date)
                ));
                ui.label(format!("{} ({} bytes)", preview.path.display(), preview.size));
                open = ui.button("Open PDF").clicked();
            }
        }
        if open {
            self.desk.open_preview();
        }
    }

    fn settings_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.add_space(4.0);

        ui.label("Output directory for invoice PDFs");
        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.desk.settings_form.output_directory);
            if ui.button("Choose...").clicked() {
                let current = self.desk.settings_form.output_directory.clone();
                let picked = desktop::pick_directory(
                    "Choose Output Directory for Invoice PDFs",
                    Some(std::path::Path::new(&current)),
                );
                self.desk.choose_output_directory(picked);
            }
            if ui.button("Open").clicked() {
                self.desk.open_output_directory();
            }
        });

        if let Some(dir) = self.desk.settings_form.config_directory.as_mut() {
            ui.label("Configuration directory");
            ui.text_edit_singleline(dir);
        }

        if self.desk.settings_form != *self.desk.settings() {
            ui.label(RichText::new("Unsaved changes").italics());
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Save Settings").clicked() {
                self.desk.save_settings();
            }
            if ui.button("Reset to Default").clicked() {
                self.desk.request_settings_reset();
            }
        });

        ui.add_space(16.0);
        ui.separator();
        ui.label(RichText::new("Danger zone").strong().color(DANGER));
        ui.label("Deletes every invoice and recreates the example data.");
        if ui.button(RichText::new("Reset Database...").color(DANGER)).clicked() {
            self.desk.open_reset_dialog();
        }
    }

    fn settings_reset_modal(&mut self, ctx: &egui::Context) {
        if !self.desk.confirming_settings_reset() {
            return;
        }
        let modal = egui::Modal::new(egui::Id::new("reset-settings")).show(ctx, |ui| {
            ui.label("Are you sure you want to reset all settings to default? This will change your output directory.");
            ui.horizontal(|ui| {
                if ui.button("Reset").clicked() {
                    self.desk.reset_settings();
                }
                if ui.button("Cancel").clicked() {
                    self.desk.cancel_settings_reset();
                }
            });
        });
        if modal.should_close() {
            self.desk.cancel_settings_reset();
        }
    }

    fn reset_database_modal(&mut self, ctx: &egui::Context) {
        if !self.desk.gate.is_open() {
            return;
        }
        let modal = egui::Modal::new(egui::Id::new("reset-database")).show(ctx, |ui| {
            ui.set_width(380.0);
            ui.horizontal(|ui| {
                ui.heading(RichText::new("Reset Database").color(DANGER));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("✕").clicked() {
                        self.desk.dismiss_reset_dialog();
                    }
                });
            });
            ui.label("This permanently deletes all invoices and replaces them with example data.");
            ui.add_space(6.0);
            ui.label(format!("Type {REQUIRED_PHRASE} to confirm:"));

            let color = match self.desk.gate.feedback() {
                PhraseFeedback::Neutral => None,
                PhraseFeedback::Valid => Some(SUCCESS),
                PhraseFeedback::Invalid => Some(DANGER),
            };
            let mut edit = egui::TextEdit::singleline(&mut self.desk.gate.phrase);
            if let Some(color) = color {
                edit = edit.text_color(color);
            }
            ui.add(edit);
            ui.checkbox(
                &mut self.desk.gate.acknowledged,
                "I understand this action cannot be undone",
            );

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                let confirm = egui::Button::new(RichText::new("Delete Everything").color(DANGER));
                if ui.add_enabled(self.desk.gate.can_confirm(), confirm).clicked() {
                    self.desk.confirm_reset();
                }
                if ui.button("Cancel").clicked() {
                    self.desk.dismiss_reset_dialog();
                }
            });
        });
        if modal.should_close() {
            self.desk.dismiss_reset_dialog();
        }
    }
}

impl eframe::App for DeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_outcomes();
        if let Some(wait) = self.desk.tick(Instant::now()) {
            ctx.request_repaint_after(wait);
        }

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| self.tab_bar(ui));
        egui::TopBottomPanel::bottom("actions").show(ctx, |ui| self.action_bar(ui));
        egui::CentralPanel::default().show(ctx, |ui| match self.desk.current_tab() {
            Tab::History => self.history_tab(ui),
            Tab::Settings => self.settings_tab(ui),
            tab => self.editor_tab(ui, tab),
        });

        self.settings_reset_modal(ctx);
        self.reset_database_modal(ctx);

        self.submit_tasks();
    }
}
