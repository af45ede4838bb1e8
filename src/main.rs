//! Bug Studio - Bug tracker desktop client
//! Built with egui for native Wayland support

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

use eframe::egui::{self, Color32, RichText};

use bug_studio::api::{ApiError, Bug, BugApi, BugDraft, BugStatus, HttpBugApi, Priority};
use bug_studio::config::{self, AppConfig};
use bug_studio::session::Session;
use bug_studio::store::BugStore;
use bug_studio::telemetry::{self, ErrorEvent, ErrorSink};
use bug_studio::theme::{Theme, ThemeKind};

fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("Bug Studio"),
        ..Default::default()
    };

    eframe::run_native(
        "Bug Studio",
        options,
        Box::new(|_cc| Ok(Box::new(BugStudio::new()))),
    )
}

/// Routing surface: the bugs view is only reachable with a credential.
#[derive(Debug, Clone, Copy, PartialEq)]
enum View {
    Login,
    Register,
    Bugs,
}

/// Completion message from a background auth request.
enum AuthEvent {
    LoggedIn(Result<String, ApiError>),
    Registered(Result<(), ApiError>),
}

/// Edit/delete clicks collected during list rendering, executed after.
enum RowAction {
    Edit(Bug),
    Delete(String),
}

/// Main application state
struct BugStudio {
    config_dir: PathBuf,
    theme_kind: ThemeKind,
    theme: Theme,

    session: Session,
    store: BugStore,
    api: Arc<dyn BugApi + Send + Sync>,
    sink: Arc<dyn ErrorSink>,

    view: View,

    // Auth form state
    username: String,
    password: String,
    auth_busy: bool,
    auth_error: Option<String>,
    auth_notice: Option<String>,
    auth_receiver: Option<Receiver<AuthEvent>>,

    // Bug form state
    editing_id: Option<String>,
    form: BugDraft,
    form_error: Option<String>,

    // Transient status line (telemetry test, etc.)
    notice: Option<String>,
}

impl BugStudio {
    fn new() -> Self {
        let config_dir = config::config_dir();
        let app_config = AppConfig::load(&config_dir);
        let sink = telemetry::from_endpoint(app_config.telemetry_endpoint.as_deref());

        let session = Session::load(&config_dir);
        let theme_kind = ThemeKind::load(&config_dir);

        let api: Arc<dyn BugApi + Send + Sync> =
            Arc::new(HttpBugApi::new(app_config.server_url.clone()));
        let mut store = BugStore::new(Arc::clone(&api), Arc::clone(&sink));

        // Seeding the credential kicks off the initial fetch.
        store.set_token(session.token().map(str::to_string));

        let view = if session.is_authenticated() {
            View::Bugs
        } else {
            View::Login
        };

        Self {
            config_dir,
            theme_kind,
            theme: theme_kind.palette(),
            session,
            store,
            api,
            sink,
            view,
            username: String::new(),
            password: String::new(),
            auth_busy: false,
            auth_error: None,
            auth_notice: None,
            auth_receiver: None,
            editing_id: None,
            form: BugDraft::default(),
            form_error: None,
            notice: None,
        }
    }

    fn toggle_theme(&mut self) {
        self.theme_kind = self.theme_kind.toggled();
        self.theme = self.theme_kind.palette();
        self.theme_kind.save(&self.config_dir);
    }

    fn switch_view(&mut self, view: View) {
        self.view = view;
        self.auth_error = None;
        self.auth_notice = None;
    }

    fn start_login(&mut self) {
        let username = self.username.trim().to_string();
        let password = self.password.clone();
        if username.is_empty() || password.is_empty() {
            self.auth_error = Some("Username and password are required".to_string());
            return;
        }
        self.auth_error = None;
        self.auth_notice = None;
        self.auth_busy = true;

        let (tx, rx) = std::sync::mpsc::channel();
        self.auth_receiver = Some(rx);
        let api = Arc::clone(&self.api);
        std::thread::spawn(move || {
            let _ = tx.send(AuthEvent::LoggedIn(api.login(&username, &password)));
        });
    }

    fn start_register(&mut self) {
        let username = self.username.trim().to_string();
        let password = self.password.clone();
        if username.is_empty() || password.is_empty() {
            self.auth_error = Some("Username and password are required".to_string());
            return;
        }
        self.auth_error = None;
        self.auth_notice = None;
        self.auth_busy = true;

        let (tx, rx) = std::sync::mpsc::channel();
        self.auth_receiver = Some(rx);
        let api = Arc::clone(&self.api);
        std::thread::spawn(move || {
            let _ = tx.send(AuthEvent::Registered(api.register(&username, &password)));
        });
    }

    fn logout(&mut self) {
        self.session.clear();
        self.store.set_token(None);
        self.reset_form();
        self.switch_view(View::Login);
    }

    /// Check for a completed auth request.
    fn poll_auth(&mut self) {
        let Some(rx) = &self.auth_receiver else {
            return;
        };
        match rx.try_recv() {
            Ok(event) => {
                self.auth_receiver = None;
                self.auth_busy = false;
                match event {
                    AuthEvent::LoggedIn(Ok(token)) => {
                        self.session.save(token.clone());
                        self.store.set_token(Some(token));
                        self.password.clear();
                        self.switch_view(View::Bugs);
                    }
                    AuthEvent::LoggedIn(Err(err)) => {
                        log::warn!("Login failed: {}", err);
                        self.auth_error = Some(err.user_message("Failed to login"));
                    }
                    AuthEvent::Registered(Ok(())) => {
                        self.password.clear();
                        self.switch_view(View::Login);
                        self.auth_notice = Some("Account created. Please log in.".to_string());
                    }
                    AuthEvent::Registered(Err(err)) => {
                        log::warn!("Registration failed: {}", err);
                        self.auth_error = Some(err.user_message("Failed to register"));
                    }
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.auth_receiver = None;
                self.auth_busy = false;
            }
        }
    }

    fn submit_form(&mut self) {
        if self.form.title.trim().is_empty() {
            self.form_error = Some("Title is required".to_string());
            return;
        }
        self.form_error = None;
        let draft = self.form.clone();
        match self.editing_id.take() {
            Some(id) => self.store.update_bug(id, draft),
            None => self.store.add_bug(draft),
        }
        self.form = BugDraft::default();
    }

    fn reset_form(&mut self) {
        self.editing_id = None;
        self.form = BugDraft::default();
        self.form_error = None;
    }

    fn show_auth_page(&mut self, ui: &mut egui::Ui, register: bool) {
        let theme = self.theme;
        ui.vertical_centered(|ui| {
            ui.add_space(100.0);
            ui.heading(if register { "Register" } else { "Login" });
            ui.add_space(16.0);

            ui.add(
                egui::TextEdit::singleline(&mut self.username)
                    .hint_text("Username")
                    .desired_width(240.0),
            );
            ui.add_space(6.0);
            ui.add(
                egui::TextEdit::singleline(&mut self.password)
                    .password(true)
                    .hint_text("Password")
                    .desired_width(240.0),
            );
            ui.add_space(12.0);

            let label = if register { "Register" } else { "Login" };
            if ui
                .add_enabled(!self.auth_busy, egui::Button::new(label))
                .clicked()
            {
                if register {
                    self.start_register();
                } else {
                    self.start_login();
                }
            }

            if self.auth_busy {
                ui.add_space(6.0);
                ui.label(RichText::new("Contacting server…").color(theme.fg_dim));
            }
            if let Some(err) = &self.auth_error {
                ui.add_space(6.0);
                ui.colored_label(theme.error, err);
            }
            if let Some(notice) = &self.auth_notice {
                ui.add_space(6.0);
                ui.colored_label(theme.success, notice);
            }

            ui.add_space(16.0);
            ui.horizontal(|ui| {
                // Center the prompt + link pair by padding the row.
                let pad = (ui.available_width() - 260.0).max(0.0) / 2.0;
                ui.add_space(pad);
                if register {
                    ui.label("Already have an account?");
                    if ui.link("Login").clicked() {
                        self.switch_view(View::Login);
                    }
                } else {
                    ui.label("Don't have an account?");
                    if ui.link("Register").clicked() {
                        self.switch_view(View::Register);
                    }
                }
            });
        });
    }

    fn show_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Bug Tracker");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Logout").clicked() {
                    self.logout();
                }
                let toggle_label = match self.theme_kind {
                    ThemeKind::Light => "Switch to Dark Mode",
                    ThemeKind::Dark => "Switch to Light Mode",
                };
                if ui.button(toggle_label).clicked() {
                    self.toggle_theme();
                }
            });
        });
    }

    fn show_bug_form(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme;
        ui.horizontal(|ui| {
            let title_edit = ui.add(
                egui::TextEdit::singleline(&mut self.form.title)
                    .hint_text("Bug title")
                    .desired_width(260.0),
            );

            egui::ComboBox::from_id_salt("form_status")
                .selected_text(self.form.status.label())
                .show_ui(ui, |ui| {
                    for status in BugStatus::ALL {
                        ui.selectable_value(&mut self.form.status, status, status.label());
                    }
                });

            egui::ComboBox::from_id_salt("form_priority")
                .selected_text(self.form.priority.label())
                .show_ui(ui, |ui| {
                    for priority in Priority::ALL {
                        ui.selectable_value(&mut self.form.priority, priority, priority.label());
                    }
                });

            let submit_label = if self.editing_id.is_some() {
                "Update Bug"
            } else {
                "Add Bug"
            };
            let submitted = ui.button(submit_label).clicked()
                || (title_edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)));
            if submitted {
                self.submit_form();
            }

            if self.editing_id.is_some() && ui.button("Cancel").clicked() {
                self.reset_form();
            }
        });

        if let Some(err) = &self.form_error {
            ui.colored_label(theme.error, err);
        }
    }

    fn show_filters(&mut self, ui: &mut egui::Ui) {
        let mut status_filter = self.store.filter().status;
        let mut priority_filter = self.store.filter().priority;

        ui.horizontal(|ui| {
            egui::ComboBox::from_id_salt("status_filter")
                .selected_text(status_filter.map_or("All Statuses", |s| s.label()))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut status_filter, None, "All Statuses");
                    for status in BugStatus::ALL {
                        ui.selectable_value(&mut status_filter, Some(status), status.label());
                    }
                });

            egui::ComboBox::from_id_salt("priority_filter")
                .selected_text(priority_filter.map_or("All Priorities", |p| p.label()))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut priority_filter, None, "All Priorities");
                    for priority in Priority::ALL {
                        ui.selectable_value(&mut priority_filter, Some(priority), priority.label());
                    }
                });
        });

        // No-ops when unchanged; a real change refetches.
        self.store.set_status_filter(status_filter);
        self.store.set_priority_filter(priority_filter);
    }

    fn show_bug_list(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme;
        let mut action: Option<RowAction> = None;

        egui::ScrollArea::vertical().show(ui, |ui| {
            if self.store.bugs().is_empty() && !self.store.loading() {
                ui.add_space(12.0);
                ui.label(RichText::new("No bugs to show.").color(theme.fg_dim));
            }

            for bug in self.store.bugs() {
                egui::Frame::none()
                    .fill(theme.panel_bg)
                    .stroke(egui::Stroke::new(1.0, theme.border))
                    .inner_margin(egui::Margin::symmetric(10.0, 8.0))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.vertical(|ui| {
                                ui.label(RichText::new(&bug.title).strong().size(15.0));
                                ui.horizontal(|ui| {
                                    ui.label(RichText::new("Status:").color(theme.fg_dim));
                                    ui.label(
                                        RichText::new(bug.status.label())
                                            .color(status_color(&theme, bug.status)),
                                    );
                                    ui.separator();
                                    ui.label(RichText::new("Priority:").color(theme.fg_dim));
                                    ui.label(
                                        RichText::new(bug.priority.label())
                                            .color(priority_color(&theme, bug.priority)),
                                    );
                                });
                            });
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.button("Delete").clicked() {
                                        action = Some(RowAction::Delete(bug.id.clone()));
                                    }
                                    if ui.button("Edit").clicked() {
                                        action = Some(RowAction::Edit(bug.clone()));
                                    }
                                },
                            );
                        });
                    });
                ui.add_space(4.0);
            }
        });

        match action {
            Some(RowAction::Edit(bug)) => {
                self.editing_id = Some(bug.id);
                self.form = BugDraft {
                    title: bug.title,
                    status: bug.status,
                    priority: bug.priority,
                };
                self.form_error = None;
            }
            Some(RowAction::Delete(id)) => self.store.delete_bug(id),
            None => {}
        }
    }

    fn show_bugs_page(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme;

        if let Some(err) = self.store.error().map(str::to_string) {
            egui::Frame::none()
                .fill(theme.panel_bg)
                .stroke(egui::Stroke::new(1.0, theme.error))
                .inner_margin(egui::Margin::symmetric(10.0, 6.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.colored_label(theme.error, &err);
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("Dismiss").clicked() {
                                self.store.clear_error();
                            }
                        });
                    });
                });
            ui.add_space(6.0);
        }

        if self.store.loading() {
            ui.label(RichText::new("Loading bugs…").color(theme.fg_dim));
            ui.add_space(4.0);
        }

        self.show_bug_form(ui);
        ui.add_space(8.0);
        self.show_filters(ui);
        ui.separator();
        self.show_bug_list(ui);

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            if ui.small_button("Send test error").clicked() {
                self.sink
                    .capture(ErrorEvent::new("ui_test", "Synthetic test error"));
                self.notice = Some("A test error has been sent to the telemetry sink.".to_string());
            }
            if let Some(notice) = &self.notice {
                ui.label(RichText::new(notice).color(theme.fg_dim));
            }
        });
    }
}

fn status_color(theme: &Theme, status: BugStatus) -> Color32 {
    match status {
        BugStatus::Open => theme.accent,
        BugStatus::InProgress => theme.warning,
        BugStatus::Closed => theme.success,
    }
}

fn priority_color(theme: &Theme, priority: Priority) -> Color32 {
    match priority {
        Priority::Low => theme.fg_dim,
        Priority::Medium => theme.warning,
        Priority::High => theme.error,
    }
}

impl eframe::App for BugStudio {
    /// Persist the theme preference when the app is about to exit
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.theme_kind.save(&self.config_dir);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll background requests for completion
        self.poll_auth();
        self.store.poll();

        // Keep polling while something is in flight.
        if self.store.loading() || self.auth_busy {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        let theme = self.theme;
        let mut visuals = match self.theme_kind {
            ThemeKind::Light => egui::Visuals::light(),
            ThemeKind::Dark => egui::Visuals::dark(),
        };
        visuals.panel_fill = theme.bg;
        visuals.window_fill = theme.panel_bg;
        visuals.faint_bg_color = theme.input_bg;
        visuals.widgets.noninteractive.bg_fill = theme.panel_bg;
        visuals.widgets.inactive.bg_fill = theme.input_bg;
        visuals.widgets.hovered.bg_fill = theme.list_hover;
        visuals.widgets.active.bg_fill = theme.accent;
        visuals.selection.bg_fill = theme.selection;
        ctx.set_visuals(visuals);

        // Protected route: no credential, no bugs view.
        if self.view == View::Bugs && !self.session.is_authenticated() {
            self.view = View::Login;
        }

        if self.view == View::Bugs {
            egui::TopBottomPanel::top("header")
                .frame(
                    egui::Frame::none()
                        .fill(theme.panel_bg)
                        .inner_margin(egui::Margin::symmetric(12.0, 8.0)),
                )
                .show(ctx, |ui| {
                    self.show_header(ui);
                });
        }

        egui::CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(theme.bg)
                    .inner_margin(egui::Margin::same(12.0)),
            )
            .show(ctx, |ui| match self.view {
                View::Login => self.show_auth_page(ui, false),
                View::Register => self.show_auth_page(ui, true),
                View::Bugs => self.show_bugs_page(ui),
            });
    }
}
