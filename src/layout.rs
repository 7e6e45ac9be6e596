use crate::{
    CUSTOM_SQL_TITLE, Catalog, EditorState, Error, HistoryList, MenuEntry, MyStyle, Notification,
    QueryDefinition, QueryMenuResult, RawInputs, VariableControl, VariableInputRenderer,
    apply_variables, build_menu, info_heading, load_catalog, open_catalog, select_custom_sql,
    select_query,
};

use egui::{
    CentralPanel, Color32, Context, Direction, FontId, Frame, Grid, Layout, RichText, ScrollArea,
    Stroke, TextEdit, TextStyle, TopBottomPanel, Ui, ViewportCommand, menu, style::Visuals,
    warn_if_debug_build, widgets,
};
use tracing::{debug, error, info};

/// The main application struct for Query Menu.
///
/// It owns the read-only inputs (catalog, history), the menu composed from them and the single
/// live `EditorState`. Every selection replaces the editor state and the form inputs wholesale.
pub struct QueryMenuApp {
    /// Categories of predefined queries.
    catalog: Catalog,
    /// Statements executed so far (loaded history plus this session's executions).
    history: HistoryList,
    /// Menu composed from `catalog` and `history`. Rebuilt whenever one of them changes.
    menu: Vec<MenuEntry>,
    /// The live editing session.
    editor: EditorState,
    /// Input controls of the selected query, computed once per selection.
    controls: Vec<VariableControl>,
    /// What the user typed or checked in the variables form.
    inputs: RawInputs,
    /// Optional Notification window for displaying errors.
    notification: Option<Box<dyn Notification>>,

    /// Tokio runtime driving the native file dialog.
    runtime: tokio::runtime::Runtime,
}

impl QueryMenuApp {
    /// Creates a new `QueryMenuApp` instance with "Custom SQL" selected.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        catalog: Catalog,
        history: Option<HistoryList>,
    ) -> QueryMenuResult<Self> {
        cc.egui_ctx.set_style_init(Visuals::dark()); // Dark theme and custom styles.

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let history = history.unwrap_or_default();
        let menu = build_menu(&catalog, Some(&history));
        let editor = select_custom_sql();

        Ok(Self {
            catalog,
            history,
            menu,
            controls: editor.controls(),
            inputs: editor.default_inputs(),
            editor,
            notification: None,
            runtime,
        })
    }

    /// Checks if a Notification is active and displays it.
    fn check_notification(&mut self, ctx: &Context) {
        if let Some(notification) = &mut self.notification
            && !notification.show(ctx)
        {
            self.notification = None; // Remove closed Notification.
        }
    }

    /// Shows `message` in an error window and logs it.
    fn notify_error(&mut self, message: String) {
        error!("{message}");
        self.notification = Some(Box::new(Error { message }));
    }

    /// Replaces the live session with a new one for `query`.
    fn select(&mut self, query: QueryDefinition) {
        self.editor = select_query(query);
        self.controls = self.editor.controls();
        self.inputs = self.editor.default_inputs();
    }

    /// "Apply variables": substitutes the current form inputs into the template.
    fn apply(&mut self) {
        self.editor = apply_variables(&self.editor, &self.inputs);
        debug!("Applied variables: {:?}", self.editor.variable_values());
    }

    /// "Execute query": hands the rendered SQL over and records it in the session history.
    ///
    /// The SQL is written to stdout (one statement per line, ready to be piped into a client) and
    /// copied to the clipboard. Executing it is not this application's job.
    fn execute(&mut self, ctx: &Context) {
        let sql = self.editor.rendered_sql().to_string();

        if sql.trim().is_empty() {
            self.notify_error("Nothing to execute: the SQL text is empty.".to_string());
            return;
        }

        info!("Execute query: {sql}");
        println!("{}", sql.replace("\r\n", " ").replace('\n', " "));
        ctx.copy_text(sql.clone());

        if self.history.record(&sql) {
            self.menu = build_menu(&self.catalog, Some(&self.history));
        }
    }

    /// File → Open catalog: replaces the catalog and starts over with "Custom SQL".
    fn open_catalog_from_dialog(&mut self) {
        let path = match self.runtime.block_on(open_catalog()) {
            Ok(path) => path,
            Err(_) => return, // Dialog cancelled.
        };

        match load_catalog(&path) {
            Ok(catalog) => {
                debug!("Catalog loaded from {path:?}");
                self.catalog = catalog;
                self.menu = build_menu(&self.catalog, Some(&self.history));
                self.select(QueryDefinition::custom());
            }
            Err(err) => self.notify_error(format!("Failed to load {path:?}:\n{err}")),
        }
    }

    /// Renders the variables form and the "Apply variables" button.
    ///
    /// ### Returns
    /// `true` if "Apply variables" was clicked.
    fn render_variables(&mut self, ui: &mut Ui) -> bool {
        let mut apply = false;

        Grid::new("variables_grid")
            .num_columns(2)
            .spacing([10.0, 12.0])
            .striped(true)
            .show(ui, |ui| {
                for control in &self.controls {
                    if let Some(input) = self.inputs.get_mut(&control.slug) {
                        ui.render_variable_input(control, input);
                        ui.end_row();
                    }
                }

                ui.label(""); // For alignment.
                if ui.button("Apply variables").clicked() {
                    apply = true;
                }
                ui.end_row();
            });

        apply
    }

    /// Renders the SQL text area. Editable only when the query declares no variables.
    fn render_sql_editor(&mut self, ui: &mut Ui) {
        let mut sql = self.editor.rendered_sql().to_string();

        let response = ui.add(
            TextEdit::multiline(&mut sql)
                .font(TextStyle::Monospace)
                .desired_width(f32::INFINITY)
                .desired_rows(7)
                .interactive(self.editor.editable()),
        );

        if response.changed() {
            self.editor = self.editor.clone().with_edited_sql(sql);
        }
    }
}

/// Renders menu entries; returns the query of the clicked leaf, if any.
///
/// Top-level entries are separated by a line; nested items are not.
fn render_menu_entries(
    ui: &mut Ui,
    entries: &[MenuEntry],
    separated: bool,
) -> Option<QueryDefinition> {
    let mut selected = None;

    for (index, entry) in entries.iter().enumerate() {
        if separated && index != 0 {
            ui.separator();
        }

        match entry {
            MenuEntry::Leaf { title, query } => {
                let text = if title == CUSTOM_SQL_TITLE {
                    RichText::new(title).strong()
                } else {
                    RichText::new(title)
                };

                let button = ui.button(text);
                let button = match &query.info {
                    Some(info) if !info.is_empty() => button.on_hover_text(info),
                    _ => button,
                };

                if button.clicked() {
                    selected = Some(query.clone());
                    ui.close_menu();
                }
            }
            MenuEntry::Submenu { label, items } => {
                ui.menu_button(label, |ui| {
                    ScrollArea::vertical().show(ui, |ui| {
                        if let Some(query) = render_menu_entries(ui, items, false) {
                            selected = Some(query);
                        }
                    });
                });
            }
        }
    }

    selected
}

/// Renders the "About" sub-menu content.
fn render_about(ui: &mut Ui) {
    Frame::default()
        .stroke(Stroke::new(1.0, Color32::GRAY)) // Thin gray border for visual separation.
        .outer_margin(2.0)
        .inner_margin(10.0)
        .show(ui, |ui| {
            let version = env!("CARGO_PKG_VERSION");
            let authors = env!("CARGO_PKG_AUTHORS");
            let description = env!("CARGO_PKG_DESCRIPTION");

            Grid::new("about_grid")
                .num_columns(1)
                .spacing([10.0, 4.0])
                .show(ui, |ui| {
                    ui.with_layout(
                        Layout::centered_and_justified(Direction::LeftToRight),
                        |ui| {
                            ui.label(RichText::new("Query Menu").font(FontId::proportional(30.0)));
                        },
                    );
                    ui.end_row();

                    ui.with_layout(
                        Layout::centered_and_justified(Direction::LeftToRight),
                        |ui| {
                            ui.label(format!("Version: {version}"));
                        },
                    );
                    ui.end_row();
                    ui.end_row();

                    ui.label(RichText::new(description).font(FontId::proportional(18.0)));
                    ui.end_row();
                    ui.end_row();

                    ui.label(format!("Author: {authors}"));
                    ui.end_row();
                });
        });
}

impl eframe::App for QueryMenuApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        // Check and display any active Notifications.
        self.check_notification(ctx);

        // Define the main UI layout.
        //
        //  | File  Queries        theme |
        //  ------------------------------
        //  | info                       |
        //  | variables form + Apply     |
        //  | SQL editor                 |
        //  | Execute query              |
        //  ------------------------------
        //  | catalog / history summary  |

        let mut selected: Option<QueryDefinition> = None;
        let mut open_requested = false;

        TopBottomPanel::top("top_panel").show(ctx, |ui| {
            menu::bar(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.menu_button("File", |ui| {
                        if ui.button("Open catalog…").clicked() {
                            open_requested = true;
                            ui.close_menu();
                        }

                        ui.menu_button("About", render_about);

                        if ui.button("Quit").clicked() {
                            ui.ctx().send_viewport_cmd(ViewportCommand::Close);
                        }
                    });

                    ui.menu_button("Queries", |ui| {
                        selected = render_menu_entries(ui, &self.menu, true);
                    });

                    // Add spacing to align theme switch to the right.
                    let delta = ui.available_width() - 15.0;
                    if delta > 0.0 {
                        ui.add_space(delta);
                        widgets::global_theme_preference_switch(ui);
                    }
                });
            });
        });

        TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!(
                    "{} categories · {} history entries",
                    self.catalog.len(),
                    self.history.len()
                ));
                ui.separator();
                ui.label(match self.editor.current_query().title.as_deref() {
                    Some(title) => title.to_string(),
                    None => CUSTOM_SQL_TITLE.to_string(),
                });
            });
        });

        // CentralPanel must be added after all other panels in your egui layout!
        CentralPanel::default().show(ctx, |ui| {
            warn_if_debug_build(ui);

            ScrollArea::vertical().show(ui, |ui| {
                // Info panel: only when the query has a non-empty info.
                if let Some(text) = self.editor.info() {
                    let heading = info_heading(ui.visuals());
                    Frame::default()
                        .stroke(Stroke::new(1.0, Color32::GRAY))
                        .outer_margin(2.0)
                        .inner_margin(10.0)
                        .show(ui, |ui| {
                            ui.label(heading);
                            ui.label(text);
                        });
                    ui.add_space(8.0);
                }

                // Variables form.
                if !self.controls.is_empty() && self.render_variables(ui) {
                    self.apply();
                }

                ui.add_space(8.0);
                self.render_sql_editor(ui);
                ui.add_space(8.0);

                if ui.button("Execute query").clicked() {
                    self.execute(ctx);
                }
            });
        });

        // Act on menu actions after the frame's widgets are laid out.
        if let Some(query) = selected {
            debug!("Selected: {:?}", query.title);
            self.select(query);
        }

        if open_requested {
            self.open_catalog_from_dialog();
        }
    }
}
