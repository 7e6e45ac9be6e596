//! egui extensions used by the host UI: application style, the error window and the
//! variables form row. Also `PathExtension`, used for catalog format detection.

use crate::{InputControl, RawInput, VariableControl};

use egui::{
    Align, Color32, Context,
    FontFamily::{Monospace as MonospaceFamily, Proportional},
    FontId, Frame, Layout, Response, RichText, Spacing, Stroke, Style,
    TextStyle::{self, Body, Button, Heading, Monospace, Small},
    TextEdit, Ui, Vec2, Visuals, Window,
    style::ScrollStyle,
};

use std::{ffi::OsStr, path::Path};

/// Font sizes of the app. SQL (editor and text inputs) uses the monospace family.
pub const SQL_TEXT_STYLE: [(TextStyle, FontId); 5] = [
    (Heading, FontId::new(18.0, Proportional)),
    (Body, FontId::new(15.0, Proportional)),
    (Button, FontId::new(15.0, Proportional)),
    (Monospace, FontId::new(14.0, MonospaceFamily)),
    (Small, FontId::new(12.0, Proportional)),
];

/// Installs the app style on an egui `Context`.
pub trait MyStyle {
    fn set_style_init(&self, visuals: Visuals);
}

impl MyStyle for Context {
    /// `visuals` picks the theme; spacing is widened a bit so the variables grid breathes.
    fn set_style_init(&self, visuals: Visuals) {
        let spacing = Spacing {
            scroll: ScrollStyle {
                handle_min_length: 24.0,
                ..ScrollStyle::default()
            },
            item_spacing: [8.0, 8.0].into(),
            interact_size: [40.0, 22.0].into(),
            ..Spacing::default()
        };

        self.set_style(Style {
            visuals,
            spacing,
            text_styles: SQL_TEXT_STYLE.into(),
            ..Style::default()
        });
    }
}

/// A modal window owned by `QueryMenuApp` until the user closes it.
pub trait Notification: Send + Sync + 'static {
    /// Draws the window; `false` once it has been closed.
    fn show(&mut self, ctx: &Context) -> bool;
}

/// Load or execute failure shown to the user.
pub struct Error {
    pub message: String,
}

impl Notification for Error {
    fn show(&mut self, ctx: &Context) -> bool {
        let mut open = true;

        Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                let width = ui.available_width() * 0.8;
                ui.allocate_ui_with_layout(
                    Vec2::new(width, ui.available_height()),
                    Layout::top_down(Align::LEFT),
                    |ui| {
                        Frame::default()
                            .fill(Color32::from_rgb(255, 215, 215))
                            .stroke(Stroke::new(1.0, Color32::DARK_RED))
                            .inner_margin(8.0)
                            .show(ui, |ui| {
                                ui.colored_label(Color32::BLACK, &self.message);
                            });
                    },
                );
            });

        open
    }
}

/// Trait defining a widget for rendering one variable input of the form.
/// Provides a consistent interface for `layout.rs::render_variables`.
pub trait VariableInputRenderer {
    /// Renders the label and the input control of a variable inside a 2-column `Grid` row.
    ///
    /// ### Arguments
    /// * `control`: What to draw (label, control kind, step hint).
    /// * `input`: The raw value held by the control. Edited in place.
    ///
    /// ### Returns
    /// * `egui::Response`: Response of the input widget. The caller decides what to do with changes.
    fn render_variable_input(&mut self, control: &VariableControl, input: &mut RawInput)
    -> Response;
}

impl VariableInputRenderer for Ui {
    /// Implements variable rendering for `egui::Ui`.
    ///
    /// ### Logic
    /// 1. Label cell: the variable label, with the slug as hover text.
    /// 2. Input cell, chosen by the control kind:
    ///    - Checkbox: `ui.checkbox` bound to `RawInput::Checked`.
    ///    - Text / Number: single-line `TextEdit` bound to `RawInput::Text`. Numbers get a
    ///      `step` hint; the content is never parsed.
    /// 3. If the raw input does not match the control (should not happen, inputs are built from the same
    ///    declarations), it is reset to the control's initial value before drawing.
    fn render_variable_input(
        &mut self,
        control: &VariableControl,
        input: &mut RawInput,
    ) -> Response {
        // 1. Label.
        self.label(&control.label)
            .on_hover_text(format!("{{{}}}", control.slug));

        // 3. Keep the raw input in the shape the control expects.
        let reset = match (&control.control, &*input) {
            (InputControl::Checkbox { checked }, RawInput::Text(_)) => {
                Some(RawInput::Checked(*checked))
            }
            (
                InputControl::Text { value } | InputControl::Number { value, .. },
                RawInput::Checked(_),
            ) => Some(RawInput::Text(value.clone())),
            _ => None,
        };

        if let Some(reset) = reset {
            *input = reset;
        }

        // 2. Input.
        match (input, &control.control) {
            (RawInput::Checked(checked), _) => self.checkbox(checked, ""),
            (RawInput::Text(text), InputControl::Number { step, .. }) => self
                .add(
                    TextEdit::singleline(text)
                        .font(TextStyle::Monospace)
                        .desired_width(f32::INFINITY),
                )
                .on_hover_text(format!("Number (step {step})")),
            (RawInput::Text(text), _) => self.add(
                TextEdit::singleline(text)
                    .font(TextStyle::Monospace)
                    .desired_width(f32::INFINITY),
            ),
        }
    }
}

/// Helper: Heading text for the information panel, with a theme-aware color.
pub fn info_heading(visuals: &Visuals) -> RichText {
    let color = if visuals.dark_mode {
        Color32::from_rgb(160, 200, 255) // Lighter blue for dark mode
    } else {
        Color32::from_rgb(0, 80, 160) // Darker blue for light mode
    };

    RichText::new("Info").color(color).strong()
}

/// Lowercase file extension of a path (`Queries.YML` gives `yml`).
pub trait PathExtension {
    fn extension_as_lowercase(&self) -> Option<String>;
}

impl PathExtension for Path {
    fn extension_as_lowercase(&self) -> Option<String> {
        self.extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// cargo test -- --show-output tests_path_extension
#[cfg(test)]
mod tests_path_extension {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extension_as_lowercase_some() {
        let path = PathBuf::from("queries.YAML");
        assert_eq!(path.extension_as_lowercase(), Some("yaml".to_string()));
    }

    #[test]
    fn test_extension_as_lowercase_none() {
        let path = PathBuf::from("queries");
        assert_eq!(path.extension_as_lowercase(), None);
    }

    #[test]
    fn test_extension_as_lowercase_multiple_dots() {
        let path = PathBuf::from("config.prod.yml");
        assert_eq!(path.extension_as_lowercase(), Some("yml".to_string()));
    }
}
