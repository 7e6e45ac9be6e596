use crate::{
    MenuEntry, QueryDefinition, QueryMenuError, QueryMenuResult, RawInput, RawInputs,
    VariableKind, apply_variables, find_leaf, select_query,
};

use clap::Parser;
use std::path::PathBuf;

// https://stackoverflow.com/questions/74068168/clap-rs-not-printing-colors-during-help
fn get_styles() -> clap::builder::Styles {
    let cyan = anstyle::Color::Ansi(anstyle::AnsiColor::Cyan);
    let green = anstyle::Color::Ansi(anstyle::AnsiColor::Green);
    let yellow = anstyle::Color::Ansi(anstyle::AnsiColor::Yellow);

    clap::builder::Styles::styled()
        .placeholder(anstyle::Style::new().fg_color(Some(yellow)))
        .usage(anstyle::Style::new().fg_color(Some(cyan)).bold())
        .header(
            anstyle::Style::new()
                .fg_color(Some(cyan))
                .bold()
                .underline(),
        )
        .literal(anstyle::Style::new().fg_color(Some(green)))
}

// https://docs.rs/clap/latest/clap/struct.Command.html#method.help_template
const APPLET_TEMPLATE: &str = "\
{before-help}
{about-with-newline}
{usage-heading} {usage}

{all-args}
{after-help}";

const EX1: &str = r#" query-menu config.yml"#;
const EX2: &str = r#" query-menu config.yml -H history.sql --print-menu"#;
const EX3: &str = r#" query-menu config.yml -s "Stats/Top digests""#;
const EX4: &str = r#" query-menu config.yml -s "Stats/Top digests" -v limit=5 -v active=yes"#;

/// Command-line arguments for the Query Menu application.
#[derive(Parser, Debug, Clone)]
#[command(
    // Read from `Cargo.toml`.
    author, version, about,
    long_about = None,
    next_line_help = true,
    help_template = APPLET_TEMPLATE,
    styles=get_styles(),
    after_help = format!("EXAMPLES:\n{EX1}\n{EX2}\n{EX3}\n{EX4}")
)]
pub struct Arguments {
    /// Optional path to the query catalog (YAML or Json).
    #[arg(
        value_name = "CATALOG_PATH",
        required = false,
        help = "Path to the query catalog (.yaml/.yml/.json) [Optional]",
        long_help = "Path to the query catalog.\n\
        Either a mapping of category names to query lists, or an application\n\
        config holding that mapping under its `misc` key.\n\
        If omitted, only \"Custom SQL\" (and History) are offered."
    )]
    pub catalog_path: Option<PathBuf>,

    /// History file: one SQL statement per line.
    #[arg(
        short = 'H',
        long,
        value_name = "HISTORY_PATH",
        help = "File with previously executed SQL, one statement per line",
        long_help = "Statements listed here are offered in the \"History\" submenu,\n\
        in file order. Blank lines are skipped."
    )]
    pub history: Option<PathBuf>,

    /// Print the menu and exit.
    #[arg(
        short = 'm',
        long,
        help = "Print the composed menu tree and exit",
        long_help = "Prints every menu entry, one per line. Queries with variables are marked with '*'.",
        action = clap::ArgAction::SetTrue,
    )]
    pub print_menu: bool,

    /// Select a menu entry without starting the UI and print its SQL.
    #[arg(
        short = 's',
        long,
        value_name = "MENU_PATH",
        help = "Select a menu entry, print its SQL and exit",
        long_help = "\
Selects a menu entry without opening the UI.

MENU_PATH is either \"Custom SQL\" or \"<submenu>/<title>\", for example:
    --select \"Stats/Top digests\"
    --select \"History/1. SELECT 1...\"

Without --var the SQL template is printed as is.
With --var the given values are applied once and the result is printed.
"
    )]
    pub select: Option<String>,

    /// Variable value for the selected query, repeatable [requires --select].
    #[arg(
        short = 'v',
        long = "var",
        value_name = "SLUG=VALUE",
        help = "Value for a variable of the selected query (repeatable) [requires --select]",
        long_help = "\
Sets the raw input of one variable, as if typed in the form.

- boolean variables accept 1/0, true/false, yes/no, on/off, checked/unchecked
- string, integer and float values are used verbatim (never parsed)

Variables not given are left out: their placeholders stay in the SQL.
",
        requires = "select",
        value_parser = parse_var_assignment
    )]
    pub vars: Vec<(String, String)>,
}

impl Arguments {
    /// Build `Arguments` struct.
    pub fn build() -> Arguments {
        Arguments::parse()
    }

    /// Resolves `--select`/`--var` against `menu`.
    ///
    /// ### Returns
    /// * `Ok(None)`: no `--select` given.
    /// * `Ok(Some(sql))`: the template, or the SQL after one "Apply variables" when `--var` is given.
    /// * `Err(_)`: unknown menu path, unknown slug or invalid boolean.
    pub fn resolve_selection(&self, menu: &[MenuEntry]) -> QueryMenuResult<Option<String>> {
        let Some(path) = &self.select else {
            return Ok(None);
        };

        let query = find_leaf(menu, path)
            .cloned()
            .ok_or_else(|| QueryMenuError::MenuEntryNotFound(path.clone()))?;

        let state = select_query(query);

        if self.vars.is_empty() {
            return Ok(Some(state.rendered_sql().to_string()));
        }

        let inputs = raw_inputs(state.current_query(), &self.vars)?;
        let applied = apply_variables(&state, &inputs);

        Ok(Some(applied.rendered_sql().to_string()))
    }
}

/// Converts `--var` pairs into raw form inputs for `query`.
pub fn raw_inputs(query: &QueryDefinition, vars: &[(String, String)]) -> QueryMenuResult<RawInputs> {
    let mut inputs = RawInputs::new();

    for (slug, value) in vars {
        let spec = query
            .variables
            .get(slug)
            .ok_or_else(|| QueryMenuError::UnknownVariable(slug.clone()))?;

        let raw = match spec.kind {
            VariableKind::Boolean => RawInput::Checked(parse_flag(value).ok_or_else(|| {
                QueryMenuError::InvalidArgument {
                    arg_name: format!("--var {slug}"),
                    reason: format!("'{value}' is not a boolean (use 1/0, true/false, yes/no, on/off)"),
                }
            })?),
            VariableKind::String | VariableKind::Integer | VariableKind::Float => {
                RawInput::Text(value.clone())
            }
        };

        inputs.set(slug.as_str(), raw);
    }

    Ok(inputs)
}

/// Reads a checkbox state from its command-line spelling.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "checked" => Some(true),
        "0" | "false" | "no" | "off" | "unchecked" => Some(false),
        _ => None,
    }
}

// --- Validation Functions ---

/// clap value parser for `--var`: splits `SLUG=VALUE` at the first `=`.
/// The value may be empty or contain `=`; the slug may not be empty.
fn parse_var_assignment(s: &str) -> QueryMenuResult<(String, String)> {
    match s.split_once('=') {
        Some((slug, value)) if !slug.trim().is_empty() => {
            Ok((slug.trim().to_string(), value.to_string()))
        }
        _ => Err(QueryMenuError::InvalidArgument {
            arg_name: "--var".to_string(),
            reason: format!("expected SLUG=VALUE, got '{s}'"),
        }),
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
