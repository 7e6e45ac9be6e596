//! Composes the selectable query menu from a `Catalog` and an optional `HistoryList`.
//!
//! The resulting structure is plain data: the host UI decides how leaves and submenus are drawn
//! (see `layout.rs`), and the headless command line walks it with `find_leaf` and
//! `render_menu_tree`.

use crate::{Catalog, HistoryList, QueryDefinition};

/// Title of the synthetic first entry.
pub const CUSTOM_SQL_TITLE: &str = "Custom SQL";

/// Label of the trailing submenu built from history.
pub const HISTORY_LABEL: &str = "History";

/// Number of characters of a history statement kept in its menu title.
pub const HISTORY_TITLE_CHARS: usize = 80;

/// One selectable item of the menu.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuEntry {
    /// Selecting a leaf hands its query definition to the template engine.
    Leaf {
        title: String,
        query: QueryDefinition,
    },
    /// A labeled, ordered group of entries.
    Submenu { label: String, items: Vec<MenuEntry> },
}

impl MenuEntry {
    /// Title of a leaf or label of a submenu.
    pub fn name(&self) -> &str {
        match self {
            MenuEntry::Leaf { title, .. } => title,
            MenuEntry::Submenu { label, .. } => label,
        }
    }

    fn leaf(query: QueryDefinition) -> Self {
        MenuEntry::Leaf {
            title: query.title.clone().unwrap_or_default(),
            query,
        }
    }
}

/// Builds the ordered menu.
///
/// ### Logic
/// 1. "Custom SQL" leaf with an empty query definition, always first.
/// 2. One submenu per category, in catalog order, with one leaf per query titled by the query's `title`.
/// 3. If history is present and non-empty, a trailing "History" submenu whose leaf `i` (1-based)
///    is titled `"{i}. {first 80 chars}..."`. The ellipsis is appended even to short statements.
///
/// Pure: identical inputs always produce identical menus.
pub fn build_menu(catalog: &Catalog, history: Option<&HistoryList>) -> Vec<MenuEntry> {
    // 1. Custom SQL.
    let mut entries = vec![MenuEntry::Leaf {
        title: CUSTOM_SQL_TITLE.to_string(),
        query: QueryDefinition::custom(),
    }];

    // 2. Catalog categories.
    entries.extend(catalog.iter().map(|category| MenuEntry::Submenu {
        label: category.name.clone(),
        items: category.queries.iter().cloned().map(MenuEntry::leaf).collect(),
    }));

    // 3. History.
    if let Some(history) = history.filter(|h| !h.is_empty()) {
        let items = history
            .iter()
            .enumerate()
            .map(|(index, sql)| {
                MenuEntry::leaf(QueryDefinition::new(sql).with_title(history_title(index, sql)))
            })
            .collect();

        entries.push(MenuEntry::Submenu {
            label: HISTORY_LABEL.to_string(),
            items,
        });
    }

    entries
}

/// Title of the history leaf at 0-based `index`.
pub fn history_title(index: usize, sql: &str) -> String {
    let head: String = sql.chars().take(HISTORY_TITLE_CHARS).collect();
    format!("{}. {head}...", index + 1)
}

/// Resolves a menu path to the query definition of a leaf.
///
/// A path is either the title of a top-level leaf (`"Custom SQL"`) or
/// `"<submenu label>/<leaf title>"`. Labels and titles may themselves contain `/`:
/// every submenu whose label is followed by `/` in the path is tried.
pub fn find_leaf<'a>(entries: &'a [MenuEntry], path: &str) -> Option<&'a QueryDefinition> {
    entries.iter().find_map(|entry| match entry {
        MenuEntry::Leaf { title, query } if title == path => Some(query),
        MenuEntry::Leaf { .. } => None,
        MenuEntry::Submenu { label, items } => path
            .strip_prefix(label.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| find_leaf(items, rest)),
    })
}

/// Renders the menu as an indented text tree, one entry per line.
///
/// Leaves are prefixed with `- `, submenus end with `/`.
pub fn render_menu_tree(entries: &[MenuEntry]) -> String {
    let mut lines = Vec::new();
    push_tree_lines(entries, 0, &mut lines);
    lines.join("\n")
}

fn push_tree_lines(entries: &[MenuEntry], depth: usize, lines: &mut Vec<String>) {
    let indent = "    ".repeat(depth);

    for entry in entries {
        match entry {
            MenuEntry::Leaf { title, query } => {
                let marker = if query.has_variables() { " *" } else { "" };
                lines.push(format!("{indent}- {title}{marker}"));
            }
            MenuEntry::Submenu { label, items } => {
                lines.push(format!("{indent}{label}/"));
                push_tree_lines(items, depth + 1, lines);
            }
        }
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
