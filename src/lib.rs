#![warn(clippy::all)]
#![doc = include_str!("../README.md")]

// Modules that make up the Query Menu library.
mod args;
mod catalog;
mod config;
mod error;
mod file_dialog;
mod file_extension;
mod layout;
mod menu;
mod template;
mod traits;

// Publicly expose the contents of these modules.
pub use self::{
    // add to lib
    args::*,
    catalog::*,
    config::*,
    error::*,
    file_dialog::*,
    file_extension::*,
    layout::*,
    menu::*,
    template::*,
    traits::*,
};
