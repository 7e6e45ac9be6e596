#![warn(clippy::all)]

use query_menu::{
    Arguments, Catalog, QueryMenuApp, QueryMenuError, QueryMenuResult, build_menu, load_catalog,
    load_history, render_menu_tree,
};
use tracing::{debug, error};

/*
cargo fmt
cargo test -- --nocapture
cargo test -- --show-output tests_template
cargo run -- --help
cargo run -- config.yml --print-menu
cargo run -- config.yml -s "Stats/Top digests" -v limit=5
cargo doc --open
cargo b -r && cargo install --path=.
*/

#[cfg(not(target_arch = "wasm32"))]
fn main() -> QueryMenuResult<()> {
    // Initialize the tracing subscriber for logging.
    // Use RUST_LOG environment variable to set logging level.  eg `export RUST_LOG=info`
    tracing_subscriber::fmt::init();

    // Parse command-line arguments.
    let args = Arguments::build();

    // Load the inputs. Without a catalog only "Custom SQL" (and History) are offered.
    let catalog = match &args.catalog_path {
        Some(path) => load_catalog(path)?,
        None => Catalog::default(),
    };
    let history = args.history.as_deref().map(load_history).transpose()?;

    // RUST_LOG=debug cargo run -- config.yml
    debug!("main()\nCatalog: {catalog:#?}");

    // Headless modes.
    if args.print_menu || args.select.is_some() {
        let menu = build_menu(&catalog, history.as_ref());

        if args.print_menu {
            println!("{}", render_menu_tree(&menu));
        }

        if let Some(sql) = args.resolve_selection(&menu)? {
            println!("{sql}");
        }

        return Ok(());
    }

    // Configure the native options for the eframe application.
    let native_options = eframe::NativeOptions {
        centered: true,
        persist_window: true,
        vsync: true,
        ..Default::default()
    };

    // Run the eframe application.
    eframe::run_native(
        "Query Menu",
        native_options,
        Box::new(move |creation_context| {
            match QueryMenuApp::new(creation_context, catalog, history) {
                Ok(app) => Ok(Box::new(app)),
                Err(err) => {
                    error!("Failed to initialize QueryMenuApp: {}", err); //Log
                    Err(Box::new(err))
                }
            }
        }),
    )
    .map_err(|err| QueryMenuError::Other(format!("eframe: {err}")))
}
