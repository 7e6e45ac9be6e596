use crate::{QueryMenuError, QueryMenuResult};

use rfd::AsyncFileDialog;
use std::path::PathBuf;

/// Opens a file dialog asynchronously, allowing the user to choose a catalog file.
///
/// This function uses the `rfd::AsyncFileDialog` to present a native file dialog
/// to the user, filtered on the catalog formats understood by `config::load_catalog`.
///
/// # Returns
///
/// - `Ok(PathBuf)`: The path to the selected file if the user successfully chooses one.
/// - `Err(QueryMenuError::FileNotFound)`: If the user cancels the dialog (no file is selected).
pub async fn open_catalog() -> QueryMenuResult<PathBuf> {
    // Open the file dialog. `pick_file` returns an `Option<FileHandle>`.
    let opt_file = AsyncFileDialog::new()
        .set_title("Open query catalog")
        .add_filter("YAML", &["yaml", "yml"])
        .add_filter("Json", &["json"])
        .pick_file()
        .await;

    // Convert the `Option<FileHandle>` to a `QueryMenuResult<PathBuf>`.
    // A cancelled dialog (None) becomes `FileNotFound` with an empty path.
    opt_file
        .map(|file| file.path().to_path_buf())
        .ok_or_else(|| QueryMenuError::FileNotFound(PathBuf::new()))
}
