use std::path::Path;

use crate::sanitize;

/// Default archive file name: `<prefix>_<destination dir name>_<4 hex>.zip`.
///
/// The random suffix keeps repeated exports into the same directory apart.
pub fn archive_file_name(prefix: &str, destination: &Path) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..4];

    match destination.file_name().and_then(|n| n.to_str()) {
        Some(dir_name) => format!(
            "{}_{}_{}.zip",
            prefix,
            sanitize::sanitize_base_name(dir_name),
            suffix
        ),
        None => format!("{}_{}.zip", prefix, suffix),
    }
}

/// Appends `.zip` unless the caller-supplied name already ends with it.
pub fn ensure_zip_extension(name: &str) -> String {
    if name.to_lowercase().ends_with(".zip") {
        name.to_string()
    } else {
        format!("{}.zip", name)
    }
}
