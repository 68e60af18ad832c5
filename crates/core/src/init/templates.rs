//! Templates embedded into the binary for `assess init`.
//!
//! `templates/` at the workspace root holds the default `config.toml` and
//! the stock check definitions under `checks/<category>/`.

use rust_embed::RustEmbed;

/// Files below the workspace `templates/` directory.
///
/// With the `debug-embed` feature the files are compiled in for debug
/// builds too, so tests see the same assets as release binaries.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../templates"]
pub struct TemplateAssets;

/// Content of the template at `path`, relative to the templates root.
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}

/// Template paths starting with `prefix`, sorted.
pub fn list_templates(prefix: &str) -> Vec<String> {
    let mut paths: Vec<String> = TemplateAssets::iter()
        .filter(|path| path.starts_with(prefix))
        .map(|path| path.to_string())
        .collect();
    paths.sort();
    paths
}
