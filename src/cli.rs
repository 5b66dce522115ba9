use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "media-localizer",
    about = "Downloads CDN-hosted media referenced by an HTML page and points the page at the local copies",
    long_about = "Selects media elements in an HTML file, downloads every matched src (and optionally poster) URL into a local media directory, then rewrites the HTML in place to reference the downloaded files."
)]
pub struct LocalizeCommand {
    /// Path to the configuration file (TOML, or JSON when it ends in .json)
    #[arg(short, long, default_value = "./config.toml")]
    pub config: PathBuf,
}
