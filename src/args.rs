use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use yield_image::config::{FetcherKind, RenderMode};

#[derive(Parser, Debug)]
#[command(name = "yield-image")]
#[command(about = "Finds landscape images of a subject on an image search results page")]
#[command(version)]
pub struct Args {
    /// Search results page to scan (defaults to the configured start URL)
    pub url: Option<String>,

    /// Only keep images whose title contains this text (case-sensitive)
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Ask the classification model whether each image shows this subject
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Classification model name (enables classification)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Keep at most this many candidates
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// How to interpret the page content
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// How to load the page
    #[arg(long, value_enum)]
    pub fetcher: Option<FetcherArg>,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of images checked at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Skip downloading images; print candidates with their declared size
    #[arg(long)]
    pub no_verify: bool,

    /// Ignore a model set in the config file and accept every landscape image
    ///
    /// Without a config file the model is only asked when --subject or
    /// --model is given.
    #[arg(long, conflicts_with_all = ["subject", "model"])]
    pub no_classify: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Html,
    Markdown,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FetcherArg {
    Webdriver,
    Http,
}

impl From<ModeArg> for RenderMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Html => RenderMode::Html,
            ModeArg::Markdown => RenderMode::Markdown,
        }
    }
}

impl From<FetcherArg> for FetcherKind {
    fn from(arg: FetcherArg) -> Self {
        match arg {
            FetcherArg::Webdriver => FetcherKind::WebDriver,
            FetcherArg::Http => FetcherKind::Http,
        }
    }
}
