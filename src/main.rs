use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use yield_image::config::{ModelConfig, PipelineConfig};
use yield_image::results::AspectCheck;
use yield_image::{Error, FilteredCandidate, Images, VerifiedResult};

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let images = match build(&args) {
        Ok(images) => images,
        Err(e) => {
            ::log::error!("Invalid setup: {}", e);
            return ExitCode::FAILURE;
        }
    };

    ::log::info!("Scanning {}", images.config().start_url);
    let start_time = std::time::Instant::now();

    let printed = if args.no_verify {
        match images.generate_candidates().await {
            Ok(candidates) => {
                let landscape: Vec<_> = candidates
                    .into_iter()
                    .filter(|c| c.aspect == AspectCheck::Landscape)
                    .collect();
                emit(&landscape, args.json, print_candidates)
            }
            Err(e) => Err(e.to_string()),
        }
    } else {
        match images.generate().await {
            Ok(results) => emit(&results, args.json, print_results),
            Err(e) => Err(e.to_string()),
        }
    };

    ::log::info!(
        "Finished in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );

    match printed {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ::log::error!("Failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Print as JSON or with the human-readable printer
fn emit<T: Serialize>(items: &[T], json: bool, print: fn(&[T])) -> Result<(), String> {
    if json {
        let out = serde_json::to_string_pretty(items).map_err(|e| e.to_string())?;
        println!("{}", out);
    } else {
        print(items);
    }
    Ok(())
}

/// Combine the config file with command-line overrides
fn build(args: &Args) -> Result<Images, Error> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(mode) = args.mode {
        config.page.render_mode = mode.into();
    }
    if let Some(fetcher) = args.fetcher {
        config.page.fetcher = fetcher.into();
    }
    if args.no_classify {
        config.classifier.model = None;
    } else if args.subject.is_some() || args.model.is_some() {
        let model = config.classifier.model.get_or_insert_with(ModelConfig::default);
        if let Some(name) = &args.model {
            model.model = name.clone();
        }
    }

    let url = args.url.clone().unwrap_or_else(|| config.start_url.clone());
    let mut images = Images::new(&url).with_config(config);

    if let Some(keyword) = &args.keyword {
        images = images.with_keyword(keyword.as_str());
    }
    if let Some(subject) = &args.subject {
        images = images.with_subject(subject.as_str());
    }
    if let Some(limit) = args.limit {
        images = images.with_limit(limit);
    }
    if let Some(concurrency) = args.concurrency {
        images = images.with_max_concurrency(concurrency);
    }

    Ok(images)
}

fn print_results(results: &[VerifiedResult]) {
    println!("\nFound {} matching images:", results.len());
    for (idx, img) in results.iter().enumerate() {
        println!("{}. {}", idx + 1, img.url);
        println!("   size: {}x{}", img.true_width, img.true_height);
        println!("   title: {}\n", img.title);
    }
}

fn print_candidates(candidates: &[FilteredCandidate]) {
    println!("\nFound {} unverified candidates:", candidates.len());
    for (idx, c) in candidates.iter().enumerate() {
        println!("{}. {}", idx + 1, c.url());
        println!(
            "   declared size: {}x{}",
            c.candidate.declared_width, c.candidate.declared_height
        );
        println!("   title: {}\n", c.title());
    }
}
