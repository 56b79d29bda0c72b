//! CLI for mmldoc - MML to HTML converter

use clap::Parser;
use mmldoc::render::render_toc;
use mmldoc::{ArticleIndex, ArticleRef, Language, MmlToHtml, RenderOptions};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input MML file path
    input: PathBuf,

    /// Output HTML file path (optional, prints to stdout if not specified)
    output: Option<PathBuf>,

    /// Language for generated labels (en or ko)
    #[arg(long, default_value = "en")]
    lang: String,

    /// Do not append the bibliography section
    #[arg(long)]
    no_bibliography: bool,

    /// Known article for [[id]] links, as ID=URI or ID=URI=TITLE (repeatable)
    #[arg(long = "article", value_name = "ID=URI[=TITLE]")]
    articles: Vec<String>,

    /// Print the table of contents instead of the document
    #[arg(long)]
    toc: bool,

    /// Log pipeline stages to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_article(value: &str) -> Option<(String, ArticleRef)> {
    let mut parts = value.splitn(3, '=');
    let id = parts.next()?.trim();
    let uri = parts.next()?.trim();
    if id.is_empty() || uri.is_empty() {
        return None;
    }
    let title = parts.next().map(str::trim).unwrap_or(id);
    Some((id.to_string(), ArticleRef::new(title, uri)))
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .with_target(false)
        .init();

    let Some(language) = Language::from_code(&args.lang) else {
        eprintln!("Error: unsupported language '{}'", args.lang);
        std::process::exit(1);
    };

    let mut articles = ArticleIndex::default();
    for value in &args.articles {
        match parse_article(value) {
            Some((id, article)) => articles.insert(id, article),
            None => {
                eprintln!("Error: invalid --article '{}', expected ID=URI[=TITLE]", value);
                std::process::exit(1);
            }
        }
    }

    let options = RenderOptions {
        include_bibliography: !args.no_bibliography,
        articles,
        language,
    };
    let converter = MmlToHtml::new(options);

    let source = match std::fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading input: {}", e);
            std::process::exit(1);
        }
    };

    match converter.convert_str(&source) {
        Ok(rendered) => {
            let output = if args.toc {
                render_toc(&rendered.toc, language.strategy().table_of_contents_title())
            } else {
                rendered.html
            };
            if let Some(path) = args.output {
                if let Err(e) = std::fs::write(&path, &output) {
                    eprintln!("Error writing output: {}", e);
                    std::process::exit(1);
                }
                println!("Successfully converted to {:?}", path);
            } else {
                print!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
