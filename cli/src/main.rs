//! unabbyy CLI - ABBYY FineReader XML conversion tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use unabbyy::{
    render, AbbyyParser, DetectorOptions, FlatDocument, JsonFormat, PageTypeIndex, ParseOptions,
    Placement, RenderOptions, RunningElements,
};

#[derive(Parser)]
#[command(name = "unabbyy")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Flatten ABBYY FineReader XML to Markdown, text, and JSON", long_about = None)]
struct Cli {
    /// Force debug logging (otherwise RUST_LOG decides)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Input documents shared by every command.
#[derive(Args)]
struct Inputs {
    /// ABBYY XML file (plain or gzip)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Metadata document
    #[arg(long, value_name = "FILE")]
    meta: Option<PathBuf>,

    /// Scan description with page types
    #[arg(long, value_name = "FILE")]
    scandata: Option<PathBuf>,

    /// Keep the first picture of the book
    #[arg(long)]
    keep_cover: bool,
}

/// Running-element detector thresholds.
#[derive(Args)]
struct Detection {
    /// Keep running headers, footers and page numbers
    #[arg(long)]
    keep_running: bool,

    /// Average similarity a repeating pattern must exceed (0-100)
    #[arg(long, default_value = "50")]
    present_threshold: f64,

    /// Similarity at which a single line is suppressed (0-100)
    #[arg(long, default_value = "80")]
    match_threshold: u8,
}

impl Detection {
    fn options(&self) -> DetectorOptions {
        DetectorOptions::new()
            .with_present_threshold(self.present_threshold)
            .with_match_threshold(self.match_threshold)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert to Markdown
    #[command(alias = "md")]
    Markdown {
        #[command(flatten)]
        inputs: Inputs,

        #[command(flatten)]
        detection: Detection,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Include YAML frontmatter
        #[arg(short, long)]
        frontmatter: bool,

        /// Mark page ends with HTML comments
        #[arg(long)]
        page_markers: bool,

        /// Maximum heading level (1-6)
        #[arg(long, default_value = "6")]
        max_heading: u8,
    },

    /// Convert to plain text
    Text {
        #[command(flatten)]
        inputs: Inputs,

        #[command(flatten)]
        detection: Detection,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Convert to JSON
    Json {
        #[command(flatten)]
        inputs: Inputs,

        #[command(flatten)]
        detection: Detection,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show document information
    Info {
        #[command(flatten)]
        inputs: Inputs,

        #[command(flatten)]
        detection: Detection,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let result = match cli.command {
        Commands::Markdown {
            inputs,
            detection,
            output,
            frontmatter,
            page_markers,
            max_heading,
        } => {
            let options = RenderOptions::new()
                .with_frontmatter(frontmatter)
                .with_page_markers(page_markers)
                .with_max_heading(max_heading)
                .with_running_elements(!detection.keep_running);
            cmd_markdown(&inputs, &detection, output.as_deref(), &options)
        }
        Commands::Text {
            inputs,
            detection,
            output,
        } => cmd_text(&inputs, &detection, output.as_deref()),
        Commands::Json {
            inputs,
            detection,
            output,
            compact,
        } => cmd_json(&inputs, &detection, output.as_deref(), compact),
        Commands::Info { inputs, detection } => cmd_info(&inputs, &detection),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn parse_options(inputs: &Inputs) -> Result<ParseOptions, Box<dyn std::error::Error>> {
    let mut options = ParseOptions::new();
    if let Some(meta) = &inputs.meta {
        options = options.with_metadata_file(meta);
    }
    if let Some(scandata) = &inputs.scandata {
        options = options.with_page_types(PageTypeIndex::from_scandata_path(scandata)?);
    }
    if inputs.keep_cover {
        options = options.keep_cover_picture();
    }
    Ok(options)
}

/// Parse and run the detector behind a spinner.
fn load(
    inputs: &Inputs,
    detection: &Detection,
) -> Result<(FlatDocument, RunningElements), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message(format!("Parsing {}...", inputs.input.display()));
    let parser = AbbyyParser::open_with_options(&inputs.input, parse_options(inputs)?)?;
    let mut doc = match parser.parse() {
        Ok(doc) => doc,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };

    pb.set_message("Detecting running headers and footers...");
    let running = unabbyy::find_running_elements(&mut doc, detection.options());

    pb.finish_and_clear();
    Ok((doc, running))
}

fn write_output(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        eprintln!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_markdown(
    inputs: &Inputs,
    detection: &Detection,
    output: Option<&Path>,
    options: &RenderOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let (doc, running) = load(inputs, detection)?;
    let markdown = render::to_markdown(&doc, Some(&running), options)?;
    write_output(output, &markdown)
}

fn cmd_text(
    inputs: &Inputs,
    detection: &Detection,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (doc, running) = load(inputs, detection)?;
    let options = RenderOptions::new().with_running_elements(!detection.keep_running);
    let text = render::to_text(&doc, Some(&running), &options)?;
    write_output(output, &text)
}

fn cmd_json(
    inputs: &Inputs,
    detection: &Detection,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (doc, running) = load(inputs, detection)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = render::to_json_with_findings(&doc, &running, format)?;
    write_output(output, &json)
}

fn cmd_info(inputs: &Inputs, detection: &Detection) -> Result<(), Box<dyn std::error::Error>> {
    let (doc, running) = load(inputs, detection)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), inputs.input.display());
    println!("{}: {}", "Schema".bold(), doc.schema);
    println!("{}: {}", "Pages".bold(), doc.page_count);
    println!("{}: {}", "Paragraph styles".bold(), doc.style_count);
    println!("{}: {}", "Pictures".bold(), doc.pictures_by_page.len());

    if !doc.metadata.is_empty() {
        println!();
        println!("{}", "Metadata".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        for (key, values) in doc.metadata.iter() {
            println!("{}: {}", key.bold(), values.join("; "));
        }
    }

    println!();
    println!("{}", "Blocks".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (kind, count) in doc.block_stats() {
        println!("{}: {}", kind.bold(), count);
    }
    let text = doc.plain_text();
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());

    println!();
    println!("{}", "Running Elements".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (label, placement) in [("Header", Placement::First), ("Footer", Placement::Last)] {
        let findings = running.findings(placement);
        let mut found = Vec::new();
        if findings.arabic_confirmed {
            found.push("page numbers".to_string());
        }
        if findings.roman_confirmed {
            found.push("roman page numbers".to_string());
        }
        if findings.pattern != unabbyy::analyze::RepeatPattern::Absent {
            found.push(format!("{:?} repetition", findings.pattern).to_lowercase());
        }
        let summary = if found.is_empty() {
            "none".dimmed().to_string()
        } else {
            found.join(", ").green().to_string()
        };
        println!("{}: {}", label.bold(), summary);
    }
    let suppressed = doc
        .text_blocks()
        .filter(|t| t.suppressed)
        .count();
    println!("{}: {}", "Suppressed lines".bold(), suppressed);

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "unabbyy".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("ABBYY FineReader XML conversion tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/unabbyy".dimmed());
    println!("License: MIT");
}
