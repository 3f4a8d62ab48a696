use std::{
    ffi::OsString,
    io::Write,
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use sharpframes::{
    BatchReport, Configuration, DEFAULT_OUTPUT_DIRECTORY, Extractor, FfmpegLogLevel, ImageFormat,
    OutputLayout, ProgressCallback, ProgressEvent, Sampling, SharpFramesError, VideoOutcome,
};

const CLI_AFTER_HELP: &str = "Examples:\n  sharpframes videos/ -o frames --stride 10\n  sharpframes videos/ -r -fb 150 -ex jpg --nested\n  sharpframes clip.mp4 --skip-time 500 --start 2000 --end 8000 --progress\n  sharpframes --completions zsh > _sharpframes\n\nThe multi-letter short flags -fb, -sf, -st and -ex are accepted as\nshorthands for --filter-blur, --stride, --skip-time and --extension.\nPlace INPUT before flags that take an optional value.";

/// Multi-letter short flags and the long flags they stand for.
const MULTI_LETTER_FLAGS: &[(&str, &str)] = &[
    ("-fb", "--filter-blur"),
    ("-sf", "--stride"),
    ("-st", "--skip-time"),
    ("-ex", "--extension"),
];

#[derive(Debug, Parser)]
#[command(
    name = "sharpframes",
    version,
    about = "Extract sharp frames from a directory of videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Video directory, or a single video file.
    #[arg(required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Directory that receives the images.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIRECTORY)]
    output: PathBuf,

    /// Image format to write (png, jpg).
    #[arg(long, default_value = "png", value_parser = parse_image_format)]
    extension: ImageFormat,

    /// Write images to <OUTPUT>/<video name>/ instead of directly into <OUTPUT>.
    #[arg(short, long)]
    nested: bool,

    /// Look for videos in subdirectories too.
    #[arg(short, long)]
    recursive: bool,

    /// Drop frames whose Laplacian variance is below THRESHOLD (100 if no value).
    #[arg(
        long,
        visible_alias = "filter-blur-image",
        value_name = "THRESHOLD",
        num_args = 0..=1,
        default_missing_value = "100"
    )]
    filter_blur: Option<f64>,

    /// Keep every Nth frame (1 if no value).
    #[arg(
        long,
        visible_alias = "skip-frame",
        value_name = "N",
        num_args = 0..=1,
        default_missing_value = "1",
        value_parser = clap::value_parser!(u64).range(1..),
        conflicts_with = "skip_time"
    )]
    stride: Option<u64>,

    /// Keep at most one frame every MS milliseconds (1000 if no value).
    #[arg(
        long,
        value_name = "MS",
        num_args = 0..=1,
        default_missing_value = "1000",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    skip_time: Option<u64>,

    /// Ignore frames before this offset, in milliseconds.
    #[arg(short, long, value_name = "MS")]
    start: Option<u64>,

    /// Stop at this offset, in milliseconds.
    #[arg(short, long, value_name = "MS")]
    end: Option<u64>,

    /// Log every processed video and frame.
    #[arg(short, long)]
    verbose: bool,

    /// Show a progress bar per video.
    #[arg(long)]
    progress: bool,

    /// Print the batch report as JSON.
    #[arg(long)]
    json: bool,

    /// FFmpeg's own log level (quiet, fatal, error, warning, info, verbose, debug).
    #[arg(long, default_value = "error")]
    ffmpeg_log_level: FfmpegLogLevel,

    /// Print a shell completion script and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn parse_image_format(value: &str) -> Result<ImageFormat, String> {
    ImageFormat::from_extension(value).ok_or_else(|| format!("unsupported image format: {value}"))
}

/// Rewrite `-fb`, `-sf`, `-st` and `-ex` (optionally with `=VALUE`) to
/// their long forms. Arguments after `--` are left alone.
fn expand_multi_letter_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(|arg| {
            if passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            let (flag, value) = match text.split_once('=') {
                Some((flag, value)) => (flag, Some(value)),
                None => (text, None),
            };
            match MULTI_LETTER_FLAGS.iter().find(|(short, _)| *short == flag) {
                Some((_, long)) => match value {
                    Some(value) => OsString::from(format!("{long}={value}")),
                    None => OsString::from(*long),
                },
                None => arg,
            }
        })
        .collect()
}

fn build_configuration(cli: &Cli) -> Result<Configuration, SharpFramesError> {
    let input = cli
        .input
        .clone()
        .ok_or_else(|| SharpFramesError::InvalidArgument("missing input path".to_string()))?;

    let sampling = match (cli.stride, cli.skip_time) {
        (Some(_), Some(_)) => {
            return Err(SharpFramesError::InvalidArgument(
                "choose either --stride or --skip-time, not both".to_string(),
            ));
        }
        (_, Some(milliseconds)) => Sampling::EveryInterval(Duration::from_millis(milliseconds)),
        (Some(stride), None) => Sampling::EveryNthFrame(stride),
        (None, None) => Sampling::default(),
    };

    let layout = if cli.nested {
        OutputLayout::Nested
    } else {
        OutputLayout::Flat
    };

    let config = Configuration::new(input)
        .with_output(&cli.output)
        .with_recursive(cli.recursive)
        .with_sampling(sampling)
        .with_start(cli.start.map(Duration::from_millis))
        .with_end(cli.end.map(Duration::from_millis))
        .with_blur_threshold(cli.filter_blur)
        .with_image_format(cli.extension)
        .with_layout(layout)
        .with_verbose(cli.verbose);

    config.validate()?;
    Ok(config)
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| match record.level() {
            log::Level::Error => writeln!(buf, "{} {}", "error:".red().bold(), record.args()),
            log::Level::Warn => writeln!(buf, "{} {}", "warning:".yellow().bold(), record.args()),
            _ => writeln!(buf, "{}", record.args()),
        })
        .init();
}

/// Drives one indicatif bar per video.
#[derive(Default)]
struct TerminalProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        let mut slot = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        match event {
            ProgressEvent::VideoStarted { video, expected } => {
                let bar = match expected {
                    Some(total) => {
                        let bar = ProgressBar::new(*total);
                        if let Ok(style) = ProgressStyle::with_template(
                            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
                        ) {
                            bar.set_style(style.progress_chars("##-"));
                        }
                        bar
                    }
                    None => ProgressBar::new_spinner(),
                };
                let name = video
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                bar.set_message(name);
                *slot = Some(bar);
            }
            ProgressEvent::Frame(_) => {
                if let Some(bar) = slot.as_ref() {
                    bar.inc(1);
                }
            }
            ProgressEvent::VideoFinished { .. } => {
                if let Some(bar) = slot.take() {
                    bar.finish();
                }
            }
        }
    }
}

fn outcome_label(outcome: &VideoOutcome) -> (&'static str, Option<&str>) {
    match outcome {
        VideoOutcome::Completed => ("completed", None),
        VideoOutcome::Truncated(reason) => ("truncated", Some(reason)),
        VideoOutcome::Skipped(reason) => ("skipped", Some(reason)),
        VideoOutcome::WriteFailed(reason) => ("write_failed", Some(reason)),
    }
}

fn print_json(report: &BatchReport, config: &Configuration) -> Result<(), serde_json::Error> {
    let videos: Vec<_> = report
        .videos
        .iter()
        .map(|video| {
            let (outcome, reason) = outcome_label(&video.outcome);
            json!({
                "video": video.video.display().to_string(),
                "sampled": video.sampled,
                "saved": video.saved,
                "blurry": video.blurry,
                "outcome": outcome,
                "reason": reason,
            })
        })
        .collect();

    let payload = json!({
        "output": config.output.display().to_string(),
        "videos": videos,
        "total_saved": report.total_saved(),
        "total_blurry": report.total_blurry(),
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn print_summary(report: &BatchReport, config: &Configuration) {
    if report.videos.is_empty() {
        println!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("no videos found in {}", config.input.display()).yellow()
        );
        return;
    }

    for video in &report.videos {
        let (label, reason) = outcome_label(&video.outcome);
        if let Some(reason) = reason {
            eprintln!(
                "{} {} ({label}: {reason})",
                "warning:".yellow().bold(),
                video.video.display()
            );
        }
    }

    let message = format!(
        "Saved {} image(s) from {} video(s) to {} ({} blurry frame(s) skipped)",
        report.total_saved(),
        report.videos.len(),
        config.output.display(),
        report.total_blurry()
    );
    if report.has_write_failures() {
        println!("{} {}", "partial:".red().bold(), message);
    } else {
        println!("{} {}", "success:".green().bold(), message.green());
    }
}

fn run() -> Result<i32, Box<dyn std::error::Error>> {
    let cli = Cli::parse_from(expand_multi_letter_flags(std::env::args_os()));

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "sharpframes", &mut std::io::stdout());
        return Ok(0);
    }

    let config = build_configuration(&cli)?;
    init_logging(config.verbose);
    sharpframes::set_ffmpeg_log_level(cli.ffmpeg_log_level);

    let mut extractor = Extractor::new(config.clone());
    if cli.progress {
        extractor = extractor.with_progress(Arc::new(TerminalProgress::default()));
    }

    let report = extractor.run()?;
    if cli.json {
        print_json(&report, &config)?;
    } else {
        print_summary(&report, &config);
    }

    Ok(if report.has_write_failures() { 1 } else { 0 })
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}
