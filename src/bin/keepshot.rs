use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use keepshot::{
    CommandBackend, ExtractOptions, FfmpegPaths, FrameExtractor, FrameRenderer, ImageFormat,
    MediaProber, ProgressCallback, ProgressInfo, ScratchSpace, ThreeFieldMode, UploadedVideo,
    command::FFMPEG_DIR_ENV, storage, timestamp,
};

#[cfg(feature = "native")]
use keepshot::NativeBackend;

const CLI_AFTER_HELP: &str = "Examples:\n  keepshot extract input.mp4 -t 00:10 -t 00:05 -t 01:40 --out shots\n  keepshot extract input.mp4 -t 01:02:15 --out shots --format png --json\n  keepshot resolve 01:02:15 --duration 90 --fps 25\n  keepshot probe input.mp4 --json\n  keepshot sweep shots --max-age 3600\n  keepshot completions zsh > _keepshot";

#[derive(Debug, Parser)]
#[command(
    name = "keepshot",
    version,
    about = "Extract still frames from a video at the timestamps you choose",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long, global = true)]
    progress: bool,

    /// Decoding backend.
    #[arg(long, value_enum, global = true, default_value_t = Backend::default())]
    backend: Backend,

    /// Directory holding the ffmpeg and ffprobe executables (command backend).
    #[arg(long, global = true, env = FFMPEG_DIR_ENV)]
    ffmpeg_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Linked FFmpeg libraries.
    Native,
    /// ffmpeg / ffprobe child processes.
    Command,
}

impl Default for Backend {
    fn default() -> Self {
        if cfg!(feature = "native") {
            Backend::Native
        } else {
            Backend::Command
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract one still per timestamp.
    #[command(
        about = "Extract still frames",
        after_help = "Examples:\n  keepshot extract input.mp4 -t 00:10 -t 00:05 --out shots\n  keepshot extract input.mp4 -t 00:01:02:15 --out shots --format png"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,
        /// Timestamp (SS, MM:SS, MM:SS:FF or HH:MM:SS, HH:MM:SS:FF). Repeatable.
        #[arg(short = 't', long = "time", required = true)]
        times: Vec<String>,
        /// Output directory for the stills.
        #[arg(long)]
        out: PathBuf,
        /// Output image format (jpg, png).
        #[arg(long, default_value = "jpg")]
        format: String,
        /// Filename prefix for the stills.
        #[arg(long)]
        prefix: Option<String>,
        /// How to read A:B:C timestamps (auto, hms, msf).
        #[arg(long, default_value = "auto")]
        three_field: String,
        /// Print each still as a URL under this base instead of a path.
        #[arg(long)]
        base_url: Option<String>,
        /// Output results as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show how a timestamp resolves against a given duration.
    #[command(
        about = "Resolve a timestamp",
        after_help = "Examples:\n  keepshot resolve 01:02:15 --duration 90\n  keepshot resolve 01:02:15 --duration 7200"
    )]
    Resolve {
        /// Raw timestamp.
        timestamp: String,
        /// Media duration in seconds.
        #[arg(long)]
        duration: f64,
        /// Media frame rate.
        #[arg(long, default_value_t = timestamp::DEFAULT_FRAME_RATE)]
        fps: f64,
        /// How to read A:B:C timestamps (auto, hms, msf).
        #[arg(long, default_value = "auto")]
        three_field: String,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print duration and frame rate of a video.
    #[command(about = "Probe a video", visible_alias = "info")]
    Probe {
        /// Input video path.
        input: PathBuf,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete old files from scratch directories.
    #[command(about = "Delete stale stills and uploads")]
    Sweep {
        /// Directories to sweep.
        #[arg(required = true)]
        directories: Vec<PathBuf>,
        /// Maximum file age in seconds.
        #[arg(long, default_value_t = 3600)]
        max_age: u64,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn parse_three_field_mode(value: &str) -> Option<ThreeFieldMode> {
    match value.to_ascii_lowercase().as_str() {
        "auto" | "duration" => Some(ThreeFieldMode::ByDuration),
        "hms" | "hh:mm:ss" => Some(ThreeFieldMode::HoursMinutesSeconds),
        "msf" | "mm:ss:ff" => Some(ThreeFieldMode::MinutesSecondsFrames),
        _ => None,
    }
}

fn ffmpeg_paths(global: &GlobalOptions) -> FfmpegPaths {
    match &global.ffmpeg_dir {
        Some(directory) => FfmpegPaths::in_directory(directory),
        None => FfmpegPaths::from_path(),
    }
}

type Backends = (Arc<dyn MediaProber>, Arc<dyn FrameRenderer>);

fn backends(global: &GlobalOptions) -> Result<Backends, Box<dyn std::error::Error>> {
    match global.backend {
        #[cfg(feature = "native")]
        Backend::Native => {
            let native = Arc::new(NativeBackend::new());
            let prober: Arc<dyn MediaProber> = native.clone();
            let renderer: Arc<dyn FrameRenderer> = native;
            Ok((prober, renderer))
        }
        #[cfg(not(feature = "native"))]
        Backend::Native => Err("--backend native requires building with the `native` feature".into()),
        Backend::Command => {
            let command = Arc::new(CommandBackend::new(ffmpeg_paths(global)));
            let prober: Arc<dyn MediaProber> = command.clone();
            let renderer: Arc<dyn FrameRenderer> = command;
            Ok((prober, renderer))
        }
    }
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(total: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current as u64);
        self.bar.set_message(format!("{:.3}s", info.offset.as_secs_f64()));
    }
}

struct VerboseProgress;

impl ProgressCallback for VerboseProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        eprintln!(
            "{} {}/{} {:.3}s -> {}",
            "saved".cyan().bold(),
            info.current,
            info.total,
            info.offset.as_secs_f64(),
            info.output.display()
        );
    }
}

fn read_video(input: &Path) -> Result<UploadedVideo, Box<dyn std::error::Error>> {
    let bytes = fs::read(input).map_err(|error| format!("cannot read {}: {error}", input.display()))?;
    let file_name = input.file_name().and_then(|name| name.to_str());
    Ok(UploadedVideo::new(bytes, file_name))
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            times,
            out,
            format,
            prefix,
            three_field,
            base_url,
            json,
        } => {
            let image_format =
                ImageFormat::from_name(&format).ok_or(format!("unsupported --format: {format}"))?;
            let mode = parse_three_field_mode(&three_field)
                .ok_or(format!("unsupported --three-field: {three_field}"))?;

            let mut options = ExtractOptions::new()
                .with_image_format(image_format)
                .with_three_field_mode(mode);
            if let Some(prefix) = &prefix {
                options = options.with_file_prefix(prefix);
            }

            let total = times.iter().filter(|raw| !timestamp::is_blank(raw)).count();
            let terminal_progress = if cli.global.progress {
                let progress = Arc::new(TerminalProgress::new(total as u64)?);
                options = options.with_progress(progress.clone());
                Some(progress)
            } else {
                if cli.global.verbose {
                    options = options.with_progress(Arc::new(VerboseProgress));
                }
                None
            };

            let scratch = ScratchSpace::new(std::env::temp_dir().join("keepshot"), &out);
            let (prober, renderer) = backends(&cli.global)?;
            let extractor =
                FrameExtractor::with_scratch(prober, renderer, scratch).with_options(options);

            let video = read_video(&input)?;
            let stills = extractor.extract_many(&video, &times)?;

            if let Some(progress) = terminal_progress {
                progress.bar.finish_with_message("done");
            }

            if stills.is_empty() {
                return Err("no valid times were provided".into());
            }

            let reference = |still: &keepshot::ExtractionResult| match &base_url {
                Some(base) => still.url(base),
                None => still.path.display().to_string(),
            };

            if json {
                let payload: Vec<_> = stills
                    .iter()
                    .map(|still| {
                        json!({
                            "index": still.index,
                            "input": still.input,
                            "requested_seconds": still.requested.as_secs_f64(),
                            "offset_seconds": still.offset.as_secs_f64(),
                            "clamped": still.was_clamped(),
                            "image": reference(still),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for still in &stills {
                    let note = if still.was_clamped() {
                        " (clamped)".yellow().to_string()
                    } else {
                        String::new()
                    };
                    println!(
                        "{} {} @ {:.3}s{note} -> {}",
                        "saved".green().bold(),
                        still.input,
                        still.offset.as_secs_f64(),
                        reference(still)
                    );
                }
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!("Extracted {} still(s) to {}", stills.len(), out.display()).green()
                );
            }
        }
        Commands::Resolve {
            timestamp: raw,
            duration,
            fps,
            three_field,
            json,
        } => {
            let mode = parse_three_field_mode(&three_field)
                .ok_or(format!("unsupported --three-field: {three_field}"))?;
            if !duration.is_finite() || duration < 0.0 {
                return Err(format!("invalid --duration: {duration}").into());
            }
            let media_duration = Duration::from_secs_f64(duration);

            let resolved = timestamp::resolve_clamped_with(&raw, fps, media_duration, mode)?;
            if json {
                let payload = json!({
                    "input": raw,
                    "frame_rate": timestamp::effective_frame_rate(fps),
                    "requested_seconds": resolved.requested.as_secs_f64(),
                    "offset_seconds": resolved.offset.as_secs_f64(),
                    "clamped": resolved.was_clamped(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Requested: {:.3}s", resolved.requested.as_secs_f64());
                println!("Offset:    {:.3}s", resolved.offset.as_secs_f64());
                if resolved.was_clamped() {
                    println!("{}", "clamped to the last safe frame".yellow());
                }
            }
        }
        Commands::Probe { input, json } => {
            let (prober, _) = backends(&cli.global)?;
            let probe = prober.probe(&input)?;
            if json {
                let payload = json!({
                    "duration_seconds": probe.duration.as_secs_f64(),
                    "frame_rate": probe.frame_rate,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Duration:   {:.3}s", probe.duration.as_secs_f64());
                println!("Frame rate: {:.3} fps", probe.frame_rate);
            }
        }
        Commands::Sweep {
            directories,
            max_age,
        } => {
            let max_age = Duration::from_secs(max_age);
            for directory in &directories {
                let removed = storage::sweep_older_than(directory, max_age);
                if cli.global.verbose || removed > 0 {
                    println!(
                        "{} {removed} file(s) from {}",
                        "swept".green().bold(),
                        directory.display()
                    );
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "keepshot", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, parse_three_field_mode};
    use clap::CommandFactory;
    use keepshot::ThreeFieldMode;

    #[test]
    fn parse_three_field_mode_aliases() {
        assert_eq!(parse_three_field_mode("auto"), Some(ThreeFieldMode::ByDuration));
        assert_eq!(
            parse_three_field_mode("HMS"),
            Some(ThreeFieldMode::HoursMinutesSeconds)
        );
        assert_eq!(
            parse_three_field_mode("mm:ss:ff"),
            Some(ThreeFieldMode::MinutesSecondsFrames)
        );
        assert!(parse_three_field_mode("frames").is_none());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
