use astc_png::config::ConvertOptions;
use astc_png::decoder::DecodeMode;
use astc_png::grid::BLOCK_BYTES;
use astc_png::image::Swizzle;
use astc_png::pipeline::Converter;
use astc_png::{header, transport};
use clap::{ArgAction, Parser, Subcommand};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "astc-png", about = "Convert ASTC texture containers to PNG")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Base-64 container text to a PNG data URI
    Convert {
        /// Input text file (stdin when omitted)
        input: Option<PathBuf>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// JSON options file; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        /// Decode mode: ldr-srgb (default) or ldr
        #[arg(long)]
        mode: Option<String>,
        /// Channel swizzle over r, g, b, a, 0, 1 (e.g. bgra)
        #[arg(long)]
        swizzle: Option<Swizzle>,
        /// Keep rows top-down instead of flipping
        #[arg(long)]
        no_flip: bool,
        /// Also write the PNG to this path
        #[arg(long)]
        debug_png: Option<PathBuf>,
    },
    /// Print the base-64 transport text of a binary container
    Encode {
        input: PathBuf,
    },
    /// Show container header fields
    Info {
        input: PathBuf,
    },
    /// Binary container straight to a PNG file
    Png {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// JSON options file; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        /// Decode mode: ldr-srgb (default) or ldr
        #[arg(long)]
        mode: Option<String>,
        /// Channel swizzle over r, g, b, a, 0, 1 (e.g. bgra)
        #[arg(long)]
        swizzle: Option<Swizzle>,
        /// Z slice of a volume texture (default 0)
        #[arg(long)]
        slice: Option<u32>,
        /// Keep rows top-down instead of flipping
        #[arg(long)]
        no_flip: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(command: Commands) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {

        // ── Convert ──────────────────────────────────────────────────────────
        Commands::Convert { input, output, config, mode, swizzle, no_flip, debug_png } => {
            let mut opts = load_options(config, mode, swizzle, no_flip)?;
            if debug_png.is_some() {
                opts.debug_output = debug_png;
            }

            let text = match input {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let uri = astc_png::pipeline::convert_to_image_with(text.trim(), &opts);
            if uri.is_empty() {
                eprintln!("Conversion failed: input is not a valid base-64 ASTC container");
                return Ok(ExitCode::FAILURE);
            }
            match output {
                Some(path) => std::fs::write(&path, &uri)?,
                None => {
                    let mut out = std::io::stdout().lock();
                    out.write_all(uri.as_bytes())?;
                    out.write_all(b"\n")?;
                }
            }
        }

        // ── Encode ───────────────────────────────────────────────────────────
        Commands::Encode { input } => {
            let data = std::fs::read(&input)?;
            println!("{}", transport::encode(&data));
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let data = std::fs::read(&input)?;
            let parsed = header::parse(&data)?;
            let (b, t, n) = (parsed.block_dims(), parsed.texel_dims(), parsed.block_counts());
            let first = parsed.blocks.get(..BLOCK_BYTES).map(hex::encode).unwrap_or_default();

            println!("── ASTC container ───────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  Block size     {}x{}x{}", b.x, b.y, b.z);
            println!("  Texel size     {}x{}x{}", t.x, t.y, t.z);
            println!("  Block counts   {}x{}x{} ({} blocks)", n.x, n.y, n.z, parsed.grid.block_count());
            println!("  Block data     {} B", parsed.blocks.len());
            println!("  First block    {}", first);
        }

        // ── Png ──────────────────────────────────────────────────────────────
        Commands::Png { input, output, config, mode, swizzle, slice, no_flip } => {
            let mut opts = load_options(config, mode, swizzle, no_flip)?;
            if let Some(z) = slice {
                opts.slice = z;
            }
            let data = std::fs::read(&input)?;
            let png = Converter::new(opts).container_to_png(&data)?;
            std::fs::write(&output, &png)?;
            println!("Wrote: {} ({} B)", output.display(), png.len());
        }
    }

    Ok(ExitCode::SUCCESS)
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn parse_mode(s: &str) -> Result<DecodeMode, String> {
    DecodeMode::from_name(s).ok_or_else(|| format!("Unknown decode mode '{s}', expected ldr-srgb or ldr"))
}

/// Options from `config` (or defaults) with the shared command-line overrides applied.
fn load_options(
    config: Option<PathBuf>,
    mode: Option<String>,
    swizzle: Option<Swizzle>,
    no_flip: bool,
) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let mut opts = match config {
        Some(path) => ConvertOptions::from_json_file(path)?,
        None       => ConvertOptions::default(),
    };
    if let Some(m) = mode {
        opts.decode_mode = parse_mode(&m)?;
    }
    if let Some(s) = swizzle {
        opts.swizzle = s;
    }
    if no_flip {
        opts.flip_y = false;
    }
    Ok(opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_accepts_config_and_swizzle() {
        let cli = Cli::try_parse_from([
            "astc-png", "png", "in.astc", "-o", "out.png", "--config", "opts.json", "--swizzle", "bgra",
        ])
        .unwrap();
        let Commands::Png { config, swizzle, slice, .. } = cli.command else { panic!("expected png") };
        assert_eq!(config, Some(PathBuf::from("opts.json")));
        assert_eq!(swizzle.map(|s| s.to_string()), Some("bgra".to_string()));
        assert_eq!(slice, None);
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"decode-mode": "ldr", "swizzle": "abgr", "slice": 2}}"#).unwrap();

        let opts = load_options(Some(file.path().to_path_buf()), None, None, true).unwrap();
        assert_eq!(opts.decode_mode, DecodeMode::Ldr);
        assert_eq!(opts.swizzle.to_string(), "abgr");
        assert_eq!(opts.slice, 2);
        assert!(!opts.flip_y);

        let rgba: Swizzle = "rgba".parse().unwrap();
        let opts = load_options(Some(file.path().to_path_buf()), Some("ldr-srgb".into()), Some(rgba), false).unwrap();
        assert_eq!(opts.decode_mode, DecodeMode::LdrSrgb);
        assert!(opts.swizzle.is_identity());
    }
}
