use std::path::PathBuf;

use anyhow::Result as R;
use clap::Parser;
use wavcodex_lib::*;

/// Re-encode a WAV file as a canonical 16-bit PCM or 32-bit float WAV.
#[derive(Parser, Debug)]
#[command(name = "wavcodex")]
#[command(about = "Re-encode audio into a canonical 44-byte-header WAV")]
struct Args {
    /// Input WAV file
    input: PathBuf,

    /// Output path (default: converted-audio.wav in the current directory)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Write 32-bit IEEE float samples instead of 16-bit PCM
    #[arg(long)]
    float: bool,

    /// Resample to this rate before encoding
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Debug logging (overrides RUST_LOG)
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> R<()> {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let start_time = std::time::Instant::now();

    let options = ConvertOptions {
        encode: EncodeOptions {
            use_float_samples: args.float,
        },
        target_sample_rate: args.sample_rate,
        ..Default::default()
    };

    let converted = convert_file(&args.input, &options)?;
    let output = args
        .output
        .unwrap_or_else(|| converted.default_path(std::path::Path::new(".")));
    converted.write_to_path(&output)?;

    let header = converted.header()?;
    println!("File: {} ({})", output.display(), converted.mime_type);
    println!("Duration: {}", converted.duration);
    println!(
        "Format: {} Hz, {} channel(s), {}-bit {}",
        header.sample_rate(),
        header.channels(),
        header.format().bits_per_sample(),
        match header.format() {
            SampleFormat::I16 => "PCM",
            SampleFormat::F32 => "float",
        }
    );
    println!("Size: {} bytes", converted.bytes.len());
    println!(
        "Finished in {} seconds",
        start_time.elapsed().as_secs_f32()
    );

    Ok(())
}
