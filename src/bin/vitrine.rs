//! CLI wrapper: load items/config/texts JSON, run one generation, write the
//! artifact to disk.

use std::path::PathBuf;

use clap::Parser;

use vitrine::session::progress::ChannelProgress;
use vitrine::{
    CancelToken, CatalogItem, Generator, GeneratorOpts, IntroOutroTexts, VideoConfig, artifact,
};

#[derive(Parser, Debug)]
#[command(name = "vitrine", about = "Render a catalog slideshow video")]
struct Args {
    /// JSON file holding an array of catalog items.
    #[arg(long)]
    items: PathBuf,

    /// JSON file holding the video configuration.
    #[arg(long)]
    config: PathBuf,

    /// JSON file holding the intro/outro texts.
    #[arg(long)]
    texts: PathBuf,

    /// TrueType/OpenType font used for all rendered text.
    #[arg(long)]
    font: PathBuf,

    /// Directory relative image references resolve against.
    #[arg(long, default_value = ".")]
    assets_root: PathBuf,

    /// Output directory for the finished artifact.
    #[arg(long, default_value = "out")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let items: Vec<CatalogItem> = serde_json::from_slice(&std::fs::read(&args.items)?)?;
    let config: VideoConfig = serde_json::from_slice(&std::fs::read(&args.config)?)?;
    let texts: IntroOutroTexts = serde_json::from_slice(&std::fs::read(&args.texts)?)?;

    let (progress, rx) = ChannelProgress::new();
    let printer = std::thread::spawn(move || {
        for tick in rx {
            eprintln!("[{:>3}%] {}", tick.percent, tick.message);
        }
    });

    let mut generator = Generator::new(GeneratorOpts::new(args.assets_root, args.font))?;
    let video = generator.generate(&items, &config, &texts, &progress, &CancelToken::new())?;
    drop(progress);
    let _ = printer.join();

    let path = artifact::download(&video, &args.out)?;
    println!(
        "{} ({} bytes, {:.1}s) -> {}",
        video.id,
        video.byte_size,
        video.duration_secs,
        path.display()
    );
    Ok(())
}
