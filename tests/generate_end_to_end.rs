//! Full-pipeline tests driving the orchestrator into an in-memory sink.
//!
//! Text shaping needs a real font; tests locate one on the host and return
//! early when none is available (same convention as skipping when ffmpeg is
//! absent).

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use vitrine::assets::acquire::ImageAcquirer;
use vitrine::session::progress::ChannelProgress;
use vitrine::{
    AnimationKind, CancelToken, CatalogItem, Canvas, EncoderCapability, FrameIndex,
    GenerationStatus, Generator, GeneratorOpts, InMemorySink, IntroOutroTexts, VideoConfig,
    VitrineError,
};

struct OnlyX264;

impl EncoderCapability for OnlyX264 {
    fn supports(&self, encoder: &str) -> bool {
        encoder == "libx264"
    }
}

fn find_font() -> Option<PathBuf> {
    const CANDIDATES: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];
    for c in CANDIDATES {
        let p = Path::new(c);
        if p.exists() {
            return Some(p.to_path_buf());
        }
    }
    for root in ["/usr/share/fonts", "/usr/local/share/fonts"] {
        if let Some(found) = find_font_under(Path::new(root)) {
            return Some(found);
        }
    }
    None
}

fn find_font_under(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_font_under(&path) {
                return Some(found);
            }
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("ttf") | Some("otf")
        ) {
            return Some(path);
        }
    }
    None
}

fn write_png(path: &Path, w: u32, h: u32, rgb: [u8; 3]) {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, buf).unwrap();
}

fn catalog_item(id: &str, title: &str, price: f64, discount: Option<f64>) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        title: title.to_string(),
        price,
        discount_percent: discount,
        image: format!("{id}.png"),
        category: "apparel".to_string(),
    }
}

fn texts() -> IntroOutroTexts {
    IntroOutroTexts {
        brand_name: "Maison Vitrine".to_string(),
        intro_subtitle: "New Season".to_string(),
        intro_description: "Hand-picked pieces from this week's drop".to_string(),
        outro_message: "Thanks for watching".to_string(),
        outro_call_to_action: "Visit the store today".to_string(),
    }
}

#[test]
fn generate_three_items_end_to_end() {
    let Some(font) = find_font() else {
        eprintln!("no system font found; skipping");
        return;
    };

    let assets = tempfile::tempdir().unwrap();
    write_png(&assets.path().join("a.png"), 12, 8, [200, 40, 40]);
    write_png(&assets.path().join("b.png"), 8, 12, [40, 200, 40]);
    write_png(&assets.path().join("c.png"), 10, 10, [40, 40, 200]);

    let items = vec![
        catalog_item("a", "Elegant Lace Bodysuit Set", 49.9, None),
        catalog_item("b", "Silk Evening Scarf", 200.0, Some(20.0)),
        catalog_item("c", "Velvet Clutch", 89.0, None),
    ];
    let config = VideoConfig {
        max_items: 3,
        item_hold_secs: 3.0,
        animation: AnimationKind::Fade,
        ..VideoConfig::default()
    };

    let mut opts = GeneratorOpts::new(assets.path(), font);
    // A small canvas keeps the in-memory frame capture cheap.
    opts.canvas = Canvas {
        width: 64,
        height: 64,
    };
    let mut generator = Generator::new(opts)
        .unwrap()
        .with_capability(Box::new(OnlyX264));

    let (progress, rx) = ChannelProgress::new();
    let mut sink = InMemorySink::new();
    let video = generator
        .generate_into(
            &items,
            &config,
            &texts(),
            &progress,
            &CancelToken::new(),
            &mut sink,
        )
        .unwrap();
    drop(progress);

    assert_eq!(video.items.len(), 3);
    assert_eq!(video.mime_type, "video/mp4");
    // 2.5 s intro + 3 x 3 s + 3 s outro.
    assert!((video.duration_secs - 14.5).abs() < 1e-9);
    assert!(video.byte_size > 0);
    assert_eq!(video.byte_size, video.bytes.len());
    assert!(video.id.starts_with("reel-"));

    let session = generator.session();
    assert_eq!(session.status, GenerationStatus::Success);
    assert_eq!(session.percent, 100);

    // Frames arrive in strictly increasing order and cover the timeline.
    let frames = sink.frames();
    assert_eq!(frames.len(), 870);
    for (i, (idx, frame)) in frames.iter().enumerate() {
        assert_eq!(*idx, FrameIndex(i as u64));
        assert_eq!((frame.width, frame.height), (64, 64));
    }

    // Progress is monotonically non-decreasing and ends at 100.
    let percents: Vec<u8> = rx.iter().map(|p| p.percent).collect();
    assert!(!percents.is_empty());
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*percents.last().unwrap(), 100);
}

#[test]
fn acquisition_failure_yields_placeholder_of_fixed_size() {
    let Some(font) = find_font() else {
        eprintln!("no system font found; skipping");
        return;
    };
    let font = Arc::new(std::fs::read(font).unwrap());

    let assets = tempfile::tempdir().unwrap();
    let acquirer =
        ImageAcquirer::new(assets.path(), font, Duration::from_millis(200)).unwrap();

    let missing = catalog_item("ghost", "Phantom Opera Gloves", 59.0, Some(10.0));
    let image = acquirer.acquire(&missing).unwrap();
    assert_eq!((image.width, image.height), (600, 600));

    // The title feeds the synthesis, so differing titles produce differing
    // placeholder pixels.
    let other = catalog_item("ghost2", "X", 59.0, Some(10.0));
    let other_image = acquirer.acquire(&other).unwrap();
    assert_ne!(image.rgba8_premul, other_image.rgba8_premul);
}

#[test]
fn cancelled_run_fails_without_artifact() {
    let Some(font) = find_font() else {
        eprintln!("no system font found; skipping");
        return;
    };

    let assets = tempfile::tempdir().unwrap();
    write_png(&assets.path().join("a.png"), 4, 4, [1, 2, 3]);
    let items = vec![catalog_item("a", "Thing", 5.0, None)];

    let mut opts = GeneratorOpts::new(assets.path(), font);
    opts.canvas = Canvas {
        width: 64,
        height: 64,
    };
    let mut generator = Generator::new(opts)
        .unwrap()
        .with_capability(Box::new(OnlyX264));

    let cancel = CancelToken::new();
    cancel.cancel();
    let mut sink = InMemorySink::new();
    let err = generator
        .generate_into(
            &items,
            &VideoConfig::default(),
            &texts(),
            &vitrine::NullProgress,
            &cancel,
            &mut sink,
        )
        .unwrap_err();
    assert!(matches!(err, VitrineError::Precondition(_)));
    assert_eq!(generator.session().status, GenerationStatus::Error);
    assert!(sink.frames().is_empty());
}
