//! Run the auto-crop flow on image files and print the reconciled crops.
//!
//! Usage:
//!   cargo run --example auto_crop --features rustface -- <seeta_model.bin> <image>...
//!
//! Set `RUST_LOG=avatarcrop=debug` to see detector and reconciler logs.

use avatarcrop::{Analyzer, AvatarConfig, CaptureSession, Preset, ReadinessTracker, RustfaceDetector};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(model_path) = args.next() else {
        eprintln!("usage: auto_crop <seeta_model.bin> <image>...");
        std::process::exit(2);
    };

    let detector = RustfaceDetector::from_path(&model_path).expect("failed to load model");
    let config = AvatarConfig::default().preset(Preset::Portrait);
    let readiness = ReadinessTracker::ready();
    let analyzer =
        Analyzer::new(&config, Box::new(detector), readiness.subscribe()).expect("invalid config");
    let mut session = CaptureSession::new(analyzer);

    for path in args {
        let input = std::fs::read(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"));
        println!("=== {path} ===");
        match session.handle_file(&input) {
            Ok(result) => {
                let r = result.rectangle;
                println!("  faces: {}", result.face_count);
                println!(
                    "  crop:  ({:.1}, {:.1}) - ({:.1}, {:.1}), {:.0}x{:.0}",
                    r.x1,
                    r.y1,
                    r.x2,
                    r.y2,
                    r.width(),
                    r.height()
                );
                if let Some(notice) = result.notice {
                    println!("  notice: {notice}");
                }
            }
            Err(e) => println!("  failed: {e}"),
        }
        println!();
    }
}
