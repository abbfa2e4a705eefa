//! Headless runner: loads every bundled scene, runs it, prints tank ratios and
//! verifies determinism.
//!
//! Run with: `cargo run --package gas-sorter-headless --example headless_runner`
//! Set `RUST_LOG=gas_sorter_core=debug` to see per-transfer logs.

use std::path::Path;

use gas_sorter_core::fixed::fixed64_to_f64;
use gas_sorter_core::host::Channel;
use gas_sorter_headless::scene_builder::build_scene;
use gas_sorter_headless::scene_manager::SceneManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let scenes_dir = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/scenes"));
    let mgr = SceneManager::new(scenes_dir).expect("failed to load manifest");

    println!("=== {} ===\n{}\n", mgr.title(), mgr.description());

    for entry in mgr.scenes() {
        println!("--- {} ({} ticks) ---", entry.title, entry.ticks);
        println!("    {}", entry.summary);

        let scene_dir = scenes_dir.join(&entry.path);

        // Run 1
        let mut scene1 = build_scene(&scene_dir).unwrap_or_else(|e| {
            panic!("failed to build scene '{}': {e}", entry.id);
        });
        let mut scans = 0;
        let mut transfers = 0;
        for _ in 0..entry.ticks {
            if let Some(report) = scene1.step() {
                scans += 1;
                transfers += report.transfers;
            }
        }
        let hash1 = scene1.state_hash();
        println!("    {scans} scans, {transfers} transfers, state hash = {hash1:#018x}");

        let mut names: Vec<_> = scene1.block_names.keys().collect();
        names.sort();
        for name in names {
            if let Ok(ratio) = scene1.tank_ratio(name) {
                println!("      [{name:>12}] ratio={:.6}", fixed64_to_f64(ratio));
            }
        }
        for line in scene1.messages.on(Channel::Debug) {
            println!("      {}: {line}", Channel::Debug.prefix());
        }

        // Run 2: determinism check
        let mut scene2 = build_scene(&scene_dir).unwrap_or_else(|e| {
            panic!("failed to build scene '{}' (run 2): {e}", entry.id);
        });
        for _ in 0..entry.ticks {
            scene2.step();
        }
        let hash2 = scene2.state_hash();

        if hash1 == hash2 {
            println!("    Determinism: PASS (hashes match)");
        } else {
            println!("    Determinism: FAIL! hash1={hash1:#018x} != hash2={hash2:#018x}");
            std::process::exit(1);
        }

        println!();
    }

    println!("All {} scenes passed.", mgr.scenes().len());
}
