//! minimal — smallest end-to-end run of the rust_dso output layer.
//!
//! Writes the same two simulated events through both backends: a text file
//! for eyes and a structured binary stream for downstream analysis, then
//! reads the binary stream back to show the committed record count.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

use dso_core::{Bank, BankMap, FieldKind, GeneratedParticle, HitRecord, Vec3};
use dso_output::{OutputBackend, OutputChannel, OutputConfig, StreamRecord, register_backends};

// ── Constants ─────────────────────────────────────────────────────────────────

const OUTPUT_DIR: &str = "output/minimal";
const EVENTS:     u64  = 2;

// ── Event fixtures ────────────────────────────────────────────────────────────

fn build_banks() -> BankMap {
    let mut banks = BankMap::new();
    banks.insert("header".to_owned(), Bank::new("header").with("evn", FieldKind::Int));
    banks.insert(
        "generated".to_owned(),
        Bank::new("generated")
            .with("pid", FieldKind::Int)
            .with("px", FieldKind::Double)
            .with("py", FieldKind::Double)
            .with("pz", FieldKind::Double)
            .with("vx", FieldKind::Double)
            .with("vy", FieldKind::Double)
            .with("vz", FieldKind::Double)
            .with("time", FieldKind::Double)
            .with("multiplicity", FieldKind::Int),
    );
    banks.insert(
        "ecal".to_owned(),
        Bank::new("ecal")
            .with("adc", FieldKind::Int)
            .with("tdc", FieldKind::Int)
            .with("edep", FieldKind::Double),
    );
    banks
}

/// One 2-GeV electron that fired the calorimeter twice.
fn build_particles() -> Vec<GeneratedParticle> {
    let mut electron =
        GeneratedParticle::new(11, Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), 0.0, 1);
    electron.record_hit("ecal", 1.8, 6.2, 11);
    electron.record_hit("ecal", 0.2, 9.5, 2);

    let photon =
        GeneratedParticle::new(22, Vec3::new(0.0, 0.1, 0.0), Vec3::new(0.0, 0.0, 1.0), 0.0, 1);

    vec![electron, photon]
}

fn build_hits(event: u64) -> Vec<HitRecord> {
    let mut front = HitRecord::new();
    front.set_one_dgt("adc", 105 + event as i32);
    front.set_one_dgt("tdc", 4_012);
    front.set_one_raw("edep", 1.8);

    let mut back = HitRecord::new();
    back.set_one_dgt("adc", 17);
    back.set_one_raw("edep", 0.2);

    vec![front, back]
}

// ── Run one backend over all events ───────────────────────────────────────────

fn run_backend(config: &OutputConfig, banks: &BankMap) -> Result<()> {
    let mut channel = OutputChannel::open(config)?;
    let mut backend = register_backends().get_backend(&config.kind)?;

    let mut conditions = BTreeMap::new();
    conditions.insert("beam".to_owned(), "e-".to_owned());
    conditions.insert("energy".to_owned(), "2.0 GeV".to_owned());
    backend.record_sim_conditions(&mut channel, &conditions)?;

    for event in 1..=EVENTS {
        let mut header = BTreeMap::new();
        header.insert("evn".to_owned(), event as f64);
        backend.write_header(&mut channel, &header, &banks["header"])?;
        backend.write_generated(&mut channel, &build_particles(), banks)?;

        let hits = build_hits(event);
        let flags = config.flags("ecal");
        if flags.raw {
            backend.write_raw_integrated(&mut channel, &hits, "ecal", banks)?;
        }
        if flags.steps {
            backend.write_raw_steps(&mut channel, &hits, "ecal", banks)?;
        }
        if flags.digitized {
            backend.write_dgt_integrated(&mut channel, &hits, "ecal", banks)?;
        }

        backend.write_event(&mut channel)?;
    }

    channel.close()?;
    Ok(())
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    println!("=== minimal — rust_dso event output ===");
    println!("Events: {EVENTS}  |  Detectors: ecal");
    println!();

    // 1. Bank schemas (normally supplied by detector configuration).
    let banks = build_banks();
    println!("Banks: {}", banks.keys().cloned().collect::<Vec<_>>().join(", "));

    // 2. Output destinations.
    std::fs::create_dir_all(OUTPUT_DIR)?;
    let text_config = OutputConfig::new("text", Path::new(OUTPUT_DIR).join("run.txt"));
    let mut structured_config =
        OutputConfig::new("structured", Path::new(OUTPUT_DIR).join("run.bin"));
    // The binary stream also carries the integrated true information.
    structured_config
        .detectors
        .insert("ecal".to_owned(), dso_output::DetectorFlags {
            raw:       true,
            steps:     false,
            digitized: true,
        });

    // 3. Same events through both backends.
    run_backend(&text_config, &banks)?;
    run_backend(&structured_config, &banks)?;

    // 4. Read the structured stream back.
    let bin = std::fs::File::open(&structured_config.path)?;
    let mut reader = std::io::BufReader::new(bin);
    let mut conditions_records = 0u64;
    let mut event_records = 0u64;
    while let Ok(record) = bincode::deserialize_from::<_, StreamRecord>(&mut reader) {
        match record {
            StreamRecord::Conditions(_) => conditions_records += 1,
            StreamRecord::Event { .. }  => event_records += 1,
        }
    }

    // 5. Summary.
    println!();
    println!("{:<12} {:<28} {:<10}", "Backend", "File", "Records");
    println!("{}", "-".repeat(52));
    println!(
        "{:<12} {:<28} {:<10}",
        "text",
        text_config.path.display(),
        std::fs::read_to_string(&text_config.path)?.lines().count(),
    );
    println!(
        "{:<12} {:<28} {:<10}",
        "structured",
        structured_config.path.display(),
        format!("{conditions_records} conditions + {event_records} events"),
    );

    Ok(())
}
