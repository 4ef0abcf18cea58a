//! Integration tests for dso-output.

use std::collections::BTreeMap;
use std::path::Path;

use dso_core::{Bank, BankMap, FieldKind, GeneratedParticle, HitRecord, Vec3};
use tempfile::TempDir;

use crate::backend::OutputBackend;
use crate::channel::OutputChannel;
use crate::config::OutputConfig;
use crate::registry::register_backends;

fn tmp() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

fn banks() -> BankMap {
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

fn electron() -> GeneratedParticle {
    GeneratedParticle::new(11, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 0.0, 1)
}

fn ecal_hit(adc: i32) -> HitRecord {
    let mut hit = HitRecord::new();
    hit.set_one_dgt("adc", adc);
    hit
}

fn header(evn: f64) -> BTreeMap<String, f64> {
    let mut h = BTreeMap::new();
    h.insert("evn".to_owned(), evn);
    h
}

fn conditions() -> BTreeMap<String, String> {
    let mut c = BTreeMap::new();
    c.insert("beam".to_owned(), "e-".to_owned());
    c
}

fn open(kind: &str, path: &Path) -> OutputChannel {
    OutputChannel::open(&OutputConfig::new(kind, path)).expect("open channel")
}

// ── Registry ──────────────────────────────────────────────────────────────────

mod registry {
    use crate::error::OutputError;
    use crate::registry::register_backends;

    #[test]
    fn every_registered_kind_constructs_matching_backend() {
        let registry = register_backends();
        for kind in registry.kinds() {
            let backend = registry.get_backend(kind).unwrap();
            assert_eq!(backend.kind(), kind);
        }
    }

    #[test]
    fn both_shipped_kinds_registered() {
        assert_eq!(register_backends().kinds(), ["structured", "text"]);
    }

    #[test]
    fn unknown_kind_is_descriptible() {
        let err = register_backends().get_backend("csv").unwrap_err();
        match err {
            OutputError::UnknownKind { requested, known } => {
                assert_eq!(requested, "csv");
                assert_eq!(known, "structured, text");
            }
            other => panic!("expected UnknownKind, got {other}"),
        }
    }

    #[test]
    fn each_lookup_returns_fresh_instance() {
        let registry = register_backends();
        // Two lookups must not share event state.
        let _a = registry.get_backend("text").unwrap();
        let _b = registry.get_backend("text").unwrap();
    }
}

// ── Channel ───────────────────────────────────────────────────────────────────

mod channel {
    use super::{open, tmp};
    use crate::channel::{OutputChannel, OutputKind};
    use crate::config::OutputConfig;
    use crate::error::OutputError;

    #[test]
    fn open_resolves_kind_and_path() {
        let dir = tmp();
        let path = dir.path().join("run.txt");
        let channel = open("text", &path);
        assert_eq!(channel.kind(), OutputKind::Text);
        assert_eq!(channel.path(), path);
        assert!(path.exists());
    }

    #[test]
    fn unknown_kind_rejected_before_any_file_is_touched() {
        let dir = tmp();
        let path = dir.path().join("run.out");
        let err = OutputChannel::open(&OutputConfig::new("hipo", &path)).unwrap_err();
        assert!(matches!(err, OutputError::UnknownKind { .. }));
        assert!(!path.exists(), "no file should be created for an unknown kind");
    }

    #[test]
    fn unopenable_path_is_an_io_error() {
        let dir = tmp();
        let path = dir.path().join("no_such_dir").join("run.txt");
        let err = OutputChannel::open(&OutputConfig::new("text", &path)).unwrap_err();
        // A failed open yields no channel at all, so there is nothing to
        // double-close later.
        assert!(matches!(err, OutputError::Io(_)));
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tmp();
        let mut channel = open("text", &dir.path().join("run.txt"));
        channel.close().unwrap();
        channel.close().unwrap();
    }

    #[test]
    fn wrong_stream_variant_is_descriptible() {
        let dir = tmp();
        let mut channel = open("text", &dir.path().join("run.txt"));
        assert!(matches!(channel.structured(), Err(OutputError::Channel(_))));
        assert!(channel.text().is_ok());
    }

    #[test]
    fn closed_channel_refuses_writes() {
        let dir = tmp();
        let mut channel = open("text", &dir.path().join("run.txt"));
        channel.close().unwrap();
        assert!(matches!(channel.text(), Err(OutputError::Channel(_))));
    }
}

// ── Text backend ──────────────────────────────────────────────────────────────

mod text_backend {
    use super::*;

    /// End-to-end scenario: conditions, one event with a header, one
    /// generated electron, and one digitized ecal hit.
    #[test]
    fn one_event_end_to_end() {
        let dir = tmp();
        let path = dir.path().join("run.txt");
        let banks = banks();

        let mut channel = open("text", &path);
        let mut backend = register_backends().get_backend("text").unwrap();

        backend.record_sim_conditions(&mut channel, &conditions()).unwrap();
        backend.write_header(&mut channel, &header(1.0), &banks["header"]).unwrap();
        backend.write_generated(&mut channel, &[electron()], &banks).unwrap();
        backend
            .write_dgt_integrated(&mut channel, &[ecal_hit(105)], "ecal", &banks)
            .unwrap();
        backend.write_event(&mut channel).unwrap();
        channel.close().unwrap();

        let out = std::fs::read_to_string(&path).unwrap();
        assert!(out.contains("run conditions:"), "{out}");
        assert!(out.contains("beam: e-"), "{out}");
        assert!(out.contains("event 1:"), "{out}");
        assert!(out.contains("evn: 1"), "{out}");
        assert!(out.contains("pid: 11"), "{out}");
        assert!(out.contains("pz: 1"), "{out}");
        assert!(out.contains("adc: 105"), "{out}");
        assert!(out.contains("end event 1"), "{out}");
        // Categories never invoked must not appear.
        assert!(!out.contains("ecal.raws"), "{out}");
        assert!(!out.contains("ecal.steps"), "{out}");
    }

    #[test]
    fn header_only_event_is_committed() {
        let dir = tmp();
        let path = dir.path().join("run.txt");
        let banks = banks();

        let mut channel = open("text", &path);
        let mut backend = register_backends().get_backend("text").unwrap();
        backend.write_header(&mut channel, &header(7.0), &banks["header"]).unwrap();
        backend.write_event(&mut channel).unwrap();
        channel.close().unwrap();

        let out = std::fs::read_to_string(&path).unwrap();
        assert!(out.contains("event 1:"), "{out}");
        assert!(out.contains("evn: 7"), "{out}");
        assert!(out.contains("end event 1"), "{out}");
    }

    #[test]
    fn detector_summaries_rendered_with_particles() {
        let dir = tmp();
        let path = dir.path().join("run.txt");
        let banks = banks();

        let mut p = electron();
        p.record_hit("ecal", 2.5, 12.0, 4);

        let mut channel = open("text", &path);
        let mut backend = register_backends().get_backend("text").unwrap();
        backend.write_header(&mut channel, &header(1.0), &banks["header"]).unwrap();
        backend.write_generated(&mut channel, &[p], &banks).unwrap();
        backend.write_event(&mut channel).unwrap();
        channel.close().unwrap();

        let out = std::fs::read_to_string(&path).unwrap();
        assert!(out.contains("psummary:"), "{out}");
        assert!(out.contains("pindex: 1"), "{out}");
        assert!(out.contains("detector: ecal"), "{out}");
        assert!(out.contains("etot: 2.5"), "{out}");
        assert!(out.contains("nphe: 4"), "{out}");
    }

    #[test]
    fn empty_category_writes_no_block() {
        let dir = tmp();
        let path = dir.path().join("run.txt");
        let banks = banks();

        let mut channel = open("text", &path);
        let mut backend = register_backends().get_backend("text").unwrap();
        backend.write_header(&mut channel, &header(1.0), &banks["header"]).unwrap();
        // Hits carry digitized data only; the raw category has nothing.
        backend
            .write_raw_integrated(&mut channel, &[ecal_hit(9)], "ecal", &banks)
            .unwrap();
        backend.write_event(&mut channel).unwrap();
        channel.close().unwrap();

        let out = std::fs::read_to_string(&path).unwrap();
        assert!(!out.contains("ecal.raws"), "{out}");
    }

    #[test]
    fn events_are_numbered_consecutively() {
        let dir = tmp();
        let path = dir.path().join("run.txt");
        let banks = banks();

        let mut channel = open("text", &path);
        let mut backend = register_backends().get_backend("text").unwrap();
        for evn in 1..=3 {
            backend
                .write_header(&mut channel, &header(evn as f64), &banks["header"])
                .unwrap();
            backend.write_event(&mut channel).unwrap();
        }
        channel.close().unwrap();

        let out = std::fs::read_to_string(&path).unwrap();
        for n in 1..=3 {
            assert!(out.contains(&format!("event {n}:")), "{out}");
            assert!(out.contains(&format!("end event {n}")), "{out}");
        }
    }
}

// ── Structured backend ────────────────────────────────────────────────────────

mod structured_backend {
    use super::*;
    use crate::block::BankValue;
    use crate::error::OutputError;
    use crate::stream::StreamRecord;

    fn read_stream(path: &Path) -> Vec<StreamRecord> {
        let file = std::fs::File::open(path).unwrap();
        let mut reader = std::io::BufReader::new(file);
        let mut records = Vec::new();
        loop {
            match bincode::deserialize_from::<_, StreamRecord>(&mut reader) {
                Ok(record) => records.push(record),
                Err(_) => break, // EOF
            }
        }
        records
    }

    #[test]
    fn stream_round_trip_preserves_write_order() {
        let dir = tmp();
        let path = dir.path().join("run.bin");
        let banks = banks();

        let mut channel = open("structured", &path);
        let mut backend = register_backends().get_backend("structured").unwrap();

        backend.record_sim_conditions(&mut channel, &conditions()).unwrap();

        // Event 1: full content.
        backend.write_header(&mut channel, &header(1.0), &banks["header"]).unwrap();
        backend.write_generated(&mut channel, &[electron()], &banks).unwrap();
        backend
            .write_dgt_integrated(&mut channel, &[ecal_hit(105), ecal_hit(17)], "ecal", &banks)
            .unwrap();
        backend.write_event(&mut channel).unwrap();

        // Event 2: header only (a zero-hit event is still a committed event).
        backend.write_header(&mut channel, &header(2.0), &banks["header"]).unwrap();
        backend.write_event(&mut channel).unwrap();

        channel.close().unwrap();

        let records = read_stream(&path);
        assert_eq!(records.len(), 3, "conditions + two events");

        match &records[0] {
            StreamRecord::Conditions(c) => assert_eq!(c["beam"], "e-"),
            other => panic!("expected conditions first, got {other:?}"),
        }

        match &records[1] {
            StreamRecord::Event { blocks } => {
                let names: Vec<_> = blocks.iter().map(|b| b.name.as_str()).collect();
                assert_eq!(names, ["header", "generated", "ecal.dgtz"]);

                let dgtz = &blocks[2];
                assert_eq!(dgtz.fields, ["adc"]);
                assert_eq!(dgtz.rows.len(), 2);
                assert_eq!(dgtz.rows[0][0], BankValue::Int(105));
                assert_eq!(dgtz.rows[1][0], BankValue::Int(17));
            }
            other => panic!("expected event, got {other:?}"),
        }

        match &records[2] {
            StreamRecord::Event { blocks } => {
                assert_eq!(blocks.len(), 1);
                assert_eq!(blocks[0].name, "header");
                assert_eq!(blocks[0].rows[0][0], BankValue::Int(2));
            }
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn nothing_reaches_the_stream_before_commit() {
        let dir = tmp();
        let path = dir.path().join("run.bin");
        let banks = banks();

        let mut channel = open("structured", &path);
        let mut backend = register_backends().get_backend("structured").unwrap();
        backend.write_header(&mut channel, &header(1.0), &banks["header"]).unwrap();
        backend
            .write_dgt_integrated(&mut channel, &[ecal_hit(1)], "ecal", &banks)
            .unwrap();
        channel.close().unwrap(); // commit never happened

        assert!(read_stream(&path).is_empty(), "uncommitted event must not be written");
    }

    #[test]
    fn conditions_after_first_event_rejected() {
        let dir = tmp();
        let banks = banks();

        let mut channel = open("structured", &dir.path().join("run.bin"));
        let mut backend = register_backends().get_backend("structured").unwrap();
        backend.write_header(&mut channel, &header(1.0), &banks["header"]).unwrap();
        backend.write_event(&mut channel).unwrap();

        let err = backend
            .record_sim_conditions(&mut channel, &conditions())
            .unwrap_err();
        assert!(matches!(err, OutputError::Sequence(_)), "got {err}");
    }

    #[test]
    fn generated_summaries_survive_the_round_trip() {
        let dir = tmp();
        let path = dir.path().join("run.bin");
        let banks = banks();

        let mut p = electron();
        p.record_hit("ecal", 1.25, 8.0, 2);

        let mut channel = open("structured", &path);
        let mut backend = register_backends().get_backend("structured").unwrap();
        backend.write_header(&mut channel, &header(1.0), &banks["header"]).unwrap();
        backend.write_generated(&mut channel, &[p], &banks).unwrap();
        backend.write_event(&mut channel).unwrap();
        channel.close().unwrap();

        let records = read_stream(&path);
        let StreamRecord::Event { blocks } = &records[0] else {
            panic!("expected event");
        };
        let summary = blocks.iter().find(|b| b.name == "psummary").unwrap();
        assert_eq!(
            summary.rows[0],
            vec![
                BankValue::Int(1),
                BankValue::Text("ecal".to_owned()),
                BankValue::Int(1),
                BankValue::Double(1.25),
                BankValue::Double(8.0),
                BankValue::Int(2),
            ]
        );
    }
}

// ── Sequencing (both backends) ────────────────────────────────────────────────

mod sequencing {
    use super::*;
    use crate::error::OutputError;

    #[test]
    fn double_write_event_rejected_on_both_backends() {
        for kind in ["text", "structured"] {
            let dir = tmp();
            let banks = banks();
            let mut channel = open(kind, &dir.path().join("run.out"));
            let mut backend = register_backends().get_backend(kind).unwrap();

            backend.write_header(&mut channel, &header(1.0), &banks["header"]).unwrap();
            backend.write_event(&mut channel).unwrap();

            let err = backend.write_event(&mut channel).unwrap_err();
            assert!(matches!(err, OutputError::Sequence(_)), "{kind}: got {err}");
        }
    }

    #[test]
    fn data_write_without_header_rejected() {
        for kind in ["text", "structured"] {
            let dir = tmp();
            let banks = banks();
            let mut channel = open(kind, &dir.path().join("run.out"));
            let mut backend = register_backends().get_backend(kind).unwrap();

            let err = backend
                .write_dgt_integrated(&mut channel, &[ecal_hit(1)], "ecal", &banks)
                .unwrap_err();
            assert!(matches!(err, OutputError::Sequence(_)), "{kind}: got {err}");
        }
    }

    #[test]
    fn second_header_without_commit_rejected() {
        for kind in ["text", "structured"] {
            let dir = tmp();
            let banks = banks();
            let mut channel = open(kind, &dir.path().join("run.out"));
            let mut backend = register_backends().get_backend(kind).unwrap();

            backend.write_header(&mut channel, &header(1.0), &banks["header"]).unwrap();
            let err = backend
                .write_header(&mut channel, &header(2.0), &banks["header"])
                .unwrap_err();
            assert!(matches!(err, OutputError::Sequence(_)), "{kind}: got {err}");
        }
    }

    #[test]
    fn error_does_not_poison_subsequent_events() {
        let dir = tmp();
        let path = dir.path().join("run.txt");
        let banks = banks();
        let mut channel = open("text", &path);
        let mut backend = register_backends().get_backend("text").unwrap();

        backend.write_header(&mut channel, &header(1.0), &banks["header"]).unwrap();
        backend.write_event(&mut channel).unwrap();
        assert!(backend.write_event(&mut channel).is_err());

        // The next event still opens and commits normally.
        backend.write_header(&mut channel, &header(2.0), &banks["header"]).unwrap();
        backend.write_event(&mut channel).unwrap();
        channel.close().unwrap();

        let out = std::fs::read_to_string(&path).unwrap();
        assert!(out.contains("end event 2"), "{out}");
    }
}

// ── Schema checking ───────────────────────────────────────────────────────────

mod schema {
    use super::*;
    use crate::error::OutputError;

    #[test]
    fn unknown_hit_field_names_bank_and_field() {
        let dir = tmp();
        let banks = banks();
        let mut channel = open("text", &dir.path().join("run.txt"));
        let mut backend = register_backends().get_backend("text").unwrap();
        backend.write_header(&mut channel, &header(1.0), &banks["header"]).unwrap();

        let mut hit = HitRecord::new();
        hit.set_one_dgt("bogus", 1);
        let err = backend
            .write_dgt_integrated(&mut channel, &[hit], "ecal", &banks)
            .unwrap_err();
        match err {
            OutputError::SchemaMismatch { bank, field } => {
                assert_eq!(bank, "ecal");
                assert_eq!(field, "bogus");
            }
            other => panic!("expected SchemaMismatch, got {other}"),
        }
    }

    #[test]
    fn unknown_header_field_rejected() {
        let dir = tmp();
        let banks = banks();
        let mut channel = open("text", &dir.path().join("run.txt"));
        let mut backend = register_backends().get_backend("text").unwrap();

        let mut h = header(1.0);
        h.insert("weight".to_owned(), 0.5);
        let err = backend.write_header(&mut channel, &h, &banks["header"]).unwrap_err();
        assert!(matches!(err, OutputError::SchemaMismatch { .. }), "got {err}");
    }

    #[test]
    fn missing_detector_bank_rejected() {
        let dir = tmp();
        let banks = banks();
        let mut channel = open("text", &dir.path().join("run.txt"));
        let mut backend = register_backends().get_backend("text").unwrap();
        backend.write_header(&mut channel, &header(1.0), &banks["header"]).unwrap();

        let err = backend
            .write_dgt_integrated(&mut channel, &[ecal_hit(1)], "dc", &banks)
            .unwrap_err();
        match err {
            OutputError::MissingBank(bank) => assert_eq!(bank, "dc"),
            other => panic!("expected MissingBank, got {other}"),
        }
    }
}

// ── Composition ───────────────────────────────────────────────────────────────

mod composition {
    use super::*;
    use crate::block::BankValue;
    use crate::compose::{self, ScalarCategory};

    #[test]
    fn hit_rows_pad_missing_fields_with_sentinel() {
        let banks = banks();
        let bank = &banks["ecal"];
        let mut full = HitRecord::new();
        full.set_one_dgt("adc", 105);
        full.set_one_dgt("tdc", 4000);
        let sparse = ecal_hit(17); // adc only

        let block = compose::scalar_hits_block(
            &[full, sparse],
            "ecal",
            bank,
            ScalarCategory::Digitized,
        )
        .unwrap();

        assert_eq!(block.fields, ["adc", "tdc"]);
        assert_eq!(block.rows[0], vec![BankValue::Int(105), BankValue::Int(4000)]);
        // tdc absent from the sparse hit: padded with the -99 sentinel.
        assert_eq!(block.rows[1], vec![BankValue::Int(17), BankValue::Int(-99)]);
    }

    #[test]
    fn field_order_follows_bank_schema_not_data() {
        let bank = Bank::new("ecal")
            .with("tdc", FieldKind::Int)
            .with("adc", FieldKind::Int);
        let mut hit = HitRecord::new();
        hit.set_one_dgt("adc", 1);
        hit.set_one_dgt("tdc", 2);

        let block =
            compose::scalar_hits_block(&[hit], "ecal", &bank, ScalarCategory::Digitized).unwrap();
        assert_eq!(block.fields, ["tdc", "adc"]);
    }

    #[test]
    fn step_block_holds_sequences() {
        let bank = Bank::new("ecal").with("edep", FieldKind::Double);
        let mut hit = HitRecord::new();
        let mut steps = BTreeMap::new();
        steps.insert("edep".to_owned(), vec![0.1, 0.2]);
        hit.set_all_raws(steps);

        let block = compose::step_hits_block(&[hit], "ecal", &bank).unwrap();
        assert_eq!(block.name, "ecal.steps");
        assert_eq!(block.rows[0][0], BankValue::DoubleSeq(vec![0.1, 0.2]));
    }

    #[test]
    fn header_block_orders_by_bank_and_skips_absent_fields() {
        let bank = Bank::new("header")
            .with("evn", FieldKind::Int)
            .with("weight", FieldKind::Double);
        let block = compose::header_block(&header(5.0), &bank).unwrap();
        // weight was not supplied: not computed, not zero.
        assert_eq!(block.fields, ["evn"]);
        assert_eq!(block.rows, vec![vec![BankValue::Int(5)]]);
    }

    #[test]
    fn generated_block_resolves_bank_fields_through_variables() {
        let banks = banks();
        let block = compose::generated_block(&[electron()], &banks["generated"]).unwrap();
        assert_eq!(block.rows.len(), 1);
        assert_eq!(block.rows[0][0], BankValue::Int(11)); // pid
        assert_eq!(block.rows[0][3], BankValue::Double(1.0)); // pz
    }

    #[test]
    fn generated_block_rejects_unresolvable_bank_field() {
        let bank = Bank::new("generated").with("charge", FieldKind::Int);
        let err = compose::generated_block(&[electron()], &bank).unwrap_err();
        assert!(matches!(err, crate::error::OutputError::SchemaMismatch { .. }));
    }
}
