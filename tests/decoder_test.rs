//! End-to-end decoder tests: synthesized bit streams and hex-format groups
//! through the full pipeline, checked at the record level.

mod helpers;

use std::sync::Arc;

use fmrds::{EventCatalog, Options, Pipeline, Record, VecSink};
use helpers::group_bits;

const PI: u16 = 0xD3C2;

fn pipeline_with(options: &Options) -> Pipeline {
    Pipeline::new(options, 0, Arc::new(EventCatalog::new()))
}

fn feed_bits(pipeline: &mut Pipeline, bits: &[bool], sink: &mut VecSink) {
    for &bit in bits {
        pipeline.push_bit(bit, sink);
    }
}

fn field<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record.get(key).and_then(|value| value.as_str())
}

#[test]
fn test_ps_name_from_bit_stream() {
    let mut pipeline = pipeline_with(&Options::default());
    let mut sink = VecSink::new();

    let segments = [
        (0x0400u16, 0x4D44u16), // "MD"
        (0x0401, 0x5220),       // "R "
        (0x0402, 0x4A55),       // "JU"
        (0x0403, 0x4D50),       // "MP"
    ];

    // Twice: the first cycle only acquires sync
    for _ in 0..2 {
        for &(block2, block4) in &segments {
            feed_bits(
                &mut pipeline,
                &group_bits(PI, block2, 0xE0E1, block4),
                &mut sink,
            );
        }
    }

    assert!(pipeline.is_in_sync());
    let ps_records: Vec<_> = sink
        .records
        .iter()
        .filter_map(|record| field(record, "ps"))
        .collect();
    assert!(
        ps_records.contains(&"MDR JUMP"),
        "expected PS in {:?}",
        ps_records
    );
}

#[test]
fn test_radiotext_from_hex_groups() {
    let mut pipeline = pipeline_with(&Options::default());
    let mut sink = VecSink::new();

    let message = "Das Leichteste der Welt von Silbermond JETZT AUF MDR JUMP";
    let mut bytes: Vec<u8> = message.bytes().collect();
    bytes.push(0x0D);
    while bytes.len() % 4 != 0 {
        bytes.push(b' ');
    }

    for (segment, chunk) in bytes.chunks(4).enumerate() {
        let block2 = 0x2000 | segment as u16;
        let block3 = ((chunk[0] as u16) << 8) | chunk[1] as u16;
        let block4 = ((chunk[2] as u16) << 8) | chunk[3] as u16;
        pipeline.push_group(
            [Some(PI), Some(block2), Some(block3), Some(block4)],
            &mut sink,
        );
    }

    let last = sink.records.last().unwrap();
    assert_eq!(field(last, "radiotext"), Some(message));
}

#[test]
fn test_oda_announcement_then_radiotext_plus() {
    let mut pipeline = pipeline_with(&Options::default());
    let mut sink = VecSink::new();

    // 3A: register group 12A for RadioText+
    pipeline.push_group(
        [Some(PI), Some(0x3018), Some(0x0000), Some(0x4BD7)],
        &mut sink,
    );
    let announcement = sink.records.last().unwrap();
    let json = announcement.to_json();
    assert!(json.contains(r#""open_data_app":{"oda_group":"12A","app_name":"RadioText+ (RT+)"}"#));

    // Complete a RadioText message so the tags have something to point into
    let message = "Das Leichteste der Welt von Silbermond";
    let mut bytes: Vec<u8> = message.bytes().collect();
    bytes.push(0x0D);
    while bytes.len() % 4 != 0 {
        bytes.push(b' ');
    }
    for (segment, chunk) in bytes.chunks(4).enumerate() {
        let block2 = 0x2000 | segment as u16;
        let block3 = ((chunk[0] as u16) << 8) | chunk[1] as u16;
        let block4 = ((chunk[2] as u16) << 8) | chunk[3] as u16;
        pipeline.push_group(
            [Some(PI), Some(block2), Some(block3), Some(block4)],
            &mut sink,
        );
    }

    // 12A with two tags: item.title "Das Leichteste der Welt" and
    // item.artist "Silbermond"
    let (content1, start1, len1) = (1u16, 0u16, 22u16);
    let (content2, start2, len2) = (4u16, 28u16, 9u16);
    let block2 = 0xC000 | (content1 >> 3);
    let block3 = ((content1 & 0b111) << 13) | (start1 << 7) | (len1 << 1) | (content2 >> 5);
    let block4 = ((content2 & 0b11111) << 11) | (start2 << 5) | len2;

    pipeline.push_group(
        [Some(PI), Some(block2), Some(block3), Some(block4)],
        &mut sink,
    );

    let json = sink.records.last().unwrap().to_json();
    assert!(
        json.contains(r#"{"content-type":"item.title","data":"Das Leichteste der Welt"}"#),
        "{}",
        json
    );
    assert!(
        json.contains(r#"{"content-type":"item.artist","data":"Silbermond"}"#),
        "{}",
        json
    );
}

#[test]
fn test_clock_time_record() {
    let mut pipeline = pipeline_with(&Options::default());
    let mut sink = VecSink::new();

    // MJD 58780 = 2019-10-24; 21:07 UTC at +2 h
    let mjd: u32 = 58780;
    let block2 = 0x4000 | ((mjd >> 15) & 0x3) as u16;
    let block3 = (((mjd & 0x7FFF) << 1) as u16) | (21 >> 4);
    let block4 = ((21u16 & 0xF) << 12) | (7 << 6) | 4;

    pipeline.push_group(
        [Some(PI), Some(block2), Some(block3), Some(block4)],
        &mut sink,
    );

    assert_eq!(
        field(sink.records.last().unwrap(), "clock_time"),
        Some("2019-10-24T23:07:00+02:00")
    );
}

#[test]
fn test_clock_time_is_idempotent() {
    let mut pipeline = pipeline_with(&Options::default());
    let mut sink = VecSink::new();

    let mjd: u32 = 58780;
    let blocks = [
        Some(PI),
        Some(0x4000 | ((mjd >> 15) & 0x3) as u16),
        Some((((mjd & 0x7FFF) << 1) as u16) | 1),
        Some((5u16 << 12) | (7 << 6)),
    ];

    pipeline.push_group(blocks, &mut sink);
    pipeline.push_group(blocks, &mut sink);

    assert_eq!(sink.records.len(), 2);
    assert_eq!(
        sink.records[0].to_json(),
        sink.records[1].to_json(),
        "re-feeding the same 4A group must emit the same record"
    );
}

#[test]
fn test_corrected_group_is_indistinguishable() {
    // Flipping two adjacent bits of block B must not change the record
    let segments = [
        (0x0400u16, 0x4D44u16),
        (0x0401, 0x5220),
        (0x0402, 0x4A55),
        (0x0403, 0x4D50),
    ];

    let run = |corrupt: bool| -> Vec<String> {
        let mut pipeline = pipeline_with(&Options::default());
        let mut sink = VecSink::new();
        for cycle in 0..2 {
            for (i, &(block2, block4)) in segments.iter().enumerate() {
                let mut bits = group_bits(PI, block2, 0xE0E1, block4);
                if corrupt && cycle == 1 && i == 2 {
                    // Bits 3 and 4 of block B, counted from the LSB end
                    bits[26 + (25 - 4)] = !bits[26 + (25 - 4)];
                    bits[26 + (25 - 3)] = !bits[26 + (25 - 3)];
                }
                for bit in bits {
                    pipeline.push_bit(bit, &mut sink);
                }
            }
        }
        sink.records.iter().map(|r| r.to_json()).collect()
    };

    assert_eq!(
        run(false),
        run(true),
        "burst-corrected stream must decode identically"
    );
}

#[test]
fn test_hex_round_trip() {
    let options = Options {
        show_raw: true,
        ..Options::default()
    };
    let mut pipeline = pipeline_with(&options);
    let mut sink = VecSink::new();

    pipeline.push_group(
        [Some(PI), Some(0x0400), Some(0xE0E1), Some(0x4D44)],
        &mut sink,
    );

    assert_eq!(
        field(sink.records.last().unwrap(), "raw_data"),
        Some("D3C2 0400 E0E1 4D44"),
        "hex rendering of a raw group is the identity"
    );
}

#[test]
fn test_tmc_single_group_message_end_to_end() {
    let mut catalog = EventCatalog::new();
    catalog
        .parse_events("108;queuing traffic;queuing traffic for _ km;1;0;1;2;3;1\n")
        .unwrap();

    let mut pipeline = Pipeline::new(&Options::default(), 0, Arc::new(catalog));
    let mut sink = VecSink::new();

    // 3A announcing TMC on 8A, with the system-info message word:
    // LTN 0x04, AFI, national scope
    let system_message = (0x04u16 << 6) | (1 << 5) | 0b0100;
    pipeline.push_group(
        [Some(PI), Some(0x3010), Some(system_message), Some(0xCD46)],
        &mut sink,
    );
    let json = sink.records.last().unwrap().to_json();
    assert!(json.contains(r#""location_table":"0x04""#), "{}", json);

    // 8A single-group user message: event 108, extent 1, location 0x0BEE
    let x = 0b01000 | 3; // F=1, duration 3
    let y = (1u16 << 11) | 108;
    pipeline.push_group(
        [Some(PI), Some(0x8000 | x), Some(y), Some(0x0BEE)],
        &mut sink,
    );

    let json = sink.records.last().unwrap().to_json();
    assert!(json.contains(r#""event_codes":[108]"#), "{}", json);
    assert!(json.contains(r#""location":"0x0BEE""#), "{}", json);
    assert!(json.contains("Queuing traffic"), "{}", json);
}

#[test]
fn test_bler_and_channel_tagging() {
    let options = Options {
        bler: true,
        num_channels: 2,
        ..Options::default()
    };
    let mut pipeline = Pipeline::new(&options, 1, Arc::new(EventCatalog::new()));
    let mut sink = VecSink::new();

    for _ in 0..3 {
        feed_bits(
            &mut pipeline,
            &group_bits(PI, 0x0400, 0xE0E1, 0x4D44),
            &mut sink,
        );
    }

    let last = sink.records.last().unwrap();
    assert_eq!(last.get("channel").and_then(|v| v.as_u64()), Some(1));
    assert!(last.get("bler").is_some());
}

#[test]
fn test_partial_ps_with_show_partial() {
    let options = Options {
        show_partial: true,
        ..Options::default()
    };
    let mut pipeline = pipeline_with(&options);
    let mut sink = VecSink::new();

    pipeline.push_group(
        [Some(PI), Some(0x0400), Some(0xE0E1), Some(0x4D44)],
        &mut sink,
    );

    assert_eq!(
        field(sink.records.last().unwrap(), "partial_ps"),
        Some("MD      "),
        "first segment shows up as a partial PS"
    );
}
