//! Traffic Message Channel (ALERT-C, ISO 14819-1) decoding.
//!
//! TMC rides on ODA group 8A. A 3A system group announces the service and
//! its location table; user groups then carry either administration data,
//! tuning information, or the traffic messages themselves. Single-group
//! messages fit in one group; multi-group messages are spread over up to
//! five groups tied together by a continuity index and must be reassembled
//! here before they can be read.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Error, Result};
use crate::options::Options;
use crate::output::Record;
use crate::rdsstring::{RdsChar, RdsString};
use crate::util::{bits, prefixed_hex_string};

/// Quantifier type 0: small numbers 1..28, then even numbers to 56.
const Q_SMALL_NUMBER: u16 = 0;

/// One event-code row of the external event catalog.
#[derive(Clone, Debug, Default)]
pub struct Event {
    pub description: String,
    pub description_with_quantifier: String,
    pub nature: u16,
    pub quantifier_type: u16,
    pub duration_type: u16,
    pub directionality: u16,
    pub urgency: u16,
    pub update_class: u16,
    pub allows_quantifier: bool,
}

/// The static event and supplementary-information catalogs, keyed by their
/// 11-bit and 8-bit codes.
///
/// The catalog contents are data, not code: they are loaded from
/// `;`-separated tables at startup. An empty catalog is fine; messages then
/// carry raw event codes without descriptions.
#[derive(Default)]
pub struct EventCatalog {
    events: HashMap<u16, Event>,
    supplementary: HashMap<u16, String>,
}

impl EventCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the event table: `code;description;description_with_quantifier;
    /// nature;quantifier_type;duration_type;directionality;urgency;
    /// update_class`.
    pub fn parse_events(&mut self, data: &str) -> Result<()> {
        for (line_num, line) in data.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(';').collect();
            if fields.len() < 9 {
                return Err(Error::BadCatalogRow {
                    line: line_num + 1,
                    reason: format!("expected 9 fields, got {}", fields.len()),
                });
            }
            let parse = |s: &str| -> Result<u16> {
                s.trim().parse().map_err(|_| Error::BadCatalogRow {
                    line: line_num + 1,
                    reason: format!("not a number: {:?}", s),
                })
            };
            let code = parse(fields[0])?;
            let description_with_quantifier = fields[2].to_string();
            self.events.insert(
                code,
                Event {
                    description: fields[1].to_string(),
                    allows_quantifier: !description_with_quantifier.is_empty(),
                    description_with_quantifier,
                    nature: parse(fields[3])?,
                    quantifier_type: parse(fields[4])?,
                    duration_type: parse(fields[5])?,
                    directionality: parse(fields[6])?,
                    urgency: parse(fields[7])?,
                    update_class: parse(fields[8])?,
                },
            );
        }
        Ok(())
    }

    /// Parse the supplementary-information table: `code;description`.
    pub fn parse_supplementary(&mut self, data: &str) -> Result<()> {
        for (line_num, line) in data.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (code, description) =
                line.split_once(';').ok_or_else(|| Error::BadCatalogRow {
                    line: line_num + 1,
                    reason: "expected code;description".to_string(),
                })?;
            let code = code.trim().parse().map_err(|_| Error::BadCatalogRow {
                line: line_num + 1,
                reason: format!("not a number: {:?}", code),
            })?;
            self.supplementary.insert(code, description.to_string());
        }
        Ok(())
    }

    /// Load both tables from files.
    pub fn load(events_path: &Path, suppl_path: Option<&Path>) -> Result<Self> {
        let mut catalog = Self::new();
        catalog.parse_events(&std::fs::read_to_string(events_path)?)?;
        if let Some(path) = suppl_path {
            catalog.parse_supplementary(&std::fs::read_to_string(path)?)?;
        }
        Ok(catalog)
    }

    pub fn event(&self, code: u16) -> Option<&Event> {
        self.events.get(&code)
    }

    pub fn supplementary(&self, code: u16) -> Option<&str> {
        self.supplementary.get(&code).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// One buffered group of a multi-group message: the y and z words (and x for
/// single-group messages).
#[derive(Clone, Copy, Debug, Default)]
pub struct MessagePart {
    pub is_received: bool,
    pub data: [u16; 3],
}

impl MessagePart {
    fn new(data: [u16; 3]) -> Self {
        Self {
            is_received: true,
            data,
        }
    }
}

/// Free-form field payload widths by 4-bit label (ISO 14819-1, 5.5).
const FIELD_SIZE: [usize; 16] = [3, 3, 5, 5, 5, 8, 8, 8, 8, 11, 16, 16, 16, 16, 0, 0];

/// Pop `len` bits MSB-first off the front of a bit queue.
fn pop_bits(bit_queue: &mut std::collections::VecDeque<bool>, len: usize) -> u16 {
    let mut result = 0u16;
    if bit_queue.len() >= len {
        for _ in 0..len {
            result = (result << 1) | bit_queue.pop_front().unwrap() as u16;
        }
    }
    result
}

/// Extract (label, data) pairs from the concatenated free-form bits of a
/// multi-group message: 12 + 16 bits per used group from the second onward.
fn freeform_fields(parts: &[MessagePart]) -> Vec<(u16, u16)> {
    let second_gsi = bits(parts[1].data[0], 12, 2) as usize;

    // The second group always contributes; the last `second_gsi` slots hold
    // the remaining groups. The bit stream must stay contiguous, so a gap
    // ends the concatenation.
    let mut freeform_bits = std::collections::VecDeque::new();
    for (i, part) in parts.iter().enumerate().skip(1) {
        if i != 1 && i < parts.len() - second_gsi {
            continue;
        }
        if !part.is_received {
            break;
        }
        for b in 0..12 {
            freeform_bits.push_back((part.data[0] >> (11 - b)) & 1 != 0);
        }
        for b in 0..16 {
            freeform_bits.push_back((part.data[1] >> (15 - b)) & 1 != 0);
        }
    }

    let mut result = Vec::new();
    while freeform_bits.len() > 4 {
        let label = pop_bits(&mut freeform_bits, 4);
        let width = FIELD_SIZE[label as usize];
        if freeform_bits.len() < width {
            break;
        }
        result.push((label, pop_bits(&mut freeform_bits, width)));
    }
    result
}

/// Render an ALERT-C time code (ISO 14819-1, 5.5.5).
fn time_string(field_data: u16) -> String {
    if field_data <= 95 {
        format!("{:02}:{:02}", field_data / 4, 15 * (field_data % 4))
    } else if field_data <= 200 {
        let days = (field_data - 96) / 24;
        let hour = (field_data - 96) % 24;
        match days {
            0 => format!("at {:02}:00", hour),
            1 => format!("after 1 day at {:02}:00", hour),
            _ => format!("after {} days at {:02}:00", days, hour),
        }
    } else if field_data <= 231 {
        format!("day {} of the month", field_data - 200)
    } else {
        let month = ((field_data - 232) / 2) as usize;
        let end_mid = (field_data - 232) % 2 == 1;
        const MONTHS: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        if month < 12 {
            if end_mid {
                format!("end of {}", MONTHS[month])
            } else {
                format!("mid-{}", MONTHS[month])
            }
        } else {
            String::new()
        }
    }
}

/// Width of the quantifier field a quantifier type expects.
fn quantifier_size(quantifier_type: u16) -> usize {
    if quantifier_type <= 5 {
        5
    } else if quantifier_type <= 12 {
        8
    } else {
        0
    }
}

/// Substitute a quantifier value into an event's quantifier template.
fn description_with_quantifier(event: &Event, q_value: u16) -> String {
    let q = if event.quantifier_type == Q_SMALL_NUMBER {
        let mut num = q_value as u32;
        if num > 28 {
            num += num - 28;
        }
        num.to_string()
    } else {
        // Reserved quantifier types carry their raw value
        q_value.to_string()
    };
    event.description_with_quantifier.replace('_', &q)
}

fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// A decoded traffic message, single- or multi-group.
#[derive(Debug, Default)]
struct Message {
    is_encrypted: bool,
    is_complete: bool,
    duration: u16,
    diversion_advised: bool,
    direction: u16,
    extent: u16,
    events: Vec<u16>,
    supplementary: Vec<u16>,
    quantifiers: HashMap<usize, u16>,
    location: u16,
    length_affected: Option<u16>,
    time_starts: Option<u16>,
    time_until: Option<u16>,
}

impl Message {
    /// Decode a single-group message from its (x, y, z) words.
    fn from_single(x: u16, y: u16, z: u16, is_encrypted: bool) -> Self {
        Self {
            is_encrypted,
            is_complete: true,
            duration: bits(x, 0, 3),
            diversion_advised: bits(y, 15, 1) != 0,
            direction: bits(y, 14, 1),
            extent: bits(y, 11, 3),
            events: vec![bits(y, 0, 11)],
            location: z,
            ..Self::default()
        }
    }

    /// Assemble a multi-group message from the reassembly buffer.
    fn from_multi(parts: &[MessagePart], is_encrypted: bool, catalog: &EventCatalog) -> Self {
        let mut message = Self {
            is_encrypted,
            ..Self::default()
        };

        // Nothing can be read without the first group
        if !parts[0].is_received {
            return message;
        }
        message.is_complete = true;

        message.direction = bits(parts[0].data[0], 14, 1);
        message.extent = bits(parts[0].data[0], 11, 3);
        message.events.push(bits(parts[0].data[0], 0, 11));
        message.location = parts[0].data[1];

        if !parts[1].is_received {
            return message;
        }

        for (label, field_data) in freeform_fields(parts) {
            match label {
                0 => message.duration = field_data,
                2 => message.length_affected = Some(field_data),
                4 | 5 => {
                    let wanted_size = if label == 4 { 5 } else { 8 };
                    let index = message.events.len() - 1;
                    let event = message.events.last().and_then(|&code| catalog.event(code));
                    let acceptable = event.is_some_and(|ev| {
                        ev.allows_quantifier && quantifier_size(ev.quantifier_type) == wanted_size
                    });
                    if acceptable && !message.quantifiers.contains_key(&index) {
                        message.quantifiers.insert(index, field_data);
                    } else {
                        debug!(label, field_data, "ignoring invalid quantifier");
                    }
                }
                6 => message.supplementary.push(field_data),
                7 => message.time_starts = Some(field_data),
                8 => message.time_until = Some(field_data),
                _ => {
                    debug!(label, field_data, "unhandled free-form label");
                }
            }
        }

        message
    }

    /// Write the message into the record under `tmc_message`.
    fn write(&self, record: &mut Record, catalog: &EventCatalog) {
        if !self.is_complete || self.events.is_empty() {
            return;
        }

        for &code in &self.events {
            record.append_nested("tmc_message", "event_codes", code);
        }
        for &code in &self.supplementary {
            record.append_nested("tmc_message", "supplementary_codes", code);
        }

        // Human-readable description, when the catalog knows the codes
        let mut sentences = Vec::new();
        for (index, &code) in self.events.iter().enumerate() {
            if let Some(event) = catalog.event(code) {
                let sentence = match self.quantifiers.get(&index) {
                    Some(&q_value) => description_with_quantifier(event, q_value),
                    None => event.description.clone(),
                };
                sentences.push(ucfirst(&sentence));
            }
        }
        for &code in &self.supplementary {
            if let Some(description) = catalog.supplementary(code) {
                sentences.push(ucfirst(description));
            }
        }
        if !sentences.is_empty() {
            record.set_nested("tmc_message", "description", sentences.join(". ") + ".");
        }

        let location_key = if self.is_encrypted {
            "encrypted_location"
        } else {
            "location"
        };
        record.set_nested(
            "tmc_message",
            location_key,
            prefixed_hex_string(self.location as u32, 4),
        );
        record.set_nested(
            "tmc_message",
            "direction",
            if self.direction != 0 {
                "negative"
            } else {
                "positive"
            },
        );
        record.set_nested("tmc_message", "extent", self.extent);
        record.set_nested("tmc_message", "diversion_advised", self.diversion_advised);
        record.set_nested("tmc_message", "duration", self.duration);
        if let Some(length) = self.length_affected {
            record.set_nested("tmc_message", "length_affected", length);
        }
        if let Some(starts) = self.time_starts {
            record.set_nested("tmc_message", "starts", time_string(starts));
        }
        if let Some(until) = self.time_until {
            record.set_nested("tmc_message", "until", time_string(until));
        }
    }
}

/// Per-station TMC decoder state.
pub struct Tmc {
    catalog: Arc<EventCatalog>,
    message_timeout: Option<Duration>,
    is_initialized: bool,
    is_encrypted: bool,
    ltn: u16,
    ltnbe: u16,
    sid: u16,
    encid: u16,
    has_encid: bool,
    service_provider: RdsString,
    current_ci: u16,
    multi_group_buffer: [MessagePart; 5],
    last_part_time: Option<Instant>,
}

impl Tmc {
    pub fn new(options: &Options, catalog: Arc<EventCatalog>) -> Self {
        Self {
            catalog,
            message_timeout: options.tmc_message_timeout,
            is_initialized: false,
            is_encrypted: false,
            ltn: 0,
            ltnbe: 0,
            sid: 0,
            encid: 0,
            has_encid: false,
            service_provider: RdsString::new(8),
            current_ci: 0,
            multi_group_buffer: [MessagePart::default(); 5],
            last_part_time: None,
        }
    }

    /// Decode the message word of a 3A system group.
    pub fn receive_system_group(&mut self, message: u16, record: &mut Record) {
        if bits(message, 14, 1) != 0 {
            return;
        }

        self.is_initialized = true;
        self.ltn = bits(message, 6, 6);
        self.is_encrypted = self.ltn == 0;

        record.set_nested2("tmc", "system_info", "is_encrypted", self.is_encrypted);
        if !self.is_encrypted {
            record.set_nested2(
                "tmc",
                "system_info",
                "location_table",
                prefixed_hex_string(self.ltn as u32, 2),
            );
        }

        let afi = bits(message, 5, 1) != 0;
        record.set_nested2("tmc", "system_info", "is_on_alt_freqs", afi);

        let mut scope = Vec::new();
        if bits(message, 3, 1) != 0 {
            scope.push("inter-road");
        }
        if bits(message, 2, 1) != 0 {
            scope.push("national");
        }
        if bits(message, 1, 1) != 0 {
            scope.push("regional");
        }
        if bits(message, 0, 1) != 0 {
            scope.push("urban");
        }
        record.set_nested2("tmc", "system_info", "scope", scope);
    }

    /// Decode an 8A user group: the low 5 bits of block 2 (`x`), block 3
    /// (`y`) and block 4 (`z`).
    pub fn receive_user_group(&mut self, x: u16, y: u16, z: u16, record: &mut Record) {
        if !self.is_initialized {
            return;
        }

        let t = bits(x, 4, 1) != 0;

        if bits(x, 0, 5) == 0x00 {
            // Encryption administration group
            self.sid = bits(y, 5, 6);
            self.encid = bits(y, 0, 5);
            self.ltnbe = bits(z, 10, 6);
            self.has_encid = true;

            record.set_nested("tmc", "service_id", prefixed_hex_string(self.sid as u32, 2));
            record.set_nested(
                "tmc",
                "encryption_id",
                prefixed_hex_string(self.encid as u32, 2),
            );
            record.set_nested(
                "tmc",
                "location_table",
                prefixed_hex_string(self.ltnbe as u32, 2),
            );
        } else if t {
            self.receive_tuning_info(x, y, z, record);
        } else {
            self.receive_user_message(x, y, z, record);
        }
    }

    fn receive_tuning_info(&mut self, x: u16, y: u16, z: u16, record: &mut Record) {
        let variant = bits(x, 0, 4);

        if variant == 4 || variant == 5 {
            let pos = 4 * (variant as usize - 4);
            self.service_provider
                .set(pos, RdsChar::new(bits(y, 8, 8) as u8));
            self.service_provider
                .set(pos + 1, RdsChar::new(bits(y, 0, 8) as u8));
            self.service_provider
                .set(pos + 2, RdsChar::new(bits(z, 8, 8) as u8));
            self.service_provider
                .set(pos + 3, RdsChar::new(bits(z, 0, 8) as u8));

            if self.service_provider.is_complete() {
                record.set_nested(
                    "tmc",
                    "service_provider",
                    self.service_provider.last_complete_string(),
                );
            }
        } else {
            record.debug(format!("TODO: TMC tuning info variant {}", variant));
        }
    }

    fn receive_user_message(&mut self, x: u16, y: u16, z: u16, record: &mut Record) {
        if self.is_encrypted && !self.has_encid {
            return;
        }

        let single_group = bits(x, 3, 1) != 0;

        if single_group {
            Message::from_single(x, y, z, self.is_encrypted).write(record, &self.catalog);
            self.current_ci = 0;
            return;
        }

        // Part of a multi-group message
        let ci = bits(x, 0, 3);
        let first_group = bits(y, 15, 1) != 0;

        let stale = match (self.message_timeout, self.last_part_time) {
            (Some(timeout), Some(last)) => last.elapsed() > timeout,
            _ => false,
        };

        if ci != self.current_ci || stale {
            self.flush_multi_group(record);
            self.current_ci = ci;
        }

        let slot = if first_group {
            0
        } else if bits(y, 14, 1) != 0 {
            1
        } else {
            // Groups count down: the last group has sequence index 0
            4 - bits(y, 12, 2) as usize
        };

        self.multi_group_buffer[slot] = MessagePart::new([y, z, 0]);
        self.last_part_time = Some(Instant::now());
    }

    /// Emit whatever the reassembly buffer holds and clear it.
    fn flush_multi_group(&mut self, record: &mut Record) {
        if self.multi_group_buffer.iter().any(|part| part.is_received) {
            Message::from_multi(&self.multi_group_buffer, self.is_encrypted, &self.catalog)
                .write(record, &self.catalog);
        }
        for part in &mut self.multi_group_buffer {
            part.is_received = false;
        }
        self.last_part_time = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with_event() -> Arc<EventCatalog> {
        let mut catalog = EventCatalog::new();
        catalog
            .parse_events("101;stationary traffic;stationary traffic for _ km;1;0;1;2;3;1\n")
            .unwrap();
        catalog.parse_supplementary("1;in the local area\n").unwrap();
        Arc::new(catalog)
    }

    fn initialized_tmc(catalog: Arc<EventCatalog>) -> Tmc {
        let mut tmc = Tmc::new(&Options::default(), catalog);
        let mut record = Record::new();
        // LTN 0x11, AFI set, national+regional scope
        tmc.receive_system_group((0x11 << 6) | (1 << 5) | 0b0110, &mut record);
        tmc
    }

    #[test]
    fn test_system_group_fields() {
        let mut tmc = Tmc::new(&Options::default(), Arc::new(EventCatalog::new()));
        let mut record = Record::new();
        tmc.receive_system_group((0x11 << 6) | (1 << 5) | 0b0110, &mut record);

        let json = record.to_json();
        assert!(json.contains(r#""is_encrypted":false"#));
        assert!(json.contains(r#""location_table":"0x11""#));
        assert!(json.contains(r#""is_on_alt_freqs":true"#));
        assert!(json.contains(r#""national""#));
        assert!(json.contains(r#""regional""#));
        assert!(!json.contains("urban"));
    }

    #[test]
    fn test_encrypted_when_ltn_zero() {
        let mut tmc = Tmc::new(&Options::default(), Arc::new(EventCatalog::new()));
        let mut record = Record::new();
        tmc.receive_system_group(0, &mut record);
        assert!(tmc.is_encrypted);
        assert!(record.to_json().contains(r#""is_encrypted":true"#));
    }

    #[test]
    fn test_single_group_message() {
        let mut tmc = initialized_tmc(catalog_with_event());
        let mut record = Record::new();

        // T=0, F=1, duration 2; direction positive, extent 3, event 101
        let x = 0b01010;
        let y = (0 << 15) | (0 << 14) | (3 << 11) | 101;
        let z = 0x1234;
        tmc.receive_user_group(x, y, z, &mut record);

        let json = record.to_json();
        assert!(json.contains(r#""event_codes":[101]"#));
        assert!(json.contains(r#""location":"0x1234""#));
        assert!(json.contains(r#""direction":"positive""#));
        assert!(json.contains(r#""extent":3"#));
        assert!(json.contains(r#""duration":2"#));
        assert!(json.contains("Stationary traffic"));
    }

    #[test]
    fn test_multi_group_flush_on_ci_change() {
        let mut tmc = initialized_tmc(catalog_with_event());

        // First group of a multi-group message, CI 3
        let mut record = Record::new();
        let x = 0b00011; // T=0, F=0, CI=3
        let y1 = (1u16 << 15) | (1 << 14) | (2 << 11) | 101; // first group flag
        tmc.receive_user_group(x, y1, 0x4321, &mut record);
        assert!(
            !record.to_json().contains("tmc_message"),
            "no message until the buffer is flushed"
        );

        // Second group, GSI 0 (no more groups follow)
        let mut record = Record::new();
        let y2 = (0u16 << 15) | (1 << 14) | (0 << 12);
        tmc.receive_user_group(x, y2, 0x0000, &mut record);
        assert!(!record.to_json().contains("tmc_message"));

        // A new CI flushes the buffered message
        let mut record = Record::new();
        let x_new_ci = 0b00100; // CI=4
        let y_new = (1u16 << 15) | (2 << 11) | 101;
        tmc.receive_user_group(x_new_ci, y_new, 0x4321, &mut record);

        let json = record.to_json();
        assert!(json.contains(r#""event_codes":[101]"#), "flush emits buffered message");
        assert!(json.contains(r#""location":"0x4321""#));

        // The buffer was cleared by the flush: the next CI change flushes
        // only the CI=4 first group stored after it
        let mut record = Record::new();
        let x_newer_ci = 0b00101;
        tmc.receive_user_group(x_newer_ci, y_new, 0x9999, &mut record);
        let json = record.to_json();
        assert!(json.contains(r#""event_codes":[101]"#));
        assert!(json.contains(r#""location":"0x4321""#));
    }

    #[test]
    fn test_multi_group_quantifier() {
        let mut tmc = initialized_tmc(catalog_with_event());

        // First group: event 101, which allows a 5-bit quantifier
        let mut record = Record::new();
        let x = 0b00001; // CI=1
        let y1 = (1u16 << 15) | (1 << 14) | (1 << 11) | 101;
        tmc.receive_user_group(x, y1, 0x4321, &mut record);

        // Second group: GSI=0, free-form label 4 (5-bit quantifier) value 30
        let mut record = Record::new();
        // y: bit14=1 (second group), GSI bits 12..13 = 0, then 12 free-form
        // bits: label 4 (0100) + value 30 (11110) + padding
        let freeform12 = (0b0100u16 << 8) | (0b11110 << 3);
        let y2 = (1u16 << 14) | freeform12;
        tmc.receive_user_group(x, y2, 0x0000, &mut record);

        // Flush by switching CI
        let mut record = Record::new();
        tmc.receive_user_group(0b00010, (1u16 << 15) | 101, 0x1111, &mut record);

        let json = record.to_json();
        // Q_SMALL_NUMBER: 30 > 28, so rendered as 30 + (30 - 28) = 32
        assert!(
            json.contains("Stationary traffic for 32 km"),
            "quantifier not substituted: {}",
            json
        );
    }

    #[test]
    fn test_encrypted_service_needs_encid() {
        let mut tmc = Tmc::new(&Options::default(), catalog_with_event());
        let mut record = Record::new();
        tmc.receive_system_group(0, &mut record); // LTN 0: encrypted

        // A user message before any encryption administration group
        let mut record = Record::new();
        tmc.receive_user_group(0b01010, (3 << 11) | 101, 0x1234, &mut record);
        assert!(record.is_empty(), "encrypted message without encid is dropped");

        // Encryption administration group provides the parameters
        let mut record = Record::new();
        let y = (0x15u16 << 5) | 0x09;
        tmc.receive_user_group(0x00, y, 0x23 << 10, &mut record);
        assert!(record.to_json().contains(r#""service_id":"0x15""#));
        assert!(record.to_json().contains(r#""encryption_id":"0x09""#));

        let mut record = Record::new();
        tmc.receive_user_group(0b01010, (3 << 11) | 101, 0x1234, &mut record);
        assert!(
            record.to_json().contains(r#""encrypted_location":"0x1234""#),
            "encrypted messages tag their location as encrypted"
        );
    }

    #[test]
    fn test_service_provider_name() {
        let mut tmc = initialized_tmc(Arc::new(EventCatalog::new()));

        let mut record = Record::new();
        // Tuning info variant 4: chars 0..4 "Traf"
        let x = 0b10100;
        tmc.receive_user_group(x, 0x5472, 0x6166, &mut record); // "Tr" "af"
        assert!(!record.to_json().contains("service_provider"));

        let mut record = Record::new();
        // Variant 5: chars 4..8 "fic1"
        let x = 0b10101;
        tmc.receive_user_group(x, 0x6669, 0x6331, &mut record); // "fi" "c1"
        assert!(
            record.to_json().contains(r#""service_provider":"Traffic1""#),
            "got {}",
            record.to_json()
        );
    }

    #[test]
    fn test_uninitialized_ignores_user_groups() {
        let mut tmc = Tmc::new(&Options::default(), Arc::new(EventCatalog::new()));
        let mut record = Record::new();
        tmc.receive_user_group(0b01010, (3 << 11) | 101, 0x1234, &mut record);
        assert!(record.is_empty());
    }

    #[test]
    fn test_empty_catalog_emits_raw_codes() {
        let mut tmc = initialized_tmc(Arc::new(EventCatalog::new()));
        let mut record = Record::new();
        tmc.receive_user_group(0b01010, (3 << 11) | 999, 0x1234, &mut record);
        let json = record.to_json();
        assert!(json.contains(r#""event_codes":[999]"#));
        assert!(!json.contains("description"));
    }

    #[test]
    fn test_time_strings() {
        assert_eq!(time_string(0), "00:00");
        assert_eq!(time_string(95), "23:45");
        assert_eq!(time_string(96), "at 00:00");
        assert_eq!(time_string(121), "after 1 day at 01:00");
        assert_eq!(time_string(150), "after 2 days at 06:00");
        assert_eq!(time_string(201), "day 1 of the month");
        assert_eq!(time_string(231), "day 31 of the month");
        assert_eq!(time_string(232), "mid-Jan");
        assert_eq!(time_string(233), "end of Jan");
        assert_eq!(time_string(255), "end of Dec");
    }

    #[test]
    fn test_catalog_rejects_malformed_rows() {
        let mut catalog = EventCatalog::new();
        assert!(catalog.parse_events("1;too;few;fields\n").is_err());
        assert!(catalog.parse_events("x;a;b;1;1;1;1;1;1\n").is_err());
        assert!(catalog.parse_supplementary("no separator\n").is_err());
    }
}
