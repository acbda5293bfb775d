//! Per-station decoding state and group dispatch.
//!
//! A [`Station`] represents one broadcast carrier identified by its PI code.
//! It owns every accumulator that spans groups (PS, RadioText, AF lists, EON
//! tables, ODA registrations, the TMC decoder) and turns each incoming group
//! into at most one record.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde_json::json;
use tracing::trace;

use crate::altfreq::{AfList, AltFreqList, Band, CarrierFrequency};
use crate::group::{Block2, Block3, Block4, BlockNumber, Group, GroupType, Version};
use crate::options::Options;
use crate::output::{Record, RecordSink};
use crate::rdsstring::{RdsChar, RdsString, TextBuffer};
use crate::tables;
use crate::tmc::{EventCatalog, Tmc};
use crate::util::{bits, bits2, hex_string, prefixed_hex_string, rtrim};

/// Addresses in the transparent data channel times four bytes each.
const FULL_TDC_LENGTH: usize = 32 * 4;

/// Programme Item Number: day of month, hour, minute (IEC 62106:2015,
/// section 6.1.5.2). Hour 24 is allowed for programmes spilling past
/// midnight.
fn decode_pin(pin: u16) -> Option<(u16, u16, u16)> {
    let day = bits(pin, 11, 5);
    let hour = bits(pin, 6, 5);
    let minute = bits(pin, 0, 6);
    (day >= 1 && hour <= 24 && minute <= 59).then_some((day, hour, minute))
}

/// Radio paging parameters from group 1A (legacy, mostly dark since RDS2).
/// Tracked for completeness; nothing downstream consumes them yet.
#[allow(dead_code)]
#[derive(Default)]
struct Pager {
    paging_code: u16,
    interval: u16,
    opc: u16,
    pac: u16,
    ecc: u16,
    ccf: u16,
}

impl Pager {
    /// Sub-decode of block 4 when the group carries no PIN
    /// (IEC 62106:2015, section M.3.2.5.3).
    fn decode_block4(&mut self, block4: u16) {
        let sub_type = bits(block4, 10, 1);
        if sub_type == 0 {
            self.pac = bits(block4, 4, 6);
            self.opc = bits(block4, 0, 4);
        } else {
            match bits(block4, 8, 2) {
                0 => self.ecc = bits(block4, 0, 6),
                3 => self.ccf = bits(block4, 0, 4),
                _ => {}
            }
        }
    }
}

/// RadioText+ parameters announced via 3A and latched across user groups.
#[allow(dead_code)]
#[derive(Default)]
struct RadioTextPlus {
    exists: bool,
    cb: bool,
    scb: u16,
    template_num: u16,
    toggle: bool,
    item_running: bool,
}

/// One broadcast carrier and everything accumulated about it.
pub struct Station {
    pi: u16,
    has_pi: bool,
    options: Options,
    which_channel: usize,
    ps: TextBuffer,
    radiotext: TextBuffer,
    ptyname: TextBuffer,
    alt_freq_list: AltFreqList,
    pin: u16,
    ecc: u8,
    cc: u16,
    tmc_id: u16,
    linkage_la: bool,
    clock_time: String,
    #[allow(dead_code)]
    has_country: bool,
    oda_app_for_group: BTreeMap<GroupType, u16>,
    radiotext_plus: RadioTextPlus,
    eon_ps_names: HashMap<u16, RdsString>,
    eon_alt_freqs: HashMap<u16, AltFreqList>,
    pager: Pager,
    full_tdc: RdsString,
    tmc: Tmc,
    last_group_had_pi: bool,
}

impl Station {
    pub fn new(
        pi: u16,
        options: &Options,
        which_channel: usize,
        tmc_catalog: Arc<EventCatalog>,
    ) -> Self {
        Self {
            pi,
            has_pi: true,
            options: options.clone(),
            which_channel,
            ps: TextBuffer::new(8),
            radiotext: TextBuffer::new(64),
            ptyname: TextBuffer::new(8),
            alt_freq_list: AltFreqList::new(),
            pin: 0,
            ecc: 0,
            cc: 0,
            tmc_id: 0,
            linkage_la: false,
            clock_time: String::new(),
            has_country: false,
            oda_app_for_group: BTreeMap::new(),
            radiotext_plus: RadioTextPlus::default(),
            eon_ps_names: HashMap::new(),
            eon_alt_freqs: HashMap::new(),
            pager: Pager::default(),
            full_tdc: RdsString::new(FULL_TDC_LENGTH),
            tmc: Tmc::new(options, tmc_catalog),
            last_group_had_pi: false,
        }
    }

    pub fn pi(&self) -> u16 {
        self.pi
    }

    /// Decode one group and emit its record into the sink.
    pub fn update_and_print(&mut self, group: &Group, sink: &mut dyn RecordSink) {
        if !self.has_pi {
            return;
        }

        // Tolerate one group with missed PI; on the second miss, stay quiet
        // until PI comes back
        if group.has_pi() {
            self.last_group_had_pi = true;
        } else if self.last_group_had_pi {
            self.last_group_had_pi = false;
        } else {
            return;
        }

        if group.is_empty() {
            return;
        }

        let mut record = Record::new();
        record.set("pi", prefixed_hex_string(self.pi as u32, 4));

        if self.options.rbds {
            if let Some(callsign) = tables::callsign_from_pi(self.pi) {
                if self.pi & 0xF000 == 0x1000 {
                    record.set("callsign_uncertain", callsign);
                } else {
                    record.set("callsign", callsign);
                }
            }
        }

        if self.options.timestamp {
            if let Some(rx_time) = group.rx_time() {
                record.set(
                    "rx_time",
                    rx_time.format(&self.options.time_format).to_string(),
                );
            }
        }

        if let Some(bler) = group.bler() {
            record.set("bler", bler.round() as u32);
        }

        if self.options.num_channels > 1 {
            record.set("channel", self.which_channel);
        }

        if self.options.show_raw {
            record.set("raw_data", group.hex());
        }

        self.decode_basics(group, &mut record);

        if let Some(group_type) = group.group_type() {
            match (group_type.number, group_type.version) {
                // These groups can never be reassigned to an ODA
                (0, _) => self.decode_type0(group, &mut record),
                (1, _) => self.decode_type1(group, &mut record),
                (2, _) => self.decode_type2(group, &mut record),
                (3, Version::A) => self.decode_type3a(group, &mut record),
                (4, Version::A) => self.decode_type4a(group, &mut record),
                (10, Version::A) => self.decode_type10a(group, &mut record),
                (14, _) => self.decode_type14(group, &mut record),
                (15, Version::B) => self.decode_type15b(group, &mut record),

                // Groups announced for an ODA by an earlier 3A
                _ if self.oda_app_for_group.contains_key(&group_type) => {
                    self.decode_oda_group(group, &mut record)
                }

                // Groups with a primary function that may also host an ODA
                (5, _) => self.decode_type5(group, &mut record),
                (6, _) => self.decode_type6(group, &mut record),
                (7, Version::A) => record.debug("TODO: 7A"),
                (8, Version::A) => {
                    if group.has(Block2) && group.has(Block3) && group.has(Block4) {
                        self.tmc.receive_user_group(
                            bits(group.block2(), 0, 5),
                            group.block3(),
                            group.block4(),
                            &mut record,
                        );
                    }
                }
                (9, Version::A) => record.debug("TODO: 9A"),

                // ODA-only groups without a registration yet
                _ => self.decode_oda_group(group, &mut record),
            }
        }

        sink.emit(&record);
    }

    /// Fields common to all groups: group type, TP, programme type. For 15B
    /// they are duplicated in block 4, which may be the only block we have.
    fn decode_basics(&mut self, group: &Group, record: &mut Record) {
        if group.has(Block2) {
            if let Some(group_type) = group.group_type() {
                record.set("group", group_type.to_string());
            }
            record.set("tp", bits(group.block2(), 10, 1) != 0);

            let pty = bits(group.block2(), 5, 5);
            record.set("prog_type", self.pty_name(pty));
        } else if group.group_type().map(|t| (t.number, t.version)) == Some((15, Version::B))
            && group.has(Block4)
        {
            record.set("group", "15B");
            record.set("tp", bits(group.block4(), 10, 1) != 0);

            let pty = bits(group.block4(), 5, 5);
            record.set("prog_type", self.pty_name(pty));
        }
    }

    fn pty_name(&self, pty: u16) -> &'static str {
        if self.options.rbds {
            tables::pty_name_rbds(pty)
        } else {
            tables::pty_name(pty)
        }
    }

    /// Group 0: basic tuning and switching.
    fn decode_type0(&mut self, group: &Group, record: &mut Record) {
        let segment_address = bits(group.block2(), 0, 2);
        let is_di = bits(group.block2(), 2, 1) != 0;
        record.set_nested("di", tables::di_code(segment_address), is_di);
        record.set("ta", bits(group.block2(), 4, 1) != 0);
        record.set("is_music", bits(group.block2(), 3, 1) != 0);

        if !group.has(Block3) {
            // Losing part of a Method B list would let unrelated lists blend
            if self.alt_freq_list.is_method_b() {
                self.alt_freq_list.clear();
            }
            return;
        }

        if group.group_type().map(|t| t.version) == Some(Version::A) {
            self.alt_freq_list.insert(bits(group.block3(), 8, 8));
            self.alt_freq_list.insert(bits(group.block3(), 0, 8));

            if self.alt_freq_list.is_complete() {
                match self.alt_freq_list.classify() {
                    Some(AfList::MethodB {
                        tuned_frequency,
                        same_programme,
                        regional_variants,
                    }) => {
                        record.set_nested("alt_frequencies_b", "tuned_frequency", tuned_frequency);
                        for frequency in same_programme {
                            record.append_nested("alt_frequencies_b", "same_programme", frequency);
                        }
                        for frequency in regional_variants {
                            record.append_nested(
                                "alt_frequencies_b",
                                "regional_variants",
                                frequency,
                            );
                        }
                    }
                    Some(AfList::MethodA(frequencies)) => {
                        for frequency in frequencies {
                            record.append("alt_frequencies_a", frequency);
                        }
                    }
                    // Mixed-up list; drop it as noise
                    None => trace!("discarding inconsistent AF list"),
                }
                self.alt_freq_list.clear();
            } else if self.options.show_partial {
                for &frequency in self.alt_freq_list.raw_list() {
                    record.append("partial_alt_frequencies", frequency);
                }
            }
        }

        if !group.has(Block4) {
            return;
        }

        self.ps.update_pair(
            segment_address as usize * 2,
            RdsChar::new(bits(group.block4(), 8, 8) as u8),
            RdsChar::new(bits(group.block4(), 0, 8) as u8),
        );

        if self.ps.text.is_complete() {
            record.set("ps", self.ps.text.last_complete_string());
        } else if self.options.show_partial {
            record.set("partial_ps", self.ps.text.string());
        }
    }

    /// Group 1: programme item number and slow labelling codes.
    fn decode_type1(&mut self, group: &Group, record: &mut Record) {
        if !(group.has(Block3) && group.has(Block4)) {
            return;
        }

        self.pin = group.block4();

        if self.pin != 0x0000 {
            match decode_pin(self.pin) {
                Some((day, hour, minute)) => {
                    record.set("prog_item_number", self.pin);
                    record.set_nested("prog_item_started", "day", day);
                    record.set_nested(
                        "prog_item_started",
                        "time",
                        format!("{:02}:{:02}", hour, minute),
                    );
                }
                None => record.debug("invalid PIN"),
            }
        }

        if group.group_type().map(|t| t.version) != Some(Version::A) {
            return;
        }

        self.pager.paging_code = bits(group.block2(), 2, 3);
        if self.pager.paging_code != 0 {
            self.pager.interval = bits(group.block2(), 0, 2);
        }
        self.linkage_la = bits(group.block3(), 15, 1) != 0;
        record.set("has_linkage", self.linkage_la);

        let slow_label_variant = bits(group.block3(), 12, 3);
        match slow_label_variant {
            0 => {
                if self.pager.paging_code != 0 {
                    self.pager.opc = bits(group.block3(), 8, 4);
                    if group.has(Block4) && bits(group.block4(), 11, 5) == 0 {
                        self.pager.decode_block4(group.block4());
                    }
                }

                self.ecc = bits(group.block3(), 0, 8) as u8;
                self.cc = bits(self.pi, 12, 4);

                if self.ecc != 0x00 {
                    self.has_country = true;
                    record.set("country", tables::country_string(self.cc, self.ecc));
                }
            }
            1 => {
                self.tmc_id = bits(group.block3(), 0, 12);
                record.set("tmc_id", self.tmc_id);
            }
            2 => {
                if self.pager.paging_code != 0 {
                    self.pager.pac = bits(group.block3(), 0, 6);
                    self.pager.opc = bits(group.block3(), 8, 4);
                    if group.has(Block4) && bits(group.block4(), 11, 5) == 0 {
                        self.pager.decode_block4(group.block4());
                    }
                }
            }
            3 => {
                let language_code = bits(group.block3(), 0, 8) as u8;
                match tables::language_string(language_code) {
                    Some(language) => record.set("language", language),
                    None => record.set(
                        "language",
                        prefixed_hex_string(language_code as u32, 2),
                    ),
                }
            }
            7 => {
                record.set("ews", bits(group.block3(), 0, 12));
            }
            _ => {
                record.debug(format!("TODO: SLC variant {}", slow_label_variant));
            }
        }
    }

    /// Group 2: RadioText.
    ///
    /// Three message-length conventions exist in the wild: a 0x0D terminator,
    /// padding to the full 64 characters, or neither. The last one is only
    /// decodable by noticing the same message repeating, which is what the
    /// repeat heuristic below does.
    fn decode_type2(&mut self, group: &Group, record: &mut Record) {
        if !(group.has(Block3) && group.has(Block4)) {
            return;
        }

        let version = match group.group_type().map(|t| t.version) {
            Some(version) => version,
            None => return,
        };

        let radiotext_position =
            bits(group.block2(), 0, 4) as usize * if version == Version::A { 4 } else { 2 };

        let is_ab_changed = self.radiotext.ab_changed(bits(group.block2(), 4, 1) != 0);

        // Possibly a full random-length message with no terminator: back at
        // position 0 with text in the buffer and no terminator in sight
        let mut has_potentially_complete_message = radiotext_position == 0
            && self.radiotext.text.received_length() > 1
            && !self.radiotext.text.is_complete()
            && !self.radiotext.text.has_previously_received_terminators();

        let mut potentially_complete_message = String::new();
        if has_potentially_complete_message {
            potentially_complete_message = rtrim(&self.radiotext.text.string());

            // Require a repeat before trusting it; the terminator may simply
            // have been lost in noise, or an A/B change cut the message short
            if potentially_complete_message
                != self.radiotext.previous_potentially_complete_message
            {
                has_potentially_complete_message = false;
            }
            self.radiotext.previous_potentially_complete_message =
                potentially_complete_message.clone();
        }

        // The transmitter requests a wipe: message contents will change
        if is_ab_changed {
            self.radiotext.text.clear();
        }

        if version == Version::A {
            self.radiotext.text.resize(64);
            self.radiotext.update_pair(
                radiotext_position,
                RdsChar::new(bits(group.block3(), 8, 8) as u8),
                RdsChar::new(bits(group.block3(), 0, 8) as u8),
            );
            self.radiotext.update_pair(
                radiotext_position + 2,
                RdsChar::new(bits(group.block4(), 8, 8) as u8),
                RdsChar::new(bits(group.block4(), 0, 8) as u8),
            );
        } else {
            self.radiotext.text.resize(32);
            self.radiotext.update_pair(
                radiotext_position,
                RdsChar::new(bits(group.block4(), 8, 8) as u8),
                RdsChar::new(bits(group.block4(), 0, 8) as u8),
            );
        }

        if self.radiotext.text.is_complete() {
            record.set("radiotext", rtrim(self.radiotext.text.last_complete_string()));
        } else if has_potentially_complete_message {
            record.set("radiotext", potentially_complete_message);
        } else if self.options.show_partial
            && !rtrim(&self.radiotext.text.string()).is_empty()
        {
            record.set("partial_radiotext", self.radiotext.text.string());
        }
    }

    /// Group 3A: Open Data Application announcements.
    fn decode_type3a(&mut self, group: &Group, record: &mut Record) {
        if !(group.has(Block3) && group.has(Block4)) {
            return;
        }

        let oda_group_type = GroupType::from_code(bits(group.block2(), 0, 5));
        let oda_message = group.block3();
        let oda_app_id = group.block4();

        self.oda_app_for_group.insert(oda_group_type, oda_app_id);

        record.set_nested("open_data_app", "oda_group", oda_group_type.to_string());
        record.set_nested("open_data_app", "app_name", tables::app_name(oda_app_id));

        match oda_app_id {
            0xCD46 | 0xCD47 => {
                self.tmc.receive_system_group(oda_message, record);
            }
            0x4BD7 => {
                self.radiotext_plus.exists = true;
                self.radiotext_plus.cb = bits(oda_message, 12, 1) != 0;
                self.radiotext_plus.scb = bits(oda_message, 8, 4);
                self.radiotext_plus.template_num = bits(oda_message, 0, 8);
            }
            0x0093 => {
                // Message bits are unused for DAB cross-referencing
            }
            _ => {
                record.debug(format!(
                    "TODO: Unimplemented ODA app {}",
                    prefixed_hex_string(oda_app_id as u32, 4)
                ));
                record.set_nested("open_data_app", "message", oda_message);
            }
        }
    }

    /// Group 4A: clock-time and date.
    fn decode_type4a(&mut self, group: &Group, record: &mut Record) {
        if !(group.has(Block3) && group.has(Block4)) {
            return;
        }

        let modified_julian_date = bits2(group.block2(), group.block3(), 1, 17) as f64;

        let mut year = ((modified_julian_date - 15078.2) / 365.25) as i32;
        let mut month =
            ((modified_julian_date - 14956.1 - (year as f64 * 365.25).trunc()) / 30.6001) as i32;
        let day = (modified_julian_date
            - 14956.0
            - (year as f64 * 365.25).trunc()
            - (month as f64 * 30.6001).trunc()) as i32;
        if month == 14 || month == 15 {
            year += 1;
            month -= 12;
        }
        year += 1900;
        month -= 1;

        let hour = bits2(group.block3(), group.block4(), 12, 5);
        let minute = bits(group.block4(), 6, 6);

        let offset_negative = bits(group.block4(), 5, 1) != 0;
        let offset_half_hours = bits(group.block4(), 0, 5) as i64;
        let offset_minutes = if offset_negative {
            -30 * offset_half_hours
        } else {
            30 * offset_half_hours
        };

        let is_valid = hour <= 23 && minute <= 59 && offset_half_hours / 2 <= 14;
        let date = NaiveDate::from_ymd_opt(year, month as u32, day as u32)
            .and_then(|date| date.and_hms_opt(hour, minute as u32, 0));

        match (is_valid, date) {
            (true, Some(utc)) => {
                let local = utc + Duration::minutes(offset_minutes);
                let suffix = if offset_minutes == 0 {
                    "Z".to_string()
                } else {
                    format!(
                        "{}{:02}:{:02}",
                        if offset_minutes < 0 { "-" } else { "+" },
                        offset_minutes.abs() / 60,
                        offset_minutes.abs() % 60
                    )
                };
                self.clock_time = format!("{}{}", local.format("%Y-%m-%dT%H:%M:00"), suffix);
                record.set("clock_time", self.clock_time.clone());
            }
            _ => record.debug("invalid date/time"),
        }
    }

    /// Group 5: transparent data channels.
    fn decode_type5(&mut self, group: &Group, record: &mut Record) {
        let address = bits(group.block2(), 0, 5) as usize;
        record.set_nested("transparent_data", "address", address);

        if group.group_type().map(|t| t.version) == Some(Version::A) {
            let data = [
                bits(group.block3(), 8, 8) as u8,
                bits(group.block3(), 0, 8) as u8,
                bits(group.block4(), 8, 8) as u8,
                bits(group.block4(), 0, 8) as u8,
            ];

            record.set_nested(
                "transparent_data",
                "raw",
                data.iter()
                    .map(|&byte| hex_string(byte as u32, 2))
                    .collect::<Vec<_>>()
                    .join(" "),
            );

            let mut decoded_text = RdsString::new(4);
            decoded_text.set_pair(0, RdsChar::new(data[0]), RdsChar::new(data[1]));
            decoded_text.set_pair(2, RdsChar::new(data[2]), RdsChar::new(data[3]));

            self.full_tdc
                .set_pair(address * 4, RdsChar::new(data[0]), RdsChar::new(data[1]));
            self.full_tdc
                .set_pair(address * 4 + 2, RdsChar::new(data[2]), RdsChar::new(data[3]));
            if self.full_tdc.is_complete() {
                record.set_nested("transparent_data", "full_text", self.full_tdc.string());
                let full_raw = self
                    .full_tdc
                    .chars()
                    .iter()
                    .map(|chr| hex_string(chr.code as u32, 2))
                    .collect::<Vec<_>>()
                    .join(" ");
                record.set_nested("transparent_data", "full_raw", full_raw);
            }

            record.set_nested("transparent_data", "as_text", decoded_text.string());
        } else {
            let data = [
                bits(group.block4(), 8, 8) as u8,
                bits(group.block4(), 0, 8) as u8,
            ];

            record.set_nested(
                "transparent_data",
                "raw",
                format!(
                    "{} {}",
                    hex_string(data[0] as u32, 2),
                    hex_string(data[1] as u32, 2)
                ),
            );

            let mut decoded_text = RdsString::new(2);
            decoded_text.set_pair(0, RdsChar::new(data[0]), RdsChar::new(data[1]));
            record.set_nested("transparent_data", "as_text", decoded_text.string());
        }
    }

    /// Group 6: in-house applications, passed through as opaque numbers.
    fn decode_type6(&mut self, group: &Group, record: &mut Record) {
        record.append("in_house_data", bits(group.block2(), 0, 5));

        if group.group_type().map(|t| t.version) == Some(Version::A) {
            if group.has(Block3) {
                record.append("in_house_data", group.block3());
                if group.has(Block4) {
                    record.append("in_house_data", group.block4());
                }
            }
        } else if group.has(Block4) {
            record.append("in_house_data", group.block4());
        }
    }

    /// Group 10A: programme type name.
    fn decode_type10a(&mut self, group: &Group, record: &mut Record) {
        if !(group.has(Block3) && group.has(Block4)) {
            return;
        }

        let segment_address = bits(group.block2(), 0, 1);

        if self.ptyname.ab_changed(bits(group.block2(), 4, 1) != 0) {
            self.ptyname.text.clear();
        }

        self.ptyname.update_quad(
            segment_address as usize * 4,
            RdsChar::new(bits(group.block3(), 8, 8) as u8),
            RdsChar::new(bits(group.block3(), 0, 8) as u8),
            RdsChar::new(bits(group.block4(), 8, 8) as u8),
            RdsChar::new(bits(group.block4(), 0, 8) as u8),
        );

        if self.ptyname.text.is_complete() {
            record.set("pty_name", self.ptyname.text.last_complete_string());
        }
    }

    /// Group 14: Enhanced Other Networks.
    fn decode_type14(&mut self, group: &Group, record: &mut Record) {
        if !group.has(Block4) {
            return;
        }

        let on_pi = group.block4();
        record.set_nested("other_network", "pi", prefixed_hex_string(on_pi as u32, 4));
        record.set_nested("other_network", "tp", bits(group.block2(), 4, 1) != 0);

        if group.group_type().map(|t| t.version) == Some(Version::B) {
            record.set_nested("other_network", "ta", bits(group.block2(), 3, 1) != 0);
            return;
        }

        if !group.has(Block3) {
            return;
        }

        let eon_variant = bits(group.block2(), 0, 4);
        match eon_variant {
            0..=3 => {
                let ps_name = self
                    .eon_ps_names
                    .entry(on_pi)
                    .or_insert_with(|| RdsString::new(8));
                ps_name.set_pair(
                    2 * eon_variant as usize,
                    RdsChar::new(bits(group.block3(), 8, 8) as u8),
                    RdsChar::new(bits(group.block3(), 0, 8) as u8),
                );
                if ps_name.is_complete() {
                    record.set_nested("other_network", "ps", ps_name.last_complete_string());
                }
            }
            4 => {
                let alt_freqs = self.eon_alt_freqs.entry(on_pi).or_default();
                alt_freqs.insert(bits(group.block3(), 8, 8));
                alt_freqs.insert(bits(group.block3(), 0, 8));

                if alt_freqs.is_complete() {
                    for &frequency in alt_freqs.raw_list() {
                        record.append_nested("other_network", "alt_frequencies", frequency);
                    }
                    alt_freqs.clear();
                }
            }
            5..=9 => {
                let frequency = CarrierFrequency::new(bits(group.block3(), 0, 8), Band::Fm);
                if frequency.is_valid() {
                    record.set_nested("other_network", "kilohertz", frequency.khz());
                }
            }
            12 => {
                let has_linkage = bits(group.block3(), 15, 1) != 0;
                let lsn = bits(group.block3(), 0, 12);
                record.set_nested("other_network", "has_linkage", has_linkage);
                if has_linkage && lsn != 0 {
                    record.set_nested("other_network", "linkage_set", lsn);
                }
            }
            13 => {
                let pty = bits(group.block3(), 11, 5);
                record.set_nested("other_network", "prog_type", self.pty_name(pty));
                record.set_nested("other_network", "ta", bits(group.block3(), 0, 1) != 0);
            }
            14 => {
                let pin = group.block3();
                if pin != 0x0000 {
                    match decode_pin(pin) {
                        Some((day, hour, minute)) => {
                            record.set_nested("other_network", "prog_item_number", pin);
                            record.set_nested2("other_network", "prog_item_started", "day", day);
                            record.set_nested2(
                                "other_network",
                                "prog_item_started",
                                "time",
                                format!("{:02}:{:02}", hour, minute),
                            );
                        }
                        None => record.debug("invalid PIN"),
                    }
                }
            }
            15 => {
                record.set_nested(
                    "other_network",
                    "broadcaster_data",
                    hex_string(group.block3() as u32, 4),
                );
            }
            _ => {
                // Variants 10 and 11 are unallocated
                record.debug(format!("TODO: EON variant {}", eon_variant));
            }
        }
    }

    /// Group 15B: fast tuning. The flags are duplicated in blocks 2 and 4,
    /// so either alone is enough.
    fn decode_type15b(&mut self, group: &Group, record: &mut Record) {
        let block_num = if group.has(Block2) {
            BlockNumber::Block2
        } else {
            BlockNumber::Block4
        };

        record.set("ta", bits(group.block(block_num), 4, 1) != 0);
        record.set("is_music", bits(group.block(block_num), 3, 1) != 0);
    }

    /// A group registered to an Open Data Application, or one we have no
    /// registration for.
    fn decode_oda_group(&mut self, group: &Group, record: &mut Record) {
        let app_id = group
            .group_type()
            .and_then(|group_type| self.oda_app_for_group.get(&group_type).copied());

        let raw_data = || {
            format!(
                "{} {} {}",
                hex_string((group.block2() & 0b11111) as u32, 2),
                if group.has(Block3) {
                    hex_string(group.block3() as u32, 4)
                } else {
                    "----".to_string()
                },
                if group.has(Block4) {
                    hex_string(group.block4() as u32, 4)
                } else {
                    "----".to_string()
                }
            )
        };

        match app_id {
            None => {
                record.set_nested("unknown_oda", "raw_data", raw_data());
            }
            Some(0xCD46) | Some(0xCD47) => {
                if group.has(Block2) && group.has(Block3) && group.has(Block4) {
                    self.tmc.receive_user_group(
                        bits(group.block2(), 0, 5),
                        group.block3(),
                        group.block4(),
                        record,
                    );
                }
            }
            Some(0x4BD7) => self.parse_radiotext_plus(group, record),
            Some(0x0093) => self.parse_dab(group, record),
            Some(app_id) => {
                record.set_nested("unknown_oda", "app_name", tables::app_name(app_id));
                record.set_nested("unknown_oda", "raw_data", raw_data());
            }
        }
    }

    /// RadioText+ user group: up to two tags pointing into the RadioText.
    fn parse_radiotext_plus(&mut self, group: &Group, record: &mut Record) {
        let item_toggle = bits(group.block2(), 4, 1) != 0;
        let item_running = bits(group.block2(), 3, 1) != 0;

        if item_toggle != self.radiotext_plus.toggle
            || item_running != self.radiotext_plus.item_running
        {
            self.radiotext.text.clear();
            self.radiotext_plus.toggle = item_toggle;
            self.radiotext_plus.item_running = item_running;
        }

        record.set_nested("radiotext_plus", "item_running", item_running);
        record.set_nested("radiotext_plus", "item_toggle", item_toggle as u32);

        struct Tag {
            content_type: u16,
            start: usize,
            length: usize,
        }

        let mut tags = Vec::new();
        if group.has(Block3) {
            tags.push(Tag {
                content_type: bits2(group.block2(), group.block3(), 13, 6) as u16,
                start: bits(group.block3(), 7, 6) as usize,
                length: bits(group.block3(), 1, 6) as usize + 1,
            });
            if group.has(Block4) {
                tags.push(Tag {
                    content_type: bits2(group.block3(), group.block4(), 11, 6) as u16,
                    start: bits(group.block4(), 5, 6) as usize,
                    length: bits(group.block4(), 0, 5) as usize + 1,
                });
            }
        }

        for tag in tags {
            let text = rtrim(
                &self
                    .radiotext
                    .text
                    .last_complete_substring(tag.start, tag.length),
            );

            if self.radiotext.text.has_chars(tag.start, tag.length)
                && !text.is_empty()
                && tag.content_type != 0
            {
                record.append_nested(
                    "radiotext_plus",
                    "tags",
                    json!({
                        "content-type": tables::rtplus_content_type(tag.content_type),
                        "data": text,
                    }),
                );
            }
        }
    }

    /// DAB cross-reference (ETSI EN 301 700).
    fn parse_dab(&mut self, group: &Group, record: &mut Record) {
        let es_flag = bits(group.block2(), 4, 1) != 0;

        if es_flag {
            record.debug("TODO: DAB service table");
            return;
        }

        const MODES: [&str; 4] = ["unspecified", "I", "II or III", "IV"];
        let mode = bits(group.block2(), 2, 2);
        record.set_nested("dab", "mode", MODES[mode as usize]);

        let khz = 16 * bits2(group.block2(), group.block3(), 0, 18);
        record.set_nested("dab", "kilohertz", khz);

        if let Some(channel) = tables::dab_channel(khz) {
            record.set_nested("dab", "channel", channel);
        }

        record.set_nested(
            "dab",
            "ensemble_id",
            prefixed_hex_string(group.block4() as u32, 4),
        );
    }
}
