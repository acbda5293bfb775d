//! Static lookup tables: programme types, languages, countries, ODA
//! application names, RadioText+ content types, DAB channel labels, RBDS
//! callsigns, and the character-set subset.
//!
//! Everything here is read-only data addressed by small codes taken from the
//! group bit fields. The TMC event catalog is the one table that is *not*
//! compiled in; see [`crate::tmc::EventCatalog`].

/// Programme type names, RDS (IEC 62106) variant. 32 entries.
const PTY_NAMES_RDS: [&str; 32] = [
    "No PTY",
    "News",
    "Current affairs",
    "Information",
    "Sport",
    "Education",
    "Drama",
    "Cultures",
    "Science",
    "Varied",
    "Pop music",
    "Rock music",
    "Easy listening",
    "Light classics",
    "Serious classics",
    "Other music",
    "Weather",
    "Finance",
    "Children's programmes",
    "Social affairs",
    "Religion",
    "Phone-in",
    "Travel & touring",
    "Leisure & hobby",
    "Jazz music",
    "Country music",
    "National music",
    "Oldies music",
    "Folk music",
    "Documentary",
    "Alarm test",
    "Alarm!",
];

/// Programme type names, North American RBDS variant. 32 entries.
const PTY_NAMES_RBDS: [&str; 32] = [
    "No PTY",
    "News",
    "Information",
    "Sports",
    "Talk",
    "Rock",
    "Classic rock",
    "Adult hits",
    "Soft rock",
    "Top 40",
    "Country",
    "Oldies",
    "Soft",
    "Nostalgia",
    "Jazz",
    "Classical",
    "Rhythm and blues",
    "Soft rhythm and blues",
    "Language",
    "Religious music",
    "Religious talk",
    "Personality",
    "Public",
    "College",
    "Spanish talk",
    "Spanish music",
    "Hip hop",
    "Unassigned",
    "Unassigned",
    "Weather",
    "Emergency test",
    "Emergency!",
];

/// Programme type name for a 5-bit PTY code.
pub fn pty_name(pty: u16) -> &'static str {
    PTY_NAMES_RDS[(pty & 0x1F) as usize]
}

/// Programme type name for a 5-bit PTY code, RBDS variant.
pub fn pty_name_rbds(pty: u16) -> &'static str {
    PTY_NAMES_RBDS[(pty & 0x1F) as usize]
}

/// Decoder Information flag name for a group 0 segment address.
pub fn di_code(segment: u16) -> &'static str {
    match segment & 0x3 {
        0 => "dynamic_pty",
        1 => "compressed",
        2 => "artificial_head",
        _ => "stereo",
    }
}

/// Country codes for ECC pages E0 through E4, indexed by the PI country-code
/// nybble 1..15 (ISO 3166 alpha-2). Unallocated combinations are `"??"`.
const COUNTRIES_E0: [&str; 15] = [
    "de", "dz", "ad", "il", "it", "be", "ru", "ps", "al", "at", "hu", "mt", "de", "??", "eg",
];
const COUNTRIES_E1: [&str; 15] = [
    "gr", "cy", "sm", "ch", "jo", "fi", "lu", "bg", "dk", "gi", "iq", "gb", "ly", "ro", "fr",
];
const COUNTRIES_E2: [&str; 15] = [
    "ma", "cz", "pl", "va", "sk", "sy", "tn", "??", "li", "is", "mc", "lt", "rs", "es", "no",
];
const COUNTRIES_E3: [&str; 15] = [
    "??", "ie", "tr", "mk", "??", "??", "??", "nl", "lv", "lb", "az", "hr", "kz", "se", "by",
];
const COUNTRIES_E4: [&str; 15] = [
    "md", "ee", "kg", "??", "??", "ua", "??", "pt", "si", "am", "uz", "ge", "??", "tm", "ba",
];

/// Country for a (PI country-code nybble, extended country code) pair.
///
/// Covers the RDS-region pages E0–E4 plus A0 (United States); other pages
/// report `"??"`.
pub fn country_string(cc: u16, ecc: u8) -> &'static str {
    if cc == 0 || cc > 15 {
        return "??";
    }
    let index = (cc - 1) as usize;
    match ecc {
        0xA0 => "us",
        0xE0 => COUNTRIES_E0[index],
        0xE1 => COUNTRIES_E1[index],
        0xE2 => COUNTRIES_E2[index],
        0xE3 => COUNTRIES_E3[index],
        0xE4 => COUNTRIES_E4[index],
        _ => "??",
    }
}

/// Broadcast language names for the 8-bit language codes of group 1A
/// slow-labelling variant 3. Codes 0x00..=0x7F; gaps are unassigned.
const LANGUAGES: [&str; 128] = [
    "Unknown",
    "Albanian",
    "Breton",
    "Catalan",
    "Croatian",
    "Welsh",
    "Czech",
    "Danish",
    "German",
    "English",
    "Spanish",
    "Esperanto",
    "Estonian",
    "Basque",
    "Faroese",
    "French",
    "Frisian",
    "Irish",
    "Gaelic",
    "Galician",
    "Icelandic",
    "Italian",
    "Lappish",
    "Latin",
    "Latvian",
    "Luxembourgian",
    "Lithuanian",
    "Hungarian",
    "Maltese",
    "Dutch",
    "Norwegian",
    "Occitan",
    "Polish",
    "Portuguese",
    "Romanian",
    "Romansh",
    "Serbian",
    "Slovak",
    "Slovene",
    "Finnish",
    "Swedish",
    "Turkish",
    "Flemish",
    "Walloon",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "Background",
    "",
    "",
    "",
    "",
    "Zulu",
    "Vietnamese",
    "Uzbek",
    "Urdu",
    "Ukrainian",
    "Thai",
    "Telugu",
    "Tatar",
    "Tamil",
    "Tadzhik",
    "Swahili",
    "Sranan Tongo",
    "Somali",
    "Sinhalese",
    "Shona",
    "Serbo-Croat",
    "Ruthenian",
    "Russian",
    "Quechua",
    "Pushtu",
    "Punjabi",
    "Persian",
    "Papamiento",
    "Oriya",
    "Nepali",
    "Ndebele",
    "Marathi",
    "Moldovian",
    "Malaysian",
    "Malagasay",
    "Macedonian",
    "Laotian",
    "Korean",
    "Khmer",
    "Kazakh",
    "Kannada",
    "Japanese",
    "Indonesian",
    "Hindi",
    "Hebrew",
    "Hausa",
    "Gurani",
    "Gujurati",
    "Greek",
    "Georgian",
    "Fulani",
    "Dari",
    "Churash",
    "Chinese",
    "Burmese",
    "Bulgarian",
    "Bengali",
    "Belorussian",
    "Bambora",
    "Azerbaijani",
    "Assamese",
    "Armenian",
    "Arabic",
    "Amharic",
];

/// Language name for an 8-bit language code, or `None` for unassigned codes.
pub fn language_string(code: u8) -> Option<&'static str> {
    LANGUAGES
        .get(code as usize)
        .copied()
        .filter(|name| !name.is_empty())
}

/// Registered Open Data Applications, sorted by application ID.
const ODA_APPS: [(u16, &str); 65] = [
    (0x0000, "None"),
    (0x0093, "Cross referencing DAB within RDS"),
    (0x0BCB, "Leisure & Practical Info for Drivers"),
    (0x0C24, "ELECTRABEL-DSM 7"),
    (0x0CC1, "Wireless Playground broadcast control signal"),
    (0x0D45, "RDS-TMC: ALERT-C / EN ISO 14819-1"),
    (0x0D8B, "ELECTRABEL-DSM 18"),
    (0x0E2C, "ELECTRABEL-DSM 3"),
    (0x0E31, "ELECTRABEL-DSM 13"),
    (0x0F87, "ELECTRABEL-DSM 2"),
    (0x125F, "I-FM-RDS for fixed and mobile devices"),
    (0x1BDA, "ELECTRABEL-DSM 1"),
    (0x1C5E, "ELECTRABEL-DSM 20"),
    (0x1C68, "ITIS In-vehicle data base"),
    (0x1CB1, "ELECTRABEL-DSM 10"),
    (0x1D47, "ELECTRABEL-DSM 4"),
    (0x1DC2, "CITIBUS 4"),
    (0x1DC5, "Encrypted TTI using ALERT-Plus"),
    (0x1E8F, "ELECTRABEL-DSM 17"),
    (0x4400, "RDS-Light"),
    (0x4AA1, "RASANT"),
    (0x4AB7, "ELECTRABEL-DSM 9"),
    (0x4BA2, "ELECTRABEL-DSM 5"),
    (0x4BD7, "RadioText+ (RT+)"),
    (0x4BD8, "RadioText Plus / RT+ for eRT"),
    (0x4C59, "CITIBUS 2"),
    (0x4D87, "Radio Commerce System (RCS)"),
    (0x4D95, "ELECTRABEL-DSM 16"),
    (0x4D9A, "ELECTRABEL-DSM 11"),
    (0x50DD, "To warn people in case of disasters or emergency"),
    (0x5757, "Personal weather station"),
    (0x6363, "Hybradio RDS-Net"),
    (0x6365, "RDS2 - 9 bit AF lists ODA"),
    (0x6552, "Enhanced RadioText (eRT)"),
    (0x6A7A, "Warning receiver"),
    (0x7373, "Enhanced early warning system"),
    (0xA112, "NL Alert system"),
    (0xA911, "Data FM Selective Multipoint Messaging"),
    (0xABCF, "RF Power Monitoring"),
    (0xC350, "NRSC Song Title and Artist"),
    (0xC3A1, "Personal Radio Service"),
    (0xC3B0, "iTunes Tagging"),
    (0xC3C3, "NAVTEQ Traffic Plus"),
    (0xC4D4, "eEAS"),
    (0xC549, "Smart Grid Broadcast Channel"),
    (0xC563, "ID Logic"),
    (0xC6A7, "Veil Enabled Interactive Device"),
    (0xC737, "Utility Message Channel (UMC)"),
    (0xCB73, "CITIBUS 1"),
    (0xCB97, "ELECTRABEL-DSM 14"),
    (0xCC21, "CITIBUS 3"),
    (0xCD46, "RDS-TMC: ALERT-C"),
    (0xCD47, "RDS-TMC: ALERT-C"),
    (0xCD9E, "ELECTRABEL-DSM 8"),
    (0xCE6B, "Encrypted TTI using ALERT-Plus"),
    (0xE123, "APS Gateway"),
    (0xE1C1, "Action code"),
    (0xE319, "ELECTRABEL-DSM 12"),
    (0xE411, "Beacon downlink"),
    (0xE440, "ELECTRABEL-DSM 15"),
    (0xE4A6, "ELECTRABEL-DSM 19"),
    (0xE5D7, "ELECTRABEL-DSM 6"),
    (0xE911, "EAS open protocol"),
    (0xFF7F, "RFT: Station logo"),
    (0xFF80, "RFT+ (work title)"),
];

/// Name of an Open Data Application by its 16-bit AID.
pub fn app_name(app_id: u16) -> &'static str {
    match ODA_APPS.binary_search_by_key(&app_id, |&(id, _)| id) {
        Ok(index) => ODA_APPS[index].1,
        Err(_) => "(Unknown)",
    }
}

/// RadioText+ content type labels for the 6-bit content-type codes.
const RTPLUS_CONTENT_TYPES: [&str; 64] = [
    "dummy_class",
    "item.title",
    "item.album",
    "item.tracknumber",
    "item.artist",
    "item.composition",
    "item.movement",
    "item.conductor",
    "item.composer",
    "item.band",
    "item.comment",
    "item.genre",
    "info.news",
    "info.news.local",
    "info.stockmarket",
    "info.sport",
    "info.lottery",
    "info.horoscope",
    "info.daily_diversion",
    "info.health",
    "info.event",
    "info.scene",
    "info.cinema",
    "info.tv",
    "info.date_time",
    "info.weather",
    "info.traffic",
    "info.alarm",
    "info.advertisement",
    "info.url",
    "info.other",
    "stationname.short",
    "stationname.long",
    "programme.now",
    "programme.next",
    "programme.part",
    "programme.host",
    "programme.editorial_staff",
    "programme.frequency",
    "programme.homepage",
    "programme.subchannel",
    "phone.hotline",
    "phone.studio",
    "phone.other",
    "sms.studio",
    "sms.other",
    "email.hotline",
    "email.studio",
    "email.other",
    "mms.other",
    "chat",
    "chat.centre",
    "vote.question",
    "vote.centre",
    "unknown",
    "unknown",
    "place",
    "appointment",
    "identifier",
    "purchase",
    "get_data",
    "unknown",
    "unknown",
    "unknown",
];

/// RadioText+ content type label for a 6-bit code.
pub fn rtplus_content_type(code: u16) -> &'static str {
    RTPLUS_CONTENT_TYPES[(code & 0x3F) as usize]
}

/// DAB channel labels by ensemble frequency in kHz (ETSI EN 301 700).
const DAB_CHANNELS: [(u32, &str); 61] = [
    (174928, "5A"),
    (176640, "5B"),
    (178352, "5C"),
    (180064, "5D"),
    (181936, "6A"),
    (183648, "6B"),
    (185360, "6C"),
    (187072, "6D"),
    (188928, "7A"),
    (190640, "7B"),
    (192352, "7C"),
    (194064, "7D"),
    (195936, "8A"),
    (197648, "8B"),
    (199360, "8C"),
    (201072, "8D"),
    (202928, "9A"),
    (204640, "9B"),
    (206352, "9C"),
    (208064, "9D"),
    (209936, "10A"),
    (211648, "10B"),
    (213360, "10C"),
    (215072, "10D"),
    (216928, "11A"),
    (218640, "11B"),
    (220352, "11C"),
    (222064, "11D"),
    (223936, "12A"),
    (225648, "12B"),
    (227360, "12C"),
    (229072, "12D"),
    (230784, "13A"),
    (232496, "13B"),
    (234208, "13C"),
    (235776, "13D"),
    (237488, "13E"),
    (239200, "13F"),
    (1452960, "LA"),
    (1454672, "LB"),
    (1456384, "LC"),
    (1458096, "LD"),
    (1459808, "LE"),
    (1461520, "LF"),
    (1463232, "LG"),
    (1464944, "LH"),
    (1466656, "LI"),
    (1468368, "LJ"),
    (1470080, "LK"),
    (1471792, "LL"),
    (1473504, "LM"),
    (1475216, "LN"),
    (1476928, "LO"),
    (1478640, "LP"),
    (1480352, "LQ"),
    (1482064, "LR"),
    (1483776, "LS"),
    (1485488, "LT"),
    (1487200, "LU"),
    (1488912, "LV"),
    (1490624, "LW"),
];

/// DAB channel label for an ensemble frequency in kHz, if it falls on a
/// standard channel raster.
pub fn dab_channel(khz: u32) -> Option<&'static str> {
    DAB_CHANNELS
        .binary_search_by_key(&khz, |&(f, _)| f)
        .ok()
        .map(|index| DAB_CHANNELS[index].1)
}

/// Derive a North American callsign from a PI code (NRSC-4 Annex D).
///
/// Returns `None` when the PI is outside the callsign ranges. PIs in the
/// 0x1000 prefix range produce valid-looking but uncertain callsigns; the
/// caller distinguishes them via `(pi & 0xF000) == 0x1000`.
pub fn callsign_from_pi(pi: u16) -> Option<String> {
    let mut pi = pi as u32;

    // AFxx and Axxy are compressed encodings of smaller PI values
    if pi >> 8 == 0xAF {
        pi = (pi & 0xFF) << 8;
    }
    if pi >> 12 == 0xA {
        pi = ((pi & 0xF00) << 4) | (pi & 0xFF);
    }

    let (prefix, base) = if (4096..21672).contains(&pi) {
        ('K', pi - 4096)
    } else if (21672..=39247).contains(&pi) {
        ('W', pi - 21672)
    } else {
        return None;
    };

    let letter = |n: u32| (b'A' + (n % 26) as u8) as char;
    Some(format!(
        "{}{}{}{}",
        prefix,
        letter(base / 676),
        letter(base / 26),
        letter(base)
    ))
}

/// Decode one code point of the RDS basic character set.
///
/// Covers the printable ASCII-compatible subset plus the code points where
/// the basic set deviates from ASCII; everything else renders as a space.
/// The full EBU-Latin table (accented block 0x80..0xFF) is supplied by the
/// embedding environment when needed; this signature is the contract.
pub fn decode_rds_char(code: u8) -> char {
    match code {
        0x24 => '¤',
        0x5E => '―',
        0x60 => '‖',
        0x7E => '¯',
        0x20..=0x7D => code as char,
        _ => ' ',
    }
}
