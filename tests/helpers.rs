//! Test helpers for synthesizing RDS block streams.

use fmrds::block_sync::calculate_syndrome;

/// Offset words from IEC 62106:2015 table B.1.
pub const OFFSET_WORD_A: u32 = 0b0011111100;
pub const OFFSET_WORD_B: u32 = 0b0110011000;
pub const OFFSET_WORD_C: u32 = 0b0101101000;
pub const OFFSET_WORD_D: u32 = 0b0110110100;

/// Encode a 16-bit payload into a valid 26-bit block for the given offset
/// word, by searching the 1024 possible checkwords for the one whose
/// syndrome matches.
pub fn encode_block(data: u16, offset_word: u32) -> u32 {
    let target = calculate_syndrome(offset_word);
    let data_part = (data as u32) << 10;
    let needed = calculate_syndrome(data_part) ^ target;
    (0u32..1024)
        .find(|&checkword| calculate_syndrome(checkword) == needed)
        .map(|checkword| data_part | checkword)
        .expect("a checkword exists for every syndrome")
}

/// Encode a full group as a 104-bit sequence, MSB first.
pub fn group_bits(pi: u16, block2: u16, block3: u16, block4: u16) -> Vec<bool> {
    let words = [
        encode_block(pi, OFFSET_WORD_A),
        encode_block(block2, OFFSET_WORD_B),
        encode_block(block3, OFFSET_WORD_C),
        encode_block(block4, OFFSET_WORD_D),
    ];
    words
        .iter()
        .flat_map(|&word| (0..26).rev().map(move |i| (word >> i) & 1 != 0))
        .collect()
}
