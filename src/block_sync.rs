//! Block synchronization and burst-error correction.
//!
//! The bit stream carries no framing other than the offset words folded into
//! each block's checkword. [`BlockStream`] slides a 26-bit register over the
//! incoming bits, recognizes blocks by their syndrome, locks onto the
//! repeating A B C D rhythm, and corrects short burst errors against the
//! offset expected at each position (IEC 62106 annex B).

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::{debug, trace};

use crate::group::{
    block_number_for_offset, next_offset, Block, Group, Offset,
};
use crate::options::Options;
use crate::util::{RunningAverage, RunningSum};

pub const BLOCK_LENGTH: usize = 26;
const BLOCK_BITMASK: u32 = (1 << BLOCK_LENGTH) - 1;
const CHECKWORD_LENGTH: usize = 10;

/// Groups averaged for the block error rate attached to emitted groups.
const NUM_BLER_AVERAGE_GROUPS: usize = 12;

/// Offset words, 10 bits each (IEC 62106:2015 table B.1).
const OFFSET_WORDS: [(Offset, u32); 5] = [
    (Offset::A, 0b0011111100),
    (Offset::B, 0b0110011000),
    (Offset::C, 0b0101101000),
    (Offset::Cprime, 0b1101010000),
    (Offset::D, 0b0110110100),
];

/// Parity-check matrix of the (26,16) shortened cyclic code, one 10-bit row
/// per received bit, first-transmitted bit first (EN 50067:1998 B.1.1).
const PARITY_CHECK_MATRIX: [u16; 26] = [
    0b1000000000,
    0b0100000000,
    0b0010000000,
    0b0001000000,
    0b0000100000,
    0b0000010000,
    0b0000001000,
    0b0000000100,
    0b0000000010,
    0b0000000001,
    0b1011011100,
    0b0101101110,
    0b0010110111,
    0b1010000111,
    0b1110011111,
    0b1100010011,
    0b1101010101,
    0b1101110110,
    0b0110111011,
    0b1000000001,
    0b1111011100,
    0b0111101110,
    0b0011110111,
    0b1010100111,
    0b1110001111,
    0b1100011011,
];

/// Multiply a 26-bit block by the parity-check matrix over GF(2).
pub fn calculate_syndrome(vec: u32) -> u16 {
    let mut result: u16 = 0;
    for k in 0..BLOCK_LENGTH {
        if (vec >> k) & 1 != 0 {
            result ^= PARITY_CHECK_MATRIX[BLOCK_LENGTH - 1 - k];
        }
    }
    result
}

/// The offset whose error-free blocks produce this syndrome
/// (IEC 62106:2015 table B.2).
pub fn offset_for_syndrome(syndrome: u16) -> Offset {
    match syndrome {
        0b1111011000 => Offset::A,
        0b1111010100 => Offset::B,
        0b1001011100 => Offset::C,
        0b1111001100 => Offset::Cprime,
        0b1001011000 => Offset::D,
        _ => Offset::Invalid,
    }
}

/// Map of (syndrome, expected offset) to the error vector that caused it,
/// precomputed for every 1-bit and 2-bit burst at every shift.
fn error_lookup_table() -> &'static HashMap<(u16, Offset), u32> {
    static TABLE: OnceLock<HashMap<(u16, Offset), u32>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = HashMap::new();
        for &(offset, offset_word) in &OFFSET_WORDS {
            // Correction is restricted to bursts spanning one or two bits;
            // anything longer costs more miscorrections than it repairs
            for error_bits in [0b1u32, 0b11u32] {
                for shift in 0..BLOCK_LENGTH {
                    let error_vector = (error_bits << shift) & BLOCK_BITMASK;
                    let syndrome = calculate_syndrome(error_vector ^ offset_word);
                    table.entry((syndrome, offset)).or_insert(error_vector);
                }
            }
        }
        table
    })
}

/// Attempt to correct a 1- or 2-bit burst in `raw` assuming it sits at the
/// position marked by `expected_offset`. Returns the corrected 26 bits.
pub fn correct_burst_errors(raw: u32, expected_offset: Offset) -> Option<u32> {
    let syndrome = calculate_syndrome(raw);
    error_lookup_table()
        .get(&(syndrome, expected_offset))
        .map(|error_vector| raw ^ error_vector)
}

/// A valid block sighting while hunting for sync.
#[derive(Clone, Copy)]
struct SyncPulse {
    offset: Offset,
    bitcount: i64,
}

impl Default for SyncPulse {
    fn default() -> Self {
        Self {
            offset: Offset::Invalid,
            bitcount: -1,
        }
    }
}

/// History of the last four sync pulses.
///
/// Sync is declared when two pulses sit a whole number of blocks apart (at
/// most six) and their offsets are consistent with that distance modulo the
/// four-block group cycle.
struct SyncPulseBuffer {
    pulses: [SyncPulse; 4],
}

impl SyncPulseBuffer {
    fn new() -> Self {
        Self {
            pulses: [SyncPulse::default(); 4],
        }
    }

    fn push(&mut self, offset: Offset, bitcount: i64) {
        self.pulses.rotate_left(1);
        self.pulses[3] = SyncPulse { offset, bitcount };
    }

    fn is_sequence_found(&self) -> bool {
        let newest = &self.pulses[3];
        self.pulses[..3].iter().any(|prev| {
            if prev.offset == Offset::Invalid {
                return false;
            }
            let distance = newest.bitcount - prev.bitcount;
            if distance % BLOCK_LENGTH as i64 != 0 || distance / (BLOCK_LENGTH as i64) > 6 {
                return false;
            }
            let blocks_apart = (distance / BLOCK_LENGTH as i64) as usize;
            (block_number_for_offset(prev.offset) as usize + blocks_apart) % 4
                == block_number_for_offset(newest.offset) as usize
        })
    }
}

/// Synchronizer and error corrector: bits in, groups out.
pub struct BlockStream {
    bitcount: i64,
    num_bits_until_next_block: usize,
    input_register: u32,
    expected_offset: Offset,
    is_in_sync: bool,
    block_error_sum: RunningSum<50>,
    bler_average: RunningAverage<NUM_BLER_AVERAGE_GROUPS>,
    sync_buffer: SyncPulseBuffer,
    current_group: Group,
    ready_group: Option<Group>,
    num_bits_since_sync_lost: usize,
    attach_bler: bool,
}

impl BlockStream {
    pub fn new(options: &Options) -> Self {
        Self {
            bitcount: 0,
            num_bits_until_next_block: 1,
            input_register: 0,
            expected_offset: Offset::A,
            is_in_sync: false,
            block_error_sum: RunningSum::new(),
            bler_average: RunningAverage::new(),
            sync_buffer: SyncPulseBuffer::new(),
            current_group: Group::new(),
            ready_group: None,
            num_bits_since_sync_lost: 0,
            attach_bler: options.bler,
        }
    }

    /// Feed one bit, MSB first in transmission order.
    pub fn push_bit(&mut self, bit: bool) {
        self.input_register = (self.input_register << 1) | bit as u32;
        self.num_bits_until_next_block -= 1;
        self.bitcount += 1;

        if self.num_bits_until_next_block == 0 {
            self.find_block_in_input_register();
            self.num_bits_until_next_block = if self.is_in_sync { BLOCK_LENGTH } else { 1 };
        }
    }

    pub fn has_group_ready(&self) -> bool {
        self.ready_group.is_some()
    }

    /// Take the completed group, if one is waiting.
    pub fn pop_group(&mut self) -> Option<Group> {
        self.ready_group.take()
    }

    /// The partially assembled group, for flushing at end of input.
    pub fn flush_current_group(&self) -> Group {
        self.current_group.clone()
    }

    pub fn is_in_sync(&self) -> bool {
        self.is_in_sync
    }

    pub fn num_bits_since_sync_lost(&self) -> usize {
        self.num_bits_since_sync_lost
    }

    fn find_block_in_input_register(&mut self) {
        let raw = self.input_register & BLOCK_BITMASK;
        let mut block = Block {
            raw,
            data: (raw >> CHECKWORD_LENGTH) as u16,
            offset: offset_for_syndrome(calculate_syndrome(raw)),
            is_received: false,
            had_errors: false,
        };

        self.acquire_sync(&block);

        if !self.is_in_sync {
            return;
        }

        if self.expected_offset == Offset::C && block.offset == Offset::Cprime {
            self.expected_offset = Offset::Cprime;
        }

        block.had_errors = block.offset != self.expected_offset;
        self.block_error_sum.push(block.had_errors);

        if block.had_errors {
            if let Some(corrected) = correct_burst_errors(block.raw, self.expected_offset) {
                block.raw = corrected;
                block.data = (corrected >> CHECKWORD_LENGTH) as u16;
                block.offset = self.expected_offset;
                trace!(
                    offset = ?self.expected_offset,
                    "corrected burst error"
                );
            } else {
                self.handle_uncorrectable_error();
            }
        }

        // Error-free block received, or errors successfully corrected
        if block.offset == self.expected_offset {
            block.is_received = true;
            self.current_group
                .set_block(block_number_for_offset(self.expected_offset), block);
        }

        self.expected_offset = next_offset(self.expected_offset);

        if self.expected_offset == Offset::A {
            self.handle_newly_received_group();
        }
    }

    fn acquire_sync(&mut self, block: &Block) {
        if self.is_in_sync {
            return;
        }

        self.num_bits_since_sync_lost += 1;

        if block.offset == Offset::Invalid {
            return;
        }

        self.sync_buffer.push(block.offset, self.bitcount);

        if self.sync_buffer.is_sequence_found() {
            debug!(offset = ?block.offset, bit = self.bitcount, "sync acquired");
            self.is_in_sync = true;
            self.expected_offset = block.offset;
            self.current_group = Group::new();
            self.num_bits_since_sync_lost = 0;
        }
    }

    fn handle_uncorrectable_error(&mut self) {
        // Sync is dropped when more than 45 of the last 50 blocks errored
        // (EN 50067:1998 C.1.2)
        if self.is_in_sync && self.block_error_sum.sum() > 45 {
            debug!("sync lost");
            self.is_in_sync = false;
            self.block_error_sum.clear();
        }
    }

    fn handle_newly_received_group(&mut self) {
        let mut group = std::mem::take(&mut self.current_group);
        self.bler_average
            .push(100.0 * group.num_errors() as f32 / 4.0);
        if self.attach_bler {
            group.set_average_bler(self.bler_average.average());
        }
        self.ready_group = Some(group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{Block2, Block4};

    const SYNDROME_A: u16 = 0b1111011000;
    const SYNDROME_B: u16 = 0b1111010100;
    const SYNDROME_D: u16 = 0b1001011000;

    /// Encode a 16-bit payload into a valid 26-bit block for an offset, by
    /// searching the 1024 possible checkwords.
    fn encode_block(data: u16, offset: Offset) -> u32 {
        let target = OFFSET_WORDS
            .iter()
            .find(|&&(o, _)| o == offset)
            .map(|&(_, word)| calculate_syndrome(word))
            .unwrap();
        let data_part = (data as u32) << CHECKWORD_LENGTH;
        let needed = calculate_syndrome(data_part) ^ target;
        (0u32..1024)
            .find(|&checkword| calculate_syndrome(checkword) == needed)
            .map(|checkword| data_part | checkword)
            .expect("a checkword exists for every syndrome")
    }

    fn push_word(stream: &mut BlockStream, word: u32) {
        for i in (0..26).rev() {
            stream.push_bit((word >> i) & 1 != 0);
        }
    }

    fn group_words(pi: u16, block2: u16, block3: u16, block4: u16) -> [u32; 4] {
        [
            encode_block(pi, Offset::A),
            encode_block(block2, Offset::B),
            encode_block(block3, Offset::C),
            encode_block(block4, Offset::D),
        ]
    }

    #[test]
    fn test_syndrome_of_offset_words() {
        assert_eq!(calculate_syndrome(0b0011111100), SYNDROME_A);
        assert_eq!(calculate_syndrome(0b0110011000), SYNDROME_B);
        assert_eq!(calculate_syndrome(0b0110110100), SYNDROME_D);
    }

    #[test]
    fn test_syndrome_of_encoded_blocks() {
        // Syndrome of any valid block equals its offset's syndrome
        for data in [0x0000u16, 0xD3C2, 0xFFFF, 0x1234] {
            for &(offset, word) in &OFFSET_WORDS {
                let block = encode_block(data, offset);
                assert_eq!(
                    calculate_syndrome(block),
                    calculate_syndrome(word),
                    "data {:04X} offset {:?}",
                    data,
                    offset
                );
                assert_eq!(offset_for_syndrome(calculate_syndrome(block)), offset);
            }
        }
    }

    #[test]
    fn test_burst_error_correction() {
        let original = encode_block(0xD3C2, Offset::B);
        for shift in 0..25 {
            // Two adjacent flipped bits at every position
            let corrupted = original ^ (0b11 << shift);
            let corrected = correct_burst_errors(corrupted, Offset::B);
            assert_eq!(
                corrected,
                Some(original),
                "2-bit burst at shift {} should correct",
                shift
            );
        }
        for shift in 0..26 {
            let corrupted = original ^ (0b1 << shift);
            assert_eq!(correct_burst_errors(corrupted, Offset::B), Some(original));
        }
    }

    #[test]
    fn test_correction_restores_data_bits() {
        // Bits 3 and 4 land in the checkword region; flips in the data
        // region must also restore the payload
        let original = encode_block(0xABCD, Offset::C);
        let corrupted = original ^ (0b11 << 18);
        let corrected = correct_burst_errors(corrupted, Offset::C).unwrap();
        assert_eq!((corrected >> 10) as u16, 0xABCD);
    }

    #[test]
    fn test_sync_and_group_emission() {
        let mut stream = BlockStream::new(&Options::default());
        let words = group_words(0xD3C2, 0x0400, 0xE0E1, 0x4D44);

        // First group acquires sync, second decodes fully
        for _ in 0..2 {
            for &word in &words {
                push_word(&mut stream, word);
            }
        }

        assert!(stream.is_in_sync());
        let group = stream.pop_group().expect("group after two full cycles");
        assert!(group.has_pi());
        assert_eq!(group.pi(), 0xD3C2);
        assert_eq!(group.block4(), 0x4D44);
    }

    #[test]
    fn test_sync_survives_leading_junk() {
        // Sync must land on the same groups regardless of junk prefix
        let words = group_words(0xD3C2, 0x2000, 0x4461, 0x7320);

        for junk_len in [0usize, 1, 7, 25] {
            let mut stream = BlockStream::new(&Options::default());
            for _ in 0..junk_len {
                stream.push_bit(false);
            }
            let mut received = Vec::new();
            for _ in 0..3 {
                for &word in &words {
                    push_word(&mut stream, word);
                    if let Some(group) = stream.pop_group() {
                        if group.has_pi() {
                            received.push(group.pi());
                        }
                    }
                }
            }
            assert!(
                received.iter().all(|&pi| pi == 0xD3C2),
                "junk prefix {} corrupted groups",
                junk_len
            );
            assert!(
                !received.is_empty(),
                "no groups received with junk prefix {}",
                junk_len
            );
        }
    }

    #[test]
    fn test_corrupted_block_still_decodes_group() {
        let mut stream = BlockStream::new(&Options::default());
        let mut words = group_words(0xD3C2, 0x0400, 0xE0E1, 0x4D44);

        for &word in &words {
            push_word(&mut stream, word);
        }
        // Flip bits 3 and 4 of block 2 in the second group
        words[1] ^= 0b11 << 3;
        for &word in &words {
            push_word(&mut stream, word);
        }

        let group = stream.pop_group().expect("corrected group");
        assert_eq!(
            group.block2(),
            0x0400,
            "burst error in the checkword must not alter the payload"
        );
        assert!(group.has(Block2));
    }

    #[test]
    fn test_uncorrectable_block_leaves_slot_empty() {
        let mut stream = BlockStream::new(&Options::default());
        let mut words = group_words(0xD3C2, 0x0400, 0xE0E1, 0x4D44);

        for &word in &words {
            push_word(&mut stream, word);
        }
        // A scattered 3-bit error is beyond the burst corrector
        words[3] ^= 0x2021;
        for &word in &words {
            push_word(&mut stream, word);
        }

        let group = stream.pop_group().expect("group still emitted");
        assert!(group.has_pi());
        assert!(!group.has(Block4), "uncorrectable block is not received");
    }

    #[test]
    fn test_bler_attached_when_enabled() {
        let options = Options {
            bler: true,
            ..Options::default()
        };
        let mut stream = BlockStream::new(&options);
        let words = group_words(0xD3C2, 0x0400, 0xE0E1, 0x4D44);
        for _ in 0..3 {
            for &word in &words {
                push_word(&mut stream, word);
            }
        }
        let group = stream.pop_group().unwrap();
        assert!(group.bler().is_some());
    }
}
