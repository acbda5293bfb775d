//! Blocks, group types, and assembled groups.
//!
//! An RDS group is four 26-bit blocks; after checkword stripping each block
//! carries 16 payload bits. Block position within the group is identified by
//! the offset word the checkword was XORed with, and version-B groups repeat
//! the PI code in block 3 under the C′ offset.

use chrono::{DateTime, Utc};

use crate::util::{bits, hex_string};

/// Offset words identify a block's position within the group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Offset {
    A,
    B,
    C,
    Cprime,
    D,
    Invalid,
}

/// Block positions within a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BlockNumber {
    Block1 = 0,
    Block2 = 1,
    Block3 = 2,
    Block4 = 3,
}

pub use BlockNumber::{Block1, Block2, Block3, Block4};

/// The block number an offset word stands for. C and C′ both mark block 3.
pub fn block_number_for_offset(offset: Offset) -> BlockNumber {
    match offset {
        Offset::A => Block1,
        Offset::B => Block2,
        Offset::C | Offset::Cprime => Block3,
        Offset::D => Block4,
        Offset::Invalid => Block1,
    }
}

/// The offset expected after `offset` in the A → B → C|C′ → D cycle.
pub fn next_offset(offset: Offset) -> Offset {
    match offset {
        Offset::A => Offset::B,
        Offset::B => Offset::C,
        Offset::C | Offset::Cprime => Offset::D,
        Offset::D => Offset::A,
        Offset::Invalid => Offset::A,
    }
}

/// One 26-bit block as it came off the air.
#[derive(Clone, Copy, Debug)]
pub struct Block {
    /// The full 26 received bits.
    pub raw: u32,
    /// The 16 payload bits after checkword stripping.
    pub data: u16,
    pub offset: Offset,
    pub is_received: bool,
    pub had_errors: bool,
}

impl Default for Block {
    fn default() -> Self {
        Self {
            raw: 0,
            data: 0,
            offset: Offset::Invalid,
            is_received: false,
            had_errors: false,
        }
    }
}

/// Group type version: A (PI once) or B (PI repeated in block 3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    A,
    B,
}

/// A group type code such as 0A or 15B.
///
/// Ordered lexicographically over (number, version) so it can key the ODA
/// routing map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupType {
    pub number: u16,
    pub version: Version,
}

impl GroupType {
    /// Build from the 5-bit type code in block 2 bits 11..15: four bits of
    /// group number and the version bit.
    pub fn from_code(type_code: u16) -> Self {
        Self {
            number: (type_code >> 1) & 0xF,
            version: if type_code & 0x1 == 0 {
                Version::A
            } else {
                Version::B
            },
        }
    }
}

impl std::fmt::Display for GroupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            self.number,
            if self.version == Version::A { "A" } else { "B" }
        )
    }
}

/// Four blocks assembled into one group, with derived metadata.
#[derive(Clone, Debug, Default)]
pub struct Group {
    blocks: [Block; 4],
    group_type: Option<GroupType>,
    has_c_prime: bool,
    no_offsets: bool,
    bler: Option<f32>,
    rx_time: Option<DateTime<Utc>>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a block, updating the derived group type.
    ///
    /// The type lives in block 2 bits 11..15. For version-B groups the type
    /// only becomes trustworthy once the C′ offset confirms the version,
    /// unless offsets were disabled because the source was already
    /// synchronized (hex input). A 15B group missing block 2 can still
    /// reveal its type through block 4, which repeats block 2's content.
    pub fn set_block(&mut self, block_num: BlockNumber, block: Block) {
        self.blocks[block_num as usize] = block;

        if block.offset == Offset::Cprime {
            self.has_c_prime = true;
        }

        match block_num {
            Block2 => {
                let group_type = GroupType::from_code(bits(block.data, 11, 5));
                let confirmed = group_type.version == Version::A
                    || self.has_c_prime
                    || self.no_offsets;
                self.group_type = confirmed.then_some(group_type);
            }
            Block4 => {
                if self.has_c_prime && self.group_type.is_none() {
                    let potential = GroupType::from_code(bits(block.data, 11, 5));
                    if potential.number == 15 && potential.version == Version::B {
                        self.group_type = Some(potential);
                    }
                }
            }
            _ => {}
        }

        if block.offset == Offset::Cprime && self.has(Block2) {
            let tentative = GroupType::from_code(bits(self.block2(), 11, 5));
            self.group_type = (tentative.version == Version::B).then_some(tentative);
        }
    }

    /// Mark the group as coming from an already-synchronized source, so
    /// version-B detection does not wait for a C′ offset.
    pub fn disable_offsets(&mut self) {
        self.no_offsets = true;
    }

    pub fn has(&self, block_num: BlockNumber) -> bool {
        self.blocks[block_num as usize].is_received
    }

    pub fn is_empty(&self) -> bool {
        !self.blocks.iter().any(|block| block.is_received)
    }

    pub fn block(&self, block_num: BlockNumber) -> u16 {
        self.blocks[block_num as usize].data
    }

    pub fn block1(&self) -> u16 {
        self.block(Block1)
    }

    pub fn block2(&self) -> u16 {
        self.block(Block2)
    }

    pub fn block3(&self) -> u16 {
        self.block(Block3)
    }

    pub fn block4(&self) -> u16 {
        self.block(Block4)
    }

    /// PI is carried in block 1, and duplicated in block 3 under C′ for
    /// version-B groups.
    pub fn has_pi(&self) -> bool {
        self.blocks[Block1 as usize].is_received
            || (self.blocks[Block3 as usize].is_received
                && self.blocks[Block3 as usize].offset == Offset::Cprime)
    }

    /// Check [`Self::has_pi`] first.
    pub fn pi(&self) -> u16 {
        if self.blocks[Block1 as usize].is_received {
            self.block1()
        } else if self.blocks[Block3 as usize].is_received
            && self.blocks[Block3 as usize].offset == Offset::Cprime
        {
            self.block3()
        } else {
            0x0000
        }
    }

    pub fn group_type(&self) -> Option<GroupType> {
        self.group_type
    }

    /// Blocks that were lost or arrived with errors.
    pub fn num_errors(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| block.had_errors || !block.is_received)
            .count()
    }

    pub fn set_average_bler(&mut self, bler: f32) {
        self.bler = Some(bler);
    }

    pub fn bler(&self) -> Option<f32> {
        self.bler
    }

    pub fn set_rx_time(&mut self, time: DateTime<Utc>) {
        self.rx_time = Some(time);
    }

    pub fn rx_time(&self) -> Option<DateTime<Utc>> {
        self.rx_time
    }

    /// Raw group data as hex, RDS Spy style; missing blocks render as
    /// `----`.
    pub fn hex(&self) -> String {
        self.blocks
            .iter()
            .map(|block| {
                if block.is_received {
                    hex_string(block.data as u32, 4)
                } else {
                    "----".to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
