//! The per-channel decoding pipeline: bits to records.
//!
//! A [`Pipeline`] owns one [`BlockStream`] and one [`Station`] per PI code
//! seen on its channel. Stations are created on first sight and live for the
//! whole session. Groups that arrive without any PI (both carrying blocks
//! lost) are routed to the most recently seen station, whose own gating
//! decides whether to trust them.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::block_sync::BlockStream;
use crate::group::{Block, Block1, Block2, Block3, Block4, Group, Offset};
use crate::options::Options;
use crate::output::RecordSink;
use crate::station::Station;
use crate::tmc::EventCatalog;

/// One input channel's full decoding chain.
pub struct Pipeline {
    options: Options,
    which_channel: usize,
    block_stream: BlockStream,
    stations: HashMap<u16, Station>,
    last_pi: Option<u16>,
    tmc_catalog: Arc<EventCatalog>,
}

impl Pipeline {
    pub fn new(options: &Options, which_channel: usize, tmc_catalog: Arc<EventCatalog>) -> Self {
        Self {
            options: options.clone(),
            which_channel,
            block_stream: BlockStream::new(options),
            stations: HashMap::new(),
            last_pi: None,
            tmc_catalog,
        }
    }

    /// Feed one demodulated bit; emits at most one record.
    pub fn push_bit(&mut self, bit: bool, sink: &mut dyn RecordSink) {
        self.block_stream.push_bit(bit);
        if let Some(group) = self.block_stream.pop_group() {
            self.handle_group(group, sink);
        }
    }

    /// Feed a pre-synchronized group of four block words, e.g. from
    /// hex-format input. `None` marks a block that was not received.
    pub fn push_group(&mut self, blocks: [Option<u16>; 4], sink: &mut dyn RecordSink) {
        let mut group = Group::new();
        group.disable_offsets();

        let positions = [
            (Block1, Offset::A),
            (Block2, Offset::B),
            (Block3, Offset::C),
            (Block4, Offset::D),
        ];
        for (i, &(block_num, offset)) in positions.iter().enumerate() {
            if let Some(data) = blocks[i] {
                group.set_block(
                    block_num,
                    Block {
                        raw: (data as u32) << 10,
                        data,
                        offset,
                        is_received: true,
                        had_errors: false,
                    },
                );
            }
        }

        self.handle_group(group, sink);
    }

    pub fn is_in_sync(&self) -> bool {
        self.block_stream.is_in_sync()
    }

    pub fn num_bits_since_sync_lost(&self) -> usize {
        self.block_stream.num_bits_since_sync_lost()
    }

    fn handle_group(&mut self, mut group: Group, sink: &mut dyn RecordSink) {
        if self.options.timestamp {
            group.set_rx_time(Utc::now());
        }

        let pi = if group.has_pi() {
            self.last_pi = Some(group.pi());
            Some(group.pi())
        } else {
            self.last_pi
        };

        if let Some(pi) = pi {
            let Self {
                stations,
                options,
                which_channel,
                tmc_catalog,
                ..
            } = self;
            let station = stations
                .entry(pi)
                .or_insert_with(|| Station::new(pi, options, *which_channel, tmc_catalog.clone()));
            station.update_and_print(&group, sink);
        }
    }
}
