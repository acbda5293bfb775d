//! Alternative-frequency lists (group 0A, EON variant 4).
//!
//! AF codes are one byte each, two per group, and stations repeat the list
//! cyclically. Lists come in two shapes: Method A is a flat list of
//! frequencies; Method B is a list of (tuned, alternative) pairs where the
//! pair order distinguishes same-programme alternatives from regional
//! variants. Which method is in use is never signalled explicitly and has to
//! be inferred from the received list.

use std::collections::HashSet;

/// Frequency bands an AF code can address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    Fm,
    LfMf,
}

/// A single AF code interpreted in a band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CarrierFrequency {
    code: u16,
    band: Band,
}

impl CarrierFrequency {
    pub fn new(code: u16, band: Band) -> Self {
        Self { code, band }
    }

    /// Whether the code addresses an actual carrier in its band.
    pub fn is_valid(&self) -> bool {
        match self.band {
            Fm => (1..=204).contains(&self.code),
            LfMf => (1..=135).contains(&self.code),
        }
    }

    /// Carrier frequency in kHz.
    ///
    /// FM: 87.5 MHz + 100 kHz × code. LF: 153 kHz + 9 kHz steps for codes
    /// 1..=15; MF: 531 kHz + 9 kHz steps for codes 16..=135.
    pub fn khz(&self) -> u32 {
        match self.band {
            Fm => 87_500 + 100 * self.code as u32,
            LfMf => {
                if self.code <= 15 {
                    153 + 9 * (self.code as u32 - 1)
                } else {
                    531 + 9 * (self.code as u32 - 16)
                }
            }
        }
    }
}

use Band::{Fm, LfMf};

/// The filler code transmitted to pad out an odd slot.
const AF_CODE_FILLER: u16 = 205;
/// Codes 224..=249 announce how many frequencies follow.
const AF_CODE_NUM_AFS_BASE: u16 = 224;
const AF_CODE_NUM_AFS_MAX: u16 = 249;
/// The next code after this one is an LF/MF frequency.
const AF_CODE_LFMF_FOLLOWS: u16 = 250;

/// The classification of a completed list.
#[derive(Debug, PartialEq, Eq)]
pub enum AfList {
    /// Flat list of alternative frequencies, kHz.
    MethodA(Vec<u32>),
    /// Tuned frequency plus paired alternatives, kHz.
    MethodB {
        tuned_frequency: u32,
        same_programme: Vec<u32>,
        regional_variants: Vec<u32>,
    },
}

/// Accumulator for one station's AF codes.
pub struct AltFreqList {
    alt_freqs: [u32; 25],
    num_expected: usize,
    num_received: usize,
    lf_mf_follows: bool,
}

impl AltFreqList {
    pub fn new() -> Self {
        Self {
            alt_freqs: [0; 25],
            num_expected: 0,
            num_received: 0,
            lf_mf_follows: false,
        }
    }

    /// Feed one AF code.
    pub fn insert(&mut self, af_code: u16) {
        let band = if self.lf_mf_follows { LfMf } else { Fm };
        self.lf_mf_follows = false;

        let freq = CarrierFrequency::new(af_code, band);
        if freq.is_valid() && self.num_received < self.alt_freqs.len() {
            self.alt_freqs[self.num_received] = freq.khz();
            self.num_received += 1;
        } else if (AF_CODE_NUM_AFS_BASE..=AF_CODE_NUM_AFS_MAX).contains(&af_code) {
            self.num_expected = (af_code - AF_CODE_NUM_AFS_BASE) as usize;
        } else if af_code == AF_CODE_LFMF_FOLLOWS {
            self.lf_mf_follows = true;
        } else if af_code == AF_CODE_FILLER {
            // padding, no content
        }
    }

    pub fn is_complete(&self) -> bool {
        self.num_expected == self.num_received && self.num_expected > 0
    }

    /// Frequencies received so far, kHz, in arrival order.
    pub fn raw_list(&self) -> &[u32] {
        &self.alt_freqs[..self.num_received]
    }

    /// Whether the received list has Method B shape: an odd count of at
    /// least three entries where the first (tuned) frequency anchors every
    /// following pair.
    pub fn is_method_b(&self) -> bool {
        if self.num_received < 3 || self.num_received % 2 == 0 {
            return false;
        }
        let tuned = self.alt_freqs[0];
        self.alt_freqs[1..self.num_received]
            .chunks_exact(2)
            .all(|pair| pair[0] == tuned || pair[1] == tuned)
    }

    /// Classify a complete list.
    ///
    /// Returns `None` when the list failed the Method B uniqueness check,
    /// which happens when reception losses made us stitch together parts of
    /// different list transmissions; such lists are discarded as noise.
    pub fn classify(&self) -> Option<AfList> {
        let raw = self.raw_list();

        if !self.is_method_b() {
            return Some(AfList::MethodA(raw.to_vec()));
        }

        let tuned_frequency = raw[0];
        let mut same_programme = Vec::new();
        let mut regional_variants = Vec::new();
        let mut unique_same: HashSet<u32> = HashSet::new();
        let mut unique_regional: HashSet<u32> = HashSet::new();

        for pair in raw[1..].chunks_exact(2) {
            let (freq1, freq2) = (pair[0], pair[1]);
            let non_tuned = if freq1 == tuned_frequency { freq2 } else { freq1 };

            // Ascending pair order marks a same-programme alternative,
            // descending marks a regional variant
            if freq1 < freq2 {
                same_programme.push(non_tuned);
                unique_same.insert(non_tuned);
            } else {
                regional_variants.push(non_tuned);
                unique_regional.insert(non_tuned);
            }
        }

        // A stitched-together list repeats frequencies; reject it
        let expected_number_of_afs = (raw.len() - 1) / 2;
        if unique_same.len() + unique_regional.len() != expected_number_of_afs {
            return None;
        }

        Some(AfList::MethodB {
            tuned_frequency,
            same_programme,
            regional_variants,
        })
    }

    pub fn clear(&mut self) {
        self.num_expected = 0;
        self.num_received = 0;
        self.lf_mf_follows = false;
    }
}

impl Default for AltFreqList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fm_code_to_khz() {
        assert_eq!(CarrierFrequency::new(1, Fm).khz(), 87_600);
        assert_eq!(CarrierFrequency::new(204, Fm).khz(), 107_900);
    }

    #[test]
    fn test_lf_mf_codes() {
        assert_eq!(CarrierFrequency::new(1, LfMf).khz(), 153);
        assert_eq!(CarrierFrequency::new(16, LfMf).khz(), 531);
        assert!(!CarrierFrequency::new(200, LfMf).is_valid());
    }

    #[test]
    fn test_invalid_codes() {
        assert!(!CarrierFrequency::new(0, Fm).is_valid());
        assert!(!CarrierFrequency::new(205, Fm).is_valid());
        assert!(!CarrierFrequency::new(250, Fm).is_valid());
    }

    #[test]
    fn test_method_a_completion() {
        let mut list = AltFreqList::new();
        list.insert(224 + 3); // 3 AFs follow
        assert!(!list.is_complete());
        list.insert(5);
        list.insert(6);
        assert!(!list.is_complete());
        list.insert(7);
        assert!(list.is_complete());

        match list.classify() {
            Some(AfList::MethodA(freqs)) => {
                assert_eq!(freqs, vec![88_000, 88_100, 88_200]);
            }
            other => panic!("expected Method A, got {:?}", other),
        }
    }

    #[test]
    fn test_filler_is_ignored() {
        let mut list = AltFreqList::new();
        list.insert(224 + 1);
        list.insert(5);
        list.insert(AF_CODE_FILLER);
        assert!(list.is_complete());
        assert_eq!(list.raw_list(), &[88_000]);
    }

    #[test]
    fn test_lf_mf_sentinel_applies_to_next_code_only() {
        let mut list = AltFreqList::new();
        list.insert(224 + 2);
        list.insert(AF_CODE_LFMF_FOLLOWS);
        list.insert(1); // LF: 153 kHz
        list.insert(1); // back in FM band: 87.6 MHz
        assert!(list.is_complete());
        assert_eq!(list.raw_list(), &[153, 87_600]);
    }

    #[test]
    fn test_method_b_classification() {
        // Tuned 87.6; pairs: (tuned, 88.0) ascending = same programme,
        // (89.0, tuned) descending = regional variant
        let mut list = AltFreqList::new();
        list.insert(224 + 5);
        list.insert(1);
        list.insert(1);
        list.insert(5);
        list.insert(15);
        list.insert(1);
        assert!(list.is_complete());
        assert!(list.is_method_b());

        match list.classify() {
            Some(AfList::MethodB {
                tuned_frequency,
                same_programme,
                regional_variants,
            }) => {
                assert_eq!(tuned_frequency, 87_600);
                assert_eq!(same_programme, vec![88_000]);
                assert_eq!(regional_variants, vec![89_000]);
            }
            other => panic!("expected Method B, got {:?}", other),
        }
    }

    #[test]
    fn test_method_b_rejects_duplicated_pairs() {
        // Same pair received twice: uniqueness check must fail
        let mut list = AltFreqList::new();
        list.insert(224 + 5);
        list.insert(1);
        list.insert(1);
        list.insert(5);
        list.insert(1);
        list.insert(5);
        assert!(list.is_complete());
        assert!(list.is_method_b());
        assert_eq!(
            list.classify(),
            None,
            "duplicate frequencies mean a stitched list"
        );
    }

    #[test]
    fn test_method_b_shape_requires_anchor_in_every_pair() {
        let mut list = AltFreqList::new();
        list.insert(224 + 5);
        for code in [1, 2, 3, 4, 5] {
            list.insert(code);
        }
        assert!(list.is_complete());
        assert!(!list.is_method_b(), "no pair repeats the tuned frequency");
    }

    #[test]
    fn test_clear_resets_expectations() {
        let mut list = AltFreqList::new();
        list.insert(224 + 1);
        list.insert(9);
        assert!(list.is_complete());
        list.clear();
        assert!(!list.is_complete());
        assert_eq!(list.raw_list().len(), 0);
    }
}
