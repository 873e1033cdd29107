//! Signature Path Prefetcher.
//!
//! Learns the sequence of block deltas each PC makes inside a 4 KiB page and
//! predicts the next delta from a compressed history of the previous ones.
//!
//! 1. **Signature Table (ST):** per PC, the page and block last touched, the
//!    last delta, and a 12-bit signature folding recent deltas together.
//! 2. **Pattern Table (PT):** one set per signature. Each way holds a 7-bit
//!    delta and a 3-bit counter of how often that delta followed the
//!    signature; a delta's confidence is its share of the set's counters.
//! 3. **Prefetch Filter (PE):** per page, the last block issued, so a stream
//!    that keeps predicting the same block only requests it once.
//!
//! When the most confident delta of the current signature clears 50%, the
//! block it points to is requested. The prefetcher then walks one step
//! further along the predicted signature; that look-ahead block is requested
//! when the product of both confidences and the global prefetch accuracy
//! clears 75%. Predictions never leave the page.

use super::{PrefetchLevel, PrefetchRequest};
use crate::common::constants::{
    COUNTER_BIT, PAGE_BLOCKS_SHIFT, PE_LINES, PE_TAG_BIT, PE_WAYS, PRIME1, PRIME2, PRIME3, PT_LINES,
    PT_TAG_BIT, PT_WAYS, SIG_LENGTH, SIG_SHIFT, ST_LINES, ST_TAG_BIT, ST_WAYS,
};
use crate::common::error::ConfigError;
use crate::core::units::assoc::{AssocTable, Geometry, TableLine};

const SIG_MASK: u64 = (1 << SIG_LENGTH) - 1;
const COUNTER_MAX: u8 = (1 << COUNTER_BIT) - 1;
const DELTA_SIGN: u64 = 1 << (PT_TAG_BIT - 1);
const PAGE_OFFSET_MASK: u64 = (1 << PAGE_BLOCKS_SHIFT) - 1;

/// Packs a signed in-page block delta into 7 bits: sign in bit 6,
/// magnitude below.
#[inline]
pub const fn encode_delta(delta: i64) -> u64 {
    if delta < 0 {
        DELTA_SIGN | (delta.unsigned_abs() & (DELTA_SIGN - 1))
    } else {
        delta as u64 & (DELTA_SIGN - 1)
    }
}

/// Inverse of [`encode_delta`].
#[inline]
pub const fn decode_delta(encoded: u64) -> i64 {
    let magnitude = (encoded & (DELTA_SIGN - 1)) as i64;
    if encoded & DELTA_SIGN != 0 { -magnitude } else { magnitude }
}

/// Folds `encoded` into `sig`.
#[inline]
pub const fn next_signature(sig: u64, encoded: u64) -> u64 {
    ((sig << SIG_SHIFT) ^ encoded) & SIG_MASK
}

#[inline(always)]
const fn mix(value: u64, prime: u64) -> u64 {
    (value ^ (value >> 16)).wrapping_mul(prime)
}

/// Signature Table entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignatureEntry {
    /// Partial PC tag.
    pub tag: u64,
    /// Cycle of the last access, for LRU replacement.
    pub clock: u64,
    /// Whether the entry is allocated.
    pub valid: bool,
    /// Page of the last access.
    pub page: u64,
    /// Block offset of the last access within `page`.
    pub last_offset: i64,
    /// Current signature.
    pub signature: u64,
    /// Last non-zero delta, 0 right after a re-baseline.
    pub last_delta: i64,
}

impl TableLine for SignatureEntry {
    fn tag(&self) -> u64 {
        self.tag
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn stamp(&self) -> u64 {
        self.clock
    }
}

/// Pattern Table entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternEntry {
    /// Encoded delta.
    pub delta: u64,
    /// Occurrence counter.
    pub counter: u8,
    /// Whether the entry is allocated.
    pub valid: bool,
}

impl TableLine for PatternEntry {
    fn tag(&self) -> u64 {
        self.delta
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn stamp(&self) -> u64 {
        u64::from(self.counter)
    }
}

/// Prefetch Filter entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FilterEntry {
    tag: u64,
    clock: u64,
    valid: bool,
    last_block: u64,
}

impl TableLine for FilterEntry {
    fn tag(&self) -> u64 {
        self.tag
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn stamp(&self) -> u64 {
        self.clock
    }
}

/// Most confident delta of one PT set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaPrediction {
    /// Signed block delta.
    pub delta: i64,
    /// Confidence in percent.
    pub confidence: u64,
}

/// Signature prefetcher tables.
#[derive(Debug, Clone)]
pub struct SignaturePrefetcher {
    signatures: AssocTable<SignatureEntry>,
    patterns: AssocTable<PatternEntry>,
    filter: AssocTable<FilterEntry>,
    block_shift: u32,
    signature_set_bits: u32,
    filter_set_bits: u32,
}

impl SignaturePrefetcher {
    /// Creates empty tables for blocks of `1 << block_shift` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGeometry`] if a table constant does not
    /// describe a power-of-two set count.
    pub fn new(block_shift: u32) -> Result<Self, ConfigError> {
        let st = Geometry::new("signature table", ST_LINES, ST_WAYS)?;
        let pe = Geometry::new("prefetch filter", PE_LINES, PE_WAYS)?;
        Ok(Self {
            signatures: AssocTable::new(st),
            patterns: AssocTable::new(Geometry::new("pattern table", PT_LINES, PT_WAYS)?),
            filter: AssocTable::new(pe),
            block_shift,
            signature_set_bits: st.sets().trailing_zeros(),
            filter_set_bits: pe.sets().trailing_zeros(),
        })
    }

    /// Observes a demand access by `pc` to `addr` at cycle `now`.
    pub fn observe(&mut self, now: u64, pc: u64, addr: u64, accuracy_pct: u64) -> Vec<PrefetchRequest> {
        let block = addr >> self.block_shift;
        let page = block >> PAGE_BLOCKS_SHIFT;
        let offset = (block & PAGE_OFFSET_MASK) as i64;

        let Some(signature) = self.train(now, pc, page, offset) else {
            return Vec::new();
        };

        let mut requests = Vec::new();
        let Some(first) = self.best_delta(signature) else {
            return requests;
        };
        if first.confidence < PrefetchLevel::Prefetch.threshold() {
            return requests;
        }
        let Some(first_offset) = Self::in_page(offset, first.delta) else {
            return requests;
        };
        if let Some(request) = self.issue(now, page, first_offset, PrefetchLevel::Prefetch) {
            requests.push(request);
        }

        let encoded = encode_delta(first.delta);
        let last_delta = self
            .signature_entry(pc)
            .map_or(0, |entry| entry.last_delta);
        let ahead = if first.delta == last_delta {
            signature
        } else {
            next_signature(signature, encoded)
        };
        let Some(second) = self.best_delta(ahead) else {
            return requests;
        };
        let confidence = first.confidence * second.confidence / 100 * accuracy_pct / 100;
        if confidence < PrefetchLevel::LookAhead.threshold() {
            return requests;
        }
        if let Some(request) = Self::in_page(first_offset, second.delta)
            .and_then(|target| self.issue(now, page, target, PrefetchLevel::LookAhead))
        {
            requests.push(request);
        }

        requests
    }

    /// ST set key and partial tag of `pc`.
    #[inline]
    const fn signature_index(&self, pc: u64) -> (u64, u64) {
        let key = mix(pc, PRIME1);
        let tag = mix(pc >> self.signature_set_bits, PRIME2) & ((1 << ST_TAG_BIT) - 1);
        (key, tag)
    }

    /// Updates the PC's ST entry and trains the PT. Returns the signature to
    /// predict from, or `None` when the access only re-baselined the entry.
    fn train(&mut self, now: u64, pc: u64, page: u64, offset: i64) -> Option<u64> {
        let (key, tag) = self.signature_index(pc);

        let slot = match self.signatures.lookup(key, tag) {
            Some(slot) if self.signatures.line(slot).page == page => slot,
            found => {
                let slot = found.unwrap_or_else(|| self.signatures.victim(key));
                *self.signatures.line_mut(slot) = SignatureEntry {
                    tag,
                    clock: now,
                    valid: true,
                    page,
                    last_offset: offset,
                    signature: 0,
                    last_delta: 0,
                };
                return None;
            }
        };

        let entry = *self.signatures.line(slot);
        let delta = offset - entry.last_offset;
        if delta == 0 {
            self.signatures.line_mut(slot).clock = now;
            return None;
        }

        let encoded = encode_delta(delta);
        self.train_pattern(entry.signature, encoded);
        let signature = if delta == entry.last_delta {
            entry.signature
        } else {
            next_signature(entry.signature, encoded)
        };

        *self.signatures.line_mut(slot) = SignatureEntry {
            clock: now,
            last_offset: offset,
            signature,
            last_delta: delta,
            ..entry
        };
        Some(signature)
    }

    fn train_pattern(&mut self, signature: u64, encoded: u64) {
        if let Some(slot) = self.patterns.lookup(signature, encoded) {
            let line = self.patterns.line_mut(slot);
            line.counter = (line.counter + 1).min(COUNTER_MAX);
            return;
        }

        for line in self.patterns.set_mut(signature) {
            line.counter = line.counter.saturating_sub(1);
        }
        let slot = self.patterns.victim(signature);
        *self.patterns.line_mut(slot) = PatternEntry {
            delta: encoded,
            counter: 1,
            valid: true,
        };
    }

    /// Most confident delta following `signature`, lowest way on ties.
    pub fn best_delta(&self, signature: u64) -> Option<DeltaPrediction> {
        let set = self.patterns.set(signature);
        let total: u64 = set
            .iter()
            .filter(|line| line.valid)
            .map(|line| u64::from(line.counter))
            .sum();
        if total == 0 {
            return None;
        }
        let mut best: Option<&PatternEntry> = None;
        for line in set.iter().filter(|line| line.valid && line.counter > 0) {
            if best.is_none_or(|b| line.counter > b.counter) {
                best = Some(line);
            }
        }
        best.map(|line| DeltaPrediction {
            delta: decode_delta(line.delta),
            confidence: u64::from(line.counter) * 100 / total,
        })
    }

    /// Offset `delta` blocks from `offset`, if it stays in the page.
    fn in_page(offset: i64, delta: i64) -> Option<i64> {
        let target = offset + delta;
        (0..=PAGE_OFFSET_MASK as i64).contains(&target).then_some(target)
    }

    /// Requests `offset` within `page` unless the filter already saw it.
    fn issue(&mut self, now: u64, page: u64, offset: i64, level: PrefetchLevel) -> Option<PrefetchRequest> {
        let block = (page << PAGE_BLOCKS_SHIFT) | offset as u64;
        let key = mix(page, PRIME3);
        let tag = (page >> self.filter_set_bits) & ((1 << PE_TAG_BIT) - 1);

        match self.filter.lookup(key, tag) {
            Some(slot) => {
                let entry = self.filter.line_mut(slot);
                entry.clock = now;
                if entry.last_block == block {
                    return None;
                }
                entry.last_block = block;
            }
            None => {
                let slot = self.filter.victim(key);
                *self.filter.line_mut(slot) = FilterEntry {
                    tag,
                    clock: now,
                    valid: true,
                    last_block: block,
                };
            }
        }

        Some(PrefetchRequest::new(block << self.block_shift, now, level))
    }

    /// ST entry tracking `pc`, if allocated.
    pub fn signature_entry(&self, pc: u64) -> Option<&SignatureEntry> {
        let (key, tag) = self.signature_index(pc);
        self.signatures
            .lookup(key, tag)
            .map(|slot| self.signatures.line(slot))
    }

    /// PT entry for `delta` under `signature`, if present.
    pub fn pattern(&self, signature: u64, delta: i64) -> Option<&PatternEntry> {
        self.patterns
            .lookup(signature, encode_delta(delta))
            .map(|slot| self.patterns.line(slot))
    }
}
