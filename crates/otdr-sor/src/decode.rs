// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decode orchestration and the [`OtdrFile`] aggregate.
//!
//! The decoder walks `Start → MapRead → BlocksDecoded → Assembled →
//! Validated → Done`. Any failure stops the walk and is reported with the
//! stage it happened in.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::blocks::{
    decode_block, Block, DataPoints, DeclaredChecksum, FixedParameters, GeneralParameters,
    KeyEventBlock, KeyEvents, LinkParameters, OpaqueBlock, SupplierParameters,
};
use crate::error::{DecodeError, DecodeErrorKind, DecodeStage};
use crate::integrity::{self, ChecksumStatus};
use crate::map::{read_block_map, BlockDirectoryEntry, BlockId, FormatVersion};
use crate::trace::{assemble_traces, Trace};

/// Wavelengths closer than this are considered the same, nm.
const WAVELENGTH_TOLERANCE_NM: f64 = 0.5;

/// A fully decoded trace file.
///
/// Built once per decode and never modified; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtdrFile {
    version: FormatVersion,
    map_revision: u16,
    directory: Vec<BlockDirectoryEntry>,
    general: GeneralParameters,
    supplier: SupplierParameters,
    fixed: FixedParameters,
    key_events: KeyEvents,
    link: Option<LinkParameters>,
    traces: Vec<Trace>,
    checksum: ChecksumStatus,
    opaque_blocks: Vec<OpaqueBlock>,
}

impl OtdrFile {
    /// Layout generation.
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Map revision number.
    pub fn map_revision(&self) -> u16 {
        self.map_revision
    }

    /// Directory entries in file order.
    pub fn directory(&self) -> &[BlockDirectoryEntry] {
        &self.directory
    }

    /// `GenParams`, or defaults when the file has none.
    pub fn general(&self) -> &GeneralParameters {
        &self.general
    }

    /// `SupParams`, or defaults when the file has none.
    pub fn supplier(&self) -> &SupplierParameters {
        &self.supplier
    }

    /// Scalar acquisition settings of the first `FxdParams` block, with the
    /// slots of every `FxdParams` block in file order.
    pub fn fixed(&self) -> &FixedParameters {
        &self.fixed
    }

    /// Key events and their summary.
    pub fn key_events(&self) -> &KeyEvents {
        &self.key_events
    }

    /// `LnkParams`, when present.
    pub fn link(&self) -> Option<&LinkParameters> {
        self.link.as_ref()
    }

    /// Traces in file order.
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Trace `index` in file order.
    pub fn trace(&self, index: usize) -> Option<&Trace> {
        self.traces.get(index)
    }

    /// First trace at `wavelength_nm`.
    pub fn trace_for_wavelength(&self, wavelength_nm: f64) -> Option<&Trace> {
        self.traces
            .iter()
            .find(|t| (t.wavelength_nm() - wavelength_nm).abs() < WAVELENGTH_TOLERANCE_NM)
    }

    /// Distinct trace wavelengths in file order.
    pub fn wavelengths(&self) -> Vec<f64> {
        let mut out: Vec<f64> = Vec::with_capacity(self.traces.len());
        for t in &self.traces {
            let nm = t.wavelength_nm();
            if !out
                .iter()
                .any(|seen| (seen - nm).abs() < WAVELENGTH_TOLERANCE_NM)
            {
                out.push(nm);
            }
        }
        out
    }

    /// Checksum comparison outcome.
    pub fn checksum(&self) -> ChecksumStatus {
        self.checksum
    }

    /// True only when a checksum was present and matched.
    pub fn checksum_valid(&self) -> bool {
        self.checksum.is_valid()
    }

    /// Blocks kept verbatim, in file order.
    pub fn opaque_blocks(&self) -> &[OpaqueBlock] {
        &self.opaque_blocks
    }
}

/// Blocks gathered during the `MapRead → BlocksDecoded` walk.
#[derive(Default)]
struct Collected {
    general: Option<GeneralParameters>,
    supplier: Option<SupplierParameters>,
    fixed: Vec<FixedParameters>,
    key_events: Option<KeyEventBlock>,
    link: Option<LinkParameters>,
    data: Vec<DataPoints>,
    checksum: Option<(DeclaredChecksum, usize)>,
    opaque: Vec<OpaqueBlock>,
}

fn keep_first<T>(slot: &mut Option<T>, value: T, id: &BlockId) {
    if slot.is_some() {
        warn!(block = %id, "repeated block ignored; first occurrence kept");
    } else {
        *slot = Some(value);
    }
}

impl Collected {
    fn push(&mut self, entry: &BlockDirectoryEntry, block: Block) {
        match block {
            Block::General(v) => keep_first(&mut self.general, v, &entry.id),
            Block::Supplier(v) => keep_first(&mut self.supplier, v, &entry.id),
            Block::Fixed(v) => self.fixed.push(v),
            Block::KeyEvents(v) => keep_first(&mut self.key_events, v, &entry.id),
            Block::Link(v) => keep_first(&mut self.link, v, &entry.id),
            Block::DataPoints(v) => self.data.push(v),
            Block::Checksum(v) => {
                let absolute = entry.offset.saturating_add(v.value_offset);
                keep_first(&mut self.checksum, (v, absolute), &entry.id);
            }
            Block::Opaque(v) => self.opaque.push(v),
        }
    }
}

struct Decoder<'a> {
    bytes: &'a [u8],
    stage: DecodeStage,
}

impl<'a> Decoder<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            stage: DecodeStage::Start,
        }
    }

    fn advance(&mut self, next: DecodeStage) {
        trace!(from = ?self.stage, to = ?next, "decode stage");
        self.stage = next;
    }

    fn decode_blocks(
        &self,
        version: FormatVersion,
        entries: &[BlockDirectoryEntry],
    ) -> Result<Collected, DecodeError> {
        let mut collected = Collected::default();
        for entry in entries {
            let body = self.bytes.get(entry.range()).ok_or_else(|| {
                DecodeError::new(
                    DecodeErrorKind::TruncatedDirectory {
                        declared: entry.end() as u64,
                        available: self.bytes.len() as u64,
                    },
                    self.stage,
                    entry.offset,
                )
                .at_block(&entry.id)
            })?;
            let block = decode_block(entry, body, version)
                .map_err(|e| e.into_decode_error(&entry.id, entry.offset, self.stage))?;
            trace!(block = %entry.id, kind = block.label(), offset = entry.offset, "decoded block");
            collected.push(entry, block);
        }
        Ok(collected)
    }

    fn run(mut self) -> Result<OtdrFile, DecodeError> {
        let map = read_block_map(self.bytes)?;
        self.advance(DecodeStage::MapRead);

        let collected = self.decode_blocks(map.version, &map.entries)?;
        self.advance(DecodeStage::BlocksDecoded);

        let Collected {
            general,
            supplier,
            fixed,
            key_events,
            link,
            data,
            checksum,
            opaque,
        } = collected;

        let traces = assemble_traces(&fixed, data);
        let mut merged = fixed.first().cloned().unwrap_or_default();
        merged.slots = fixed.iter().flat_map(|f| f.slots.iter().cloned()).collect();
        let key_events = key_events
            .map(|block| KeyEvents::normalize(block, &merged))
            .unwrap_or_default();
        self.advance(DecodeStage::Assembled);

        let checksum = checksum.map_or(ChecksumStatus::Absent, |(declared, offset)| {
            integrity::validate(self.bytes, offset, declared.value)
        });
        self.advance(DecodeStage::Validated);

        let file = OtdrFile {
            version: map.version,
            map_revision: map.revision,
            directory: map.entries,
            general: general.unwrap_or_default(),
            supplier: supplier.unwrap_or_default(),
            fixed: merged,
            key_events,
            link,
            traces,
            checksum,
            opaque_blocks: opaque,
        };
        self.advance(DecodeStage::Done);
        debug!(
            version = ?file.version,
            traces = file.traces.len(),
            events = file.key_events.len(),
            opaque = file.opaque_blocks.len(),
            checksum = file.checksum.label(),
            "decoded trace file"
        );
        Ok(file)
    }
}

/// Decode a complete SR-4731 trace file.
///
/// Pure and synchronous: the result owns all its data and nothing borrows
/// from `bytes`.
///
/// # Errors
///
/// Returns a [`DecodeError`] carrying the failing stage, block and absolute
/// offset. A checksum mismatch is not an error; see [`OtdrFile::checksum`].
pub fn decode(bytes: &[u8]) -> Result<OtdrFile, DecodeError> {
    Decoder::new(bytes).run()
}
