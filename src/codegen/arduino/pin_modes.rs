//! Pin-mode side table, collected before `setup()` is generated.

use super::resolver::render_literal;
use crate::error::Result;
use crate::graph::{Block, BlockKind, GraphIndex, Literal};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Output,
    Input,
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinMode::Output => f.write_str("OUTPUT"),
            PinMode::Input => f.write_str("INPUT"),
        }
    }
}

/// Statically known pins and their modes, in first-discovery order
#[derive(Debug, Default, PartialEq)]
pub struct PinModeTable {
    entries: Vec<(String, PinMode)>,
}

impl PinModeTable {
    pub fn collect(index: &GraphIndex<'_>) -> Result<Self> {
        let mut table = PinModeTable::default();
        for block in index.blocks_in_order() {
            let mode = match block.kind {
                BlockKind::LedOn | BlockKind::LedOff | BlockKind::SetPinState | BlockKind::BuzzerPlay => {
                    PinMode::Output
                }
                BlockKind::DigitalRead => PinMode::Input,
                _ => continue,
            };
            match static_pin(index, block)? {
                Some(pin) => table.record(pin, mode),
                None => tracing::debug!(
                    "[LOWER] Pin of '{}' is not static; no pinMode emitted",
                    block.instance_id()
                ),
            }
        }
        Ok(table)
    }

    /// OUTPUT is never downgraded to INPUT
    pub fn record(&mut self, pin: String, mode: PinMode) {
        match self.entries.iter_mut().find(|(known, _)| *known == pin) {
            Some((_, existing)) => {
                if *existing != PinMode::Output {
                    *existing = mode;
                }
            }
            None => self.entries.push((pin, mode)),
        }
    }

    pub fn get(&self, pin: &str) -> Option<PinMode> {
        self.entries
            .iter()
            .find(|(known, _)| known == pin)
            .map(|(_, mode)| *mode)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, PinMode)> {
        self.entries.iter().map(|(pin, mode)| (pin.as_str(), *mode))
    }
}

/// Pin given by a wired constant number, else by a `pin` literal in the config
fn static_pin(index: &GraphIndex<'_>, block: &Block<'_>) -> Result<Option<String>> {
    if let Some(source) = index.data_source(block.instance_id(), "pin") {
        if let Some(producer) = index.get_block(source.node_id) {
            if let (BlockKind::ConstantNumber(_), Some(value)) = (&producer.kind, producer.literal("value")) {
                return literal_text(value).map(Some);
            }
        }
    }
    block.literal("pin").map(literal_text).transpose()
}

fn literal_text(literal: &Literal) -> Result<String> {
    match literal {
        Literal::Text(text) => Ok(text.clone()),
        other => render_literal(other),
    }
}
