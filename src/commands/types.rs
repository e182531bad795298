//! Decoded command events.

use std::fmt;

use serde::Serialize;

use super::opcode::{opcode_name, HotkeyOperation};

/// A decoded player command.
///
/// Events are produced in stream order, so `frame` never decreases from
/// one event to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandEvent {
    /// Virtual frame the command was issued on.
    pub frame: u32,
    /// Id of the issuing player.
    pub player: u8,
    /// Opcode byte.
    pub opcode: u8,
    /// Decoded payload.
    pub params: CommandParams,
    /// Payload length in bytes, excluding opcode and player bytes.
    pub payload_len: usize,
}

impl CommandEvent {
    /// Returns the opcode's table name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        opcode_name(self.opcode)
    }

    /// Returns the referenced unit type, for commands that carry one.
    #[must_use]
    pub fn unit_id(&self) -> Option<u16> {
        match self.params {
            CommandParams::Placement { unit, .. } | CommandParams::UnitRef { unit } => Some(unit),
            _ => None,
        }
    }
}

impl fmt::Display for CommandEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[P{} @{}] {}", self.player, self.frame, self.name())?;
        match &self.params {
            CommandParams::None => Ok(()),
            CommandParams::Selection { units } => write!(f, ": {} unit(s)", units.len()),
            CommandParams::Placement { unit, x, y, .. } => write!(f, ": unit {unit} at ({x}, {y})"),
            CommandParams::UnitRef { unit } => write!(f, ": unit {unit}"),
            CommandParams::Hotkey { operation, group } => write!(f, ": {operation:?} {group}"),
            CommandParams::Target { x, y, .. } => write!(f, ": ({x}, {y})"),
            CommandParams::TechRef { tech } => write!(f, ": tech {tech}"),
            CommandParams::UpgradeRef { upgrade } => write!(f, ": upgrade {upgrade}"),
            CommandParams::Chat { message } => write!(f, ": {message}"),
            other => write!(f, ": {other:?}"),
        }
    }
}

/// Decoded command parameters, one variant per payload family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandParams {
    /// No payload.
    None,
    /// Selected unit tags.
    Selection {
        /// Unit tags in the order sent.
        units: Vec<u16>,
    },
    /// Structure placement.
    Placement {
        /// Build order byte.
        order: u8,
        /// Tile x.
        x: u16,
        /// Tile y.
        y: u16,
        /// Structure unit type.
        unit: u16,
    },
    /// Reference to a unit type.
    UnitRef {
        /// Unit type id.
        unit: u16,
    },
    /// Shared vision mask.
    Vision {
        /// Player bit mask.
        mask: u16,
    },
    /// Control group operation.
    Hotkey {
        /// What was done with the group.
        operation: HotkeyOperation,
        /// Group number (0-9).
        group: u8,
    },
    /// Point or unit target.
    Target {
        /// Map x.
        x: u16,
        /// Map y.
        y: u16,
        /// Target unit tag, 0 for a ground target.
        target: u16,
        /// Unit type hint.
        unit: u16,
        /// Order byte for targeted orders.
        order: Option<u8>,
        /// Whether the command was shift-queued.
        queued: bool,
    },
    /// Queued flag only.
    Queued {
        /// Whether the command was shift-queued.
        queued: bool,
    },
    /// Queue slot tag.
    Tag {
        /// Slot tag.
        tag: u16,
    },
    /// Technology reference.
    TechRef {
        /// Technology id.
        tech: u8,
    },
    /// Upgrade reference.
    UpgradeRef {
        /// Upgrade id.
        upgrade: u8,
    },
    /// Player left the game.
    Leave {
        /// Leave reason byte.
        reason: u8,
    },
    /// Chat message.
    Chat {
        /// Message text.
        message: String,
    },
}
