//! Static opcode table.
//!
//! Every command opcode the decoder understands is listed in [`OPCODES`]
//! together with its payload shape. The table is the only place that knows
//! payload lengths; correcting an entry never touches the decode loop.

use serde::Serialize;

/// Raw opcode values.
#[allow(missing_docs)]
pub mod codes {
    pub const SYNC: u8 = 0x00;
    pub const SYNC_U8: u8 = 0x01;
    pub const SYNC_U16: u8 = 0x02;
    pub const KEEP_ALIVE: u8 = 0x05;
    pub const SELECT: u8 = 0x09;
    pub const SHIFT_SELECT: u8 = 0x0A;
    pub const SHIFT_DESELECT: u8 = 0x0B;
    pub const BUILD: u8 = 0x0C;
    pub const VISION: u8 = 0x0D;
    pub const HOTKEY: u8 = 0x13;
    pub const MOVE: u8 = 0x14;
    pub const TARGETED_ORDER: u8 = 0x15;
    pub const CANCEL: u8 = 0x18;
    pub const STOP: u8 = 0x1A;
    pub const RETURN_CARGO: u8 = 0x1E;
    pub const TRAIN: u8 = 0x1F;
    pub const CANCEL_TRAIN: u8 = 0x20;
    pub const UNIT_MORPH: u8 = 0x23;
    pub const RESEARCH: u8 = 0x2F;
    pub const CANCEL_RESEARCH: u8 = 0x30;
    pub const UPGRADE: u8 = 0x31;
    pub const CANCEL_UPGRADE: u8 = 0x32;
    pub const BUILDING_MORPH: u8 = 0x35;
    pub const LEAVE_GAME: u8 = 0x57;
    pub const CHAT: u8 = 0x5C;
}

/// Maximum units in one selection command.
pub const MAX_SELECTION: u8 = 12;

/// Highest valid unit type id.
pub const MAX_UNIT_ID: u16 = 227;

/// How many payload bytes follow the player byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// A fixed number of bytes.
    Fixed(usize),
    /// A u8 count followed by that many u16 unit tags.
    Selection,
}

/// How the payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// No parameters.
    None,
    /// Unit tag list.
    Selection,
    /// Build order, tile position and unit type.
    Placement,
    /// Vision mask.
    Vision,
    /// Control group operation.
    Hotkey,
    /// Point or unit target without an explicit order.
    Move,
    /// Point or unit target with an order byte.
    TargetedOrder,
    /// Single queued flag.
    Queued,
    /// Unit type reference.
    UnitRef,
    /// Queue slot tag.
    Tag,
    /// Technology reference.
    TechRef,
    /// Upgrade reference.
    UpgradeRef,
    /// Leave reason.
    Leave,
    /// Fixed-size chat text.
    Chat,
}

/// One entry of the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    /// Opcode byte.
    pub code: u8,
    /// Stable snake-case name used in breakdowns.
    pub name: &'static str,
    /// Payload length rule.
    pub shape: PayloadShape,
    /// Payload interpretation.
    pub params: ParamKind,
    /// Whether the command counts towards effective APM.
    pub substantive: bool,
}

const fn op(
    code: u8,
    name: &'static str,
    shape: PayloadShape,
    params: ParamKind,
    substantive: bool,
) -> OpcodeInfo {
    OpcodeInfo {
        code,
        name,
        shape,
        params,
        substantive,
    }
}

use self::PayloadShape::{Fixed, Selection};

/// Command opcodes, ordered by code.
pub const OPCODES: &[OpcodeInfo] = &[
    op(codes::KEEP_ALIVE, "keep_alive", Fixed(0), ParamKind::None, false),
    op(codes::SELECT, "select", Selection, ParamKind::Selection, false),
    op(codes::SHIFT_SELECT, "shift_select", Selection, ParamKind::Selection, false),
    op(codes::SHIFT_DESELECT, "shift_deselect", Selection, ParamKind::Selection, false),
    op(codes::BUILD, "build", Fixed(7), ParamKind::Placement, true),
    op(codes::VISION, "vision", Fixed(2), ParamKind::Vision, false),
    op(codes::HOTKEY, "hotkey", Fixed(2), ParamKind::Hotkey, true),
    op(codes::MOVE, "move", Fixed(9), ParamKind::Move, true),
    op(codes::TARGETED_ORDER, "targeted_order", Fixed(10), ParamKind::TargetedOrder, true),
    op(codes::CANCEL, "cancel", Fixed(0), ParamKind::None, true),
    op(codes::STOP, "stop", Fixed(1), ParamKind::Queued, true),
    op(codes::RETURN_CARGO, "return_cargo", Fixed(1), ParamKind::Queued, true),
    op(codes::TRAIN, "train", Fixed(2), ParamKind::UnitRef, true),
    op(codes::CANCEL_TRAIN, "cancel_train", Fixed(2), ParamKind::Tag, true),
    op(codes::UNIT_MORPH, "unit_morph", Fixed(2), ParamKind::UnitRef, true),
    op(codes::RESEARCH, "research", Fixed(1), ParamKind::TechRef, true),
    op(codes::CANCEL_RESEARCH, "cancel_research", Fixed(0), ParamKind::None, true),
    op(codes::UPGRADE, "upgrade", Fixed(1), ParamKind::UpgradeRef, true),
    op(codes::CANCEL_UPGRADE, "cancel_upgrade", Fixed(0), ParamKind::None, true),
    op(codes::BUILDING_MORPH, "building_morph", Fixed(2), ParamKind::UnitRef, true),
    op(codes::LEAVE_GAME, "leave_game", Fixed(1), ParamKind::Leave, true),
    op(codes::CHAT, "chat", Fixed(80), ParamKind::Chat, true),
];

/// Looks up a command opcode.
///
/// Sync opcodes are not commands and return `None`.
#[must_use]
pub fn lookup(code: u8) -> Option<&'static OpcodeInfo> {
    OPCODES
        .binary_search_by_key(&code, |info| info.code)
        .ok()
        .map(|i| &OPCODES[i])
}

/// Returns the table name of an opcode, or `"unknown"`.
#[must_use]
pub fn opcode_name(code: u8) -> &'static str {
    match code {
        codes::SYNC | codes::SYNC_U8 | codes::SYNC_U16 => "sync",
        _ => lookup(code).map_or("unknown", |info| info.name),
    }
}

/// Returns whether a command opcode counts towards effective APM.
///
/// Selection, vision, keep-alive and sync opcodes do not.
#[must_use]
pub fn is_substantive(code: u8) -> bool {
    lookup(code).is_some_and(|info| info.substantive)
}

/// Control group operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HotkeyOperation {
    /// Assign the current selection to a group.
    Assign,
    /// Recall a group.
    Select,
    /// Add the current selection to a group.
    Add,
}

impl HotkeyOperation {
    /// Decodes the operation byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(HotkeyOperation::Assign),
            1 => Some(HotkeyOperation::Select),
            2 => Some(HotkeyOperation::Add),
            _ => None,
        }
    }
}
