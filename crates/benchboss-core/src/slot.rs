// Fantasy lineup slot identities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse fantasy position a starter slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotKind {
    C,
    LW,
    RW,
    D,
    G,
    Util,
}

impl SlotKind {
    pub fn display_str(&self) -> &'static str {
        match self {
            SlotKind::C => "C",
            SlotKind::LW => "LW",
            SlotKind::RW => "RW",
            SlotKind::D => "D",
            SlotKind::G => "G",
            SlotKind::Util => "UTIL",
        }
    }

    /// The starter slots of this kind, in fill order.
    pub fn slots(&self) -> &'static [FantasySlot] {
        use FantasySlot::*;
        match self {
            SlotKind::C => &[C1, C2],
            SlotKind::LW => &[LW1, LW2],
            SlotKind::RW => &[RW1, RW2],
            SlotKind::D => &[D1, D2, D3, D4],
            SlotKind::G => &[G1, G2],
            SlotKind::Util => &[Util],
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// One addressable slot: 13 starter slots and 3 injured-reserve slots.
///
/// Variant order is display order, and `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FantasySlot {
    #[serde(rename = "C-1")]
    C1,
    #[serde(rename = "C-2")]
    C2,
    #[serde(rename = "LW-1")]
    LW1,
    #[serde(rename = "LW-2")]
    LW2,
    #[serde(rename = "RW-1")]
    RW1,
    #[serde(rename = "RW-2")]
    RW2,
    #[serde(rename = "D-1")]
    D1,
    #[serde(rename = "D-2")]
    D2,
    #[serde(rename = "D-3")]
    D3,
    #[serde(rename = "D-4")]
    D4,
    #[serde(rename = "G-1")]
    G1,
    #[serde(rename = "G-2")]
    G2,
    #[serde(rename = "UTIL")]
    Util,
    #[serde(rename = "IR-1")]
    Ir1,
    #[serde(rename = "IR-2")]
    Ir2,
    #[serde(rename = "IR-3")]
    Ir3,
}

impl FantasySlot {
    pub const STARTERS: [FantasySlot; 13] = [
        FantasySlot::C1,
        FantasySlot::C2,
        FantasySlot::LW1,
        FantasySlot::LW2,
        FantasySlot::RW1,
        FantasySlot::RW2,
        FantasySlot::D1,
        FantasySlot::D2,
        FantasySlot::D3,
        FantasySlot::D4,
        FantasySlot::G1,
        FantasySlot::G2,
        FantasySlot::Util,
    ];

    pub const IR: [FantasySlot; 3] = [FantasySlot::Ir1, FantasySlot::Ir2, FantasySlot::Ir3];

    /// The positional kind of a starter slot; `None` for IR slots.
    pub fn kind(&self) -> Option<SlotKind> {
        use FantasySlot::*;
        match self {
            C1 | C2 => Some(SlotKind::C),
            LW1 | LW2 => Some(SlotKind::LW),
            RW1 | RW2 => Some(SlotKind::RW),
            D1 | D2 | D3 | D4 => Some(SlotKind::D),
            G1 | G2 => Some(SlotKind::G),
            Util => Some(SlotKind::Util),
            Ir1 | Ir2 | Ir3 => None,
        }
    }

    pub fn is_ir(&self) -> bool {
        self.kind().is_none()
    }

    pub fn is_starter(&self) -> bool {
        !self.is_ir()
    }

    pub fn label(&self) -> &'static str {
        use FantasySlot::*;
        match self {
            C1 => "C-1",
            C2 => "C-2",
            LW1 => "LW-1",
            LW2 => "LW-2",
            RW1 => "RW-1",
            RW2 => "RW-2",
            D1 => "D-1",
            D2 => "D-2",
            D3 => "D-3",
            D4 => "D-4",
            G1 => "G-1",
            G2 => "G-2",
            Util => "UTIL",
            Ir1 => "IR-1",
            Ir2 => "IR-2",
            Ir3 => "IR-3",
        }
    }

    /// Parse a slot label ("D-3", "util", "IR-1"). Case-insensitive.
    pub fn from_label(s: &str) -> Option<Self> {
        let wanted = s.trim().to_uppercase();
        Self::STARTERS
            .iter()
            .chain(Self::IR.iter())
            .copied()
            .find(|slot| slot.label() == wanted)
    }
}

impl fmt::Display for FantasySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Where a player sits in a lineup: a concrete slot, or the bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    Slot(FantasySlot),
    Bench,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Slot(slot) => write!(f, "{slot}"),
            Placement::Bench => write!(f, "BN"),
        }
    }
}
