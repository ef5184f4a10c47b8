//! Types for card and terminal state

/// Card fields as last read from, or staged to, the terminal's register.
///
/// Every field starts unknown. Staging a field does not write it to the card,
/// only `write` does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFields {
    /// The card can only be used on terminals where this group is allowed.
    pub group: Option<i32>,
    /// Number of credits on the card.
    pub value: Option<i32>,
    /// Department and account tie a plastic card to its owner.
    /// Throw-away cards use 0 for both.
    pub department: Option<i32>,
    pub account: Option<i32>,
    /// Transactions made with this card (max 3000 for plastic cards, else 500).
    pub transaction_count: Option<i32>,
}

/// Card presence as reported by `sensor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    NoCard,
    PartiallyInserted,
    FullyInserted,
}

impl SensorState {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::NoCard),
            1 | 3 => Some(Self::PartiallyInserted),
            2 => Some(Self::FullyInserted),
            _ => None,
        }
    }
}

/// Card type code returned by a successful `read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardType(pub i32);

impl CardType {
    pub fn code(self) -> i32 {
        self.0
    }

    pub fn is_debit(self, debit_card_types: &[i32]) -> bool {
        debit_card_types.contains(&self.0)
    }
}
