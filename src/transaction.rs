//! Balance operations on the card currently inserted in a terminal.

use log::{debug, info, warn};

use crate::error::{Result, TcrsError};
use crate::session::TerminalSession;
use crate::transport::TerminalTransport;
use crate::types::CardType;

/// Where a [`CardTransaction`] stands with respect to its card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    AwaitingCard,
    /// `value` is `None` for cards that carry no balance, or when the terminal
    /// did not answer with a usable value.
    Present { value: Option<i32> },
    Released,
}

/// One inserted card, from insertion until it is ejected.
///
/// Borrows the session for its whole life; every terminal access goes through
/// the session's commands.
pub struct CardTransaction<'a, T: TerminalTransport> {
    session: &'a mut TerminalSession<T>,
    card_type: Option<CardType>,
    state: CardState,
}

impl<'a, T: TerminalTransport> CardTransaction<'a, T> {
    /// Waits for a card to be fully inserted, then reads it.
    ///
    /// Blocks for as long as no card is inserted.
    pub fn begin(session: &'a mut TerminalSession<T>) -> Result<Self> {
        let mut transaction = Self {
            session,
            card_type: None,
            state: CardState::AwaitingCard,
        };
        transaction.load_card()?;
        Ok(transaction)
    }

    fn load_card(&mut self) -> Result<()> {
        self.session.wait_for_card()?;
        let card_type = self.session.read()?;
        let value = if self.session.is_debit(card_type) {
            self.session.value()?
        } else {
            debug!("Card type {} carries no balance", card_type.code());
            None
        };

        info!("Card of type {} inserted, value {:?}", card_type.code(), value);
        self.card_type = Some(card_type);
        self.state = CardState::Present { value };
        Ok(())
    }

    pub fn state(&self) -> CardState {
        self.state
    }

    pub fn card_type(&self) -> Option<CardType> {
        self.card_type
    }

    /// Balance as last confirmed by the terminal
    pub fn current_value(&self) -> Result<Option<i32>> {
        match self.state {
            CardState::Released => Err(TcrsError::TransactionReleased),
            CardState::AwaitingCard => Ok(None),
            CardState::Present { value } => Ok(value),
        }
    }

    /// Adds `delta` to the card's balance and returns the new balance.
    ///
    /// The staged value is read back before anything is written: if the
    /// terminal altered it, nothing is persisted and
    /// [`TcrsError::VerificationMismatch`] is returned. After a successful
    /// write the balance is read again from the terminal.
    pub fn adjust_balance(&mut self, delta: i32) -> Result<i32> {
        let current = self.current_value()?.ok_or(TcrsError::NoBalance)?;
        let target = current.checked_add(delta).ok_or_else(|| {
            TcrsError::InvalidParameter(format!("{} + {} overflows", current, delta))
        })?;

        self.session.set_value(target)?;
        let staged = self.session.value()?;
        if staged != Some(target) {
            warn!("Terminal staged {:?} instead of {}, card left untouched", staged, target);
            // Put the confirmed balance back so a later write cannot persist the altered value.
            if let Err(e) = self.session.set_value(current) {
                warn!("Cannot restore staged value {}: {}", current, e);
            }
            return Err(TcrsError::VerificationMismatch {
                expected: target,
                staged,
            });
        }

        self.session.write()?;

        let written = self.session.value()?;
        self.state = CardState::Present { value: written };
        match written {
            Some(value) => {
                info!("Card balance changed from {} to {}", current, value);
                Ok(value)
            }
            None => Err(TcrsError::UnknownAnswer {
                command: "value".into(),
            }),
        }
    }

    /// Ejects the card. The transaction cannot be used afterwards.
    pub fn release(&mut self) -> Result<()> {
        if self.state == CardState::Released {
            return Err(TcrsError::TransactionReleased);
        }
        self.session.eject()?;
        self.state = CardState::Released;
        debug!("Card released");
        Ok(())
    }
}
