//! One complete run: draw, then notify everyone.

use crate::draw::draw;
use crate::error::Result;
use crate::notify::{CredentialSource, DispatchReport, Dispatcher, MessageOptions, TransportFactory};
use crate::participants::{AddressBook, Participant, names};

/// Draw assignments for `participants` and send every notification.
///
/// Bad participant input fails before any transport is touched. The draw
/// is logged at debug level before dispatch, so it survives a fatal
/// dispatch error.
pub fn run<F, C>(
    participants: &[Participant],
    seed: Option<u64>,
    dispatcher: &Dispatcher<F, C>,
    options: &MessageOptions,
) -> Result<DispatchReport>
where
    F: TransportFactory,
    C: CredentialSource,
{
    let assignments = draw(&names(participants), seed)?;
    for pair in assignments.iter() {
        tracing::debug!("{} -> {}", pair.gifter, pair.giftee);
    }

    let address_book = AddressBook::from_participants(participants);
    Ok(dispatcher.dispatch(&assignments, &address_book, options)?)
}
