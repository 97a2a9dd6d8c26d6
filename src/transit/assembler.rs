use thiserror::Error;

use crate::geo::ObserverLocation;
use crate::propagator::ObjectIdentity;
use crate::transit::types::{Crossings, ElevationCrossing, EventKind, TransitEvent};

/// Why a crossing stream produced no transits
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Misalignment {
    #[error("{rises} rise, {culminations} culminate and {sets} set events")]
    CountMismatch {
        rises: usize,
        culminations: usize,
        sets: usize,
    },
    #[error("triple {index} is not ordered rise < culminate < set")]
    OutOfOrder { index: usize },
}

/// Zip the rise, culminate and set events of one window into transits.
///
/// Fails closed: unequal counts, or any zipped triple out of order, rejects
/// the whole window rather than pairing whatever looks complete.
pub fn assemble_transits(
    crossings: &Crossings,
    identity: &ObjectIdentity,
    observer: &ObserverLocation,
) -> Result<Vec<TransitEvent>, Misalignment> {
    let rises: Vec<&ElevationCrossing> = crossings.of_kind(EventKind::Rise).collect();
    let culminations: Vec<&ElevationCrossing> = crossings.of_kind(EventKind::Culminate).collect();
    let sets: Vec<&ElevationCrossing> = crossings.of_kind(EventKind::Set).collect();

    if rises.len() != culminations.len() || culminations.len() != sets.len() {
        return Err(Misalignment::CountMismatch {
            rises: rises.len(),
            culminations: culminations.len(),
            sets: sets.len(),
        });
    }

    rises
        .iter()
        .zip(&culminations)
        .zip(&sets)
        .enumerate()
        .map(|(index, ((rise, culminate), set))| {
            if !(rise.epoch < culminate.epoch && culminate.epoch < set.epoch) {
                return Err(Misalignment::OutOfOrder { index });
            }
            Ok(TransitEvent {
                identity: identity.clone(),
                observer: observer.clone(),
                rise: **rise,
                culminate: **culminate,
                set: **set,
                ephemeris: None,
            })
        })
        .collect()
}
