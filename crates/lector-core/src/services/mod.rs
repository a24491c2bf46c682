//! Core services that orchestrate between ports.

mod autocommit;

pub use autocommit::{
    AutocommitCoordinator, AutocommitEntry, FinalizeOutcome, INTERRUPT_CAUSES, StreamId,
    is_interrupt_cause,
};
