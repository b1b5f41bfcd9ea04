/*!
Session progress tracking for the KDC protocol.
*/

pub mod state;

pub use state::{CenterPhase, PartyPhase, PartyRole};
