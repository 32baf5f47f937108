//! Inbound SMS processing pipeline.
//!
//! Flow: inbound text → load or create the sender's session → classify the
//! sender (new, active, inactive) and the text (NEXT or an address) → geocode
//! and page through nearby places, or continue the previous search →
//! enrich the page with live details → render the reply.

pub mod background;
pub mod clock;
pub mod enrich;
pub mod error;
pub mod format;
pub mod hours;
pub mod locks;
pub mod normalize;
pub mod reply;
pub mod state;

pub use {
    clock::{Clock, SystemClock},
    error::{Error, Result},
    normalize::{SearchQuery, search_string},
    reply::{AutoReply, Collaborators, ReplyOutcome, ReplySettings},
    state::{SenderState, classify},
};
