//! Two-channel fragment streaming from the model producer.
//!
//! The producer yields discrete fragments typed as answer or reasoning text.
//! The multiplexer folds that interleaving into one linear tagged document,
//! wrapping reasoning runs in `<think>` markers and escaping anything inside
//! them that could be misparsed as a real operation tag.

mod fragment;
mod multiplexer;

pub use fragment::{
    AbortSignal, Fragment, FragmentEvent, FragmentKind, FragmentProducer, FragmentStream, Message, Role,
    ScriptedProducer, create_fragment_channel,
};
pub use multiplexer::{Multiplexer, THINK_CLOSE, THINK_OPEN, escape_reasoning};
