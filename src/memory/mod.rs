//! Memory regions used by the front end
//!
//! Neither region frees individual allocations:
//! - [`Arena`] owns AST nodes and hands out stable indices
//! - [`StringScratch`] is a fixed-capacity byte region for decoded string
//!   literals, with a rewindable head for lexer lookahead

mod arena;
mod scratch;

pub use arena::{Arena, ArenaId};
pub use scratch::{ScratchMark, StrSlice, StringScratch};
