#![deny(warnings)]

//! Game-master console state.
//!
//! Editor, viewer and player panel are plain values advanced by pure
//! `update` functions; [`actions`] runs the store round-trips and reports
//! the outcome as a [`Notice`].

pub mod actions;
pub mod editor;
pub mod format;
pub mod player;
pub mod viewer;

pub use actions::{Notice, NoticeKind};
pub use editor::{EditorError, EditorForm, EditorMsg, Field, LevelField};
pub use player::PlayerPanel;
pub use viewer::{ViewerMsg, ViewerState};
