// Purpose - external interfaces: note numbers, host keyboard/bellows views, channel layout

pub mod bellows_view;
pub mod interleave;
pub mod keyboard;
pub mod midi;

pub use bellows_view::BellowsView;
pub use keyboard::{KeyEvent, KeyRange};
