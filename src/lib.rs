pub mod cli;
pub mod codec;
pub mod color;
pub mod document;
pub mod edit;
pub mod editor;
pub mod generate;
pub mod registry;
pub mod settings;
pub mod state;
pub mod tui;
pub mod view;
