use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::edit::SortKey;
use crate::generate::Combination;

/// Render, check and edit palette code blocks in markdown notes.
#[derive(Parser, Debug)]
#[command(name = "swatchbook", version, about)]
pub struct Args {
    /// Plugin settings file (defaults to ~/.config/swatchbook/settings.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Draw the palettes of a note to the terminal
    Render {
        /// Markdown file containing palette blocks
        file: PathBuf,

        /// Only this block (1-based)
        #[arg(short, long)]
        block: Option<usize>,

        /// Width in terminal columns
        #[arg(short, long, default_value_t = 80)]
        width: u16,

        /// Height in terminal rows
        #[arg(long, default_value_t = 8)]
        rows: u16,

        /// Show swatches the way edit mode does
        #[arg(long)]
        edit: bool,
    },

    /// Report the status of every palette block; fails if any is invalid
    Check {
        file: PathBuf,
    },

    /// Rewrite valid blocks in canonical form
    Fmt {
        file: PathBuf,

        /// Write back to the file instead of stdout
        #[arg(long)]
        write: bool,
    },

    /// Print a generated palette block
    Generate {
        #[arg(value_enum)]
        combination: Combination,

        /// Base color; random when omitted
        #[arg(long)]
        base: Option<String>,

        /// Render the palette as a gradient
        #[arg(long)]
        gradient: bool,

        /// Seed for reproducible random colors
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print a palette block for a coolors/colorhunt URL
    Link {
        url: String,

        /// Keep the URL in the block instead of expanding it to colors
        #[arg(long)]
        raw: bool,
    },

    /// Sort the colors of palette blocks
    Sort {
        file: PathBuf,

        /// Channel to sort by
        #[arg(long, value_enum)]
        by: SortKey,

        /// Only this block (1-based)
        #[arg(short, long)]
        block: Option<usize>,

        /// Write back to the file instead of stdout
        #[arg(long)]
        write: bool,
    },

    /// Edit one palette block interactively
    Edit {
        file: PathBuf,

        /// Block to edit (1-based)
        #[arg(short, long, default_value_t = 1)]
        block: usize,
    },
}
