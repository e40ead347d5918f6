use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use rand::rngs::StdRng;
use rand::SeedableRng;

use swatchbook::cli::{Args, Command};
use swatchbook::codec;
use swatchbook::color::Color;
use swatchbook::document::{self, BlockLocation, MarkdownDocument};
use swatchbook::edit::{EditSession, LogNotifier, SortKey};
use swatchbook::editor::{GenerateInput, PaletteEditor, UrlInput};
use swatchbook::generate::Combination;
use swatchbook::settings::{self, PluginSettings};
use swatchbook::state::Palette;
use swatchbook::tui::{self, TuiApp};
use swatchbook::view::{self, RenderContext};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(settings::settings_path);
    let plugin = PluginSettings::load(&config_path)?;

    match args.command {
        Command::Render {
            file,
            block,
            width,
            rows,
            edit,
        } => render(&file, block, width, rows, edit, &plugin),
        Command::Check { file } => check(&file, &plugin),
        Command::Fmt { file, write } => fmt(&file, write, &plugin),
        Command::Generate {
            combination,
            base,
            gradient,
            seed,
        } => generate(combination, base.as_deref(), gradient, seed, plugin),
        Command::Link { url, raw } => link(&url, raw, plugin),
        Command::Sort {
            file,
            by,
            block,
            write,
        } => sort(&file, by, block, write, &plugin),
        Command::Edit { file, block } => edit(file, config_path, block, plugin),
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn output(path: &Path, text: &str, write: bool) -> Result<()> {
    if write {
        std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("wrote {}", path.display());
    } else {
        print!("{text}");
    }
    Ok(())
}

/// Blocks of `markdown`, narrowed to the 1-based `only` when given.
fn select(markdown: &str, only: Option<usize>) -> Result<Vec<(usize, BlockLocation)>> {
    let blocks: Vec<(usize, BlockLocation)> = document::find_blocks(markdown)
        .into_iter()
        .enumerate()
        .map(|(i, b)| (i + 1, b))
        .collect();
    match only {
        None => Ok(blocks),
        Some(n) => match blocks.into_iter().find(|(i, _)| *i == n) {
            Some(found) => Ok(vec![found]),
            None => bail!("no palette block {n}"),
        },
    }
}

fn render(file: &Path, only: Option<usize>, width: u16, rows: u16, edit: bool, plugin: &PluginSettings) -> Result<()> {
    let markdown = read(file)?;
    let mut stdout = io::stdout().lock();
    for (n, block) in select(&markdown, only)? {
        let palette = Palette::parse(&block.body, plugin);
        let rendered = view::render(
            &palette,
            &RenderContext {
                plugin,
                edit_mode: edit,
                container_width: width as f64,
            },
        );
        println!("block {n} (line {})", block.range.start + 1);
        tui::write_preview(&mut stdout, &rendered, width, rows)?;
    }
    Ok(())
}

fn check(file: &Path, plugin: &PluginSettings) -> Result<()> {
    let markdown = read(file)?;
    let mut invalid = 0;
    for (n, block) in select(&markdown, None)? {
        let palette = Palette::parse(&block.body, plugin);
        let line = block.range.start + 1;
        let rendered = view::render(
            &palette,
            &RenderContext {
                plugin,
                edit_mode: false,
                container_width: 0.0,
            },
        );
        match rendered.body {
            view::Body::Invalid(placeholder) => {
                invalid += 1;
                println!("block {n} (line {line}): {}: {}", placeholder.status, placeholder.message);
            }
            _ => println!("block {n} (line {line}): {} ({} colors)", palette.status, palette.colors.len()),
        }
    }
    if invalid > 0 {
        bail!("{invalid} invalid palette block(s) in {}", file.display());
    }
    Ok(())
}

fn fmt(file: &Path, write: bool, plugin: &PluginSettings) -> Result<()> {
    let markdown = read(file)?;
    let mut text = markdown.clone();
    // Bottom-up so earlier ranges stay valid.
    for (n, block) in select(&markdown, None)?.into_iter().rev() {
        let palette = Palette::parse(&block.body, plugin);
        if !palette.status.is_valid() {
            log::warn!("skipping block {n}: {}", palette.status);
            continue;
        }
        text = document::replace(&text, block.range, &palette.to_block(plugin));
    }
    output(file, &text, write)
}

fn generate(
    combination: Combination,
    base: Option<&str>,
    gradient: bool,
    seed: Option<u64>,
    plugin: PluginSettings,
) -> Result<()> {
    let base = base
        .map(|b| Color::parse(b).with_context(|| format!("invalid base color: {b}")))
        .transpose()?;
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut editor = PaletteEditor::new(plugin);
    editor.load(&mut GenerateInput::with_rng(combination, base, rng))?;
    editor.settings_mut().gradient = gradient;
    print!("{}", editor.submit()?);
    Ok(())
}

fn link(url: &str, raw: bool, plugin: PluginSettings) -> Result<()> {
    if raw {
        if !codec::is_url(url) {
            bail!("not a palette URL: {url}");
        }
        print!("{}", codec::fence(url));
        return Ok(());
    }
    let mut editor = PaletteEditor::new(plugin);
    editor.load(&mut UrlInput::new(url))?;
    print!("{}", editor.submit()?);
    Ok(())
}

fn sort(file: &Path, key: SortKey, only: Option<usize>, write: bool, plugin: &PluginSettings) -> Result<()> {
    let markdown = read(file)?;
    let mut doc = MarkdownDocument::new(markdown.clone());
    for (n, block) in select(&markdown, only)?.into_iter().rev() {
        let mut session = EditSession::new(&block.text(), block.range, plugin.clone(), &mut doc, LogNotifier);
        if session.sort_by(key).is_err() {
            log::warn!("skipping block {n}: {}", session.palette().status);
        }
    }
    output(file, doc.text(), write)
}

fn edit(file: PathBuf, config_path: PathBuf, block: usize, plugin: PluginSettings) -> Result<()> {
    if !io::stdout().is_terminal() {
        bail!("edit needs an interactive terminal");
    }
    let markdown = read(&file)?;
    let (_, location) = select(&markdown, Some(block))?.remove(0);
    let width = crossterm::terminal::size().map(|(w, _)| w as f64).unwrap_or(0.0);
    let mut app = TuiApp::new(file, config_path, markdown, &location, plugin, width);
    tui::run(&mut app)
}
