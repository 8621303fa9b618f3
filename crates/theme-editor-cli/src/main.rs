use anyhow::{Context, Result};
use std::{env, path::PathBuf, process};
use theme_editor_config::Config;
use theme_editor_engine::editing::invariants;
use theme_editor_engine::markup::{self, MarkupOptions};
use theme_editor_engine::{Editor, EditorOptions, io};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Tree,
    Source,
    Save,
}

impl Command {
    fn parse(arg: &str) -> Option<Self> {
        match arg {
            "tree" => Some(Command::Tree),
            "source" => Some(Command::Source),
            "save" => Some(Command::Save),
            _ => None,
        }
    }
}

/// Hover title for a component kind: `DayOfWeek` → `Day of week`
fn component_title(kind: &str) -> String {
    let mut title = String::with_capacity(kind.len() + 4);
    for (i, c) in kind.chars().enumerate() {
        if i == 0 {
            title.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            title.push(' ');
            title.extend(c.to_lowercase());
        } else {
            title.push(c);
        }
    }
    title
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} [theme-file | themes-dir] [tree|source|save]");
    eprintln!(
        "Without a path the theme is taken from the config file at {}",
        Config::config_path().display()
    );
    process::exit(1);
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("theme-editor-cli");

    let (path_arg, command_arg) = match args.get(1..).unwrap_or_default() {
        [] => (None, None),
        [one] if Command::parse(one).is_some() => (None, Some(one.as_str())),
        [one] => (Some(one.as_str()), None),
        [path, command] => (Some(path.as_str()), Some(command.as_str())),
        _ => usage(program),
    };
    let command = match command_arg {
        Some(arg) => Command::parse(arg).unwrap_or_else(|| usage(program)),
        None => Command::Tree,
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Ignoring unreadable config: {e}");
            None
        }
    };

    let path = match (path_arg, &config) {
        (Some(path), _) => PathBuf::from(path),
        (None, Some(config)) => config.default_theme(),
        (None, None) => {
            eprintln!("Error: No theme path provided and no config file found");
            usage(program);
        }
    };

    if path.is_dir() {
        for theme in io::scan_theme_files(&path)? {
            println!("{}", theme.display());
        }
        return Ok(());
    }

    let options = EditorOptions {
        click_selects_component: config.as_ref().is_none_or(|c| c.click_selects_component),
    };
    let strip_titles = config.as_ref().is_none_or(|c| c.strip_titles_on_save);

    let document = io::read_theme(&path)
        .with_context(|| format!("Failed to load theme {}", path.display()))?;
    let mut editor = Editor::new(document, options);
    editor.refresh_titles(component_title);
    log::info!(
        "Loaded {} with {} components",
        path.display(),
        editor.document().components().len()
    );

    match command {
        Command::Tree => {
            print!("{}", editor.document().format_tree());
            for violation in invariants::tree_violations(editor.document()) {
                log::warn!("{violation}");
            }
        }
        Command::Source => {
            println!(
                "{}",
                markup::serialize(editor.document(), &MarkupOptions::default())
            );
        }
        Command::Save => io::save_theme(&path, editor.document(), strip_titles)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_title() {
        assert_eq!(component_title("DayOfWeek"), "Day of week");
        assert_eq!(component_title("hour"), "Hour");
        assert_eq!(component_title(""), "");
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("save"), Some(Command::Save));
        assert_eq!(Command::parse("theme.html"), None);
    }
}
