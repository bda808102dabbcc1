mod script;

use anyhow::{Context, Result};
use arbor_config::Config;
use arbor_engine::extensions::{Fixture, MarkdownShortcuts, install_all};
use arbor_engine::snapshot::outline;
use arbor_engine::{Editor, Node, read_document};
use log::info;
use std::io::Read;
use std::{env, fs, io, path::PathBuf, process};

const FIXTURE_PREFIX: &str = "fixture:";

/// Where the starting document comes from.
enum Source {
    Fixture(Fixture),
    File(PathBuf),
}

impl Source {
    fn parse(arg: &str) -> Result<Self> {
        match arg.strip_prefix(FIXTURE_PREFIX) {
            Some(name) => Ok(Source::Fixture(name.parse()?)),
            None => Ok(Source::File(PathBuf::from(arg))),
        }
    }

    fn load(&self) -> Result<Vec<Node>> {
        match self {
            Source::Fixture(fixture) => Ok(fixture.load()?),
            Source::File(path) => read_document(path)
                .with_context(|| format!("loading document {}", path.display())),
        }
    }
}

fn usage(program: &str) {
    eprintln!("Usage: {program} [document.json|fixture:<name>] [script-file]");
    eprintln!("The script is read from stdin when no script file is given.");
    eprintln!(
        "Fixtures: {}",
        Fixture::ALL
            .iter()
            .map(|fixture| fixture.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let (source, script_path) = match args.len() {
        1 => match &config.document {
            Some(document) => (Source::File(document.clone()), None),
            None => {
                eprintln!("Error: No document provided and none set in the config file");
                usage(&args[0]);
                eprintln!("Or set `document` in {}", config_path.display());
                process::exit(1);
            }
        },
        2 => (Source::parse(&args[1])?, None),
        3 => (Source::parse(&args[1])?, Some(PathBuf::from(&args[2]))),
        _ => {
            usage(&args[0]);
            process::exit(1);
        }
    };

    let children = source.load()?;
    let mut editor = Editor::with_schema(children, config.to_schema());
    editor.set_iterations_per_dirty_path(config.normalize.iterations_per_dirty_path);
    install_all(
        &mut editor,
        MarkdownShortcuts::default().with_shortcuts(config.shortcuts.clone()),
    );
    editor.normalize()?;
    editor.flush();
    info!("loaded {} blocks, extensions: {:?}", editor.children().len(), editor.extension_names());

    let script = match &script_path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?,
        None => {
            let mut script = String::new();
            io::stdin().read_to_string(&mut script)?;
            script
        }
    };
    let commands = script::parse(&script)?;

    let stdout = io::stdout();
    let mut runner = script::Runner {
        editor: &mut editor,
        search_mark: config.search.mark.clone(),
        out: stdout.lock(),
    };
    runner.run(&commands)?;

    print!("{}", outline(&editor));
    Ok(())
}
