use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use randomiser_core::{run, Category, CategorySet, RandomiserSettings, DEFAULT_MAX_ATTEMPTS};

#[derive(Debug, Parser)]
#[command(name = "gbc-randomiser", version, about = "Pokémon Gold cartridge randomiser")]
struct Args {
    #[arg(long, required_unless_present_any = ["settings", "list_categories"])]
    input: Option<PathBuf>,

    /// Destination; `.gbc` is appended when missing.
    #[arg(long, required_unless_present_any = ["settings", "list_categories"])]
    output: Option<PathBuf>,

    /// Derived from the clock when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Randomise only these categories (repeatable).
    #[arg(long, value_name = "CATEGORY", num_args = 1..)]
    only: Vec<Category>,

    #[arg(long, value_name = "CATEGORY", num_args = 1..)]
    skip: Vec<Category>,

    /// Redraw budget per constrained draw [default: 64].
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Also write a JSON spoiler log next to the output.
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Read every setting from a JSON file; other flags override it.
    #[arg(long, value_name = "JSON")]
    settings: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    list_categories: bool,
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn categories(only: &[Category], skip: &[Category]) -> CategorySet {
    let mut set = if only.is_empty() {
        CategorySet::all()
    } else {
        only.iter().copied().collect()
    };
    for &category in skip {
        set.remove(category);
    }
    set
}

fn settings_from_args(args: Args) -> randomiser_core::Result<RandomiserSettings> {
    let mut settings = match args.settings.as_deref() {
        Some(path) => RandomiserSettings::from_json_file(path)?,
        None => {
            let missing = |name: &str| {
                randomiser_core::RandomiserError::Config(format!("--{name} is required"))
            };
            RandomiserSettings {
                seed: 0,
                categories: CategorySet::all(),
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                debug: false,
                input_path: args.input.clone().ok_or_else(|| missing("input"))?,
                output_path: args.output.clone().ok_or_else(|| missing("output"))?,
            }
        }
    };

    if args.settings.is_none() {
        settings.seed = args.seed.unwrap_or_else(|| {
            let seed = clock_seed();
            info!("no seed given, using {seed}");
            seed
        });
        settings.categories = categories(&args.only, &args.skip);
    } else {
        if let Some(seed) = args.seed {
            settings.seed = seed;
        }
        if !args.only.is_empty() {
            settings.categories = args.only.iter().copied().collect();
        }
        for &category in &args.skip {
            settings.categories.remove(category);
        }
        if let Some(input) = args.input {
            settings.input_path = input;
        }
        if let Some(output) = args.output {
            settings.output_path = output;
        }
    }
    if let Some(max_attempts) = args.max_attempts {
        settings.max_attempts = max_attempts;
    }
    settings.debug |= args.debug;
    Ok(settings)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.list_categories {
        for category in Category::MENU_ORDER {
            println!("{:<24} {}", category.name(), category.menu_label());
        }
        return;
    }

    let settings = match settings_from_args(args) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };
    println!("Seed: {}", settings.seed);

    match run(settings) {
        Ok(written) => println!("Wrote {}", written.display()),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
