#[macro_use]
extern crate log;

mod run;

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use yomu_copymangas::CopyMangas;
use yomu_util::prefs::JsonFileStore;

#[derive(Parser)]
#[clap(version, about = "Runs the CopyMangas source against the live API")]
struct Opts {
    /// Preferences file, created on the first change
    #[clap(short, long, default_value = "./copymangas.json")]
    prefs: PathBuf,
    #[clap(subcommand)]
    subcmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    Info,
    Filters,
    Preferences,
    Popular {
        #[clap(default_value_t = 1)]
        page: i64,
    },
    Latest {
        #[clap(default_value_t = 1)]
        page: i64,
    },
    Search {
        #[clap(default_value_t = 1)]
        page: i64,
        #[clap(short, long)]
        query: Option<String>,
        /// Filter selection as NAME=INDEX, repeatable
        #[clap(short, long = "filter")]
        filters: Vec<String>,
    },
    Detail {
        path: String,
    },
    Chapters {
        path: String,
    },
    Pages {
        path: String,
    },
    /// Logs in with the stored username and password
    Login,
    /// Changes one preference, e.g. `set imageQualityZ 1500`
    Set {
        key: String,
        value: String,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let opts: Opts = Opts::parse();

    let store = JsonFileStore::open(&opts.prefs)?;
    info!("preferences at {}", opts.prefs.display());
    let source = CopyMangas::new(Arc::new(store))?;

    run::run(&source, opts.subcmd)
}
