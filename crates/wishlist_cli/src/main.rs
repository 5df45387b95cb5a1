//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `wishlist_core` linkage without the mobile runtime.
//! - Optionally print the wishes stored in a database file (`--db <path>`).

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use wishlist_core::WishStore;

#[derive(Parser, Debug)]
#[command(name = "wishlist_cli", version, about = "Wishlist core smoke check")]
struct Args {
    /// SQLite database whose wishes should be listed.
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    println!("wishlist_core ping={}", wishlist_core::ping());
    println!("wishlist_core version={}", wishlist_core::core_version());

    match args.db {
        Some(path) => print_wishes(&path),
        None => ExitCode::SUCCESS,
    }
}

fn print_wishes(path: &Path) -> ExitCode {
    let store = match WishStore::open(path) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("failed to open `{}`: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };

    match store.list() {
        Ok(wishes) => {
            println!("wishes={}", wishes.len());
            for wish in wishes {
                println!("{}\t{}\t{}", wish.id, wish.title, wish.description);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to list wishes: {err}");
            ExitCode::FAILURE
        }
    }
}
