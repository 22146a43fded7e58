// Renders the man page and shell completions from the CLI definition.

use std::env;
use std::fs;

use clap::CommandFactory;
use clap_complete::{generate_to, Shell};

// Brings in `Cli` along with its `clap` and `PathBuf` imports
include!("src/cli.rs");

fn main() -> std::io::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/cli.rs");

    let Some(out_dir) = env::var_os("OUT_DIR").map(PathBuf::from) else {
        return Ok(());
    };

    let mut cmd = Cli::command();

    let mut manpage = Vec::new();
    clap_mangen::Man::new(cmd.clone()).render(&mut manpage)?;
    fs::write(out_dir.join("featpack.1"), manpage)?;

    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
        generate_to(shell, &mut cmd, "featpack", &out_dir)?;
    }

    Ok(())
}
