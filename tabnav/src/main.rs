//! `tabnav`, a tabbed navigation shell which remembers your open tabs.

pub mod cli;
use cli::{init, log_level};

pub fn main() -> anyhow::Result<()> {
    let args = init();
    let level = log_level(&args)?;

    // create the dotdir path, so the shell doesn't need to worry about it.
    tabnav_api::config::mkdir()?;

    tabnav_shell::shell_main(args, level)
}
