use crate::prelude::*;
use clap::ArgMatches;
use lifeline::dyn_bus::DynBus;
use log::LevelFilter;
use message::main::{MainRecv, MainShutdown};
use service::main::MainService;
use simplelog::{ColorChoice, CombinedLogger, TermLogger, TerminalMode, WriteLogger};
use std::{str::FromStr, time::Duration};
use store::SnapshotStore;
use tabnav_api::{
    config::{load_config, log_path, mkdir, profiles_dir, Config},
    profile::{FileProfileData, MemoryProfileData, Profile},
};
use utils::wait_for_shutdown;

pub mod bus;
pub mod message;
mod prelude;
pub mod service;
pub mod state;
pub mod store;
pub mod utils;

pub fn shell_main(args: ArgMatches, level: LevelFilter) -> anyhow::Result<()> {
    init(level)?;

    info!("tabnav runtime starting");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .build()?;

    let result = runtime.block_on(async { main_async(args).await });

    runtime.shutdown_timeout(Duration::from_millis(25));
    info!("tabnav runtime stopped");

    result
}

fn init(level: LevelFilter) -> anyhow::Result<()> {
    mkdir()?;
    let log_file = log_path()?;

    let config = simplelog::ConfigBuilder::new()
        .set_time_format_str("%H:%M:%S%.3f NAV")
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(level, config.clone(), TerminalMode::Stderr, ColorChoice::Auto),
        WriteLogger::new(level, config, std::fs::File::create(log_file)?),
    ])
    .map_err(|e| anyhow::Error::msg(e.to_string()))?;

    log_panics::init();

    Ok(())
}

async fn main_async(args: ArgMatches<'_>) -> anyhow::Result<()> {
    let mut config = load_config()?;
    if args.is_present("DISABLE-TABS") {
        config.tabs.enabled = false;
    }

    let store = if args.is_present("EPHEMERAL") {
        info!("using in-memory profile data");
        SnapshotStore::new(MemoryProfileData::new())
    } else {
        SnapshotStore::new(FileProfileData::new(profiles_dir()?))
    };

    let (mut tx, rx_shutdown, _service) = spawn(config, store)?;

    if let Some(id) = args.value_of("PROFILE") {
        let id = i64::from_str(id)?;
        tx.send(MainRecv::LoadProfile(Profile::new(id, format!("profile-{}", id))))
            .await?;
    }

    if let Some(urls) = args.values_of("OPEN") {
        let urls = urls.map(str::to_string).collect();
        tx.send(MainRecv::OpenTabs(urls)).await?;
    }

    if args.is_present("LIST") {
        tx.send(MainRecv::ListTabs).await?;
    }

    tx.send(MainRecv::Shutdown).await?;

    match wait_for_shutdown(rx_shutdown).await {
        Some(MainShutdown(0)) | None => Ok(()),
        Some(MainShutdown(code)) => Err(anyhow::Error::msg(format!("exited with code {}", code))),
    }
}

fn spawn(
    config: Config,
    store: SnapshotStore,
) -> anyhow::Result<(
    impl Sink<Item = MainRecv> + Unpin,
    impl Stream<Item = MainShutdown> + Unpin,
    MainService,
)> {
    let bus = MainBus::default();
    bus.store_resource(config);
    bus.store_resource(store);

    let service = MainService::spawn(&bus)?;

    let tx = bus.tx::<MainRecv>()?;
    let rx_shutdown = bus.rx::<MainShutdown>()?;

    Ok((tx, rx_shutdown, service))
}
