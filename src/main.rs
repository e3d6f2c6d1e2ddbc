use anyhow::Result;

use marionette::{
    animation::AnimationScheduler,
    bus::{self, BusConductor},
    cli,
    config::SculptureConfig,
    runtime::{queue_default_show, ControlCommand, FrameSink, Runtime},
    server,
    sim::SimulatedSculpture,
    tui,
};

fn main() -> Result<()> {
    env_logger::init();
    let matches = cli::parse_args();

    if matches.get_flag("list-ports") {
        for port in bus::list_ports() {
            println!("{port}");
        }
        return Ok(());
    }

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => SculptureConfig::from_file(path)?,
        None => SculptureConfig::default(),
    };
    if let Some(port) = matches.get_one::<String>("port") {
        config.port_name = port.clone();
    }
    if let Some(baud) = matches.get_one::<u32>("baud-rate") {
        config.baud_rate = *baud;
    }
    if let Some(interval) = matches.get_one::<u64>("interval-ms") {
        config.frame_interval_ms = *interval;
    }
    if matches.get_flag("simulate") {
        config.simulate = true;
    }
    if let Some(port) = matches.get_one::<u16>("server-port") {
        config.server_port = *port;
    }

    // One-shot coil write, then exit
    if let Some(spec) = matches.get_one::<String>("set-coil") {
        let (unit, motor, address, value) = cli::parse_coil_spec(spec)?;
        let conductor = BusConductor::connect(&config.port_name, config.baud_rate)?;
        conductor.write_motor_coils(unit, motor, address, &[value])?;
        return Ok(());
    }

    let total_balls = config.total_balls();
    let sink: Box<dyn FrameSink> = if config.simulate {
        log::info!("Simulation mode: skipping device check, frames go to the simulator");
        Box::new(SimulatedSculpture::new(&config.balls_per_ring)?)
    } else {
        Box::new(BusConductor::connect(&config.port_name, config.baud_rate)?)
    };

    let mut scheduler = AnimationScheduler::new();
    queue_default_show(&mut scheduler, total_balls);

    let (control_tx, control_rx) = flume::unbounded();
    let runtime = Runtime::new(config.clone(), scheduler, sink, control_rx);
    let status = runtime.status();

    let run_tui = matches.get_flag("tui");
    let run_server = matches.get_flag("serve");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(async move {
        let runtime_handle = tokio::spawn(runtime.run());

        let (shutdown_tx, shutdown_rx) = flume::bounded::<()>(1);
        let server_handle = if run_server {
            let tx = control_tx.clone();
            let status = status.clone();
            let port = config.server_port;
            Some(tokio::spawn(server::serve(
                port,
                total_balls,
                tx,
                status,
                shutdown_rx,
            )))
        } else {
            None
        };

        if run_tui {
            let status = status.clone();
            let tx = control_tx.clone();
            tokio::task::spawn_blocking(move || tui::start(status, tx)).await??;
        } else {
            tokio::signal::ctrl_c().await?;
            log::info!("Received Ctrl-C, shutting down");
            let _ = control_tx.send(ControlCommand::Shutdown);
        }

        let _ = shutdown_tx.send(());
        runtime_handle.await??;
        if let Some(handle) = server_handle {
            handle.await??;
        }

        Ok(())
    })
}
