use tokio::io::BufReader;
use tokio::sync::mpsc as tokio_mpsc;

use lora_kernel::console::{HELP, InputHandler};
use lora_kernel::{Downlink, Kernel, KernelConfig, LoraError, SimulatedRadio};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("LoRa Radio Control Kernel");
    println!("=========================");
    println!("No radio hardware attached; using the simulated driver.");
    println!("{HELP}");

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    let result = rt.block_on(async {
        let config = KernelConfig::default();

        // Console/tick → kernel.
        let (inbound_tx, inbound_rx) = tokio_mpsc::channel(32);
        // Kernel → console: telemetry and events.
        let (downlink_tx, downlink_rx) = tokio_mpsc::unbounded_channel::<Downlink>();

        tokio::spawn(print_downlink(downlink_rx));

        let input = InputHandler::new(
            BufReader::new(tokio::io::stdin()),
            config.status_period,
            inbound_tx,
        );

        let mut kernel = Kernel::new(config, SimulatedRadio::new(), downlink_tx);
        let (_, result) = tokio::join!(input.finished(), kernel.run(inbound_rx));
        result
    });

    match result {
        Ok(()) | Err(LoraError::CommandPipeClosed) => {}
        Err(e) => {
            eprintln!("Kernel error: {e}");
            std::process::exit(1);
        }
    }
}

async fn print_downlink(mut rx: tokio_mpsc::UnboundedReceiver<Downlink>) {
    while let Some(msg) = rx.recv().await {
        match msg {
            // Status arrives every tick; keep it at debug so the console stays readable.
            Downlink::StatusTlm(tlm) => log::debug!("{tlm:?}"),
            Downlink::RadioTlm(tlm) => {
                println!(
                    "radio @ {}: {} | {} | LNA {} | ramp {} | reg {} | standby {} | {} ({} Hz)",
                    tlm.captured_at.format("%H:%M:%S"),
                    tlm.config.frequency,
                    tlm.config.modulation,
                    tlm.config.low_noise_amp_mode,
                    tlm.config.power_amp_ramp_time,
                    tlm.config.power_regulator_mode,
                    tlm.config.standby_mode,
                    tlm.device.spi_device,
                    tlm.device.spi_speed,
                );
            }
            // Already written through the log facade.
            Downlink::Event(_) => {}
        }
    }
}
