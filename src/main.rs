use anyhow::Result;

#[cfg(windows)]
fn main() -> Result<()> {
    run::run()
}

#[cfg(not(windows))]
fn main() -> Result<()> {
    eprintln!("macrokey only synthesizes input on Windows.");
    Ok(())
}

#[cfg(windows)]
mod run {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{Context, Result};

    use macrokey::platform::win::{
        enable_high_resolution_timer, set_console_ctrl_handler, shutdown_requested, AsyncKeyState,
        SendInputInjector, WinHotkeyBackend,
    };
    use macrokey::{
        status_channel, ComboExecutor, ComboStore, EngineConfig, HotkeyManager, InputSimulator,
    };

    pub fn run() -> Result<()> {
        // Request 1ms timer resolution for precise timing in playback delays
        enable_high_resolution_timer();
        set_console_ctrl_handler().context("failed to install console ctrl handler")?;

        // Load config or create default if not exists
        let config =
            EngineConfig::load_or_create("Config.toml").context("failed to load configuration")?;

        let store = ComboStore::new(&config.combos_path);
        let combos = match store.load() {
            Ok(combos) => combos,
            Err(e) => {
                eprintln!("Could not load {}: {e:#}. Starting empty.", config.combos_path);
                Vec::new()
            }
        };

        let (status_tx, status_rx) = status_channel();
        let (trigger_tx, trigger_rx) = crossbeam_channel::unbounded();

        let simulator = InputSimulator::new(
            Arc::new(SendInputInjector),
            config.key_press_delay_ms,
            config.mouse_click_delay_ms,
        );
        let executor = Arc::new(ComboExecutor::new(simulator, status_tx.clone()));
        let backend = Arc::new(WinHotkeyBackend::spawn(trigger_tx, status_tx.clone()));
        let key_source = Arc::new(AsyncKeyState);

        let manager = Arc::new(HotkeyManager::new(
            Arc::clone(&executor),
            backend,
            trigger_rx,
            key_source,
            status_tx,
            &config,
        ));

        for combo in &combos {
            println!("{combo}");
        }
        manager.update_combos(&combos);
        manager.start();

        while !shutdown_requested() {
            match status_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(event) => println!("{event}"),
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }

        manager.stop();
        // Drain the shutdown events so the final state is visible.
        while let Ok(event) = status_rx.try_recv() {
            println!("{event}");
        }
        Ok(())
    }
}
