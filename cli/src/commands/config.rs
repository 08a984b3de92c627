//! Config command - show the effective configuration or write the defaults.

use anyhow::Result;
use portscope_core::{Config, ConfigStore, Shortcut};

pub fn show(store: &ConfigStore, config: &Config, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    let keymap = config.keymap()?;
    let classifier = config.classifier();

    println!("Config file:        {}", store.path().display());
    println!("Refresh interval:   {}s", config.refresh_interval);
    println!("Freshness window:   {}ms", config.freshness_window_ms);
    println!(
        "Confirm unexpected: {}",
        if config.confirm_unexpected_kills { "yes" } else { "no" }
    );

    let source = if config.type_presets.is_some() { "custom" } else { "built-in" };
    println!("\nType presets ({}):", source);
    for preset in classifier.presets() {
        println!("  {:<12} priority {}", preset.name.as_str(), preset.priority);
    }

    println!("\nKey bindings:");
    for shortcut in Shortcut::ALL {
        println!("  {:<14} {}", shortcut.name(), keymap.keys_for(shortcut).join(", "));
    }
    Ok(())
}

pub async fn init(store: &ConfigStore, force: bool) -> Result<()> {
    if store.init(force).await? {
        println!("Wrote default configuration to {}", store.path().display());
    } else {
        println!(
            "Config file {} already exists (use --force to replace it)",
            store.path().display()
        );
    }
    Ok(())
}
