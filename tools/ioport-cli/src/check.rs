//! Check command - build a registry from a layout file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use ioport_core::{BindingTable, ConfigDocument, ConfigScope, PortLayout, PortRegistry};

/// Arguments for the check command
#[derive(Args)]
pub struct CheckArgs {
    /// TOML layout file (`[[group]]` / `[[group.control]]`)
    pub layout: PathBuf,

    /// Session configuration to apply on top of the layout
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Execute the check command
pub fn execute(args: CheckArgs) -> Result<()> {
    let layout = load_layout(&args.layout)?;
    let controls: usize = layout.groups.iter().map(|g| g.controls.len()).sum();
    println!("Checking layout: {}", args.layout.display());
    println!("  {} group(s), {} control(s)", layout.groups.len(), controls);

    let bindings = BindingTable::builtin();
    let mut registry = match PortRegistry::build(layout.into_stream(), &bindings) {
        Ok(registry) => registry,
        Err(errors) => {
            for error in errors.errors() {
                eprintln!("  error: {error}");
            }
            anyhow::bail!("{} configuration error(s)", errors.len());
        }
    };

    if let Some(path) = &args.config {
        let document = ConfigDocument::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?;
        for warning in document.validate(ConfigScope::Session) {
            println!("  warning: {warning}");
        }
        let applied = match document.apply_ports(&mut registry) {
            Ok(applied) => applied,
            Err(errors) => {
                for error in errors.errors() {
                    eprintln!("  error: {error}");
                }
                anyhow::bail!("{} configuration error(s) in {}", errors.len(), path.display());
            }
        };
        println!(
            "  Applied {}/{} port override(s) from {}",
            applied,
            document.port.len(),
            path.display()
        );
    }

    let order: Vec<&str> = registry
        .evaluation_order()
        .iter()
        .filter_map(|&id| registry.group(id))
        .map(|group| group.tag())
        .collect();
    println!("  Evaluation order: {}", order.join(" -> "));

    for group in registry.groups() {
        println!("  [{}] bits {:#010x}", group.tag(), group.used_bits());
        for field in group.fields() {
            let descriptor = field.descriptor();
            println!(
                "    {:#010x} {:<16} {:?} = {:#x}",
                descriptor.mask,
                descriptor.display_name(),
                field.class(),
                field.value()
            );
        }
    }

    println!("OK");
    Ok(())
}

fn load_layout(path: &Path) -> Result<PortLayout> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read layout: {}", path.display()))?;
    PortLayout::from_toml_str(&text)
        .with_context(|| format!("Failed to parse layout: {}", path.display()))
}
