//! Defaults command - print the builtin binding table

use anyhow::Result;
use clap::Args;
use ioport_core::{BindingTable, SeqType};

/// Arguments for the defaults command
#[derive(Args)]
pub struct DefaultsArgs {
    /// Only show this player (1-based)
    #[arg(short, long)]
    pub player: Option<u8>,
}

/// Execute the defaults command
pub fn execute(args: DefaultsArgs) -> Result<()> {
    if args.player == Some(0) {
        anyhow::bail!("Players are numbered from 1");
    }
    print!("{}", render(&BindingTable::builtin(), args.player.map(|p| p - 1)));
    Ok(())
}

fn render(table: &BindingTable, player: Option<u8>) -> String {
    let mut out = String::new();
    for (key, entry) in table.sorted_entries() {
        if player.is_some_and(|p| p != key.player) {
            continue;
        }
        let name = format!("P{} {}", u32::from(key.player) + 1, key.control);
        for seq_type in SeqType::ALL {
            let sequence = entry.get(seq_type);
            if sequence.is_empty() {
                continue;
            }
            let label = match seq_type {
                SeqType::Standard => name.clone(),
                other => format!("{name} ({other})"),
            };
            out.push_str(&format!("{label:<32} {sequence}\n"));
        }
    }
    out
}
