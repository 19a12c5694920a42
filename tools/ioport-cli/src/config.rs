//! Config command - parse and validate a configuration document

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use ioport_core::{ConfigDocument, ConfigScope};

/// Which scope the document is checked against
#[derive(Clone, Copy, ValueEnum)]
pub enum ScopeArg {
    System,
    Session,
    Profile,
}

impl From<ScopeArg> for ConfigScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::System => ConfigScope::System,
            ScopeArg::Session => ConfigScope::Session,
            ScopeArg::Profile => ConfigScope::Profile,
        }
    }
}

/// Arguments for the config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration document (TOML)
    pub file: PathBuf,

    /// Scope to validate against
    #[arg(short, long, value_enum, default_value = "session")]
    pub scope: ScopeArg,

    /// Print the normalized document after validation
    #[arg(long)]
    pub print: bool,
}

/// Execute the config command
pub fn execute(args: ConfigArgs) -> Result<()> {
    let scope = ConfigScope::from(args.scope);
    let document = ConfigDocument::load(&args.file)
        .with_context(|| format!("Failed to load config: {}", args.file.display()))?;

    println!("Config: {} ({scope} scope)", args.file.display());
    println!(
        "  {} remap(s), {} default node(s), {} port node(s)",
        document.remap.len(),
        document.defaults.len(),
        document.port.len()
    );

    let warnings = document.validate(scope);
    for warning in &warnings {
        println!("  warning: {warning}");
    }

    if args.print {
        println!();
        print!("{}", document.to_toml_string()?);
    }

    if warnings.is_empty() {
        println!("OK");
    } else {
        println!("{} warning(s)", warnings.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_warnings_do_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("default.toml");
        std::fs::write(
            &file,
            "[[remap]]\nfrom = \"KEYCODE_A\"\nto = \"KEYCODE_B\"\n",
        )
        .unwrap();

        execute(ConfigArgs {
            file,
            scope: ScopeArg::System,
            print: true,
        })
        .unwrap();
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute(ConfigArgs {
            file: dir.path().join("missing.toml"),
            scope: ScopeArg::Profile,
            print: false,
        })
        .unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
