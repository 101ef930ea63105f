use std::path::PathBuf;

use clap::Args;
use eyre::{Result, bail};
use metagen_core::OutputFile;
use metagen_csharp::scenarios;
use metagen_schema::Schema;

#[derive(Args)]
pub struct GenerateCommand {
    /// Output directory (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Generate a single scenario (contract, reader, writer, binary, walker)
    #[arg(long)]
    pub only: Option<String>,
}

impl GenerateCommand {
    pub fn run(&self) -> Result<()> {
        let schema = Schema::native_format();

        let mut selected = scenarios();
        if let Some(name) = &self.only {
            selected.retain(|s| s.name() == name.as_str());
            if selected.is_empty() {
                bail!("unknown scenario '{name}'");
            }
        }

        for scenario in &selected {
            for source in scenario.render(&schema)? {
                let file = OutputFile::new(&source.file_name, source.content);
                let path = file.write(&self.out)?;
                println!("  {} ({})", path.display(), scenario.name());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn generates_every_scenario_output() {
        let temp = TempDir::new().unwrap();
        let cmd = GenerateCommand {
            out: temp.path().to_path_buf(),
            only: None,
        };

        cmd.run().unwrap();

        for name in [
            "NativeFormatReaderCommonGen.cs",
            "NativeFormatReaderGen.cs",
            "NativeFormatWriterGen.cs",
            "MdBinaryReaderGen.cs",
            "MdBinaryWriterGen.cs",
            "MdWalkerGen.cs",
        ] {
            assert!(temp.path().join(name).exists(), "missing {name}");
        }
    }

    #[test]
    fn only_filter_limits_outputs() {
        let temp = TempDir::new().unwrap();
        let cmd = GenerateCommand {
            out: temp.path().to_path_buf(),
            only: Some("walker".to_owned()),
        };

        cmd.run().unwrap();

        assert!(temp.path().join("MdWalkerGen.cs").exists());
        assert!(!temp.path().join("NativeFormatReaderGen.cs").exists());
    }

    #[test]
    fn unknown_scenario_is_an_error() {
        let cmd = GenerateCommand {
            out: PathBuf::from("."),
            only: Some("nope".to_owned()),
        };

        assert!(cmd.run().is_err());
    }
}
