use harness_golang::ENTRY_FLAGS;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A successfully built application binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    pub bin_path: PathBuf,
}

/// Values for the flags every generated program accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppArgs {
    pub run_mode: String,
    /// 0 lets the application read its port from its own configuration.
    pub port: u16,
    pub import_path: String,
    pub src_path: PathBuf,
}

impl AppArgs {
    fn value(&self, flag: &str) -> Option<String> {
        match flag {
            "runMode" => Some(self.run_mode.clone()),
            "port" => Some(self.port.to_string()),
            "importPath" => Some(self.import_path.clone()),
            "srcPath" => Some(self.src_path.display().to_string()),
            _ => None,
        }
    }
}

impl App {
    pub fn new(bin_path: impl Into<PathBuf>) -> Self {
        Self {
            bin_path: bin_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.bin_path
    }

    /// The command that launches the binary, one `-name=value` per entry flag.
    pub fn command(&self, args: &AppArgs) -> Command {
        let mut command = Command::new(&self.bin_path);
        for flag in &ENTRY_FLAGS {
            if let Some(value) = args.value(flag.name) {
                command.arg(format!("-{}={}", flag.name, value));
            }
        }
        command
    }
}
