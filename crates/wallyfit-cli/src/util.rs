use std::{
    fs::File,
    io::{self, BufWriter},
    path::Path,
};

use anyhow::Context;
use wallyfit_engine::GameConfig;

/// Writes `value` as pretty JSON to `output_path`, or to stdout without one.
pub fn write_json<T>(value: &T, output_path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    match output_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            write_pretty(BufWriter::new(file), value)
                .with_context(|| format!("Failed to write JSON to {}", path.display()))
        }
        None => write_pretty(io::stdout().lock(), value).context("Failed to write JSON to stdout"),
    }
}

fn write_pretty<W, T>(mut writer: W, value: &T) -> io::Result<()>
where
    W: io::Write,
    T: serde::Serialize,
{
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Reads the game rules, falling back to the defaults without a file.
///
/// Fields missing from the file keep their default values. The result is
/// validated before it is returned.
pub fn read_config_file<P>(path: Option<P>) -> anyhow::Result<GameConfig>
where
    P: AsRef<Path>,
{
    let config = match path {
        Some(path) => {
            let config: GameConfig = read_json_file("config", &path)?;
            config.validate().with_context(|| {
                format!("Invalid config file: {}", path.as_ref().display())
            })?;
            config
        }
        None => GameConfig::default(),
    };
    Ok(config)
}
