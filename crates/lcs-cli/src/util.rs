use std::{
    fs::File,
    io::{self, BufReader, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use lcs_core::{LcsSeed, Params, Xcs};

use crate::schema::summary::ModelSummary;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Read learning parameters from a JSON file
///
/// Missing fields take their default values. Without a path the defaults are
/// returned.
pub fn read_params_file<P>(path: Option<P>) -> anyhow::Result<Params>
where
    P: AsRef<Path>,
{
    match path {
        Some(path) => read_json_file("params", path),
        None => Ok(Params::default()),
    }
}

/// Read a model summary written by `lcs train`
pub fn read_summary_file<P>(path: P) -> anyhow::Result<ModelSummary>
where
    P: AsRef<Path>,
{
    read_json_file("model summary", path)
}

/// Write the population of `xcs` to a binary model file
pub fn save_model<P>(xcs: &Xcs, path: P) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create model file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    xcs.save(&mut writer)
        .with_context(|| format!("Failed to write model file: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush model file: {}", path.display()))?;
    Ok(())
}

/// Read a binary model file written by [`save_model`]
pub fn load_model<P>(path: P, params: Params, seed: LcsSeed) -> anyhow::Result<Xcs>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open model file: {}", path.display()))?;
    Xcs::load(BufReader::new(file), params, seed)
        .with_context(|| format!("Failed to load model file: {}", path.display()))
}

/// Parse a seed given in hexadecimal, with or without a `0x` prefix
pub fn parse_seed(s: &str) -> anyhow::Result<LcsSeed> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let value =
        u128::from_str_radix(digits, 16).with_context(|| format!("Invalid seed: {s}"))?;
    Ok(LcsSeed::from_u128(value))
}
