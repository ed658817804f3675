use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use loanscope_analysis::dataset::{Column, Dataset};
use tracing::info;

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

    /// Creates `path` only if it does not exist yet; `None` if it does.
    pub fn create_new(path: PathBuf) -> anyhow::Result<Option<Self>> {
        match File::create_new(&path) {
            Ok(file) => Ok(Some(Output::File {
                writer: BufWriter::new(file),
                path,
            })),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to create output file: {}", path.display()))
            }
        }
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

/// Read a dataset from a CSV file with a header row
pub fn read_csv_file<P>(path: P) -> anyhow::Result<Dataset>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open dataset file: {}", path.display()))?;
    let dataset = read_csv(io::BufReader::new(file))
        .with_context(|| format!("Failed to read dataset file: {}", path.display()))?;
    info!(
        "Loaded {} rows and {} columns from {}",
        dataset.num_rows(),
        dataset.columns().len(),
        path.display()
    );
    Ok(dataset)
}

/// Read a dataset from CSV text, inferring each column's type
///
/// A column is `Int` if every present cell is an integer and none is missing,
/// `Float` if every present cell is a number, and `Text` otherwise. Empty,
/// `NA` and `NaN` cells are missing.
pub fn read_csv<R>(reader: R) -> anyhow::Result<Dataset>
where
    R: io::Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();
    let mut raw_columns = vec![vec![]; headers.len()];
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV record {}", line + 1))?;
        for (column, cell) in raw_columns.iter_mut().zip(record.iter()) {
            column.push(cell.to_owned());
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw_columns)
        .map(|(name, cells)| infer_column(name, &cells))
        .collect();
    Ok(Dataset::new(columns)?)
}

fn is_missing(cell: &str) -> bool {
    matches!(cell, "" | "NA" | "NaN")
}

#[expect(clippy::cast_precision_loss)]
fn infer_column(name: String, cells: &[String]) -> Column {
    let cells = cells
        .iter()
        .map(|cell| Some(cell.as_str()).filter(|c| !is_missing(c)))
        .collect::<Vec<_>>();

    let ints = cells
        .iter()
        .map(|cell| cell.map(str::parse::<i64>).transpose())
        .collect::<Result<Vec<_>, _>>();
    if let Ok(ints) = ints {
        if ints.iter().all(Option::is_some) {
            return Column::int(name, ints);
        }
        return Column::float(
            name,
            ints.into_iter().map(|v| v.map(|v| v as f64)).collect(),
        );
    }

    let floats = cells
        .iter()
        .map(|cell| cell.map(str::parse::<f64>).transpose())
        .collect::<Result<Vec<_>, _>>();
    match floats {
        Ok(floats) => Column::float(name, floats),
        Err(_) => Column::text(name, cells),
    }
}

#[cfg(test)]
mod tests {
    use loanscope_analysis::dataset::{ColumnType, Scalar};

    use super::*;

    const LOANS: &str = "\
id,term,dti,home,TARGET
1,36,12.5,RENT,0
2,60,,OWN,1
3,36,8,NA,0
4,,30.1,MORTGAGE,1
";

    #[test]
    fn test_infers_column_types() {
        let dataset = read_csv(LOANS.as_bytes()).unwrap();
        assert_eq!(dataset.num_rows(), 4);

        let ty = |name| dataset.column(name).unwrap().column_type();
        assert_eq!(ty("id"), ColumnType::Int);
        assert_eq!(ty("TARGET"), ColumnType::Int);
        assert_eq!(ty("term"), ColumnType::Float);
        assert_eq!(ty("dti"), ColumnType::Float);
        assert_eq!(ty("home"), ColumnType::Text);
    }

    #[test]
    fn test_missing_cells() {
        let dataset = read_csv(LOANS.as_bytes()).unwrap();
        let dti = dataset.column("dti").unwrap().cells();
        assert_eq!(dti[1], None);
        assert_eq!(dti[2], Some(Scalar::Float(8.0)));
        let home = dataset.column("home").unwrap().cells();
        assert_eq!(home[2], None);
        assert_eq!(home[3], Some(Scalar::from("MORTGAGE")));
        let term = dataset.column("term").unwrap().cells();
        assert_eq!(term[3], None);
    }

    #[test]
    fn test_ragged_record_fails() {
        let result = read_csv("a,b\n1,2\n3\n".as_bytes());
        assert!(result.is_err());
    }
}
