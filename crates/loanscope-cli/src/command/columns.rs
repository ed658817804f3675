use std::{io::Write as _, path::PathBuf};

use anyhow::Context;
use clap::Args;

use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct ColumnsArg {
    /// Path to the CSV dataset
    pub data: PathBuf,

    /// File to write the column names to; an existing file is left untouched
    #[arg(long)]
    pub output: PathBuf,
}

pub(crate) fn run(arg: &ColumnsArg) -> anyhow::Result<()> {
    let dataset = util::read_csv_file(&arg.data)?;
    let Some(mut output) = Output::create_new(arg.output.clone())? else {
        eprintln!(
            "{} already exists, leaving it untouched",
            arg.output.display()
        );
        return Ok(());
    };

    let names = dataset.sorted_column_names();
    for name in &names {
        writeln!(output, "{name}")
            .with_context(|| format!("Failed to write to {}", output.display_path()))?;
    }
    output
        .flush()
        .with_context(|| format!("Failed to flush output to {}", output.display_path()))?;

    eprintln!(
        "Wrote {} column names to {}",
        names.len(),
        output.display_path()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_writes_sorted_names_once() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("loans.csv");
        let output = dir.path().join("columns.txt");
        fs::write(&data, "home,TARGET,dti\nRENT,0,1.5\n").unwrap();

        let arg = ColumnsArg {
            data: data.clone(),
            output: output.clone(),
        };
        run(&arg).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "TARGET\ndti\nhome\n");

        fs::write(&data, "zip,home,TARGET,dti\n1,RENT,0,1.5\n").unwrap();
        run(&arg).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "TARGET\ndti\nhome\n");
    }
}
