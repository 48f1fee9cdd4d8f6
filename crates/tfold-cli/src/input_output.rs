use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use tfold::TfResult;

/// Opens the output device: a file when a path is given, stdout otherwise.
pub fn open_writer(output: &Option<PathBuf>) -> TfResult<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}
