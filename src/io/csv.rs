use nalgebra::Vector3;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::CsvError;
use crate::spins::{Dipole, Orientation};

/// Header row of the dipole CSV contract. Byte-for-byte compatible with
/// previously exported files; angles are degrees, moments Bohr magnetons.
pub const CSV_HEADER: &str = "x,y,z,phi (°),theta (°),moment (mu_B)";

/// Write one header row and one row per dipole.
pub fn write_dipoles<W: Write>(mut writer: W, dipoles: &[Dipole]) -> Result<(), CsvError> {
    writeln!(writer, "{CSV_HEADER}")?;
    for d in dipoles {
        writeln!(
            writer,
            "{},{},{},{},{},{}",
            d.position.x,
            d.position.y,
            d.position.z,
            d.orientation.phi.to_degrees(),
            d.orientation.theta.to_degrees(),
            d.moment
        )?;
    }
    Ok(())
}

/// Read dipole rows, skipping any line whose first cell is not a number
/// (the header, blanks, comments). The moment column is optional and
/// defaults to 1 µB.
pub fn read_dipoles<R: BufRead>(reader: R) -> Result<Vec<Dipole>, CsvError> {
    let mut dipoles = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        if cells[0].parse::<f64>().is_err() {
            continue;
        }
        if cells.len() < 5 {
            return Err(CsvError::parse(
                idx + 1,
                format!("expected at least 5 columns, found {}", cells.len()),
            ));
        }
        let field = |i: usize| -> Result<f64, CsvError> {
            cells[i]
                .parse::<f64>()
                .map_err(|e| CsvError::parse(idx + 1, format!("column {}: {e}", i + 1)))
        };
        let position = Vector3::new(field(0)?, field(1)?, field(2)?);
        let orientation = Orientation::new(field(3)?.to_radians(), field(4)?.to_radians());
        let moment = match cells.get(5) {
            Some(cell) if !cell.is_empty() => field(5)?,
            _ => 1.0,
        };
        dipoles.push(Dipole::new(position, orientation, moment));
    }
    Ok(dipoles)
}

/// Export to a file, creating or truncating it.
pub fn export_file(path: &Path, dipoles: &[Dipole]) -> Result<(), CsvError> {
    let file = File::create(path)?;
    write_dipoles(BufWriter::new(file), dipoles)
}

/// Import one file.
pub fn import_file(path: &Path) -> Result<Vec<Dipole>, CsvError> {
    let file = File::open(path)?;
    read_dipoles(BufReader::new(file))
}

/// Import a batch of files. A failing file does not stop the batch; its
/// error is reported alongside the dipoles collected from the others.
pub fn import_files<P: AsRef<Path>>(paths: &[P]) -> (Vec<Dipole>, Vec<(PathBuf, CsvError)>) {
    let mut dipoles = Vec::new();
    let mut failures = Vec::new();
    for path in paths {
        let path = path.as_ref();
        match import_file(path) {
            Ok(mut batch) => dipoles.append(&mut batch),
            Err(err) => failures.push((path.to_path_buf(), err)),
        }
    }
    (dipoles, failures)
}
