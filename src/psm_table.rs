//! PSM table I/O: the search engine's tab-separated PSM table in, the
//! LuciPHOr2 PSM input file out.
//!
//! Columns are resolved through the header, never by position - upstream
//! tools reorder and append columns freely. Rows without modification
//! annotations are legitimately skipped from LuciPHOr2 output (nothing to
//! localize); structurally malformed tables abort the run instead of
//! producing a silently truncated downstream file.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use log::debug;

use crate::peptide::Psm;

/// Errors raised while reading or writing PSM tables
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// I/O error reading a table
    #[error("Failed to read PSM table: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV/TSV parsing error
    #[error("PSM table parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// Missing required column in a header-indexed table
    #[error("Missing required PSM table column: {0}")]
    MissingColumn(String),

    /// A cell failed to parse as the expected type
    #[error("Invalid value in column {column}: '{value}'")]
    InvalidValue {
        /// Column the cell belongs to.
        column: String,
        /// Offending cell text.
        value: String,
    },
}

/// Resolve a required column index from a header record.
pub(crate) fn require_column(
    headers: &csv::StringRecord,
    name: &str,
) -> Result<usize, TableError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| TableError::MissingColumn(name.to_string()))
}

/// One row of the search engine's PSM table, reduced to the columns the
/// localization workflow needs.
#[derive(Debug, Clone)]
pub struct PsmRow {
    /// Annotated peptide (`Peptide` column).
    pub peptide: String,
    /// Source spectrum file (`SpectraFile` column).
    pub spectra_file: String,
    /// Precursor charge (`Charge` column).
    pub charge: String,
    /// Scan number (`ScanNum` column).
    pub scan_num: String,
    /// PSM q-value (`PSM q-value` column), used as the PSM score.
    pub qvalue: String,
}

/// Header-indexed reader over the search engine's PSM table.
#[derive(Debug)]
pub struct PsmTableReader<R: Read> {
    reader: csv::Reader<R>,
    peptide: usize,
    spectra_file: usize,
    charge: usize,
    scan_num: usize,
    qvalue: usize,
}

impl PsmTableReader<File> {
    /// Open a PSM table file and resolve the required columns.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        Self::from_reader(File::open(path)?)
    }
}

impl<R: Read> PsmTableReader<R> {
    /// Wrap any reader and resolve the required columns from its header.
    pub fn from_reader(reader: R) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        Ok(Self {
            peptide: require_column(&headers, "Peptide")?,
            spectra_file: require_column(&headers, "SpectraFile")?,
            charge: require_column(&headers, "Charge")?,
            scan_num: require_column(&headers, "ScanNum")?,
            qvalue: require_column(&headers, "PSM q-value")?,
            reader,
        })
    }

    /// Iterate over the table's rows.
    pub fn rows(&mut self) -> impl Iterator<Item = Result<PsmRow, TableError>> + '_ {
        let peptide = self.peptide;
        let spectra_file = self.spectra_file;
        let charge = self.charge;
        let scan_num = self.scan_num;
        let qvalue = self.qvalue;
        self.reader.records().map(move |record| {
            let record = record?;
            let cell = |idx: usize| record.get(idx).unwrap_or_default().to_string();
            Ok(PsmRow {
                peptide: cell(peptide),
                spectra_file: cell(spectra_file),
                charge: cell(charge),
                scan_num: cell(scan_num),
                qvalue: cell(qvalue),
            })
        })
    }
}

/// Writer for the LuciPHOr2 PSM input file.
///
/// Emits the fixed header
/// `srcFile  scanNum  charge  PSMscore  peptide  modSites` and one row per
/// PSM carrying at least one labile modification.
#[derive(Debug)]
pub struct LuciphorPsmWriter<W: Write> {
    writer: W,
    rows_written: usize,
}

impl LuciphorPsmWriter<File> {
    /// Create the output file and write the header.
    pub fn to_path<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        Self::from_writer(File::create(path)?)
    }
}

impl<W: Write> LuciphorPsmWriter<W> {
    /// Wrap any writer and emit the header.
    pub fn from_writer(mut writer: W) -> Result<Self, TableError> {
        writeln!(
            writer,
            "srcFile\tscanNum\tcharge\tPSMscore\tpeptide\tmodSites"
        )?;
        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Write one PSM if it carries a labile modification; returns whether
    /// the row was written.
    pub fn write_psm(&mut self, row: &PsmRow, psm: &Psm) -> Result<bool, TableError> {
        if !psm.has_labile() {
            debug!("skipping PSM without labile PTM: scan {}", row.scan_num);
            return Ok(false);
        }
        writeln!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.spectra_file,
            row.scan_num,
            row.charge,
            row.qvalue,
            psm.sequence,
            psm.luciphor_input_sites()
        )?;
        self.rows_written += 1;
        Ok(true)
    }

    /// Number of rows written so far (header excluded).
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modification::{classify_requested, ModLibrary};
    use crate::peptide::PtmNames;

    const SAMPLE_TABLE: &str = "SpecID\tSpectraFile\tScanNum\tCharge\tPeptide\tPSM q-value\n\
        s1\trun1.mzML\t1201\t2\tAS+79.966DFK\t0.001\n\
        s2\trun1.mzML\t1305\t3\tPEPTIDE\t0.004\n";

    #[test]
    fn header_indexing_is_order_independent() {
        let mut reader =
            PsmTableReader::from_reader(std::io::Cursor::new(SAMPLE_TABLE)).expect("open table");
        let rows: Vec<PsmRow> = reader.rows().collect::<Result<_, _>>().expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].peptide, "AS+79.966DFK");
        assert_eq!(rows[0].scan_num, "1201");
        assert_eq!(rows[0].qvalue, "0.001");
        assert_eq!(rows[1].spectra_file, "run1.mzML");
    }

    #[test]
    fn missing_column_is_fatal() {
        let data = "SpectraFile\tScanNum\tCharge\tPeptide\nr\t1\t2\tPEP\n";
        let err = PsmTableReader::from_reader(std::io::Cursor::new(data)).unwrap_err();
        assert!(matches!(err, TableError::MissingColumn(ref c) if c == "PSM q-value"));
    }

    #[test]
    fn writer_skips_psms_without_labile_ptms() {
        let library = ModLibrary::from_reader(std::io::Cursor::new(
            "79.966331,STY,opt,any,Phospho\n",
        ))
        .expect("library");
        let mods = classify_requested(&library, &["phospho".into()]).expect("classify");
        let names = PtmNames::new(&["Phospho".into()], &[]);
        let mass_map = mods.msgf_mass_map();

        let mut reader =
            PsmTableReader::from_reader(std::io::Cursor::new(SAMPLE_TABLE)).expect("open table");
        let mut out = Vec::new();
        let mut writer = LuciphorPsmWriter::from_writer(&mut out).expect("writer");
        for row in reader.rows() {
            let row = row.expect("row");
            let mut psm = Psm::new();
            psm.parse_msgf_sequence(&row.peptide, &mass_map, &names)
                .expect("parse");
            writer.write_psm(&row, &psm).expect("write");
        }
        assert_eq!(writer.rows_written(), 1);

        let text = String::from_utf8(out).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("srcFile\tscanNum\tcharge\tPSMscore\tpeptide\tmodSites")
        );
        let row = lines.next().expect("one data row");
        // 87.032028 (S) + 79.966331 (Phospho) = 166.998359
        assert_eq!(row, "run1.mzML\t1201\t2\t0.001\tASDFK\t1=166.99836");
        assert_eq!(lines.next(), None);
    }
}
