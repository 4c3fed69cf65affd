use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, StringRecord};
use tracing::warn;

use crate::error::{FaceItError, Result};

/// Column positions of the fields the pipeline reads from each catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogColumns {
    /// Index of the artist name column.
    pub artist: usize,
    /// Index of the artwork title column.
    pub title: usize,
    /// Index of the image URL column.
    pub image_url: usize,
}

impl Default for CatalogColumns {
    /// Layout of the Tate `artwork_data.csv` export.
    fn default() -> Self {
        Self {
            artist: 2,
            title: 5,
            image_url: 18,
        }
    }
}

/// One artwork row from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    /// Artist name as written in the catalog.
    pub artist: String,
    /// Artwork title as written in the catalog.
    pub title: String,
    /// Source image URL. Empty when the row has none.
    pub image_url: String,
    /// Line in the catalog the row started on.
    pub line: u64,
}

impl CatalogRecord {
    /// Output filename prefix: `sanitize(artist) + "_" + sanitize(title)`.
    pub fn tag(&self) -> String {
        format!("{}_{}", sanitize(&self.artist), sanitize(&self.title))
    }

    /// Whether the row carries an image to fetch.
    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }
}

/// Replace commas and spaces with underscores.
pub fn sanitize(value: &str) -> String {
    value.replace([',', ' '], "_")
}

/// Lazy, single-pass reader over a delimited catalog.
///
/// The first row is a header and must be consumed with
/// [`CatalogReader::read_header`] before iterating records.
pub struct CatalogReader<R> {
    inner: csv::Reader<R>,
    columns: CatalogColumns,
    row: StringRecord,
    finished: bool,
}

impl CatalogReader<File> {
    /// Open a catalog file. Failure here is fatal to a run.
    pub fn open(path: impl AsRef<Path>, columns: CatalogColumns) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| FaceItError::CatalogOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(file, columns))
    }
}

impl<R: Read> CatalogReader<R> {
    pub fn from_reader(reader: R, columns: CatalogColumns) -> Self {
        let inner = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        Self {
            inner,
            columns,
            row: StringRecord::new(),
            finished: false,
        }
    }

    /// Consume the header row. Returns `false` if the catalog is empty.
    ///
    /// The header is discarded unread, so its encoding does not matter;
    /// only I/O failures are errors.
    pub fn read_header(&mut self) -> Result<bool> {
        let mut header = ByteRecord::new();
        match self.inner.read_byte_record(&mut header) {
            Ok(true) => Ok(true),
            Ok(false) => {
                self.finished = true;
                Ok(false)
            }
            Err(e) if e.is_io_error() => {
                self.finished = true;
                Err(FaceItError::CatalogRead(e.to_string()))
            }
            Err(e) => {
                warn!("ignoring unparsable catalog header: {e}");
                Ok(true)
            }
        }
    }

    fn current_record(&self) -> Result<CatalogRecord> {
        let line = self.row.position().map_or(0, |p| p.line());
        let image_url = self
            .row
            .get(self.columns.image_url)
            .unwrap_or_default()
            .trim()
            .to_string();

        if image_url.is_empty() {
            return Ok(CatalogRecord {
                artist: self.row.get(self.columns.artist).unwrap_or_default().to_string(),
                title: self.row.get(self.columns.title).unwrap_or_default().to_string(),
                image_url,
                line,
            });
        }

        let field = |index: usize| {
            self.row
                .get(index)
                .map(str::to_string)
                .ok_or_else(|| FaceItError::MalformedRow {
                    line,
                    reason: format!("{} field(s), missing column {index}", self.row.len()),
                })
        };

        Ok(CatalogRecord {
            artist: field(self.columns.artist)?,
            title: field(self.columns.title)?,
            image_url,
            line,
        })
    }
}

impl<R: Read> Iterator for CatalogReader<R> {
    type Item = Result<CatalogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.inner.read_record(&mut self.row) {
            Ok(true) => Some(self.current_record()),
            Ok(false) => {
                self.finished = true;
                None
            }
            Err(e) if e.is_io_error() => {
                self.finished = true;
                Some(Err(FaceItError::CatalogRead(e.to_string())))
            }
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                Some(Err(FaceItError::MalformedRow {
                    line,
                    reason: e.to_string(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: CatalogColumns = CatalogColumns {
        artist: 0,
        title: 1,
        image_url: 2,
    };

    fn reader(data: &str) -> CatalogReader<&[u8]> {
        CatalogReader::from_reader(data.as_bytes(), COLUMNS)
    }

    #[test]
    fn sanitize_replaces_commas_and_spaces() {
        assert_eq!(sanitize("Smith, J"), "Smith__J");
        assert_eq!(sanitize("The Sea"), "The_Sea");
        assert_eq!(sanitize("plain"), "plain");
    }

    #[test]
    fn tag_joins_sanitized_artist_and_title() {
        let record = CatalogRecord {
            artist: "Smith, J".into(),
            title: "The Sea".into(),
            image_url: "http://example.com/a.jpg".into(),
            line: 2,
        };
        assert_eq!(record.tag(), "Smith__J_The_Sea");
    }

    #[test]
    fn header_is_skipped() {
        let mut catalog = reader("artist,title,url\nAda Lovelace,Portrait,http://example.com/a.jpg\n");
        assert!(catalog.read_header().unwrap());

        let records: Vec<_> = catalog.map(Result::unwrap).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].artist, "Ada Lovelace");
        assert_eq!(records[0].title, "Portrait");
        assert_eq!(records[0].image_url, "http://example.com/a.jpg");
        assert_eq!(records[0].line, 2);
    }

    #[test]
    fn empty_catalog_has_no_header() {
        let mut catalog = reader("");
        assert!(!catalog.read_header().unwrap());
        assert_eq!(catalog.count(), 0);
    }

    #[test]
    fn non_utf8_header_is_discarded() {
        let data: &[u8] = b"artist,t\xeftle,url\nA,B,http://example.com/a.jpg\n";
        let mut catalog = CatalogReader::from_reader(data, COLUMNS);
        assert!(catalog.read_header().unwrap());

        let record = catalog.next().unwrap().unwrap();
        assert_eq!(record.artist, "A");
        assert_eq!(record.image_url, "http://example.com/a.jpg");
        assert!(catalog.next().is_none());
    }

    #[test]
    fn header_only_catalog_yields_nothing() {
        let mut catalog = reader("artist,title,url\n");
        assert!(catalog.read_header().unwrap());
        assert_eq!(catalog.count(), 0);
    }

    #[test]
    fn quoted_commas_stay_in_one_field() {
        let mut catalog = reader("a,t,u\n\"Smith, J\",The Sea,http://example.com/s.jpg\n");
        catalog.read_header().unwrap();
        let record = catalog.next().unwrap().unwrap();
        assert_eq!(record.artist, "Smith, J");
        assert_eq!(record.tag(), "Smith__J_The_Sea");
    }

    #[test]
    fn missing_or_empty_url_has_no_image() {
        let mut catalog = reader("a,t,u\nA,T,\nB,U\n");
        catalog.read_header().unwrap();
        let records: Vec<_> = catalog.map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.has_image()));
    }

    #[test]
    fn url_without_title_is_malformed() {
        let columns = CatalogColumns {
            artist: 0,
            title: 3,
            image_url: 1,
        };
        let mut catalog =
            CatalogReader::from_reader("a,u,x,t\nA,http://example.com/a.jpg\n".as_bytes(), columns);
        catalog.read_header().unwrap();
        let err = catalog.next().unwrap().unwrap_err();
        assert!(matches!(err, FaceItError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn malformed_row_does_not_stop_iteration() {
        let data: &[u8] = b"a,t,u\nA,T,http://x/1.jpg\n\xff\xfe,bad,http://x/2.jpg\nC,V,http://x/3.jpg\n";
        let mut catalog = CatalogReader::from_reader(data, COLUMNS);
        catalog.read_header().unwrap();
        let results: Vec<_> = catalog.collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(FaceItError::MalformedRow { .. })));
        assert_eq!(results[2].as_ref().unwrap().artist, "C");
    }
}
