// Primitives for reading the result tables.

use std::fs::File;

use csv::{ByteRecord, Reader};
use encoding_rs::WINDOWS_1252;
use party_tally::builder::FileTally;

use crate::tally::{io_common::simplify_file_name, *};

/// How a table is read.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Dialect {
    /// `;` delimiter, latin-1 text, no row longer than the header.
    Latin1Semicolon,
    /// `,` delimiter, UTF-8 text with invalid bytes replaced, ragged rows accepted.
    Permissive,
}

/// The group sums of one file.
#[derive(Debug, Clone)]
pub struct FileRead {
    pub parties: FileTally,
    /// Present if coalitions are tracked and the file has the coalition column.
    pub coalitions: Option<FileTally>,
    /// The file could only be read with the permissive dialect.
    pub degraded: bool,
}

// The positions of the resolved columns in one file.
#[derive(Debug, Clone, Copy)]
struct SelectedColumns {
    party: usize,
    votes: usize,
    coalition: Option<usize>,
}

fn open_reader(path: &Path, dialect: Dialect) -> TallyResult<Reader<File>> {
    let delimiter = match dialect {
        Dialect::Latin1Semicolon => b';',
        Dialect::Permissive => b',',
    };
    // Short rows are accepted by both dialects. The length check for the strict
    // dialect is done while reading.
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_path(path)
        .context(OpeningCsvSnafu {
            path: path.display().to_string(),
        })
}

pub fn decode_field(field: &[u8], dialect: Dialect) -> String {
    match dialect {
        Dialect::Latin1Semicolon => {
            let (cow, _, _) = WINDOWS_1252.decode(field);
            cow.into_owned()
        }
        Dialect::Permissive => String::from_utf8_lossy(field).into_owned(),
    }
}

fn decode_headers(record: &ByteRecord, dialect: Dialect) -> Vec<String> {
    record
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            // Excel likes to start its exports with a UTF-8 BOM.
            let field = if idx == 0 && field.starts_with(&[0xEF, 0xBB, 0xBF]) {
                &field[3..]
            } else {
                field
            };
            decode_field(field, dialect)
        })
        .collect()
}

fn read_header_with(path: &Path, dialect: Dialect) -> TallyResult<Vec<String>> {
    let p = path.display().to_string();
    let mut rdr = open_reader(path, dialect)?;
    let header = rdr.byte_headers().context(OpeningCsvSnafu { path: p.clone() })?;
    if header.is_empty() {
        return EmptyCsvSnafu { path: p }.fail();
    }
    Ok(decode_headers(header, dialect))
}

/// Reads the column names of a file.
pub fn read_header(path: &Path) -> TallyResult<Vec<String>> {
    match read_header_with(path, Dialect::Latin1Semicolon) {
        Ok(header) => Ok(header),
        Err(e) => {
            debug!(
                "read_header: {}: {}, trying the permissive reader",
                simplify_file_name(path),
                e
            );
            read_header_with(path, Dialect::Permissive)
        }
    }
}

fn select_columns(headers: &[String], roles: &ColumnRoles) -> Result<SelectedColumns, Vec<String>> {
    let find = |name: &str| headers.iter().position(|h| h.trim() == name.trim());
    match (find(&roles.party), find(&roles.votes)) {
        (Some(party), Some(votes)) => Ok(SelectedColumns {
            party,
            votes,
            coalition: roles.coalition.as_deref().and_then(find),
        }),
        (party, votes) => {
            let mut missing: Vec<String> = Vec::new();
            if party.is_none() {
                missing.push(roles.party.clone());
            }
            if votes.is_none() {
                missing.push(roles.votes.clone());
            }
            Err(missing)
        }
    }
}

fn tally_with(
    path: &Path,
    roles: &ColumnRoles,
    dialect: Dialect,
) -> TallyResult<(FileTally, Option<FileTally>)> {
    let p = path.display().to_string();
    let mut rdr = open_reader(path, dialect)?;
    let headers = decode_headers(
        rdr.byte_headers().context(OpeningCsvSnafu { path: p.clone() })?,
        dialect,
    );
    let selected = select_columns(&headers, roles).map_err(|columns| {
        MissingColumnsSnafu {
            path: p.clone(),
            columns,
        }
        .build()
    })?;
    debug!("tally_with: {:?} {:?}", dialect, selected);
    if roles.coalition.is_some() && selected.coalition.is_none() {
        warn!(
            "{}: no column {:?}, coalitions are not counted for this file",
            simplify_file_name(path),
            roles.coalition
        );
    }

    let mut parties = FileTally::new();
    let mut coalitions: Option<(usize, FileTally)> =
        selected.coalition.map(|idx| (idx, FileTally::new()));
    let mut record = ByteRecord::new();
    while rdr
        .read_byte_record(&mut record)
        .context(OpeningCsvSnafu { path: p.clone() })?
    {
        if dialect == Dialect::Latin1Semicolon && record.len() > headers.len() {
            return RaggedRowSnafu {
                path: p,
                line: record.position().map_or(0, |pos| pos.line()),
                expected: headers.len(),
                found: record.len(),
            }
            .fail();
        }
        // The missing cells of a short row are empty.
        let field = |idx: usize| {
            record
                .get(idx)
                .map(|f| decode_field(f, dialect))
                .unwrap_or_default()
        };
        let cell = parties.add_row(&field(selected.party), &field(selected.votes));
        if let Some((idx, tally)) = coalitions.as_mut() {
            tally.add_votes(&field(*idx), cell.votes());
        }
    }
    Ok((parties, coalitions.map(|(_, tally)| tally)))
}

/// Reads the party (and coalition) sums of one file.
///
/// The file is first read as `;`-delimited latin-1. If that fails, it is read again
/// with the permissive dialect. Returns `None` if both fail: the file is skipped.
pub fn read_tally_file(path: &Path, roles: &ColumnRoles) -> Option<FileRead> {
    let name = simplify_file_name(path);
    match tally_with(path, roles, Dialect::Latin1Semicolon) {
        Ok((parties, coalitions)) => Some(FileRead {
            parties,
            coalitions,
            degraded: false,
        }),
        Err(e) => {
            debug!(
                "read_tally_file: {}: {}, trying the permissive reader",
                name, e
            );
            match tally_with(path, roles, Dialect::Permissive) {
                Ok((parties, coalitions)) => Some(FileRead {
                    parties,
                    coalitions,
                    degraded: true,
                }),
                Err(e2) => {
                    warn!("Skipping {}: {}", name, e2);
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_file(dir: &str, name: &str) -> PathBuf {
        [env!("CARGO_MANIFEST_DIR"), "tests", "data", dir, name]
            .iter()
            .collect()
    }

    #[test]
    fn latin1_fields() {
        assert_eq!(
            decode_field(b"BRASIL DA ESPERAN\xc7A", Dialect::Latin1Semicolon),
            "BRASIL DA ESPERANÇA"
        );
        assert_eq!(
            decode_field("SÃO PAULO".as_bytes(), Dialect::Permissive),
            "SÃO PAULO"
        );
    }

    #[test]
    fn header_of_semicolon_file() {
        let header = read_header(&data_file("coalitions", "a.csv")).unwrap();
        assert_eq!(
            header,
            vec![
                "ANO_ELEICAO",
                "SG_PARTIDO",
                "NM_COLIGACAO",
                "QT_VOTOS_NOMINAIS_VALIDOS"
            ]
        );
    }

    #[test]
    fn columns_are_matched_after_trimming() {
        let headers: Vec<String> = vec![" SG_PARTIDO ".to_string(), "QT_VOTOS".to_string()];
        let roles = ColumnRoles {
            party: "SG_PARTIDO".to_string(),
            votes: "QT_VOTOS ".to_string(),
            coalition: Some("NM_COLIGACAO".to_string()),
        };
        let selected = select_columns(&headers, &roles).unwrap();
        assert_eq!(selected.party, 0);
        assert_eq!(selected.votes, 1);
        assert_eq!(selected.coalition, None);

        let other = ColumnRoles {
            party: "SIGLA".to_string(),
            votes: "QT_VOTOS".to_string(),
            coalition: None,
        };
        assert_eq!(
            select_columns(&headers, &other).unwrap_err(),
            vec!["SIGLA".to_string()]
        );
    }

    #[test]
    fn permissive_reading_of_comma_file() {
        let roles = ColumnRoles {
            party: "SG_PARTIDO".to_string(),
            votes: "QT_VOTOS_NOMINAIS_VALIDOS".to_string(),
            coalition: None,
        };
        let read = read_tally_file(&data_file("mixed_formats", "b.csv"), &roles).unwrap();
        assert!(read.degraded);
        assert!(read.coalitions.is_none());
        let groups: Vec<(&str, i64)> = read.parties.groups().collect();
        assert_eq!(groups, vec![("PT", 7)]);
    }

    #[test]
    fn long_rows_fail_the_semicolon_reader() {
        let roles = ColumnRoles {
            party: "SG_PARTIDO".to_string(),
            votes: "QT_VOTOS_NOMINAIS_VALIDOS".to_string(),
            coalition: None,
        };
        let res = tally_with(
            &data_file("ragged_file", "b.csv"),
            &roles,
            Dialect::Latin1Semicolon,
        );
        match res {
            Err(TallyError::RaggedRow {
                expected, found, ..
            }) => {
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            x => panic!("unexpected result: {:?}", x.map(|_| ())),
        }

        let short = tally_with(
            &data_file("short_row", "a.csv"),
            &roles,
            Dialect::Latin1Semicolon,
        )
        .unwrap();
        assert_eq!(short.0.cell_stats().rows, 3);
    }
}
