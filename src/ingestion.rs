use std::io::Read;
use std::pin::Pin;

use csv::StringRecord;
use futures::future;
use futures::stream::{self, Stream};
use serde::Deserialize;

use crate::domain::traits::OperationStream;
use crate::domain::{Error, Operation, OperationKind};

pub struct CsvReader<R: Read> {
    reader: Option<csv::Reader<R>>,
}

impl<R: Read> CsvReader<R> {
    pub fn new(reader: R) -> Self {
        let rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        Self { reader: Some(rdr) }
    }
}

/// Internal shape used only for CSV deserialization.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "type")]
    kind: String,
    account: String,
    key: Option<String>,
    amount: u64,
}

impl TryFrom<CsvRow> for Operation {
    type Error = String;

    fn try_from(row: CsvRow) -> Result<Self, Self::Error> {
        if row.account.is_empty() {
            return Err("Missing account identifier".to_string());
        }

        let key = row.key.filter(|k| !k.is_empty());
        let amount = row.amount;
        let kind = match (row.kind.to_ascii_lowercase().as_str(), key) {
            ("debit", None) => OperationKind::Debit { amount },
            ("block", Some(key)) => OperationKind::Block { key, amount },
            ("block_no_fix", None) => OperationKind::BlockNoFix { amount },
            ("unblock", Some(key)) => OperationKind::Unblock { key, amount },
            ("unblock_no_fix", None) => OperationKind::UnblockNoFix { amount },
            ("credit", Some(key)) => OperationKind::Credit { key, amount },
            ("write_off", None) => OperationKind::WriteOff { amount },
            (kind @ ("block" | "unblock" | "credit"), None) => {
                return Err(format!("Operation {} requires a reservation key", kind));
            }
            (kind @ ("debit" | "block_no_fix" | "unblock_no_fix" | "write_off"), Some(_)) => {
                return Err(format!("Operation {} does not take a reservation key", kind));
            }
            (other, _) => return Err(format!("Invalid operation type: {}", other)),
        };

        Ok(Operation {
            kind,
            account_id: row.account,
        })
    }
}

/// Turns one record into an operation, tagging any failure with its line.
fn parse_record(headers: &StringRecord, record: &StringRecord) -> Result<Operation, Error> {
    let line = record.position().map(|pos| pos.line()).unwrap_or_default();

    record
        .deserialize::<CsvRow>(Some(headers))
        .map_err(|e| e.to_string())
        .and_then(Operation::try_from)
        .map_err(|msg| Error::Ingestion(format!("line {}: {}", line, msg)))
}

impl<R: Read + Send + 'static> OperationStream for CsvReader<R> {
    type OpStream = Pin<Box<dyn Stream<Item = Result<Operation, Error>> + Send>>;

    fn stream(&mut self) -> Self::OpStream {
        // a reader yields its operations once; later calls see nothing
        let Some(mut reader) = self.reader.take() else {
            return Box::pin(stream::empty::<Result<Operation, Error>>());
        };

        let headers = match reader.headers() {
            Ok(headers) => headers.clone(),
            Err(e) => {
                let err = Error::Ingestion(format!("Unreadable header row: {}", e));
                return Box::pin(stream::once(future::ready(Err(err))));
            }
        };

        let records = reader.into_records().map(move |record| match record {
            Ok(record) => parse_record(&headers, &record),
            Err(e) => Err(Error::Ingestion(format!("CSV read error: {}", e))),
        });

        Box::pin(stream::iter(records))
    }
}
