use errors::NetworkError;
use remote_status::StatusRecord;

/// One complete fetch-and-parse cycle. Either every field of the record is
/// fresh or the whole cycle fails; there is no partial result.
pub trait StatusSource {
    fn fetch_status(&self) -> Result<StatusRecord, NetworkError>;
}
