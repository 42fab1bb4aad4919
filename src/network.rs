use chrono::{DateTime, NaiveDateTime, Utc};
use errors::NetworkError;
use reqwest::blocking::Response;
use reqwest::header::LAST_MODIFIED;
use reqwest::Url;
use serde;
use serde_json;
use HTTP_CLIENT;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

fn get_url(url_string: &str) -> Result<Response, NetworkError> {
    let url = Url::parse(url_string).map_err(|e| NetworkError::Http {
        url: url_string.to_string(),
        message: format!("Unable to parse url: {}", e),
    })?;

    let response = HTTP_CLIENT
        .get(url)
        .send()
        .map_err(|e| NetworkError::Http {
            url: url_string.to_string(),
            message: e.to_string(),
        })?;

    if response.status().is_success() {
        Ok(response)
    } else {
        Err(NetworkError::BadStatus {
            url: url_string.to_string(),
            code: response.status().as_u16(),
        })
    }
}

pub fn get_url_text(url_string: &str) -> Result<String, NetworkError> {
    get_url(url_string)?.text().map_err(|e| NetworkError::Http {
        url: url_string.to_string(),
        message: e.to_string(),
    })
}

pub fn get_url_response<T>(url_string: &str) -> Result<T, NetworkError>
where
    T: serde::de::DeserializeOwned,
{
    let body = get_url_text(url_string)?;
    serde_json::from_str::<T>(body.as_str()).map_err(|e| NetworkError::Parse {
        url: url_string.to_string(),
        message: e.to_string(),
    })
}

/// GETs a resource only to read its `Last-Modified` header. The body is dropped unread.
pub fn get_last_modified(url_string: &str) -> Result<DateTime<Utc>, NetworkError> {
    let response = get_url(url_string)?;
    let value = response
        .headers()
        .get(LAST_MODIFIED)
        .ok_or_else(|| NetworkError::MissingLastModified {
            url: url_string.to_string(),
        })?;
    let value = value.to_str().map_err(|_| NetworkError::BadLastModified {
        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
    })?;
    parse_http_date(value)
}

pub fn parse_http_date(value: &str) -> Result<DateTime<Utc>, NetworkError> {
    NaiveDateTime::parse_from_str(value.trim(), HTTP_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| NetworkError::BadLastModified {
            value: value.to_string(),
        })
}

#[cfg(test)]
pub fn format_http_date(time: &DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}
