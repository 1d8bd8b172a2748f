//! Interpretation of the DigitalOcean v1 response envelope.
//!
//! The v1 API answers HTTP 200 even when a call fails, carrying
//! `{"status": "ERROR", "message": ..., "error_message": ...}` in the body.
//! Successful calls carry `{"status": "OK", "<field>": <payload>}`. This
//! module folds the HTTP status and the envelope into a single typed result.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{DigitalOceanError, Result};

const STATUS_UNAUTHORIZED: u16 = 401;
const STATUS_NOT_FOUND: u16 = 404;
const ERROR_STATUS: &str = "ERROR";
const AUTH_MARKERS: [&str; 3] = ["access denied", "not authorized", "authentication"];

/// How an HTTP 404 is surfaced to the caller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NotFoundPolicy {
    /// Single-item lookups yield an absent value.
    Absent,
    /// Every other endpoint raises [`DigitalOceanError::NotFound`].
    Raise,
}

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl Envelope {
    fn is_error(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case(ERROR_STATUS))
    }

    fn details(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error_message.as_deref())
            .filter(|text| !text.trim().is_empty())
    }

    fn into_error(self) -> DigitalOceanError {
        let details = self
            .details()
            .map_or_else(|| String::from("unspecified provider error"), str::to_owned);
        let lowered = details.to_ascii_lowercase();
        if AUTH_MARKERS.iter().any(|marker| lowered.contains(marker)) {
            DigitalOceanError::Authorization(details)
        } else {
            DigitalOceanError::Provider(details)
        }
    }
}

/// Interprets a response and extracts the payload stored under `field`.
///
/// Returns `Ok(None)` for a 404 under [`NotFoundPolicy::Absent`] and for a
/// response without a body.
///
/// # Errors
///
/// - [`DigitalOceanError::Authorization`] on HTTP 401 or an `ERROR` envelope
///   whose message names an authorization failure.
/// - [`DigitalOceanError::NotFound`] on HTTP 404 under
///   [`NotFoundPolicy::Raise`].
/// - [`DigitalOceanError::Provider`] on any other `ERROR` envelope.
/// - [`DigitalOceanError::Transport`] on other HTTP failures, malformed JSON,
///   or an `OK` envelope missing the requested field.
pub fn interpret<T>(
    status: u16,
    body: Option<&[u8]>,
    field: &str,
    not_found: NotFoundPolicy,
) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let Some(mut envelope) = parse(status, body, not_found)? else {
        return Ok(None);
    };
    let payload = envelope
        .payload
        .remove(field)
        .filter(|value| !value.is_null())
        .ok_or_else(|| {
            DigitalOceanError::Transport(format!("response is missing the `{field}` field"))
        })?;
    serde_json::from_value(payload)
        .map(Some)
        .map_err(DigitalOceanError::from)
}

/// Interprets a response that carries no payload, such as a delete call.
///
/// # Errors
///
/// Applies the same rules as [`interpret`], with every 404 raised as
/// [`DigitalOceanError::NotFound`].
pub fn interpret_unit(status: u16, body: Option<&[u8]>) -> Result<()> {
    parse(status, body, NotFoundPolicy::Raise).map(|_| ())
}

fn parse(status: u16, body: Option<&[u8]>, not_found: NotFoundPolicy) -> Result<Option<Envelope>> {
    let content = body.filter(|bytes| !bytes.iter().all(u8::is_ascii_whitespace));
    match status {
        STATUS_UNAUTHORIZED => {
            return Err(DigitalOceanError::Authorization(
                describe(content).unwrap_or_else(|| format!("HTTP {status}")),
            ));
        }
        STATUS_NOT_FOUND => {
            return match not_found {
                NotFoundPolicy::Absent => Ok(None),
                NotFoundPolicy::Raise => Err(DigitalOceanError::NotFound(
                    describe(content).unwrap_or_else(|| format!("HTTP {status}")),
                )),
            };
        }
        200..=299 => {}
        other => {
            return Err(DigitalOceanError::Transport(match describe(content) {
                Some(details) => format!("HTTP {other}: {details}"),
                None => format!("HTTP {other}"),
            }));
        }
    }

    let Some(bytes) = content else {
        return Ok(None);
    };
    let envelope: Envelope = serde_json::from_slice(bytes)?;
    if envelope.is_error() {
        return Err(envelope.into_error());
    }
    Ok(Some(envelope))
}

/// Extracts error details for a failed HTTP status from whatever the body holds.
fn describe(body: Option<&[u8]>) -> Option<String> {
    let bytes = body?;
    let details = serde_json::from_slice::<Envelope>(bytes)
        .ok()
        .and_then(|envelope| envelope.details().map(str::to_owned))
        .unwrap_or_else(|| String::from_utf8_lossy(bytes).trim().to_owned());
    Some(details)
}
