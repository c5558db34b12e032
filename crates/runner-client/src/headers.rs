use crate::{RunnerClientError, RunnerClientResult};
use device_identity_crypto::Identity;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONNECTION, HOST};
use task_protocol_types::{CREATOR_ADDRESS_HEADER, DEVICE_ID_HEADER};

/// Connection-scoped headers (RFC 9110 §7.6.1) that a proxy must not forward.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Copy `headers` without hop-by-hop headers, including any the
/// `Connection` header names.
pub fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let listed: Vec<String> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let mut kept = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name_str = name.as_str();
        if HOP_BY_HOP.contains(&name_str) || listed.iter().any(|l| l == name_str) {
            continue;
        }
        kept.append(name.clone(), value.clone());
    }
    kept
}

/// Headers for a request forwarded to the runner: the caller's headers minus
/// `Host` and hop-by-hop headers, with the identity headers replacing any
/// caller-supplied values.
pub fn outbound_request_headers(
    inbound: &HeaderMap,
    identity: &Identity,
) -> RunnerClientResult<HeaderMap> {
    let mut headers = strip_hop_by_hop(inbound);
    headers.remove(HOST);
    apply_identity(&mut headers, identity)?;
    Ok(headers)
}

/// Set `X-Device-ID` and `X-Creator-Address`, removing all previous values.
pub fn apply_identity(headers: &mut HeaderMap, identity: &Identity) -> RunnerClientResult<()> {
    set_single(headers, DEVICE_ID_HEADER, &identity.device_id)?;
    set_single(headers, CREATOR_ADDRESS_HEADER, &identity.creator_address)?;
    Ok(())
}

fn set_single(headers: &mut HeaderMap, name: &'static str, value: &str) -> RunnerClientResult<()> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| RunnerClientError::InvalidHeader { name })?;
    let header_value =
        HeaderValue::from_str(value).map_err(|_| RunnerClientError::InvalidHeader { name })?;
    headers.insert(header_name, header_value);
    Ok(())
}
