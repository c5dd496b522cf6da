//! Canonical digests of relay messages and the helpers that sign them.
//!
//! Each digest is domain-separated so a signature over one message kind can
//! never be replayed as another.

use arbiter_types::{AccountAddress, Hash32, RelayReply, RelayRequest};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::sign::sign_prehash;
use crate::{blake2b_256, blake2b_256_multi, AttestationError, KeyPair};

const REQUEST_DOMAIN: &[u8] = b"arbiter/relay-request";
const REPLY_DOMAIN: &[u8] = b"arbiter/relay-reply";
const FINALIZATION_DOMAIN: &[u8] = b"arbiter/finalization";

/// Every request field the client signs (all but the signature itself).
#[derive(Serialize)]
struct SignableRequest<'a> {
    provider: &'a AccountAddress,
    chain_id: &'a str,
    session_id: u64,
    relay_num: u64,
    cu_sum: u64,
    block_height: u64,
    api_id: u32,
    api_url: &'a str,
    data: &'a [u8],
    request_block: i64,
}

impl<'a> From<&'a RelayRequest> for SignableRequest<'a> {
    fn from(r: &'a RelayRequest) -> Self {
        Self {
            provider: &r.provider,
            chain_id: &r.chain_id,
            session_id: r.session_id,
            relay_num: r.relay_num,
            cu_sum: r.cu_sum,
            block_height: r.block_height,
            api_id: r.api_id,
            api_url: &r.api_url,
            data: &r.data,
            request_block: r.request_block,
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, AttestationError> {
    bincode::serialize(value).map_err(|e| AttestationError::Encoding(e.to_string()))
}

/// Hash identifying a provider's response payload.
pub fn response_hash(data: &[u8]) -> Hash32 {
    blake2b_256(data)
}

/// Digest the client signs in `RelayRequest::sig`.
pub fn request_digest(request: &RelayRequest) -> Result<Hash32, AttestationError> {
    let bytes = encode(&SignableRequest::from(request))?;
    Ok(blake2b_256_multi(&[REQUEST_DOMAIN, &bytes]))
}

/// Digest the provider signs in `RelayReply::sig`, bound to the signed request.
pub fn reply_digest(
    reply: &RelayReply,
    request: &RelayRequest,
) -> Result<Hash32, AttestationError> {
    let request_digest = request_digest(request)?;
    Ok(blake2b_256_multi(&[
        REPLY_DOMAIN,
        &response_hash(&reply.data),
        request.sig.as_bytes(),
        &request_digest,
    ]))
}

/// Digest the provider signs in `RelayReply::sig_blocks`, addressed to `client`.
pub fn finalization_digest(
    reply: &RelayReply,
    request: &RelayRequest,
    client: &AccountAddress,
) -> Result<Hash32, AttestationError> {
    let request_digest = request_digest(request)?;
    let finalized: &BTreeMap<i64, Hash32> = &reply.finalized_block_hashes;
    let finalized_bytes = encode(finalized)?;
    Ok(blake2b_256_multi(&[
        FINALIZATION_DOMAIN,
        &reply.latest_block.to_le_bytes(),
        &finalized_bytes,
        &request_digest,
        client.as_bytes(),
    ]))
}

/// Sign `request` as its client.
pub fn sign_relay_request(
    request: &mut RelayRequest,
    client: &KeyPair,
) -> Result<(), AttestationError> {
    let digest = request_digest(request)?;
    request.sig = sign_prehash(&digest, client)?;
    Ok(())
}

/// Sign `reply` as the provider that served `request`.
pub fn sign_relay_reply(
    reply: &mut RelayReply,
    request: &RelayRequest,
    provider: &KeyPair,
) -> Result<(), AttestationError> {
    let digest = reply_digest(reply, request)?;
    reply.sig = sign_prehash(&digest, provider)?;
    Ok(())
}

/// Sign the finalization acknowledgment of `reply` for `client`.
pub fn sign_finalization_ack(
    reply: &mut RelayReply,
    request: &RelayRequest,
    client: &AccountAddress,
    provider: &KeyPair,
) -> Result<(), AttestationError> {
    let digest = finalization_digest(reply, request, client)?;
    reply.sig_blocks = sign_prehash(&digest, provider)?;
    Ok(())
}
