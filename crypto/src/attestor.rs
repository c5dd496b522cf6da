//! Signer recovery for the three kinds of signed relay evidence.

use arbiter_types::{AccountAddress, RelayReply, RelayRequest};

use crate::relay::{finalization_digest, reply_digest, request_digest};
use crate::sign::recover_signer;
use crate::AttestationError;

/// Recovers the account that signed a piece of relay evidence.
///
/// Implementations are pure: no state, no I/O.
pub trait SignatureAttestor {
    /// The client that signed `request`.
    fn recover_from_request(&self, request: &RelayRequest)
        -> Result<AccountAddress, AttestationError>;

    /// The provider that signed `reply` in answer to `request`.
    fn recover_from_reply(
        &self,
        reply: &RelayReply,
        request: &RelayRequest,
    ) -> Result<AccountAddress, AttestationError>;

    /// The provider that signed the finalization acknowledgment of `reply` for `client`.
    fn recover_from_finalization_ack(
        &self,
        reply: &RelayReply,
        request: &RelayRequest,
        client: &AccountAddress,
    ) -> Result<AccountAddress, AttestationError>;
}

/// secp256k1 recoverable-ECDSA attestor.
#[derive(Clone, Copy, Debug, Default)]
pub struct EcdsaAttestor;

impl SignatureAttestor for EcdsaAttestor {
    fn recover_from_request(
        &self,
        request: &RelayRequest,
    ) -> Result<AccountAddress, AttestationError> {
        recover_signer(&request_digest(request)?, &request.sig)
    }

    fn recover_from_reply(
        &self,
        reply: &RelayReply,
        request: &RelayRequest,
    ) -> Result<AccountAddress, AttestationError> {
        recover_signer(&reply_digest(reply, request)?, &reply.sig)
    }

    fn recover_from_finalization_ack(
        &self,
        reply: &RelayReply,
        request: &RelayRequest,
        client: &AccountAddress,
    ) -> Result<AccountAddress, AttestationError> {
        recover_signer(&finalization_digest(reply, request, client)?, &reply.sig_blocks)
    }
}
