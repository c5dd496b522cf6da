//! Conflict-proof validation.
//!
//! A report is accepted only if every signature recovers to the expected
//! account, every account was staked at the request's epoch, and the
//! providers' claims actually contradict each other. Checks run in a fixed
//! order and the first failure is returned. Validation never writes.

use arbiter_crypto::{request_digest, response_hash, SignatureAttestor};
use arbiter_store::StakeRegistry;
use arbiter_types::{
    AccountAddress, ConflictRelayData, ConflictSide, FinalizationConflict, Hash32, RelayRequest,
    ResponseConflict,
};

use crate::ConflictError;

/// One side of a report after its signatures and stake were checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedSide {
    pub side: ConflictSide,
    pub provider: AccountAddress,
    pub response_hash: Hash32,
}

/// A response conflict that passed every check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedConflict {
    pub client: AccountAddress,
    pub chain_id: String,
    pub epoch: u64,
    pub api_url: String,
    pub request_data: Vec<u8>,
    pub request_block: i64,
    /// Digest of the first side's signed request, used to seed jury selection.
    pub request_digest: Hash32,
    pub first: ValidatedSide,
    pub second: ValidatedSide,
}

/// A provider caught asserting two different hashes for one final block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedFinalizationConflict {
    pub client: AccountAddress,
    pub provider: AccountAddress,
    pub chain_id: String,
    pub epoch: u64,
    pub block_height: i64,
    pub first_hash: Hash32,
    pub second_hash: Hash32,
}

/// Stateless validator over a stake registry and a signature attestor.
pub struct ConflictValidator<'a, R: ?Sized, A: ?Sized> {
    registry: &'a R,
    attestor: &'a A,
}

impl<'a, R, A> ConflictValidator<'a, R, A>
where
    R: StakeRegistry + ?Sized,
    A: SignatureAttestor + ?Sized,
{
    pub fn new(registry: &'a R, attestor: &'a A) -> Self {
        Self { registry, attestor }
    }

    /// Validate a report of two providers answering one request differently.
    ///
    /// Both sides must resolve to different providers; a report against a
    /// single provider goes through [`Self::validate_same_provider_conflict`].
    pub fn validate_response_conflict(
        &self,
        conflict: &ResponseConflict,
        client: &AccountAddress,
    ) -> Result<ValidatedConflict, ConflictError> {
        let validated = self.validate_pair(conflict, client)?;
        if validated.first.provider == validated.second.provider {
            return Err(ConflictError::SameProvider {
                provider: validated.first.provider,
            });
        }
        Ok(validated)
    }

    /// Validate a report of one provider answering the same request twice
    /// with different payloads.
    pub fn validate_same_provider_conflict(
        &self,
        conflict: &ResponseConflict,
        client: &AccountAddress,
    ) -> Result<ValidatedConflict, ConflictError> {
        let validated = self.validate_pair(conflict, client)?;
        if validated.first.provider != validated.second.provider {
            return Err(ConflictError::DifferentProviders {
                first: validated.first.provider,
                second: validated.second.provider,
            });
        }
        Ok(validated)
    }

    /// Validate a report of one provider acknowledging two different hashes
    /// for the same finalized block.
    pub fn validate_finalization_conflict(
        &self,
        conflict: &FinalizationConflict,
        client: &AccountAddress,
    ) -> Result<ValidatedFinalizationConflict, ConflictError> {
        let first = conflict.side(ConflictSide::First);
        let second = conflict.side(ConflictSide::Second);
        let first_provider = self.ack_signer(ConflictSide::First, first, client)?;
        let second_provider = self.ack_signer(ConflictSide::Second, second, client)?;
        if first_provider != second_provider {
            return Err(ConflictError::DifferentProviders {
                first: first_provider,
                second: second_provider,
            });
        }

        compare_field("chain_id", &first.request.chain_id, &second.request.chain_id)?;
        let chain_id = first.request.chain_id.as_str();

        // The two requests may fall in different epochs; the provider must
        // have been staked in each.
        let mut epochs = [0; 2];
        for (epoch, side) in epochs.iter_mut().zip(ConflictSide::BOTH) {
            *epoch = self.check_client(side, &conflict.side(side).request, client)?;
        }
        for (epoch, side) in epochs.iter().zip(ConflictSide::BOTH) {
            self.check_provider_stake(side, chain_id, &first_provider, *epoch)?;
        }
        let epoch = epochs[0];

        let (block_height, first_hash, second_hash) = first
            .reply
            .finalized_block_hashes
            .iter()
            .filter_map(|(height, hash)| {
                let other = second.reply.finalized_block_hashes.get(height)?;
                (other != hash).then_some((*height, *hash, *other))
            })
            .find(|(height, _, _)| {
                self.registry
                    .is_finalized_block(chain_id, *height, first.reply.latest_block)
                    && self
                        .registry
                        .is_finalized_block(chain_id, *height, second.reply.latest_block)
            })
            .ok_or(ConflictError::NoFinalizationConflict {
                first_latest: first.reply.latest_block,
                second_latest: second.reply.latest_block,
            })?;

        Ok(ValidatedFinalizationConflict {
            client: *client,
            provider: first_provider,
            chain_id: chain_id.to_string(),
            epoch,
            block_height,
            first_hash,
            second_hash,
        })
    }

    fn validate_pair(
        &self,
        conflict: &ResponseConflict,
        client: &AccountAddress,
    ) -> Result<ValidatedConflict, ConflictError> {
        let first = conflict.side(ConflictSide::First);
        let second = conflict.side(ConflictSide::Second);

        check_request_equality(&first.request, &second.request)?;

        let mut epoch = 0;
        for side in ConflictSide::BOTH {
            epoch = self.check_client(side, &conflict.side(side).request, client)?;
        }

        let mut providers = [AccountAddress::default(); 2];
        for (slot, side) in providers.iter_mut().zip(ConflictSide::BOTH) {
            *slot = self.check_provider(side, conflict.side(side), epoch)?;
        }

        for (provider, side) in providers.iter().zip(ConflictSide::BOTH) {
            self.check_finalization(side, conflict.side(side), provider, client)?;
        }

        let first_hash = response_hash(&first.reply.data);
        if first.reply.data == second.reply.data {
            return Err(ConflictError::NoConflict {
                response_hash: hex::encode(&first_hash),
            });
        }

        Ok(ValidatedConflict {
            client: *client,
            chain_id: first.request.chain_id.clone(),
            epoch,
            api_url: first.request.api_url.clone(),
            request_data: first.request.data.clone(),
            request_block: first.request.request_block,
            request_digest: request_digest(&first.request)?,
            first: ValidatedSide {
                side: ConflictSide::First,
                provider: providers[0],
                response_hash: first_hash,
            },
            second: ValidatedSide {
                side: ConflictSide::Second,
                provider: providers[1],
                response_hash: response_hash(&second.reply.data),
            },
        })
    }

    /// The request must be signed by `client`, and `client` staked at the
    /// request's epoch. Returns the epoch.
    fn check_client(
        &self,
        side: ConflictSide,
        request: &RelayRequest,
        client: &AccountAddress,
    ) -> Result<u64, ConflictError> {
        let signer = self
            .attestor
            .recover_from_request(request)
            .map_err(|e| ConflictError::InvalidClientSignature {
                side,
                client: *client,
                reason: e.to_string(),
            })?;
        if signer != *client {
            return Err(ConflictError::InvalidClientSignature {
                side,
                client: *client,
                reason: format!("recovered {signer}"),
            });
        }

        let epoch = self
            .registry
            .epoch_start_for_block(&request.chain_id, request.block_height)?;
        if self
            .registry
            .client_stake_entry(&request.chain_id, client, epoch)?
            .is_none()
        {
            return Err(ConflictError::NoClientStake {
                client: *client,
                chain_id: request.chain_id.clone(),
                epoch,
            });
        }
        Ok(epoch)
    }

    /// Recover the reply signer and require it to be a staked provider.
    fn check_provider(
        &self,
        side: ConflictSide,
        data: &ConflictRelayData,
        epoch: u64,
    ) -> Result<AccountAddress, ConflictError> {
        let provider = self
            .attestor
            .recover_from_reply(&data.reply, &data.request)
            .map_err(|e| ConflictError::InvalidProviderSignature {
                side,
                reason: e.to_string(),
            })?;
        self.check_provider_stake(side, &data.request.chain_id, &provider, epoch)?;
        Ok(provider)
    }

    fn check_provider_stake(
        &self,
        side: ConflictSide,
        chain_id: &str,
        provider: &AccountAddress,
        epoch: u64,
    ) -> Result<(), ConflictError> {
        match self.registry.provider_stake_entry(chain_id, provider, epoch)? {
            Some(_) => Ok(()),
            None => Err(ConflictError::NoProviderStake {
                side,
                provider: *provider,
                chain_id: chain_id.to_string(),
                epoch,
            }),
        }
    }

    /// The finalization ack must come from the reply's signer and the
    /// requested block must be final from that provider's point of view.
    fn check_finalization(
        &self,
        side: ConflictSide,
        data: &ConflictRelayData,
        provider: &AccountAddress,
        client: &AccountAddress,
    ) -> Result<(), ConflictError> {
        let found = match self
            .attestor
            .recover_from_finalization_ack(&data.reply, &data.request, client)
        {
            Ok(signer) if signer == *provider => None,
            Ok(signer) => Some(signer.to_string()),
            Err(e) => Some(e.to_string()),
        };
        if let Some(found) = found {
            return Err(ConflictError::ProviderIdentityMismatch {
                side,
                provider: *provider,
                found,
            });
        }

        if !self.registry.is_finalized_block(
            &data.request.chain_id,
            data.request.request_block,
            data.reply.latest_block,
        ) {
            return Err(ConflictError::NotFinalized {
                side,
                request_block: data.request.request_block,
                latest_block: data.reply.latest_block,
            });
        }
        Ok(())
    }

    fn ack_signer(
        &self,
        side: ConflictSide,
        data: &ConflictRelayData,
        client: &AccountAddress,
    ) -> Result<AccountAddress, ConflictError> {
        self.attestor
            .recover_from_finalization_ack(&data.reply, &data.request, client)
            .map_err(|e| ConflictError::InvalidProviderSignature {
                side,
                reason: e.to_string(),
            })
    }
}

/// Both sides must describe the same logical request. Provider, session and
/// relay counters legitimately differ and are not compared.
fn check_request_equality(first: &RelayRequest, second: &RelayRequest) -> Result<(), ConflictError> {
    compare_field("chain_id", &first.chain_id, &second.chain_id)?;
    compare_field("block_height", &first.block_height, &second.block_height)?;
    compare_field("api_id", &first.api_id, &second.api_id)?;
    compare_field("api_url", &first.api_url, &second.api_url)?;
    if first.data != second.data {
        return Err(ConflictError::MismatchedRequest {
            field: "data",
            first: hex::encode(&response_hash(&first.data)),
            second: hex::encode(&response_hash(&second.data)),
        });
    }
    compare_field("request_block", &first.request_block, &second.request_block)
}

fn compare_field<T: PartialEq + std::fmt::Display + ?Sized>(
    field: &'static str,
    first: &T,
    second: &T,
) -> Result<(), ConflictError> {
    if first != second {
        return Err(ConflictError::MismatchedRequest {
            field,
            first: first.to_string(),
            second: second.to_string(),
        });
    }
    Ok(())
}
