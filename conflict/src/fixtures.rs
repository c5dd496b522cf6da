//! Signed relay evidence for tests.

use arbiter_crypto::{
    keypair_from_seed, sign_finalization_ack, sign_relay_reply, sign_relay_request, KeyPair,
};
use arbiter_nullables::NullStakeRegistry;
use arbiter_types::{
    AccountAddress, ConflictRelayData, FinalizationConflict, Hash32, RecoverableSignature,
    RelayReply, RelayRequest, ResponseConflict, StakeEntry,
};
use std::collections::BTreeMap;

pub(crate) const CHAIN: &str = "LAV1";
pub(crate) const EPOCH: u64 = 100;

/// A client, two providers and a pool of staked jurors on one chain.
pub(crate) struct Scenario {
    pub client: KeyPair,
    pub provider0: KeyPair,
    pub provider1: KeyPair,
    pub jurors: Vec<AccountAddress>,
    pub registry: NullStakeRegistry,
}

impl Scenario {
    pub fn new() -> Self {
        Self::build(true, true, 5)
    }

    pub fn with_jurors(count: u8) -> Self {
        Self::build(true, true, count)
    }

    pub fn unstaked_client() -> Self {
        Self::build(false, true, 5)
    }

    pub fn without_provider1_stake() -> Self {
        Self::build(true, false, 5)
    }

    fn build(stake_client: bool, stake_provider1: bool, juror_count: u8) -> Self {
        let client = keypair_from_seed(&[31u8; 32]).unwrap();
        let provider0 = keypair_from_seed(&[32u8; 32]).unwrap();
        let provider1 = keypair_from_seed(&[33u8; 32]).unwrap();
        let registry = NullStakeRegistry::new(20, 6);
        let entry = StakeEntry::new(1_000);

        if stake_client {
            registry.stake_client(CHAIN, client.address, EPOCH, entry);
        }
        registry.stake_provider(CHAIN, provider0.address, EPOCH, entry);
        if stake_provider1 {
            registry.stake_provider(CHAIN, provider1.address, EPOCH, entry);
        }
        let jurors: Vec<AccountAddress> = (0..juror_count)
            .map(|i| AccountAddress::new([0x40 + i; 20]))
            .collect();
        for juror in &jurors {
            registry.stake_provider(CHAIN, *juror, EPOCH, entry);
        }

        Self {
            client,
            provider0,
            provider1,
            jurors,
            registry,
        }
    }

    pub fn request(&self, provider: &KeyPair) -> RelayRequest {
        RelayRequest {
            provider: provider.address,
            chain_id: CHAIN.into(),
            session_id: 1,
            relay_num: 1,
            cu_sum: 10,
            block_height: 105,
            api_id: 1,
            api_url: "/block".into(),
            data: br#"{"height":100}"#.to_vec(),
            request_block: 100,
            sig: RecoverableSignature::EMPTY,
        }
    }

    /// A signed exchange with `provider`. Mutations run before signing.
    pub fn exchange(
        &self,
        provider: &KeyPair,
        data: &[u8],
        mutate_reply: impl FnOnce(&mut RelayReply),
        mutate_request: impl FnOnce(&mut RelayRequest),
    ) -> ConflictRelayData {
        let mut request = self.request(provider);
        mutate_request(&mut request);
        sign_relay_request(&mut request, &self.client).unwrap();

        let mut reply = RelayReply {
            data: data.to_vec(),
            latest_block: 110,
            finalized_block_hashes: BTreeMap::new(),
            sig: RecoverableSignature::EMPTY,
            sig_blocks: RecoverableSignature::EMPTY,
        };
        mutate_reply(&mut reply);
        sign_relay_reply(&mut reply, &request, provider).unwrap();
        sign_finalization_ack(&mut reply, &request, &self.client.address, provider).unwrap();
        ConflictRelayData { request, reply }
    }

    /// Provider 0 and provider 1 answering differently. The closures mutate
    /// the second side only.
    pub fn build_conflict(
        &self,
        data0: &[u8],
        data1: &[u8],
        mutate_reply1: impl FnOnce(&mut RelayReply),
        mutate_request1: impl FnOnce(&mut RelayRequest),
    ) -> ResponseConflict {
        ResponseConflict {
            conflict_relay_data0: self.exchange(&self.provider0, data0, |_| {}, |_| {}),
            conflict_relay_data1: self.exchange(&self.provider1, data1, mutate_reply1, mutate_request1),
        }
    }

    pub fn response_conflict(&self) -> ResponseConflict {
        self.response_conflict_with(|_| {}, |_| {})
    }

    pub fn response_conflict_with(
        &self,
        mutate_reply1: impl FnOnce(&mut RelayReply),
        mutate_request1: impl FnOnce(&mut RelayRequest),
    ) -> ResponseConflict {
        self.build_conflict(b"0x64", b"0x65", mutate_reply1, mutate_request1)
    }

    /// Provider 0 answering the same request twice with different payloads.
    pub fn same_provider_conflict(&self) -> ResponseConflict {
        ResponseConflict {
            conflict_relay_data0: self.exchange(&self.provider0, b"0x64", |_| {}, |_| {}),
            conflict_relay_data1: self.exchange(&self.provider0, b"0x66", |_| {}, |r| r.relay_num = 2),
        }
    }

    /// Provider 0 acknowledging two sets of finalized block hashes.
    pub fn finalization_conflict(
        &self,
        first: &[(i64, Hash32)],
        second: &[(i64, Hash32)],
    ) -> FinalizationConflict {
        self.finalization_conflict_with(first, second, |_| {})
    }

    /// Like [`Self::finalization_conflict`], mutating the second request
    /// before it is signed.
    pub fn finalization_conflict_with(
        &self,
        first: &[(i64, Hash32)],
        second: &[(i64, Hash32)],
        mutate_request1: impl FnOnce(&mut RelayRequest),
    ) -> FinalizationConflict {
        let hashes = |pairs: &[(i64, Hash32)]| pairs.iter().copied().collect::<BTreeMap<_, _>>();
        let first = hashes(first);
        let second = hashes(second);
        FinalizationConflict {
            relay_reply0: self.exchange(
                &self.provider0,
                b"0x64",
                |reply| reply.finalized_block_hashes = first,
                |_| {},
            ),
            relay_reply1: self.exchange(
                &self.provider0,
                b"0x64",
                |reply| reply.finalized_block_hashes = second,
                |r| {
                    r.relay_num = 2;
                    mutate_request1(r);
                },
            ),
        }
    }
}
