use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Uint256};
use std::collections::HashMap;

use crate::Account;

/// Opaque handle returned by the submission collaborator
pub type TxHash = String;

/// A directed source -> destination chain pair
#[cw_serde]
#[derive(Eq, Hash)]
pub struct ChainRoute {
    pub source: String,
    pub destination: String,
}

impl ChainRoute {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl std::fmt::Display for ChainRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.source, self.destination)
    }
}

/// One bridging request, submitted exactly once
#[cw_serde]
pub struct TransferRequest {
    /// Source chain ID
    pub source: String,

    /// Destination chain ID
    pub destination: String,

    /// Sending account on the source chain
    pub sender: Account,

    /// Every receiver is credited `amount` on the destination chain
    pub receivers: Vec<Account>,

    /// Amount per receiver in the source ledger's smallest unit
    pub amount: Uint256,

    /// Optional payload attached to the bridging transaction
    pub metadata: Option<Binary>,
}

impl TransferRequest {
    pub fn new(route: &ChainRoute, sender: Account, receivers: Vec<Account>, amount: Uint256) -> Self {
        Self {
            source: route.source.clone(),
            destination: route.destination.clone(),
            sender,
            receivers,
            amount,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Option<Binary>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn route(&self) -> ChainRoute {
        ChainRoute::new(self.source.clone(), self.destination.clone())
    }
}

/// Expand a routing table into chain pairs
///
/// Sources are visited in `chains` order and destinations in declared order.
/// Self-routes and duplicates are dropped.
pub fn chain_routes(chains: &[String], routing: &HashMap<String, Vec<String>>) -> Vec<ChainRoute> {
    let mut routes = Vec::new();

    for source in chains {
        let Some(destinations) = routing.get(source) else {
            continue;
        };

        for destination in destinations {
            if destination == source {
                continue;
            }

            let route = ChainRoute::new(source.clone(), destination.clone());
            if !routes.contains(&route) {
                routes.push(route);
            }
        }
    }

    routes
}

/// Distinct destination chains of the routing table, in first-seen order
pub fn destination_chains(chains: &[String], routing: &HashMap<String, Vec<String>>) -> Vec<String> {
    let mut destinations: Vec<String> = Vec::new();

    for route in chain_routes(chains, routing) {
        if !destinations.contains(&route.destination) {
            destinations.push(route.destination);
        }
    }

    destinations
}
