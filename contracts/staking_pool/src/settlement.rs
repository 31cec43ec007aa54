use soroban_sdk::{ contracttype, token, Address, Env, Vec };

use crate::storage::Committed;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub amount: i128,
}

/// Token movements collected while controllers do their bookkeeping. They can
/// only be executed against a `Committed` proof, i.e. after the ledger has
/// been written.
pub struct Settlement {
    env: Env,
    transfers: Vec<Transfer>,
}

impl Settlement {
    pub fn new(env: &Env) -> Self {
        Settlement {
            env: env.clone(),
            transfers: Vec::new(env),
        }
    }

    /// Funds pulled into the pool from `from`.
    pub fn receive(&mut self, from: &Address, amount: i128) {
        if amount > 0 {
            self.transfers.push_back(Transfer {
                from: from.clone(),
                to: self.env.current_contract_address(),
                amount,
            });
        }
    }

    /// Funds paid out of the pool to `to`.
    pub fn pay(&mut self, to: &Address, amount: i128) {
        if amount > 0 {
            self.transfers.push_back(Transfer {
                from: self.env.current_contract_address(),
                to: to.clone(),
                amount,
            });
        }
    }

    pub fn execute(self, asset: &Address, _committed: Committed) {
        let client = token::Client::new(&self.env, asset);
        for transfer in self.transfers.iter() {
            client.transfer(&transfer.from, &transfer.to, &transfer.amount);
        }
    }
}
