use soroban_sdk::{ log, Env };

use crate::{ errors::{ ErrorCode, PoolResult }, storage::DataKey };

/// Marks the pool busy for the duration of one mutating call. A second entry
/// while the flag is set is rejected; the flag is cleared on drop, including
/// on early error returns.
pub struct BusyGuard {
    env: Env,
}

impl BusyGuard {
    pub fn acquire(env: &Env) -> PoolResult<Self> {
        let busy: bool = env.storage().instance().get(&DataKey::Busy).unwrap_or(false);
        if busy {
            log!(env, "Staking Pool: nested call rejected");
            return Err(ErrorCode::Reentrant);
        }

        env.storage().instance().set(&DataKey::Busy, &true);

        Ok(BusyGuard { env: env.clone() })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.env.storage().instance().remove(&DataKey::Busy);
    }
}
