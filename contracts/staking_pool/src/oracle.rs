use soroban_sdk::{ log, Address, Env };
use stqrl::validate;

use crate::{ errors::{ ErrorCode, PoolResult }, storage::{ Config, OracleState } };

/// Decides whether an incoming balance report may enter the ledger. The share
/// ledger and the withdrawal queue never see this seam, so a multi-party
/// scheme can replace the single reporter without touching them.
pub trait ReportVerifier {
    fn verify_report(
        &self,
        env: &Env,
        reporter: &Address,
        balance: i128,
        now: u64,
        state: &OracleState
    ) -> PoolResult;
}

/// One trusted reporter, at most one accepted report per cooldown interval.
pub struct SingleReporter {
    pub oracle: Address,
    pub cooldown: u64,
}

impl SingleReporter {
    pub fn from_config(config: &Config) -> Self {
        SingleReporter {
            oracle: config.oracle.clone(),
            cooldown: config.report_cooldown,
        }
    }
}

impl ReportVerifier for SingleReporter {
    fn verify_report(
        &self,
        env: &Env,
        reporter: &Address,
        balance: i128,
        now: u64,
        state: &OracleState
    ) -> PoolResult {
        if *reporter != self.oracle {
            log!(env, "Staking Pool: report from unknown reporter");
            return Err(ErrorCode::NotAuthorized);
        }

        validate!(env, balance >= 0, ErrorCode::ZeroAmount, "negative balance report", balance)?;

        if state.report_count > 0 {
            let next_allowed = state.last_report_ts.saturating_add(self.cooldown);
            validate!(
                env,
                now >= next_allowed,
                ErrorCode::ReportCooldownActive,
                "report cooldown active until",
                next_allowed
            )?;
        }

        Ok(())
    }
}
