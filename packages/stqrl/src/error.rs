use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ErrorCode {
    MathError = 900,
}

pub type MathResult<T = ()> = Result<T, ErrorCode>;
