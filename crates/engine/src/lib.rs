pub use balance::{ExpenseCharge, NetPosition, Participant, TransferSuggestion};
pub use currency::CurrencyCode;
pub use error::EngineError;
pub use expenses::Expense;
pub use join_requests::{JoinRequest, JoinRequestStatus};
pub use members::{Member, MemberRole};
pub use money::MoneyCents;
pub use ops::{
    BalanceReport, Engine, EngineBuilder, JoinRequestOutcome, MembersOverview, TopicSummary,
};
pub use settlements::Settlement;
pub use topics::{Topic, TopicStatus};

pub mod balance;
mod currency;
mod error;
mod expense_splits;
mod expenses;
mod join_requests;
mod members;
mod money;
mod ops;
mod settlements;
mod topics;

pub(crate) type ResultEngine<T> = Result<T, EngineError>;
