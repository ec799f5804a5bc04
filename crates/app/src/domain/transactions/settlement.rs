//! Settlement rules shared by owner confirmation, the webhook and chain
//! lookups.

use crate::domain::transactions::status::TransactionStatus;

/// What the settling party says happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    /// Seen on chain, not yet final.
    #[default]
    Processing,
    Confirmed,
    Failed,
}

/// Who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementSource {
    /// The owning user, through the API.
    Owner,

    /// The signed webhook or a chain lookup.
    Chain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Move to the given status; `stamp_confirmed` sets `confirmed_at`.
    Transition {
        status: TransactionStatus,
        stamp_confirmed: bool,
    },

    /// Nothing to change. Replays and stale chain reports end here.
    Unchanged,
}

/// Rejected owner confirmation, carrying the status left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementRejected {
    pub current: TransactionStatus,
}

/// Decide what a settlement report does to an entry in `current`.
///
/// Owners may only confirm a pending entry. Chain reports never move a
/// confirmed, failed or cancelled entry, and are acknowledged instead.
///
/// # Errors
///
/// Returns [`SettlementRejected`] for owner confirmations outside `pending`,
/// or owner verdicts other than `confirmed`.
pub fn settle(
    current: TransactionStatus,
    verdict: Verdict,
    source: SettlementSource,
) -> Result<Settlement, SettlementRejected> {
    match source {
        SettlementSource::Owner => match (current, verdict) {
            (TransactionStatus::Pending, Verdict::Confirmed) => Ok(Settlement::Transition {
                status: TransactionStatus::Confirmed,
                stamp_confirmed: true,
            }),
            _ => Err(SettlementRejected { current }),
        },
        SettlementSource::Chain => Ok(match (current, verdict) {
            (TransactionStatus::Pending, Verdict::Processing) => Settlement::Transition {
                status: TransactionStatus::Processing,
                stamp_confirmed: false,
            },
            (TransactionStatus::Pending | TransactionStatus::Processing, Verdict::Confirmed) => {
                Settlement::Transition {
                    status: TransactionStatus::Confirmed,
                    stamp_confirmed: true,
                }
            }
            (TransactionStatus::Pending | TransactionStatus::Processing, Verdict::Failed) => {
                Settlement::Transition {
                    status: TransactionStatus::Failed,
                    stamp_confirmed: false,
                }
            }
            _ => Settlement::Unchanged,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::transactions::status::TransactionStatus::{
        Cancelled, Confirmed, Failed, Pending, Processing,
    };

    #[test]
    fn owner_confirms_only_pending_entries() {
        assert_eq!(
            settle(Pending, Verdict::Confirmed, SettlementSource::Owner),
            Ok(Settlement::Transition {
                status: Confirmed,
                stamp_confirmed: true
            })
        );

        for current in [Processing, Confirmed, Failed, Cancelled] {
            assert_eq!(
                settle(current, Verdict::Confirmed, SettlementSource::Owner),
                Err(SettlementRejected { current })
            );
        }

        assert!(settle(Pending, Verdict::Failed, SettlementSource::Owner).is_err());
    }

    #[test]
    fn chain_settles_open_entries() {
        for current in [Pending, Processing] {
            assert_eq!(
                settle(current, Verdict::Failed, SettlementSource::Chain),
                Ok(Settlement::Transition {
                    status: Failed,
                    stamp_confirmed: false
                })
            );
        }

        assert_eq!(
            settle(Pending, Verdict::Processing, SettlementSource::Chain),
            Ok(Settlement::Transition {
                status: Processing,
                stamp_confirmed: false
            })
        );
        assert_eq!(
            settle(Processing, Verdict::Processing, SettlementSource::Chain),
            Ok(Settlement::Unchanged)
        );
    }

    #[test]
    fn chain_replays_against_closed_entries_change_nothing() {
        for current in [Confirmed, Failed, Cancelled] {
            for verdict in [Verdict::Processing, Verdict::Confirmed, Verdict::Failed] {
                assert_eq!(
                    settle(current, verdict, SettlementSource::Chain),
                    Ok(Settlement::Unchanged),
                    "{verdict:?} against {current}"
                );
            }
        }
    }
}
